pub mod documents;
pub mod engine;
pub mod export;
pub mod interaction;
pub mod network;
