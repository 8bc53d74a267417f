mod graph;
mod load;
pub mod parse;

pub use graph::{Edge, EntityGroup, GraphModel, Instance, InvalidRegulation, ModelError, Node, Regulation};
pub use load::load_graph;
pub use parse::{ParseError, parse_graph_document};
