mod aggregate;
mod error;
mod filter;
mod prune;
mod scheduler;
mod session;
mod width;
mod working;

pub use aggregate::{Aggregation, EdgeAggregate, NodeAggregate, aggregate, majority_vote};
pub use error::EngineError;
pub use filter::{ElementKind, Filter, FilterBank, FilterEntry, FilterProperty, FilterValue};
pub use prune::{ComponentPruner, PruneReport, connected_components};
pub use scheduler::{DEFAULT_QUIET_WINDOW, RecomputeScheduler};
pub use session::{EngineConfig, PrunedEdge, PrunedGraph, PrunedNode, Session, recompute};
pub use width::{ScaleMode, WidthConfig, WidthScaler};
pub use working::WorkingGraph;
