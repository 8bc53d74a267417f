use super::filter::{FilterProperty, FilterValue};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("the {property} filter was never given the value `{value}`")]
    UnknownFilterValue {
        property: FilterProperty,
        value: FilterValue,
    },
    #[error("minimum component size must be at least 1, got {0}")]
    InvalidComponentSize(usize),
}
