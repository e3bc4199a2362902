use crate::model::{EntityId, Ms};

/// Why an input record was kept out of lane placement.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    InvalidTimestamp {
        id: EntityId,
        field: &'static str,
        value: String,
    },
    TimestampOutOfRange {
        id: EntityId,
        field: &'static str,
        value: Ms,
    },
    EndBeforeStart {
        id: EntityId,
        start: Ms,
        end: Ms,
    },
    NonFiniteRatio {
        id: EntityId,
        field: &'static str,
    },
    NegativeSpan {
        id: EntityId,
        span: f64,
    },
}

impl LayoutError {
    pub fn id(&self) -> EntityId {
        match self {
            LayoutError::InvalidTimestamp { id, .. }
            | LayoutError::TimestampOutOfRange { id, .. }
            | LayoutError::EndBeforeStart { id, .. }
            | LayoutError::NonFiniteRatio { id, .. }
            | LayoutError::NegativeSpan { id, .. } => *id,
        }
    }
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::InvalidTimestamp { id, field, value } => {
                write!(f, "record {id}: unparseable {field} timestamp {value:?}")
            }
            LayoutError::TimestampOutOfRange { id, field, value } => {
                write!(f, "record {id}: {field} timestamp {value} out of range")
            }
            LayoutError::EndBeforeStart { id, start, end } => {
                write!(f, "record {id}: end {end} is before start {start}")
            }
            LayoutError::NonFiniteRatio { id, field } => {
                write!(f, "record {id}: {field} is not a finite number")
            }
            LayoutError::NegativeSpan { id, span } => {
                write!(f, "record {id}: negative span {span}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}
