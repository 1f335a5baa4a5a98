use ulid::Ulid;

use crate::model::Rect;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    OutOfBounds(Rect),
    SpaceTaken(Ulid),
    NoSpace { width: i32, height: i32 },
    Invalid(&'static str),
    Timeout,
    StoreUnavailable(String),
}

impl EngineError {
    /// SQLSTATE reported to wire clients.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "P0002",
            EngineError::SpaceTaken(_) => "23P01",
            EngineError::NoSpace { .. } => "53000",
            EngineError::OutOfBounds(_) => "22003",
            EngineError::Invalid(_) => "22023",
            EngineError::Timeout => "57014",
            EngineError::StoreUnavailable(_) => "58030",
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::SpaceTaken(_) => "space_taken",
            EngineError::NoSpace { .. } => "no_space",
            EngineError::OutOfBounds(_) => "out_of_bounds",
            EngineError::Invalid(_) => "invalid",
            EngineError::Timeout => "timeout",
            EngineError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "ad not found: {id}"),
            EngineError::OutOfBounds(rect) => {
                write!(f, "{rect} extends beyond the 1000x1000 canvas")
            }
            EngineError::SpaceTaken(id) => write!(f, "space already taken by ad {id}"),
            EngineError::NoSpace { width, height } => {
                write!(f, "no free {width}x{height} space on the wall")
            }
            EngineError::Invalid(msg) => write!(f, "invalid ad: {msg}"),
            EngineError::Timeout => write!(f, "timed out waiting for the wall write lock"),
            EngineError::StoreUnavailable(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
