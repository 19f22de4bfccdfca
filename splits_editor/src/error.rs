use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignError {
    #[error("sector {sector} is already assigned to {owner}")]
    AlreadyAssigned { sector: String, owner: String },
    #[error("no position at index {0}")]
    NoSuchPosition(usize),
    #[error("no draft is being edited")]
    NoDraft,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("unknown layer {0}")]
    UnknownLayer(String),
    #[error("unknown source {0}")]
    UnknownSource(String),
    #[error("failed to encode geojson: {0}")]
    Encode(String),
}
