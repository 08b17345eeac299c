use thiserror::Error;

/// Unified result type for the packing engine.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced by the packing engine and layout orchestrator.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout tree is empty")]
    EmptyLayout,
    #[error("invalid packing configuration: {0}")]
    InvalidConfig(String),
    #[error("rectangle {index} has invalid dimensions {width}x{height}")]
    InvalidRectangle { index: usize, width: f64, height: f64 },
    #[error("rectangle index {0} appears more than once")]
    DuplicateRectangle(usize),
    #[error(
        "no feasible packing below height {high} (initial lower bound {low}, limit {limit}x)"
    )]
    PackingDiverged { low: f64, high: f64, limit: f64 },
    #[error("node `{node}` has invalid dimensions {width}x{height}")]
    InvalidDimension {
        node: String,
        width: f64,
        height: f64,
    },
    #[error("node id `{0}` appears more than once")]
    DuplicateNode(String),
    #[error("node `{0}` not found")]
    NodeNotFound(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
