//! Error types shared by the packing engine and the layout orchestrator.

mod types;

pub use types::{LayoutError, Result};
