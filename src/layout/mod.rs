//! Tree layout orchestration.
//!
//! Callers hand a validated [`LayoutTree`](crate::tree::LayoutTree) to the
//! orchestrator and receive absolute boxes keyed by node id.

mod core;

pub use core::{Layout, LayoutOrchestrator};
