//! Rectangle-packing layout engine for nested content diagrams.
//!
//! Each container's children are packed into the smallest box of a fixed
//! width:height ratio the skyline heuristic can fill, and the tree is laid out
//! recursively into absolute coordinates. Parsing source files and drawing the
//! result are left to the caller; this crate only produces geometry.
//!
//! ```
//! use boxpack::{LayoutNode, LayoutOrchestrator, LayoutTree};
//!
//! let tree = LayoutTree::new(LayoutNode::container(
//!     "file",
//!     vec![
//!         LayoutNode::leaf("a").with_size(100.0, 50.0),
//!         LayoutNode::leaf("b").with_size(200.0, 30.0),
//!     ],
//! ))?;
//! let layout = LayoutOrchestrator::default().layout(&tree)?;
//! assert_eq!(layout.len(), 3);
//! # Ok::<(), boxpack::LayoutError>(())
//! ```

pub mod cache;
pub mod config;
pub mod emit;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod pack;
pub mod size;
pub mod tree;

pub use cache::SolveCache;
pub use config::{ContentExtent, LayoutConfig, LayoutSettings, PackingConfig, SizingConfig};
pub use emit::{EmittedBox, JsonLinesSink, LayoutSink};
pub use error::{LayoutError, Result};
pub use geometry::{Point, Rect, Size};
pub use layout::{Layout, LayoutOrchestrator};
pub use logging::{FileSink, LogEvent, LogLevel, LogSink, Logger, LoggingError, MemorySink};
pub use metrics::{MetricSnapshot, PackingMetrics};
pub use pack::{PackingResult, PackingSolver, Rectangle, SkylinePlacer, SolveStats, solve};
pub use size::{ChildPacker, SizeCalculator, SizeMap};
pub use tree::{LayoutNode, LayoutTree, NodeId};
