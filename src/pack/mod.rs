//! Rectangle packing: a skyline placer driven by a binary search on the
//! bounding height at a fixed width:height ratio.
//!
//! ```
//! use boxpack::pack::{Rectangle, solve};
//!
//! let rects = [Rectangle::new(0, 100.0, 50.0), Rectangle::new(1, 200.0, 30.0)];
//! let result = solve(&rects, 1.5, 1e-5)?;
//! assert_eq!(result.placements.len(), 2);
//! # Ok::<(), boxpack::LayoutError>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

pub mod skyline;
pub mod solver;

pub use skyline::{Segment, Skyline, SkylinePlacer};
pub use solver::{PackingSolver, solve};

/// One sibling box as seen by the packer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub index: usize,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub const fn new(index: usize, width: f64, height: f64) -> Self {
        Self {
            index,
            width,
            height,
        }
    }

    pub fn from_size(index: usize, size: Size) -> Self {
        Self::new(index, size.width, size.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Search bookkeeping for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolveStats {
    /// Number of skyline placement attempts, including the final one.
    pub attempts: u32,
    /// Number of times the upper bound had to grow past the initial bracket.
    pub expansions: u32,
}

/// Bounding box and local positions for one sibling group.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PackingResult {
    pub bounding_width: f64,
    pub bounding_height: f64,
    pub area: f64,
    pub placements: BTreeMap<usize, Point>,
    #[serde(skip)]
    pub stats: SolveStats,
}

impl PackingResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn bounds(&self) -> Size {
        Size::new(self.bounding_width, self.bounding_height)
    }

    /// Placed box for `rect`, if the rectangle took part in this solve.
    pub fn rect_of(&self, rect: &Rectangle) -> Option<Rect> {
        self.placements
            .get(&rect.index)
            .map(|origin| Rect::from_parts(*origin, Size::new(rect.width, rect.height)))
    }
}
