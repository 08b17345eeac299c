//! Skyline bottom-left placement at a fixed bounding box.

use std::collections::BTreeMap;

use crate::geometry::Point;

use super::Rectangle;

/// Heights and edges closer than this are treated as equal when merging.
pub const MERGE_EPSILON: f64 = 1e-6;

/// One horizontal run of the skyline: `[x_start, x_end)` at `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x_start: f64,
    pub x_end: f64,
    pub height: f64,
}

impl Segment {
    pub fn width(&self) -> f64 {
        self.x_end - self.x_start
    }
}

/// Upper frontier of the rectangles placed so far.
#[derive(Debug, Clone)]
pub struct Skyline {
    segments: Vec<Segment>,
}

impl Skyline {
    pub fn new(width: f64) -> Self {
        Self {
            segments: vec![Segment {
                x_start: 0.0,
                x_end: width,
                height: 0.0,
            }],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Lowest segment that fits `width` and stays under `limit` once raised by `height`.
    /// Ties resolve to the leftmost segment.
    fn find_slot(&self, width: f64, height: f64, limit: f64) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, segment) in self.segments.iter().enumerate() {
            if segment.width() < width || segment.height + height > limit {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => {
                    let current = &self.segments[current];
                    segment.height < current.height
                        || (segment.height == current.height && segment.x_start < current.x_start)
                }
            };
            if better {
                best = Some(idx);
            }
        }
        best
    }

    /// Raise the footprint `[x, x + width)` of segment `idx` by `height`.
    fn raise(&mut self, idx: usize, x: f64, width: f64, height: f64) {
        let segment = self.segments.remove(idx);
        let mut replacement = Vec::with_capacity(3);
        if segment.x_start < x {
            replacement.push(Segment {
                x_start: segment.x_start,
                x_end: x,
                height: segment.height,
            });
        }
        replacement.push(Segment {
            x_start: x,
            x_end: x + width,
            height: segment.height + height,
        });
        if x + width < segment.x_end {
            replacement.push(Segment {
                x_start: x + width,
                x_end: segment.x_end,
                height: segment.height,
            });
        }
        self.segments.splice(idx..idx, replacement);
        self.merge();
    }

    fn merge(&mut self) {
        self.segments
            .sort_by(|a, b| a.x_start.total_cmp(&b.x_start));
        let mut i = 0;
        while i + 1 < self.segments.len() {
            let (left, right) = (self.segments[i], self.segments[i + 1]);
            if (left.height - right.height).abs() < MERGE_EPSILON
                && (left.x_end - right.x_start).abs() < MERGE_EPSILON
            {
                self.segments[i].x_end = right.x_end;
                self.segments.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

/// Stateless entry point; each call works on a fresh [`Skyline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SkylinePlacer;

impl SkylinePlacer {
    pub fn new() -> Self {
        Self
    }

    /// Try to fit every rectangle inside `bounding_width x bounding_height`.
    ///
    /// Rectangles go tallest first (ties by index) onto the lowest, then leftmost,
    /// segment that can hold them. Returns `None` as soon as one rectangle has no
    /// slot, which tells the solver to try a taller box.
    pub fn place(
        &self,
        rectangles: &[Rectangle],
        bounding_height: f64,
        bounding_width: f64,
    ) -> Option<BTreeMap<usize, Point>> {
        let mut order: Vec<&Rectangle> = rectangles.iter().collect();
        order.sort_by(|a, b| {
            b.height
                .total_cmp(&a.height)
                .then_with(|| a.index.cmp(&b.index))
        });

        let mut skyline = Skyline::new(bounding_width);
        let mut placements = BTreeMap::new();

        for rect in order {
            let idx = skyline.find_slot(rect.width, rect.height, bounding_height)?;
            let Segment { x_start, height, .. } = skyline.segments[idx];
            placements.insert(rect.index, Point::new(x_start, height));
            skyline.raise(idx, x_start, rect.width, rect.height);
        }

        Some(placements)
    }
}
