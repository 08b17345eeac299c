use std::collections::{BTreeMap, HashSet};

use serde_json::json;

use crate::config::PackingConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::Point;
use crate::logging::{LogLevel, Logger, SOLVER_TARGET, event_with_fields, json_kv};

use super::{PackingResult, Rectangle, SkylinePlacer, SolveStats};

/// Growth factor applied to the upper bound when the initial bracket has no solution.
const EXPANSION_FACTOR: f64 = 1.5;

/// Pack `rectangles` at `ratio` with default settings otherwise.
pub fn solve(rectangles: &[Rectangle], ratio: f64, tolerance: f64) -> Result<PackingResult> {
    PackingSolver::new(PackingConfig {
        aspect_ratio: ratio,
        tolerance,
        ..PackingConfig::default()
    })
    .solve(rectangles)
}

/// Finds the smallest bounding height (at a fixed aspect ratio) for which the
/// skyline placer fits every rectangle.
#[derive(Debug, Clone)]
pub struct PackingSolver {
    config: PackingConfig,
    placer: SkylinePlacer,
    logger: Option<Logger>,
}

impl PackingSolver {
    pub fn new(config: PackingConfig) -> Self {
        Self {
            config,
            placer: SkylinePlacer::new(),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Option<Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    pub fn solve(&self, rectangles: &[Rectangle]) -> Result<PackingResult> {
        self.config.validate()?;
        validate_rectangles(rectangles)?;

        if rectangles.is_empty() {
            return Ok(PackingResult::empty());
        }

        let ratio = self.config.aspect_ratio;
        let tolerance = self.config.tolerance;
        let gutter = self.config.gutter;
        let inflated: Vec<Rectangle> = rectangles
            .iter()
            .map(|r| Rectangle::new(r.index, r.width + gutter, r.height + gutter))
            .collect();

        let total_area: f64 = inflated.iter().map(Rectangle::area).sum();
        let max_height = inflated.iter().map(|r| r.height).fold(0.0, f64::max);
        let initial_low = max_height.max((total_area / ratio).sqrt());
        if !initial_low.is_finite() {
            return Err(LayoutError::InvalidConfig(format!(
                "search bounds overflow for total area {total_area}"
            )));
        }

        let mut search = Search {
            placer: &self.placer,
            rectangles: &inflated,
            ratio,
            tolerance,
            stats: SolveStats::default(),
        };

        let height = match search.bisect(initial_low, 2.0 * initial_low) {
            Some(height) => height,
            None => self.expand(&mut search, initial_low)?,
        };

        let placements = search
            .attempt(height)
            .ok_or(LayoutError::PackingDiverged {
                low: initial_low,
                high: height,
                limit: self.config.expansion_limit,
            })?;

        let width = ratio * height;
        let result = PackingResult {
            bounding_width: width,
            bounding_height: height,
            area: width * height,
            placements,
            stats: search.stats,
        };

        self.emit(
            LogLevel::Debug,
            "solve.converged",
            [
                json_kv("rects", json!(rectangles.len())),
                json_kv("bounding_width", json!(result.bounding_width)),
                json_kv("bounding_height", json!(result.bounding_height)),
                json_kv("attempts", json!(result.stats.attempts)),
                json_kv("expansions", json!(result.stats.expansions)),
            ],
        );
        Ok(result)
    }

    /// Grow the upper bound until a placement succeeds, then bisect the last
    /// step so the height still converges.
    fn expand(&self, search: &mut Search<'_>, initial_low: f64) -> Result<f64> {
        let cap = self.config.expansion_limit * initial_low;
        let mut low = 2.0 * initial_low;
        let mut high = low;

        loop {
            if search.attempt(high).is_some() {
                break;
            }
            low = high;
            high *= EXPANSION_FACTOR;
            search.stats.expansions += 1;
            if high > cap {
                self.emit(
                    LogLevel::Warn,
                    "solve.diverged",
                    [
                        json_kv("initial_low", json!(initial_low)),
                        json_kv("high", json!(high)),
                        json_kv("limit", json!(self.config.expansion_limit)),
                    ],
                );
                return Err(LayoutError::PackingDiverged {
                    low: initial_low,
                    high,
                    limit: self.config.expansion_limit,
                });
            }
        }

        if search.stats.expansions > 0 {
            self.emit(
                LogLevel::Info,
                "solve.expanded",
                [
                    json_kv("initial_low", json!(initial_low)),
                    json_kv("high", json!(high)),
                    json_kv("expansions", json!(search.stats.expansions)),
                ],
            );
        }

        Ok(search.bisect(low, high).unwrap_or(high))
    }

    fn emit(
        &self,
        level: LogLevel,
        message: &str,
        fields: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) {
        if let Some(logger) = self.logger.as_ref() {
            if logger.enabled(level) {
                let _ = logger.log_event(event_with_fields(level, SOLVER_TARGET, message, fields));
            }
        }
    }
}

struct Search<'a> {
    placer: &'a SkylinePlacer,
    rectangles: &'a [Rectangle],
    ratio: f64,
    tolerance: f64,
    stats: SolveStats,
}

impl Search<'_> {
    fn attempt(&mut self, height: f64) -> Option<BTreeMap<usize, Point>> {
        self.stats.attempts += 1;
        self.placer
            .place(self.rectangles, height, self.ratio * height)
    }

    /// Narrow `[low, high]` to the tolerance, returning the lowest feasible height seen.
    ///
    /// Stops early once the midpoint can no longer be represented strictly
    /// between the bounds, so tolerances below the float spacing terminate.
    fn bisect(&mut self, mut low: f64, mut high: f64) -> Option<f64> {
        let mut best = None;
        while high - low >= self.tolerance {
            let mid = low + (high - low) / 2.0;
            if mid <= low || mid >= high {
                break;
            }
            if self.attempt(mid).is_some() {
                best = Some(mid);
                high = mid;
            } else {
                low = mid;
            }
        }
        best
    }
}

fn validate_rectangles(rectangles: &[Rectangle]) -> Result<()> {
    let mut seen = HashSet::with_capacity(rectangles.len());
    for rect in rectangles {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(rect.width) || !valid(rect.height) {
            return Err(LayoutError::InvalidRectangle {
                index: rect.index,
                width: rect.width,
                height: rect.height,
            });
        }
        if !seen.insert(rect.index) {
            return Err(LayoutError::DuplicateRectangle(rect.index));
        }
    }
    Ok(())
}
