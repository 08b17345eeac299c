use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::error::{LayoutError, Result};
use crate::geometry::Point;
use crate::logging::Logger;
use crate::metrics::PackingMetrics;

/// Knobs for a single packing solve.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    /// Target width:height ratio of every bounding box.
    pub aspect_ratio: f64,
    /// Bisection stops once the height bracket is narrower than this.
    pub tolerance: f64,
    /// Upper-bound growth is abandoned past `expansion_limit` times the initial lower bound.
    pub expansion_limit: f64,
    /// Extra space reserved to the right of and below every rectangle.
    pub gutter: f64,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.5,
            tolerance: 1e-5,
            expansion_limit: 100.0,
            gutter: 0.0,
        }
    }
}

impl PackingConfig {
    pub fn with_ratio(aspect_ratio: f64) -> Self {
        Self {
            aspect_ratio,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "aspect ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.expansion_limit.is_finite() && self.expansion_limit > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "expansion limit must be positive, got {}",
                self.expansion_limit
            )));
        }
        if !(self.gutter.is_finite() && self.gutter >= 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "gutter must be zero or positive, got {}",
                self.gutter
            )));
        }
        Ok(())
    }
}

/// How an internal node derives its content box from its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentExtent {
    /// Children side by side: summed widths plus spacing, tallest height.
    #[default]
    Row,
    /// The packed bounding box of the children, so parents always enclose them.
    Packed,
}

/// Default box sizes, spacing and padding applied by the size calculator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub leaf_width: f64,
    pub leaf_height: f64,
    pub min_width: f64,
    pub min_height: f64,
    /// Horizontal space added after each child in row extent.
    pub spacing: f64,
    /// Total horizontal padding around the content.
    pub padding_x: f64,
    /// Total vertical padding around the content, header included.
    pub padding_y: f64,
    /// Offset of the content area from the node's left edge.
    pub inset_x: f64,
    /// Offset of the content area from the node's top edge (header height).
    pub inset_y: f64,
    pub extent: ContentExtent,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            leaf_width: 180.0,
            leaf_height: 40.0,
            min_width: 200.0,
            min_height: 100.0,
            spacing: 20.0,
            padding_x: 40.0,
            padding_y: 60.0,
            inset_x: 20.0,
            inset_y: 40.0,
            extent: ContentExtent::Row,
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("leaf_width", self.leaf_width, false),
            ("leaf_height", self.leaf_height, false),
            ("min_width", self.min_width, true),
            ("min_height", self.min_height, true),
            ("spacing", self.spacing, true),
            ("padding_x", self.padding_x, true),
            ("padding_y", self.padding_y, true),
            ("inset_x", self.inset_x, true),
            ("inset_y", self.inset_y, true),
        ];
        for (name, value, zero_ok) in checks {
            let ok = value.is_finite() && (value > 0.0 || (zero_ok && value == 0.0));
            if !ok {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} is out of range: {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Serializable part of [`LayoutConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub packing: PackingConfig,
    pub sizing: SizingConfig,
    pub origin: Point,
    pub cache: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            packing: PackingConfig::default(),
            sizing: SizingConfig::default(),
            origin: Point::default(),
            cache: true,
        }
    }
}

/// Configuration for a whole-tree layout.
#[derive(Clone)]
pub struct LayoutConfig {
    pub packing: PackingConfig,
    pub sizing: SizingConfig,
    /// Absolute position of the root node.
    pub origin: Point,
    /// Reuse solutions for sibling groups with identical dimensions.
    pub cache: bool,
    /// Optional structured logger used by the solver and orchestrator.
    pub logger: Option<Logger>,
    /// Metrics accumulator shared across layouts.
    pub metrics: Option<Arc<Mutex<PackingMetrics>>>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::from_settings(LayoutSettings::default())
    }
}

impl LayoutConfig {
    pub fn from_settings(settings: LayoutSettings) -> Self {
        Self {
            packing: settings.packing,
            sizing: settings.sizing,
            origin: settings.origin,
            cache: settings.cache,
            logger: None,
            metrics: None,
        }
    }

    /// Parse settings from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: LayoutSettings = serde_json::from_str(json)?;
        let config = Self::from_settings(settings);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.packing.validate()?;
        self.sizing.validate()
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_extent(mut self, extent: ContentExtent) -> Self {
        self.sizing.extent = extent;
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(PackingMetrics::new())));
        }
    }

    /// Disable metrics collection.
    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<PackingMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

impl std::fmt::Debug for LayoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutConfig")
            .field("packing", &self.packing)
            .field("sizing", &self.sizing)
            .field("origin", &self.origin)
            .field("cache", &self.cache)
            .field("logger", &self.logger.is_some())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
