use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::json;

use crate::cache::{SolveCache, fingerprint};
use crate::config::LayoutConfig;
use crate::emit::LayoutSink;
use crate::error::{LayoutError, Result};
use crate::geometry::{Point, Rect};
use crate::logging::{LAYOUT_TARGET, LogLevel, event_with_fields, json_kv};
use crate::metrics::PackingMetrics;
use crate::pack::{PackingResult, PackingSolver, Rectangle};
use crate::size::{ChildPacker, SizeCalculator, SizeMap, child_rectangles};
use crate::tree::{LayoutNode, LayoutTree, NodeId};

/// Absolute geometry for every node of a tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    /// Box of the root node.
    #[serde(skip)]
    pub bounds: Rect,
    #[serde(flatten)]
    pub rects: BTreeMap<NodeId, Rect>,
}

impl Layout {
    pub fn get(&self, id: &str) -> Option<&Rect> {
        self.rects.get(id)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Rect)> {
        self.rects.iter()
    }

    /// `{ nodeId: { x, y, width, height } }` for every node.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Hand every node to `sink` in depth-first pre-order.
    pub fn emit(&self, tree: &LayoutTree, sink: &mut impl LayoutSink) -> Result<()> {
        tree.root().walk(&mut |node, depth| {
            let rect = self
                .rects
                .get(&node.id)
                .ok_or_else(|| LayoutError::NodeNotFound(node.id.clone()))?;
            sink.emit(node, rect, depth)
        })
    }
}

/// Solves sibling groups for one layout, memoizing identical groups.
struct GroupSolver {
    solver: PackingSolver,
    cache: Option<SolveCache>,
    metrics: Option<Arc<Mutex<PackingMetrics>>>,
}

impl GroupSolver {
    fn record(&self, record: impl FnOnce(&mut PackingMetrics)) {
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }
}

impl ChildPacker for GroupSolver {
    fn pack(&mut self, rectangles: &[Rectangle]) -> Result<PackingResult> {
        let key = fingerprint(self.solver.config(), rectangles);
        if let Some(hit) = self.cache.as_mut().and_then(|cache| cache.get(&key)).cloned() {
            self.record(PackingMetrics::record_cache_hit);
            return Ok(hit);
        }

        let result = self.solver.solve(rectangles)?;
        let stats = result.stats;
        self.record(|metrics| metrics.record_solve(stats.attempts, stats.expansions));
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(key, result.clone());
        }
        Ok(result)
    }
}

/// Two-pass tree layout: sizes bottom-up, then packs each sibling group and
/// anchors it inside its parent's content area, top-down.
#[derive(Debug, Clone, Default)]
pub struct LayoutOrchestrator {
    config: LayoutConfig,
}

impl LayoutOrchestrator {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut LayoutConfig {
        &mut self.config
    }

    pub fn layout(&self, tree: &LayoutTree) -> Result<Layout> {
        self.config.validate()?;

        let mut group = GroupSolver {
            solver: PackingSolver::new(self.config.packing)
                .with_logger(self.config.logger.clone()),
            cache: self.config.cache.then(SolveCache::new),
            metrics: self.config.metrics_handle(),
        };

        let calculator = SizeCalculator::new(self.config.sizing);
        let sizes = calculator.size_tree(tree.root(), &mut group)?;

        let root = tree.root();
        let root_size = sizes
            .get(&root.id)
            .copied()
            .ok_or_else(|| LayoutError::NodeNotFound(root.id.clone()))?;
        let bounds = Rect::from_parts(self.config.origin, root_size);

        let mut rects = BTreeMap::new();
        self.solve_node(root, bounds, &sizes, &mut group, &mut rects)?;

        group.record(|metrics| metrics.record_nodes(rects.len()));
        self.log_solved(&bounds, rects.len(), group.cache.as_ref());
        self.log_metrics(group.metrics.as_ref());

        Ok(Layout { bounds, rects })
    }

    fn solve_node(
        &self,
        node: &LayoutNode,
        rect: Rect,
        sizes: &SizeMap,
        group: &mut GroupSolver,
        accum: &mut BTreeMap<NodeId, Rect>,
    ) -> Result<()> {
        accum.insert(node.id.clone(), rect);

        if node.is_leaf() {
            return Ok(());
        }

        let rectangles = child_rectangles(node, sizes)?;
        let packed = group.pack(&rectangles)?;
        let content = Point::new(
            rect.x + self.config.sizing.inset_x,
            rect.y + self.config.sizing.inset_y,
        );

        for (rectangle, child) in rectangles.iter().zip(&node.children) {
            let local = packed
                .rect_of(rectangle)
                .ok_or_else(|| LayoutError::NodeNotFound(child.id.clone()))?;
            let child_rect = local.translate(content.x, content.y);
            self.solve_node(child, child_rect, sizes, group, accum)?;
        }

        Ok(())
    }

    fn log_solved(&self, bounds: &Rect, nodes: usize, cache: Option<&SolveCache>) {
        let Some(logger) = self.config.logger.as_ref() else {
            return;
        };
        let event = event_with_fields(
            LogLevel::Info,
            LAYOUT_TARGET,
            "layout.solved",
            [
                json_kv("nodes", json!(nodes)),
                json_kv("width", json!(bounds.width)),
                json_kv("height", json!(bounds.height)),
                json_kv("cache_hits", json!(cache.map_or(0, SolveCache::hits))),
                json_kv("cache_entries", json!(cache.map_or(0, SolveCache::len))),
            ],
        );
        let _ = logger.log_event(event);
    }

    /// Cumulative counters, logged after each layout when both logging and metrics are on.
    fn log_metrics(&self, metrics: Option<&Arc<Mutex<PackingMetrics>>>) {
        let (Some(logger), Some(metrics)) = (self.config.logger.as_ref(), metrics) else {
            return;
        };
        let snapshot = match metrics.lock() {
            Ok(guard) => guard.snapshot(),
            Err(_) => return,
        };
        let _ = logger.log_event(snapshot.to_log_event(LAYOUT_TARGET));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentExtent;
    use crate::logging::{Logger, MemorySink};

    fn sample_tree() -> LayoutTree {
        LayoutTree::new(LayoutNode::container(
            "root",
            vec![
                LayoutNode::container(
                    "class",
                    vec![
                        LayoutNode::leaf("ctor").with_size(120.0, 30.0),
                        LayoutNode::leaf("render").with_size(120.0, 30.0),
                    ],
                ),
                LayoutNode::leaf("main").with_size(180.0, 40.0),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn root_sits_at_origin_with_calculated_size() {
        let mut config = LayoutConfig::default();
        config.origin = Point::new(30.0, 75.0);
        let layout = LayoutOrchestrator::new(config).layout(&sample_tree()).unwrap();

        // class: (140 * 2) + 40 = 320 wide, max(100, 90) = 100 tall.
        // root: (340 + 200) + 40 = 580 wide, 100 + 60 = 160 tall.
        assert_eq!(layout.bounds, Rect::new(30.0, 75.0, 580.0, 160.0));
        assert_eq!(layout.get("root"), Some(&layout.bounds));
        assert_eq!(layout.len(), 5);
    }

    #[test]
    fn children_are_offset_by_header_inset() {
        let layout = LayoutOrchestrator::default().layout(&sample_tree()).unwrap();

        // The tallest child of root (class, 100 tall) is packed first at the local origin.
        let class = layout.get("class").unwrap();
        assert_eq!((class.x, class.y), (20.0, 40.0));
        assert_eq!((class.width, class.height), (320.0, 100.0));

        let ctor = layout.get("ctor").unwrap();
        assert_eq!((ctor.x, ctor.y), (class.x + 20.0, class.y + 40.0));
    }

    #[test]
    fn siblings_never_overlap() {
        let layout = LayoutOrchestrator::default().layout(&sample_tree()).unwrap();
        let class = layout.get("class").unwrap();
        let main = layout.get("main").unwrap();
        assert_eq!(class.intersection_area(main), 0.0);

        let ctor = layout.get("ctor").unwrap();
        let render = layout.get("render").unwrap();
        assert_eq!(ctor.intersection_area(render), 0.0);
    }

    #[test]
    fn packed_extent_keeps_children_inside_parents() {
        let config = LayoutConfig::default().with_extent(ContentExtent::Packed);
        let tree = sample_tree();
        let layout = LayoutOrchestrator::new(config).layout(&tree).unwrap();

        tree.root()
            .walk(&mut |node, _| {
                let parent = layout.get(&node.id).unwrap();
                for child in &node.children {
                    assert!(parent.contains(layout.get(&child.id).unwrap(), 1e-9));
                }
                Ok::<(), ()>(())
            })
            .unwrap();
    }

    #[test]
    fn identical_groups_hit_the_cache() {
        let leaves = |prefix: &str| {
            vec![
                LayoutNode::leaf(format!("{prefix}.a")).with_size(100.0, 30.0),
                LayoutNode::leaf(format!("{prefix}.b")).with_size(60.0, 30.0),
            ]
        };
        let tree = LayoutTree::new(LayoutNode::container(
            "root",
            vec![
                LayoutNode::container("left", leaves("left")),
                LayoutNode::container("right", leaves("right")),
            ],
        ))
        .unwrap();

        let mut config = LayoutConfig::default();
        config.enable_metrics();
        let metrics = config.metrics_handle().unwrap();
        LayoutOrchestrator::new(config).layout(&tree).unwrap();

        let snapshot = metrics.lock().unwrap().snapshot();
        assert_eq!(snapshot.solves, 2);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.nodes_laid_out, 7);
    }

    #[test]
    fn disabling_cache_solves_every_group() {
        let mut config = LayoutConfig::default();
        config.cache = false;
        config.enable_metrics();
        let metrics = config.metrics_handle().unwrap();
        let tree = sample_tree();
        let orchestrator = LayoutOrchestrator::new(config);
        let first = orchestrator.layout(&tree).unwrap();
        let second = orchestrator.layout(&tree).unwrap();

        assert_eq!(first, second);
        assert_eq!(metrics.lock().unwrap().snapshot().cache_hits, 0);
    }

    #[test]
    fn logs_layout_summary() {
        let sink = MemorySink::new();
        let config = LayoutConfig::default().with_logger(Logger::new(sink.clone()));
        LayoutOrchestrator::new(config).layout(&sample_tree()).unwrap();

        let events = sink.events();
        let summary = events.last().unwrap();
        assert_eq!(summary.target, LAYOUT_TARGET);
        assert_eq!(summary.message, "layout.solved");
        assert_eq!(summary.fields["nodes"], 5);
        assert!(events.iter().any(|event| event.message == "solve.converged"));
    }

    #[test]
    fn metrics_snapshot_is_logged_after_summary() {
        let sink = MemorySink::new();
        let mut config = LayoutConfig::default().with_logger(Logger::new(sink.clone()));
        config.enable_metrics();
        let orchestrator = LayoutOrchestrator::new(config);
        orchestrator.layout(&sample_tree()).unwrap();
        orchestrator.layout(&sample_tree()).unwrap();

        let events = sink.events();
        let snapshot = events.last().unwrap();
        assert_eq!(snapshot.target, LAYOUT_TARGET);
        assert_eq!(snapshot.message, "packing_metrics");
        assert_eq!(snapshot.fields["solves"], 4);
        assert_eq!(snapshot.fields["nodes_laid_out"], 10);
        assert_eq!(events[events.len() - 2].message, "layout.solved");
    }

    #[test]
    fn metrics_without_logger_stay_silent() {
        let mut config = LayoutConfig::default();
        config.enable_metrics();
        let metrics = config.metrics_handle().unwrap();
        LayoutOrchestrator::new(config).layout(&sample_tree()).unwrap();
        assert_eq!(metrics.lock().unwrap().snapshot().solves, 2);
    }

    #[test]
    fn json_output_maps_ids_to_boxes() {
        let layout = LayoutOrchestrator::default().layout(&sample_tree()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&layout.to_json().unwrap()).unwrap();
        assert_eq!(value["root"]["width"], 580.0);
        assert_eq!(value["class"]["x"], 20.0);
        assert!(value.get("bounds").is_none());
    }
}
