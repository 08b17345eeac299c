//! Bottom-up content sizing.
//!
//! Leaves report their intrinsic size (or the configured defaults). Containers
//! add padding around their children's extent and never shrink below their
//! minimum size.

use std::collections::HashMap;

use crate::config::{ContentExtent, SizingConfig};
use crate::error::{LayoutError, Result};
use crate::geometry::Size;
use crate::pack::{PackingResult, Rectangle};
use crate::tree::{LayoutNode, NodeId};

/// Resolved size of every node in a tree, keyed by node id.
pub type SizeMap = HashMap<NodeId, Size>;

/// Packs one sibling group; the orchestrator supplies a cached, instrumented solver.
pub trait ChildPacker {
    fn pack(&mut self, rectangles: &[Rectangle]) -> Result<PackingResult>;
}

/// Rectangles for the children of a container, indexed by child position.
pub fn child_rectangles(node: &LayoutNode, sizes: &SizeMap) -> Result<Vec<Rectangle>> {
    node.children
        .iter()
        .enumerate()
        .map(|(idx, child)| {
            sizes
                .get(&child.id)
                .map(|size| Rectangle::from_size(idx, *size))
                .ok_or_else(|| LayoutError::NodeNotFound(child.id.clone()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct SizeCalculator {
    config: SizingConfig,
}

impl SizeCalculator {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Minimum box of `node` with children laid side by side.
    ///
    /// This is always the row formula. [`ContentExtent::Packed`] needs a
    /// packer and only applies through [`SizeCalculator::size_tree`].
    pub fn size(&self, node: &LayoutNode) -> Size {
        if node.is_leaf() {
            return self.leaf_size(node);
        }
        let row = self.row_extent(node.children.iter().map(|child| self.size(child)));
        self.enclose(node, row)
    }

    /// Sum of child widths plus spacing after each, by the tallest child.
    pub fn row_extent(&self, children: impl IntoIterator<Item = Size>) -> Size {
        children.into_iter().fold(Size::default(), |row, child| {
            Size::new(
                row.width + child.width + self.config.spacing,
                row.height.max(child.height),
            )
        })
    }

    pub fn leaf_size(&self, node: &LayoutNode) -> Size {
        Size::new(
            node.width.unwrap_or(self.config.leaf_width),
            node.height.unwrap_or(self.config.leaf_height),
        )
    }

    /// Pad `content` and clamp it to the node's minimum size.
    pub fn enclose(&self, node: &LayoutNode, content: Size) -> Size {
        let min_width = node.min_width.unwrap_or(self.config.min_width);
        let min_height = node.min_height.unwrap_or(self.config.min_height);
        Size::new(
            min_width.max(content.width + self.config.padding_x),
            min_height.max(content.height + self.config.padding_y),
        )
    }

    /// Size every node under `root` according to the configured extent.
    pub fn size_tree(&self, root: &LayoutNode, packer: &mut impl ChildPacker) -> Result<SizeMap> {
        let mut sizes = SizeMap::with_capacity(root.count());
        self.size_into(root, packer, &mut sizes)?;
        Ok(sizes)
    }

    fn size_into(
        &self,
        node: &LayoutNode,
        packer: &mut impl ChildPacker,
        sizes: &mut SizeMap,
    ) -> Result<Size> {
        if node.is_leaf() {
            let size = self.leaf_size(node);
            sizes.insert(node.id.clone(), size);
            return Ok(size);
        }

        let mut child_sizes = Vec::with_capacity(node.children.len());
        for child in &node.children {
            child_sizes.push(self.size_into(child, packer, sizes)?);
        }

        let content = match self.config.extent {
            ContentExtent::Row => self.row_extent(child_sizes),
            ContentExtent::Packed => packer.pack(&child_rectangles(node, sizes)?)?.bounds(),
        };
        let size = self.enclose(node, content);
        sizes.insert(node.id.clone(), size);
        Ok(size)
    }
}
