use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Unique identifier for tree nodes.
pub type NodeId = String;

/// Content node: a leaf with an intrinsic size or a container of children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutNode {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    /// Intrinsic width, honoured for leaves only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Intrinsic height, honoured for leaves only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    pub fn leaf(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn container(id: impl Into<NodeId>, children: Vec<LayoutNode>) -> Self {
        Self {
            id: id.into(),
            children,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_min_size(mut self, width: f64, height: f64) -> Self {
        self.min_width = Some(width);
        self.min_height = Some(height);
        self
    }

    pub fn with_child(mut self, child: LayoutNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(LayoutNode::count).sum::<usize>()
    }

    /// Depth-first pre-order walk; `visit` receives each node and its depth.
    pub fn walk<E>(
        &self,
        visit: &mut impl FnMut(&LayoutNode, usize) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        self.walk_at(0, visit)
    }

    fn walk_at<E>(
        &self,
        depth: usize,
        visit: &mut impl FnMut(&LayoutNode, usize) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        visit(self, depth)?;
        for child in &self.children {
            child.walk_at(depth + 1, visit)?;
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&LayoutNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Outline document produced by the source parser: top-level nodes of one file.
#[derive(Debug, Deserialize)]
struct Outline {
    #[serde(default)]
    filename: Option<String>,
    nodes: Vec<LayoutNode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TreeDocument {
    Outline(Outline),
    Node(LayoutNode),
}

/// Validated content tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTree {
    root: LayoutNode,
}

impl LayoutTree {
    /// Validate `root`, filling empty ids with dotted paths below the nearest
    /// ancestor id (`"0"`, `"0.2"`, `"parser.1"`, ...).
    pub fn new(mut root: LayoutNode) -> Result<Self> {
        assign_ids(&mut root, "0".to_string());
        let mut seen = HashSet::new();
        root.walk(&mut |node, _| validate_node(node, &mut seen))?;
        Ok(Self { root })
    }

    /// Parse either a single node object or an outline `{ "filename", "nodes" }`.
    ///
    /// Outline nodes are wrapped in a synthetic `root` container named after the file.
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<TreeDocument>(json)? {
            TreeDocument::Node(node) => Self::new(node),
            TreeDocument::Outline(outline) => {
                if outline.nodes.is_empty() {
                    return Err(LayoutError::EmptyLayout);
                }
                let root = LayoutNode::container("root", outline.nodes)
                    .with_name(outline.filename.unwrap_or_default())
                    .with_kind("file");
                Self::new(root)
            }
        }
    }

    pub fn root(&self) -> &LayoutNode {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<&LayoutNode> {
        self.root.find(id)
    }

    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    pub fn into_root(self) -> LayoutNode {
        self.root
    }
}

fn assign_ids(node: &mut LayoutNode, path: String) {
    if node.id.is_empty() {
        node.id = path;
    }
    for (idx, child) in node.children.iter_mut().enumerate() {
        assign_ids(child, format!("{}.{idx}", node.id));
    }
}

fn validate_node(node: &LayoutNode, seen: &mut HashSet<NodeId>) -> Result<()> {
    if !seen.insert(node.id.clone()) {
        return Err(LayoutError::DuplicateNode(node.id.clone()));
    }

    let intrinsic_ok = |v: Option<f64>| v.is_none_or(|v| v.is_finite() && v > 0.0);
    let minimum_ok = |v: Option<f64>| v.is_none_or(|v| v.is_finite() && v >= 0.0);
    if !intrinsic_ok(node.width)
        || !intrinsic_ok(node.height)
        || !minimum_ok(node.min_width)
        || !minimum_ok(node.min_height)
    {
        return Err(LayoutError::InvalidDimension {
            node: node.id.clone(),
            width: node.width.or(node.min_width).unwrap_or(f64::NAN),
            height: node.height.or(node.min_height).unwrap_or(f64::NAN),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_nodes_get_path_ids() {
        let root = LayoutNode::default()
            .with_child(LayoutNode::default())
            .with_child(LayoutNode::leaf("named").with_child(LayoutNode::default()));
        let tree = LayoutTree::new(root).unwrap();

        assert_eq!(tree.root().id, "0");
        assert_eq!(tree.root().children[0].id, "0.0");
        assert_eq!(tree.root().children[1].id, "named");
        assert_eq!(tree.root().children[1].children[0].id, "named.0");
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let root = LayoutNode::container(
            "root",
            vec![LayoutNode::leaf("a"), LayoutNode::leaf("a")],
        );
        assert!(matches!(
            LayoutTree::new(root),
            Err(LayoutError::DuplicateNode(id)) if id == "a"
        ));
    }

    #[test]
    fn non_positive_intrinsic_size_is_rejected() {
        let root = LayoutNode::container(
            "root",
            vec![LayoutNode::leaf("bad").with_size(0.0, 10.0)],
        );
        assert!(matches!(
            LayoutTree::new(root),
            Err(LayoutError::InvalidDimension { node, .. }) if node == "bad"
        ));
    }

    #[test]
    fn parses_single_node_json() {
        let tree = LayoutTree::from_json(
            r#"{ "id": "cls", "name": "MyClass", "kind": "class",
                 "children": [ { "name": "render", "width": 120, "height": 30 } ] }"#,
        )
        .unwrap();
        assert_eq!(tree.root().name, "MyClass");
        assert_eq!(tree.root().children[0].id, "cls.0");
        assert_eq!(tree.root().children[0].width, Some(120.0));
    }

    #[test]
    fn parses_outline_document_into_synthetic_root() {
        let tree = LayoutTree::from_json(
            r#"{ "filename": "sample.ts",
                 "nodes": [
                   { "type": "class", "name": "MyClass",
                     "children": [ { "type": "function", "name": "constructor" } ] },
                   { "type": "function", "name": "main" }
                 ] }"#,
        )
        .unwrap();
        let root = tree.root();
        assert_eq!(root.id, "root");
        assert_eq!(root.name, "sample.ts");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].id, "root.0.0");
        assert!(tree.get("root.1").is_some());
    }

    #[test]
    fn empty_outline_is_rejected() {
        assert!(matches!(
            LayoutTree::from_json(r#"{ "filename": "empty.ts", "nodes": [] }"#),
            Err(LayoutError::EmptyLayout)
        ));
    }

    #[test]
    fn walk_visits_pre_order_with_depth() {
        let root = LayoutNode::container(
            "a",
            vec![
                LayoutNode::container("b", vec![LayoutNode::leaf("c")]),
                LayoutNode::leaf("d"),
            ],
        );
        let mut seen = Vec::new();
        root.walk(&mut |node, depth| {
            seen.push((node.id.clone(), depth));
            Ok::<(), ()>(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2),
                ("d".to_string(), 1)
            ]
        );
    }
}
