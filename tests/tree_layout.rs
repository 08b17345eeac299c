use std::collections::BTreeMap;

use boxpack::{
    ContentExtent, EmittedBox, Layout, LayoutConfig, LayoutNode, LayoutOrchestrator, LayoutTree,
    Logger, MemorySink, Rect,
};

const OUTLINE: &str = r#"{
  "filename": "sample.ts",
  "nodes": [
    { "type": "class", "name": "Parser", "kind": "class",
      "children": [
        { "type": "function", "name": "constructor" },
        { "type": "function", "name": "parse", "width": 220, "height": 40 },
        { "type": "property", "name": "tokens", "width": 120, "height": 30 }
      ] },
    { "type": "interface", "name": "Token",
      "children": [
        { "type": "property", "name": "kind", "width": 100, "height": 30 },
        { "type": "property", "name": "text", "width": 100, "height": 30 }
      ] },
    { "type": "function", "name": "main" },
    { "type": "variable", "name": "VERSION", "width": 90, "height": 30 }
  ]
}"#;

/// Nested containers three levels deep with varied leaf sizes.
fn generated_tree() -> LayoutTree {
    let mut modules = Vec::new();
    for m in 0..3 {
        let mut classes = Vec::new();
        for c in 0..(2 + m) {
            let members = (0..(1 + (c * 3 + m) % 5))
                .map(|i| {
                    LayoutNode::leaf(format!("m{m}.c{c}.f{i}"))
                        .with_size(60.0 + (i * 37 % 140) as f64, 20.0 + (i * 13 % 50) as f64)
                })
                .collect();
            classes.push(LayoutNode::container(format!("m{m}.c{c}"), members));
        }
        modules.push(LayoutNode::container(format!("m{m}"), classes));
    }
    LayoutTree::new(LayoutNode::container("workspace", modules)).unwrap()
}

fn assert_siblings_disjoint(tree: &LayoutTree, layout: &Layout) {
    tree.root()
        .walk(&mut |node, _| {
            let boxes: Vec<&Rect> = node
                .children
                .iter()
                .map(|child| layout.get(&child.id).unwrap())
                .collect();
            for (i, a) in boxes.iter().enumerate() {
                for b in &boxes[i + 1..] {
                    assert!(a.intersection_area(b) < 1e-6, "{} children overlap", node.id);
                }
            }
            Ok::<(), ()>(())
        })
        .unwrap();
}

#[test]
fn outline_document_lays_out_every_node() {
    let tree = LayoutTree::from_json(OUTLINE).unwrap();
    let layout = LayoutOrchestrator::default().layout(&tree).unwrap();

    assert_eq!(layout.len(), tree.node_count());
    assert_eq!(layout.len(), 10);
    assert_siblings_disjoint(&tree, &layout);

    let root = layout.get("root").unwrap();
    assert_eq!((root.x, root.y), (0.0, 0.0));

    // Default-sized leaf keeps 180x40.
    let constructor = layout.get("root.0.0").unwrap();
    assert_eq!((constructor.width, constructor.height), (180.0, 40.0));

    // Children start inside their parent's content area.
    let parser = layout.get("root.0").unwrap();
    for id in ["root.0.0", "root.0.1", "root.0.2"] {
        let member = layout.get(id).unwrap();
        assert!(member.x >= parser.x + 20.0);
        assert!(member.y >= parser.y + 40.0);
    }
}

#[test]
fn generated_tree_row_extent_keeps_siblings_apart() {
    let tree = generated_tree();
    let layout = LayoutOrchestrator::default().layout(&tree).unwrap();
    assert_eq!(layout.len(), tree.node_count());
    assert_siblings_disjoint(&tree, &layout);
}

#[test]
fn generated_tree_packed_extent_nests_every_box() {
    let tree = generated_tree();
    let config = LayoutConfig::default().with_extent(ContentExtent::Packed);
    let layout = LayoutOrchestrator::new(config).layout(&tree).unwrap();

    assert_siblings_disjoint(&tree, &layout);
    tree.root()
        .walk(&mut |node, _| {
            let parent = layout.get(&node.id).unwrap();
            for child in &node.children {
                let child_box = layout.get(&child.id).unwrap();
                assert!(
                    parent.contains(child_box, 1e-6),
                    "{} escapes {}",
                    child.id,
                    node.id
                );
            }
            Ok::<(), ()>(())
        })
        .unwrap();
}

#[test]
fn layout_is_deterministic_with_and_without_cache() {
    let tree = generated_tree();
    let cached = LayoutOrchestrator::default().layout(&tree).unwrap();

    let mut config = LayoutConfig::default();
    config.cache = false;
    let uncached = LayoutOrchestrator::new(config).layout(&tree).unwrap();

    assert_eq!(cached, uncached);
}

#[test]
fn json_settings_drive_the_layout() {
    let config = LayoutConfig::from_json(
        r#"{ "origin": { "x": 30, "y": 75 },
             "packing": { "aspect_ratio": 2.0 },
             "sizing": { "leaf_width": 100, "leaf_height": 20 } }"#,
    )
    .unwrap();
    let tree = LayoutTree::from_json(OUTLINE).unwrap();
    let layout = LayoutOrchestrator::new(config).layout(&tree).unwrap();

    assert_eq!((layout.bounds.x, layout.bounds.y), (30.0, 75.0));
    let main = layout.get("root.2").unwrap();
    assert_eq!((main.width, main.height), (100.0, 20.0));
}

#[test]
fn output_json_round_trips_to_id_map() {
    let tree = LayoutTree::from_json(OUTLINE).unwrap();
    let layout = LayoutOrchestrator::default().layout(&tree).unwrap();
    let parsed: BTreeMap<String, Rect> = serde_json::from_str(&layout.to_json().unwrap()).unwrap();
    assert_eq!(parsed, layout.rects);
}

#[test]
fn emitted_boxes_follow_tree_order() {
    let tree = LayoutTree::from_json(OUTLINE).unwrap();
    let layout = LayoutOrchestrator::default().layout(&tree).unwrap();
    let mut boxes: Vec<EmittedBox> = Vec::new();
    layout.emit(&tree, &mut boxes).unwrap();

    assert_eq!(boxes.len(), 10);
    assert_eq!(boxes[0].id, "root");
    assert_eq!(boxes[0].name, "sample.ts");
    assert_eq!(boxes[1].name, "Parser");
    assert_eq!(boxes[1].depth, 1);
    assert_eq!(boxes[2].depth, 2);
}

#[test]
fn logger_sees_solver_and_layout_events() {
    let sink = MemorySink::new();
    let config = LayoutConfig::default().with_logger(Logger::new(sink.clone()));
    let tree = LayoutTree::from_json(OUTLINE).unwrap();
    LayoutOrchestrator::new(config).layout(&tree).unwrap();

    let messages = sink.messages();
    assert_eq!(messages.last().map(String::as_str), Some("layout.solved"));
    // root, Parser and Token each pack one sibling group.
    assert_eq!(
        messages.iter().filter(|m| *m == "solve.converged").count(),
        3
    );
}
