//! Hand-off of solved geometry to document emitters.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::geometry::Rect;
use crate::tree::{LayoutNode, NodeId};

/// Receives every node with its absolute box, parents before children.
pub trait LayoutSink {
    fn emit(&mut self, node: &LayoutNode, rect: &Rect, depth: usize) -> Result<()>;
}

/// Flattened record of one emitted node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmittedBox {
    pub id: NodeId,
    pub name: String,
    pub kind: String,
    pub depth: usize,
    #[serde(flatten)]
    pub rect: Rect,
}

impl EmittedBox {
    fn new(node: &LayoutNode, rect: &Rect, depth: usize) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind.clone(),
            depth,
            rect: *rect,
        }
    }
}

impl LayoutSink for Vec<EmittedBox> {
    fn emit(&mut self, node: &LayoutNode, rect: &Rect, depth: usize) -> Result<()> {
        self.push(EmittedBox::new(node, rect, depth));
        Ok(())
    }
}

/// Writes one JSON object per node.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LayoutSink for JsonLinesSink<W> {
    fn emit(&mut self, node: &LayoutNode, rect: &Rect, depth: usize) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &EmittedBox::new(node, rect, depth))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}
