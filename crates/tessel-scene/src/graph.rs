//! Retained scene graph.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node is owned
//! by exactly one parent; child order is draw order. Drawing is a depth-first
//! walk that threads one [`RenderState`] through every node:
//!
//! - a shader node binds its program and publishes its bindings; nothing is
//!   undone when its subtree finishes
//! - a presentation node applies its material and restores the previous
//!   blend state after its subtree
//! - a geometry node draws, then recurses into its own children

use std::fmt::Write as _;

use slotmap::SlotMap;
use tessel_engine::render::GraphicsDevice;

use crate::error::SceneError;
use crate::nodes::{
    DraggableSegment, GeometryNode, NGonNode, PointAccumulator, PolylineAccumulator,
    PresentationNode, ShaderNode,
};
use crate::state::RenderState;

slotmap::new_key_type! {
    /// Handle to a node in a [`SceneGraph`].
    pub struct NodeId;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Root,
    Group,
    Shader,
    Presentation,
    Geometry,
}

#[derive(Debug)]
pub enum NodePayload {
    /// Plain container; draws nothing itself.
    Group,
    Shader(ShaderNode),
    Presentation(PresentationNode),
    Geometry(GeometryNode),
}

#[derive(Debug)]
pub struct SceneNode {
    name: Option<String>,
    payload: NodePayload,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn group() -> Self {
        Self::from_payload(NodePayload::Group)
    }

    fn from_payload(payload: NodePayload) -> Self {
        Self {
            name: None,
            payload,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Payload kind. Only [`SceneGraph::kind`] reports [`NodeKind::Root`].
    pub fn kind(&self) -> NodeKind {
        match self.payload {
            NodePayload::Group => NodeKind::Group,
            NodePayload::Shader(_) => NodeKind::Shader,
            NodePayload::Presentation(_) => NodeKind::Presentation,
            NodePayload::Geometry(_) => NodeKind::Geometry,
        }
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// GPU-owning payloads must have been created successfully.
    fn is_ready(&self) -> bool {
        match &self.payload {
            NodePayload::Group | NodePayload::Presentation(_) => true,
            NodePayload::Shader(s) => s.is_ready(),
            NodePayload::Geometry(g) => g.is_created(),
        }
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{:?}", self.kind()).to_lowercase(),
        }
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        match &mut self.payload {
            NodePayload::Shader(s) => s.destroy(device),
            NodePayload::Geometry(g) => g.destroy(device),
            NodePayload::Group | NodePayload::Presentation(_) => {}
        }
    }
}

impl From<ShaderNode> for SceneNode {
    fn from(node: ShaderNode) -> Self {
        Self::from_payload(NodePayload::Shader(node))
    }
}

impl From<PresentationNode> for SceneNode {
    fn from(node: PresentationNode) -> Self {
        Self::from_payload(NodePayload::Presentation(node))
    }
}

impl From<GeometryNode> for SceneNode {
    fn from(node: GeometryNode) -> Self {
        Self::from_payload(NodePayload::Geometry(node))
    }
}

macro_rules! geometry_into_scene_node {
    ($($ty:ty),*) => {$(
        impl From<$ty> for SceneNode {
            fn from(node: $ty) -> Self {
                GeometryNode::from(node).into()
            }
        }
    )*};
}

geometry_into_scene_node!(PointAccumulator, PolylineAccumulator, NGonNode, DraggableSegment);

/// Arena-backed tree rooted at a [`NodeKind::Root`] node.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::group().named("root"));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Kind of `id`, with the graph's own root reported as [`NodeKind::Root`].
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        let node = self.nodes.get(id)?;
        Some(if id == self.root { NodeKind::Root } else { node.kind() })
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Appends `node` as the last child of `parent`.
    ///
    /// Shader and geometry nodes are only accepted once their `create()` has
    /// succeeded.
    pub fn add_child(&mut self, parent: NodeId, node: impl Into<SceneNode>) -> Result<NodeId, SceneError> {
        let mut node = node.into();
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if !node.is_ready() {
            return Err(SceneError::NotCreated { node: node.label() });
        }

        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    pub fn shader_mut(&mut self, id: NodeId) -> Option<&mut ShaderNode> {
        match &mut self.nodes.get_mut(id)?.payload {
            NodePayload::Shader(s) => Some(s),
            _ => None,
        }
    }

    pub fn presentation_mut(&mut self, id: NodeId) -> Option<&mut PresentationNode> {
        match &mut self.nodes.get_mut(id)?.payload {
            NodePayload::Presentation(p) => Some(p),
            _ => None,
        }
    }

    pub fn geometry(&self, id: NodeId) -> Option<&GeometryNode> {
        match &self.nodes.get(id)?.payload {
            NodePayload::Geometry(g) => Some(g),
            _ => None,
        }
    }

    pub fn geometry_mut(&mut self, id: NodeId) -> Option<&mut GeometryNode> {
        match &mut self.nodes.get_mut(id)?.payload {
            NodePayload::Geometry(g) => Some(g),
            _ => None,
        }
    }

    pub fn ngon(&self, id: NodeId) -> Option<&NGonNode> {
        match self.geometry(id)? {
            GeometryNode::NGon(n) => Some(n),
            _ => None,
        }
    }

    pub fn point_accumulator(&self, id: NodeId) -> Option<&PointAccumulator> {
        match self.geometry(id)? {
            GeometryNode::Points(n) => Some(n),
            _ => None,
        }
    }

    pub fn point_accumulator_mut(&mut self, id: NodeId) -> Option<&mut PointAccumulator> {
        match self.geometry_mut(id)? {
            GeometryNode::Points(n) => Some(n),
            _ => None,
        }
    }

    pub fn polyline_mut(&mut self, id: NodeId) -> Option<&mut PolylineAccumulator> {
        match self.geometry_mut(id)? {
            GeometryNode::Polyline(n) => Some(n),
            _ => None,
        }
    }

    pub fn draggable_segment(&self, id: NodeId) -> Option<&DraggableSegment> {
        match self.geometry(id)? {
            GeometryNode::Segment(n) => Some(n),
            _ => None,
        }
    }

    pub fn draggable_segment_mut(&mut self, id: NodeId) -> Option<&mut DraggableSegment> {
        match self.geometry_mut(id)? {
            GeometryNode::Segment(n) => Some(n),
            _ => None,
        }
    }

    /// Draws the whole tree.
    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &mut RenderState) {
        self.draw_node(self.root, device, state);
    }

    fn draw_node(&self, id: NodeId, device: &mut dyn GraphicsDevice, state: &mut RenderState) {
        let Some(node) = self.nodes.get(id) else { return };

        match &node.payload {
            NodePayload::Group => self.draw_children(node, device, state),
            NodePayload::Shader(shader) => {
                if shader.draw(device, state) {
                    self.draw_children(node, device, state);
                }
            }
            NodePayload::Presentation(presentation) => {
                let saved = presentation.push(device, state);
                self.draw_children(node, device, state);
                presentation.pop(device, saved);
            }
            NodePayload::Geometry(geometry) => {
                geometry.draw(device, state);
                self.draw_children(node, device, state);
            }
        }
    }

    fn draw_children(&self, node: &SceneNode, device: &mut dyn GraphicsDevice, state: &mut RenderState) {
        for &child in &node.children {
            self.draw_node(child, device, state);
        }
    }

    /// Detaches `id` and destroys its subtree, releasing every GPU handle.
    /// Removing the root empties the graph but keeps the root itself.
    pub fn remove(&mut self, id: NodeId, device: &mut dyn GraphicsDevice) -> Result<(), SceneError> {
        let Some(node) = self.nodes.get(id) else {
            return Err(SceneError::UnknownNode(id));
        };

        if id == self.root {
            let children = node.children.clone();
            for child in children {
                self.destroy_subtree(child, device);
            }
            if let Some(root) = self.nodes.get_mut(id) {
                root.children.clear();
            }
            return Ok(());
        }

        let parent = node.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != id);
        }
        self.destroy_subtree(id, device);
        Ok(())
    }

    /// Releases every node's resources. The graph is left with only its root.
    pub fn destroy_all(&mut self, device: &mut dyn GraphicsDevice) {
        let root = self.root;
        let released = self.nodes.len() - 1;
        // The root always exists.
        let _ = self.remove(root, device);
        log::debug!("released {released} scene node(s)");
    }

    fn destroy_subtree(&mut self, id: NodeId, device: &mut dyn GraphicsDevice) {
        let Some(mut node) = self.nodes.remove(id) else { return };
        for child in std::mem::take(&mut node.children) {
            self.destroy_subtree(child, device);
        }
        node.destroy(device);
    }

    /// Indented `name (kind)` listing, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let (Some(node), Some(kind)) = (self.nodes.get(id), self.kind(id)) else { return };
        let _ = writeln!(out, "{:indent$}{} ({kind:?})", "", node.label(), indent = depth * 2);
        for &child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }

    /// Logs [`SceneGraph::dump`] at info level.
    pub fn print_graph(&self) {
        for line in self.dump().lines() {
            log::info!("{line}");
        }
    }
}
