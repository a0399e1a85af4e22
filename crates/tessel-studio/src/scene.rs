//! The demo scene and everything the input handlers do to it.

use tessel_engine::coords::ColorRgba;
use tessel_engine::render::GraphicsDevice;
use tessel_scene::geometry::Point2;
use tessel_scene::nodes::{
    DraggableSegment, NGonNode, PointAccumulator, PolylineAccumulator, PresentationNode,
    ShaderKind, ShaderNode,
};
use tessel_scene::{
    IntersectionTracker, NodeId, RenderState, SceneError, SceneGraph, SceneNode, WorldWindow,
};

/// Handles to the nodes input handlers mutate.
#[derive(Debug, Copy, Clone)]
pub struct SceneNodes {
    pub point_shader: NodeId,
    pub points: NodeId,
    pub polyline: NodeId,
    pub segment: NodeId,
    pub polygons: [NodeId; 3],
}

/// Scene graph plus per-frame state, independent of any particular device.
#[derive(Debug)]
pub struct StudioScene {
    graph: SceneGraph,
    state: RenderState,
    world: WorldWindow,
    world_extent: f32,
    nodes: SceneNodes,
    tracker: IntersectionTracker,
    dragging: bool,
}

impl StudioScene {
    /// Builds the whole tree. On failure everything created so far is released.
    pub fn assemble(
        device: &mut dyn GraphicsDevice,
        width: f32,
        height: f32,
        world_extent: f32,
    ) -> Result<Self, SceneError> {
        let mut graph = SceneGraph::new();
        let mut tracker = IntersectionTracker::new();

        let nodes = match build(&mut graph, &mut tracker, device) {
            Ok(nodes) => nodes,
            Err(err) => {
                graph.destroy_all(device);
                return Err(err);
            }
        };

        let world = WorldWindow::fit(width, height, world_extent);
        let state = RenderState {
            projection: world.projection(),
            ..RenderState::default()
        };

        graph.print_graph();
        Ok(Self {
            graph,
            state,
            world,
            world_extent,
            nodes,
            tracker,
            dragging: false,
        })
    }

    #[cfg(test)]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    #[cfg(test)]
    pub fn nodes(&self) -> &SceneNodes {
        &self.nodes
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &IntersectionTracker {
        &self.tracker
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Refits the world window and projection to a new window size.
    pub fn reshape(&mut self, width: f32, height: f32) {
        self.world = WorldWindow::fit(width, height, self.world_extent);
        self.state.projection = self.world.projection();
    }

    /// Framebuffer size in pixels, used by the point program.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.state.viewport = [width, height];
    }

    pub fn screen_to_world(&self, x: f32, y: f32) -> Point2 {
        self.world.screen_to_world(x, y)
    }

    /// Appends `p` to both the point and the polyline accumulator. A failed
    /// upload in one does not skip the other; the first error is returned.
    pub fn add_point(&mut self, device: &mut dyn GraphicsDevice, p: Point2) -> Result<(), SceneError> {
        let points = match self.graph.point_accumulator_mut(self.nodes.points) {
            Some(points) => points.add(device, p),
            None => Ok(()),
        };
        let polyline = match self.graph.polyline_mut(self.nodes.polyline) {
            Some(polyline) => polyline.add(device, p),
            None => Ok(()),
        };
        points.and(polyline)
    }

    pub fn begin_drag(&mut self, device: &mut dyn GraphicsDevice, p: Point2) -> Result<(), SceneError> {
        let segment = self.segment_mut()?;
        segment.reset_line(device, p, p)?;
        segment.set_visible(true);
        self.dragging = true;
        Ok(())
    }

    /// Moves the segment end and recomputes intersections. Returns the hit count.
    pub fn drag_to(&mut self, device: &mut dyn GraphicsDevice, p: Point2) -> Result<usize, SceneError> {
        if !self.dragging {
            return Ok(0);
        }
        let segment = self.segment_mut()?;
        segment.update_end_point(device, p)?;
        let line = segment.segment();
        self.tracker.update_intersections(&line, &mut self.graph, device)
    }

    pub fn end_drag(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), SceneError> {
        if !self.dragging {
            return Ok(());
        }
        self.dragging = false;
        self.segment_mut()?.set_visible(false);
        self.tracker.clear_intersections(&mut self.graph, device)
    }

    pub fn set_point_size(&mut self, pixels: f32) {
        if let Some(shader) = self.graph.shader_mut(self.nodes.point_shader) {
            shader.set_point_size(pixels);
            log::info!("point size {pixels}px");
        }
    }

    pub fn draw(&mut self, device: &mut dyn GraphicsDevice) {
        self.graph.draw(device, &mut self.state);
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.graph.destroy_all(device);
    }

    fn segment_mut(&mut self) -> Result<&mut DraggableSegment, SceneError> {
        let id = self.nodes.segment;
        self.graph
            .draggable_segment_mut(id)
            .ok_or(SceneError::UnknownNode(id))
    }
}

fn build(
    graph: &mut SceneGraph,
    tracker: &mut IntersectionTracker,
    device: &mut dyn GraphicsDevice,
) -> Result<SceneNodes, SceneError> {
    let root = graph.root();

    // Filled polygons and the click polyline.
    let basic = attach(graph, root, ShaderNode::bundled(ShaderKind::Basic, device)?, "basic shader")?;
    let polygon_specs = [
        ("red", ColorRgba::rgb(0.9, 0.2, 0.2), Point2::new(0.0, 0.0), 32, 0.4),
        ("blue", ColorRgba::new(0.2, 0.3, 0.9, 0.25), Point2::new(-2.0, -2.0), 6, 0.8),
        ("green", ColorRgba::new(0.2, 0.8, 0.3, 0.5), Point2::new(2.5, 2.5), 8, 0.6),
    ];
    let mut polygons = [root; 3];
    for (slot, (name, color, center, sides, radius)) in polygons.iter_mut().zip(polygon_specs) {
        let material = attach(graph, basic, PresentationNode::with_color(color), name)?;
        let mut ngon = NGonNode::new(center, sides, radius);
        ngon.create(device)?;
        *slot = attach(graph, material, ngon, &format!("{name} {sides}-gon"))?;
    }

    let line_material = attach(graph, basic, PresentationNode::new(), "polyline material")?;
    let mut polyline = PolylineAccumulator::new();
    polyline.create(device)?;
    let polyline = attach(graph, line_material, polyline, "polyline")?;

    // Drag segment, coloured per vertex.
    let vertex_color = attach(
        graph,
        root,
        ShaderNode::bundled(ShaderKind::VertexColor, device)?,
        "vertex colour shader",
    )?;
    let mut segment = DraggableSegment::default();
    segment.create(device)?;
    segment.set_visible(false);
    let segment = attach(graph, vertex_color, segment, "draggable segment")?;

    // Clicked points and live intersections.
    let point_shader = attach(graph, root, ShaderNode::bundled(ShaderKind::Points, device)?, "point shader")?;
    let yellow = attach(
        graph,
        point_shader,
        PresentationNode::with_color(ColorRgba::rgb(1.0, 0.9, 0.1)),
        "yellow",
    )?;
    let mut points = PointAccumulator::new();
    points.create(device)?;
    let points = attach(graph, yellow, points, "points")?;

    tracker.initialize(graph, device, yellow, &polygons)?;

    Ok(SceneNodes {
        point_shader,
        points,
        polyline,
        segment,
        polygons,
    })
}

fn attach(
    graph: &mut SceneGraph,
    parent: NodeId,
    node: impl Into<SceneNode>,
    name: &str,
) -> Result<NodeId, SceneError> {
    graph.add_child(parent, node.into().named(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_engine::render::{BlendState, Primitive, RecordingDevice};
    use tessel_scene::nodes::GeometryNode;
    use tessel_scene::NodeKind;

    fn scene(device: &mut RecordingDevice) -> StudioScene {
        StudioScene::assemble(device, 800.0, 800.0, 10.0).unwrap()
    }

    #[test]
    fn assembles_the_demo_tree() {
        let mut device = RecordingDevice::new();
        let s = scene(&mut device);
        let root = s.graph().node(s.graph().root()).unwrap();
        let kinds: Vec<NodeKind> = root
            .children()
            .iter()
            .map(|&id| s.graph().node(id).unwrap().kind())
            .collect();
        assert_eq!(kinds, vec![NodeKind::Shader; 3]);

        let sides: Vec<u32> = s
            .nodes()
            .polygons
            .iter()
            .map(|&id| s.graph().ngon(id).unwrap().sides())
            .collect();
        assert_eq!(sides, vec![32, 6, 8]);
        assert_eq!(s.tracker().polygons().count(), 3);
    }

    #[test]
    fn first_frame_draws_only_polygons() {
        let mut device = RecordingDevice::new();
        let mut s = scene(&mut device);
        device.clear_commands();

        s.draw(&mut device);
        let prims: Vec<Primitive> = device.draws().map(|d| d.primitive).collect();
        assert_eq!(prims, vec![Primitive::Triangles; 3]);

        let blends: Vec<bool> = device.draws().map(|d| d.blend.enabled).collect();
        assert_eq!(blends, vec![false, true, true]);
        assert_eq!(device.blend_state(), BlendState::default());
    }

    #[test]
    fn clicks_feed_points_and_polyline() {
        let mut device = RecordingDevice::new();
        let mut s = scene(&mut device);
        s.add_point(&mut device, Point2::new(1.0, 1.0)).unwrap();
        s.add_point(&mut device, Point2::new(2.0, 1.0)).unwrap();
        device.clear_commands();

        s.draw(&mut device);
        let prims: Vec<Primitive> = device.draws().map(|d| d.primitive).collect();
        assert!(prims.contains(&Primitive::LineStrip));
        assert!(prims.contains(&Primitive::Points));
    }

    #[test]
    fn failed_point_upload_still_feeds_the_polyline() {
        let mut device = RecordingDevice::new();
        let mut s = scene(&mut device);

        device.fail_next_uploads(1);
        assert!(s.add_point(&mut device, Point2::new(1.0, 1.0)).is_err());

        let points = s.graph().point_accumulator(s.nodes().points).unwrap();
        assert!(points.is_empty());
        let Some(GeometryNode::Polyline(polyline)) = s.graph().geometry(s.nodes().polyline) else {
            panic!("polyline node missing");
        };
        assert_eq!(polyline.points(), &[Point2::new(1.0, 1.0)]);
    }

    #[test]
    fn drag_across_red_polygon_reports_two_hits() {
        let mut device = RecordingDevice::new();
        let mut s = scene(&mut device);

        s.begin_drag(&mut device, Point2::new(-1.0, 0.05)).unwrap();
        let hits = s.drag_to(&mut device, Point2::new(1.0, 0.05)).unwrap();
        assert_eq!(hits, 2);
        assert_eq!(s.tracker().intersection_count(), 2);

        s.end_drag(&mut device).unwrap();
        assert_eq!(s.tracker().intersection_count(), 0);
        assert!(!s.is_dragging());
        assert_eq!(s.drag_to(&mut device, Point2::new(5.0, 5.0)).unwrap(), 0);
    }

    #[test]
    fn screen_center_maps_to_origin() {
        let mut device = RecordingDevice::new();
        let mut s = scene(&mut device);
        s.reshape(1000.0, 500.0);
        assert_eq!(s.screen_to_world(500.0, 250.0), Point2::ORIGIN);
        assert_eq!(s.screen_to_world(0.0, 0.0), Point2::new(-10.0, 5.0));
    }

    #[test]
    fn allocation_failure_releases_everything() {
        let mut device = RecordingDevice::new();
        device.fail_allocations(3, 1);
        let err = StudioScene::assemble(&mut device, 800.0, 800.0, 10.0).unwrap_err();
        assert!(matches!(err, SceneError::ResourceCreation { .. }));
        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(device.live_program_count(), 0);
    }

    #[test]
    fn destroy_releases_gpu_resources() {
        let mut device = RecordingDevice::new();
        let mut s = scene(&mut device);
        s.destroy(&mut device);
        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(device.live_program_count(), 0);
    }
}
