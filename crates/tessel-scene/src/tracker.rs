//! Live intersections between a query segment and registered polygons.

use tessel_engine::render::GraphicsDevice;

use crate::error::SceneError;
use crate::geometry::{Point2, Segment2};
use crate::graph::{NodeId, SceneGraph, SceneNode};
use crate::nodes::PointAccumulator;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TrackerState {
    Empty,
    Initialized,
    HasIntersections,
    NoIntersections,
}

#[derive(Debug)]
struct TrackedPolygon {
    node: NodeId,
    edges: Vec<Segment2>,
}

/// Tests a query segment against every edge of the registered polygons and
/// republishes the hits as a point node in the scene.
///
/// Each update replaces the previous result; nothing accumulates.
#[derive(Debug)]
pub struct IntersectionTracker {
    polygons: Vec<TrackedPolygon>,
    intersections: Vec<Point2>,
    display_parent: Option<NodeId>,
    display: Option<NodeId>,
    state: TrackerState,
}

impl Default for IntersectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IntersectionTracker {
    pub fn new() -> Self {
        Self {
            polygons: Vec::new(),
            intersections: Vec::new(),
            display_parent: None,
            display: None,
            state: TrackerState::Empty,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Registers `polygons` in order and attaches an empty display node under
    /// `display_parent`. Ids that do not name an n-gon are skipped with a
    /// warning. Edges are cached here and not re-read later.
    pub fn initialize(
        &mut self,
        graph: &mut SceneGraph,
        device: &mut dyn GraphicsDevice,
        display_parent: NodeId,
        polygons: &[NodeId],
    ) -> Result<(), SceneError> {
        self.detach_display(graph, device);
        self.intersections.clear();

        self.polygons = polygons
            .iter()
            .filter_map(|&id| match graph.ngon(id) {
                Some(ngon) => Some(TrackedPolygon {
                    node: id,
                    edges: ngon.perimeter_edges().to_vec(),
                }),
                None => {
                    log::warn!("intersection tracker: {id:?} is not an n-gon; skipped");
                    None
                }
            })
            .collect();

        self.display_parent = Some(display_parent);
        self.attach_display(graph, device)?;
        self.state = TrackerState::Initialized;
        log::debug!("intersection tracker: {} polygon(s) registered", self.polygons.len());
        Ok(())
    }

    /// Registered polygon nodes, in registration order.
    pub fn polygons(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.polygons.iter().map(|p| p.node)
    }

    pub fn display_node(&self) -> Option<NodeId> {
        self.display
    }

    /// Recomputes hits for `line`: polygons in registration order, then
    /// edges in edge order. The display node is rebuilt from scratch.
    ///
    /// If publishing fails the tracker falls back to `Initialized` with no
    /// hits and no display node; the next update starts over.
    pub fn update_intersections(
        &mut self,
        line: &Segment2,
        graph: &mut SceneGraph,
        device: &mut dyn GraphicsDevice,
    ) -> Result<usize, SceneError> {
        if self.state == TrackerState::Empty {
            log::warn!("intersection tracker: update before initialize");
            return Ok(0);
        }

        let hits: Vec<Point2> = self
            .polygons
            .iter()
            .flat_map(|polygon| polygon.edges.iter())
            .map(|edge| line.intersect(edge))
            .filter(|hit| hit.intersects)
            .map(|hit| hit.point)
            .collect();

        self.publish(graph, device, &hits)?;
        self.state = if hits.is_empty() {
            TrackerState::NoIntersections
        } else {
            TrackerState::HasIntersections
        };
        self.intersections = hits;
        Ok(self.intersections.len())
    }

    /// Drops every published point. Safe to call at any time, repeatedly.
    pub fn clear_intersections(
        &mut self,
        graph: &mut SceneGraph,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), SceneError> {
        if self.state == TrackerState::Empty {
            self.intersections.clear();
            return Ok(());
        }
        self.publish(graph, device, &[])?;
        self.intersections.clear();
        self.state = TrackerState::Initialized;
        Ok(())
    }

    /// Hits from the most recent update.
    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn intersections(&self) -> &[Point2] {
        &self.intersections
    }

    /// Replaces the display node with one holding `points`. On failure no
    /// display node is left behind and the previous result is dropped.
    fn publish(
        &mut self,
        graph: &mut SceneGraph,
        device: &mut dyn GraphicsDevice,
        points: &[Point2],
    ) -> Result<(), SceneError> {
        self.detach_display(graph, device);
        if let Err(err) = self.fill_display(graph, device, points) {
            self.detach_display(graph, device);
            self.intersections.clear();
            self.state = TrackerState::Initialized;
            return Err(err);
        }
        Ok(())
    }

    fn fill_display(
        &mut self,
        graph: &mut SceneGraph,
        device: &mut dyn GraphicsDevice,
        points: &[Point2],
    ) -> Result<(), SceneError> {
        let display = self.attach_display(graph, device)?;
        if let Some(node) = graph.point_accumulator_mut(display) {
            for &p in points {
                node.add(device, p)?;
            }
        }
        Ok(())
    }

    fn attach_display(&mut self, graph: &mut SceneGraph, device: &mut dyn GraphicsDevice) -> Result<NodeId, SceneError> {
        let parent = self.display_parent.unwrap_or_else(|| graph.root());
        if !graph.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let mut points = PointAccumulator::new();
        points.create(device)?;
        match graph.add_child(parent, SceneNode::from(points).named("intersections")) {
            Ok(id) => {
                self.display = Some(id);
                Ok(id)
            }
            Err(err) => {
                self.display = None;
                Err(err)
            }
        }
    }

    fn detach_display(&mut self, graph: &mut SceneGraph, device: &mut dyn GraphicsDevice) {
        if let Some(id) = self.display.take() {
            // Already gone when the parent subtree was removed.
            let _ = graph.remove(id, device);
        }
    }
}
