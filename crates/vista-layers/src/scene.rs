//! Minimal transform hierarchy implementing [`Scene`].

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use vista_xr::{ControllerId, NodeId, Parent, Scene, MAX_CONTROLLERS};

/// Deepest parent chain followed before a node is treated as detached.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy)]
struct SceneNode {
    local: Mat4,
    parent: Option<Parent>,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    next_id: u64,
    nodes: HashMap<NodeId, SceneNode>,
    controllers: [Option<Mat4>; MAX_CONTROLLERS],
    markers: [Option<Vec3>; MAX_CONTROLLERS],
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_controller_transform(&mut self, controller: ControllerId, world: Mat4) {
        if let Some(slot) = controller.slot() {
            self.controllers[slot] = Some(world);
        }
    }

    pub fn clear_controller(&mut self, controller: ControllerId) {
        if let Some(slot) = controller.slot() {
            self.controllers[slot] = None;
        }
    }

    pub fn marker(&self, controller: ControllerId) -> Option<Vec3> {
        controller.slot().and_then(|slot| self.markers[slot])
    }

    pub fn parent(&self, node: NodeId) -> Option<Parent> {
        self.nodes.get(&node).and_then(|entry| entry.parent)
    }

    pub fn local_transform(&self, node: NodeId) -> Option<Mat4> {
        self.nodes.get(&node).map(|entry| entry.local)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn parent_world(&self, parent: Parent, depth: usize) -> Option<Mat4> {
        match parent {
            Parent::Root => Some(Mat4::IDENTITY),
            Parent::Controller(controller) => self.controller_transform(controller),
            Parent::Node(node) => self.world_at_depth(node, depth + 1),
        }
    }

    fn world_at_depth(&self, node: NodeId, depth: usize) -> Option<Mat4> {
        if depth > MAX_DEPTH {
            return None;
        }
        let entry = self.nodes.get(&node)?;
        let parent_world = self.parent_world(entry.parent?, depth)?;
        Some(parent_world * entry.local)
    }
}

impl Scene for SceneGraph {
    fn create_node(&mut self, local: Mat4) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, SceneNode { local, parent: None });
        id
    }

    fn add(&mut self, node: NodeId, parent: Parent) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.parent = Some(parent);
        }
    }

    fn attach(&mut self, node: NodeId, parent: Parent) {
        let Some(world) = self.world_transform(node) else {
            self.add(node, parent);
            return;
        };
        let Some(parent_world) = self.parent_world(parent, 0) else {
            self.add(node, parent);
            return;
        };
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.local = parent_world.inverse() * world;
            entry.parent = Some(parent);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.parent = None;
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        self.world_transform(node).is_some()
    }

    fn set_local_transform(&mut self, node: NodeId, local: Mat4) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.local = local;
        }
    }

    fn world_transform(&self, node: NodeId) -> Option<Mat4> {
        self.world_at_depth(node, 0)
    }

    fn controller_transform(&self, controller: ControllerId) -> Option<Mat4> {
        controller.slot().and_then(|slot| self.controllers[slot])
    }

    fn place_marker(&mut self, controller: ControllerId, position: Vec3) {
        if let Some(slot) = controller.slot() {
            self.markers[slot] = Some(position);
        }
    }

    fn remove_marker(&mut self, controller: ControllerId) {
        if let Some(slot) = controller.slot() {
            self.markers[slot] = None;
        }
    }
}
