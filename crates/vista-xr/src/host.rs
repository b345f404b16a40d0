//! Interfaces the host application provides to the media layer core.
//!
//! Everything here runs on the single render/event thread, so shared host
//! objects are handed around as `Rc` and the asynchronous calls return
//! non-`Send` boxed futures.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use glam::{Mat4, Vec3};

use crate::{
    types::{ControllerId, LayerHandle, LayerInit, NodeId, Parent, ReadyState, ReferenceSpace, ReferenceSpaceKind},
    XrResult,
};

pub trait XrSession {
    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> LocalBoxFuture<'static, XrResult<ReferenceSpace>>;

    /// Layers currently submitted to the compositor, in draw order.
    fn render_state_layers(&self) -> Vec<LayerHandle>;
    fn update_render_state(&self, layers: Vec<LayerHandle>);

    /// Whether the session was granted compositor layer support.
    fn supports_layers(&self) -> bool;
}

pub trait CompositorBinding {
    fn create_quad_layer(
        &self,
        video: Rc<dyn VideoSource>,
        init: LayerInit,
    ) -> LocalBoxFuture<'static, XrResult<LayerHandle>>;

    fn create_equirect_layer(
        &self,
        video: Rc<dyn VideoSource>,
        init: LayerInit,
    ) -> LocalBoxFuture<'static, XrResult<LayerHandle>>;

    fn set_layer_transform(&self, layer: LayerHandle, transform: Mat4);
}

pub trait VideoSource {
    fn ready_state(&self) -> ReadyState;
    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// Length in seconds; may be NaN or infinite before metadata arrives.
    fn duration(&self) -> f64;
    fn play(&self);
    fn pause(&self);
    fn is_paused(&self) -> bool;
    fn set_looping(&self, looping: bool);
}

/// The host's 3D scene, reduced to what the toolbar and markers need.
pub trait Scene {
    fn create_node(&mut self, local: Mat4) -> NodeId;

    /// Hang `node` under `parent`, keeping its local transform.
    fn add(&mut self, node: NodeId, parent: Parent);
    /// Hang `node` under `parent`, keeping its world transform.
    fn attach(&mut self, node: NodeId, parent: Parent);
    /// Detach `node` from its parent. Its children stay attached to it.
    fn remove(&mut self, node: NodeId);
    /// True when `node` is reachable from the scene root.
    fn contains(&self, node: NodeId) -> bool;

    fn set_local_transform(&mut self, node: NodeId, local: Mat4);
    /// World transform of a node in the scene, `None` when detached.
    fn world_transform(&self, node: NodeId) -> Option<Mat4>;

    /// World transform of a connected controller.
    fn controller_transform(&self, controller: ControllerId) -> Option<Mat4>;

    fn place_marker(&mut self, controller: ControllerId, position: Vec3);
    fn remove_marker(&mut self, controller: ControllerId);
}
