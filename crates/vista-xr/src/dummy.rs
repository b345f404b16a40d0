//! In-process host used by tests and the `vista simulate` driver.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::task::Poll;

use futures_util::future::{self, FutureExt, LocalBoxFuture};
use glam::Mat4;
use tracing::{debug, info};

use crate::host::{CompositorBinding, VideoSource, XrSession};
use crate::types::{LayerHandle, LayerInit, LayerKind, ReadyState, ReferenceSpace, ReferenceSpaceKind};
use crate::{XrError, XrResult};

/// How [`DummySession`] answers reference space requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceMode {
    Immediate,
    /// Stay pending until [`DummySession::release_spaces`] is called.
    Deferred,
    Reject,
}

pub struct DummySession {
    layers: RefCell<Vec<LayerHandle>>,
    supports_layers: Cell<bool>,
    mode: Cell<SpaceMode>,
    released: Rc<Cell<bool>>,
    space_requests: Cell<u32>,
    render_state_updates: Cell<u32>,
    next_space_id: Cell<u64>,
}

impl DummySession {
    /// Projection layer the session starts with.
    pub const BASE_LAYER: LayerHandle = LayerHandle(0);

    pub fn new() -> Self {
        Self {
            layers: RefCell::new(vec![Self::BASE_LAYER]),
            supports_layers: Cell::new(true),
            mode: Cell::new(SpaceMode::Immediate),
            released: Rc::new(Cell::new(false)),
            space_requests: Cell::new(0),
            render_state_updates: Cell::new(0),
            next_space_id: Cell::new(1),
        }
    }

    pub fn with_mode(mode: SpaceMode) -> Self {
        let session = Self::new();
        session.mode.set(mode);
        session
    }

    pub fn set_supports_layers(&self, supported: bool) {
        self.supports_layers.set(supported);
    }

    pub fn release_spaces(&self) {
        self.released.set(true);
    }

    pub fn space_requests(&self) -> u32 {
        self.space_requests.get()
    }

    pub fn render_state_updates(&self) -> u32 {
        self.render_state_updates.get()
    }
}

impl Default for DummySession {
    fn default() -> Self {
        Self::new()
    }
}

impl XrSession for DummySession {
    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> LocalBoxFuture<'static, XrResult<ReferenceSpace>> {
        self.space_requests.set(self.space_requests.get() + 1);
        let id = self.next_space_id.get();
        self.next_space_id.set(id + 1);
        let space = ReferenceSpace { kind, id };
        debug!("DummySession: reference space {:?} requested", kind);

        match self.mode.get() {
            SpaceMode::Immediate => future::ready(Ok(space)).boxed_local(),
            SpaceMode::Reject => future::ready(Err(XrError::Rejected(format!(
                "reference space {:?} not supported",
                kind
            ))))
            .boxed_local(),
            SpaceMode::Deferred => {
                let released = self.released.clone();
                future::poll_fn(move |_| {
                    if released.get() {
                        Poll::Ready(Ok(space))
                    } else {
                        Poll::Pending
                    }
                })
                .boxed_local()
            }
        }
    }

    fn render_state_layers(&self) -> Vec<LayerHandle> {
        self.layers.borrow().clone()
    }

    fn update_render_state(&self, layers: Vec<LayerHandle>) {
        info!("DummySession: render state now has {} layers", layers.len());
        self.render_state_updates.set(self.render_state_updates.get() + 1);
        *self.layers.borrow_mut() = layers;
    }

    fn supports_layers(&self) -> bool {
        self.supports_layers.get()
    }
}

pub struct DummyCompositor {
    next_id: Cell<u64>,
    created: RefCell<Vec<(LayerKind, LayerInit)>>,
    transforms: RefCell<HashMap<LayerHandle, Mat4>>,
    fail: Cell<bool>,
}

impl DummyCompositor {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            created: RefCell::new(Vec::new()),
            transforms: RefCell::new(HashMap::new()),
            fail: Cell::new(false),
        }
    }

    /// Reject every subsequent layer construction.
    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn created(&self) -> Vec<(LayerKind, LayerInit)> {
        self.created.borrow().clone()
    }

    pub fn layer_transform(&self, layer: LayerHandle) -> Option<Mat4> {
        self.transforms.borrow().get(&layer).copied()
    }

    fn construct(&self, kind: LayerKind, init: LayerInit) -> LocalBoxFuture<'static, XrResult<LayerHandle>> {
        if self.fail.get() {
            return future::ready(Err(XrError::Rejected(format!(
                "{} layer construction refused",
                kind
            ))))
            .boxed_local();
        }
        let handle = LayerHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        self.created.borrow_mut().push((kind, init));
        if let Some(transform) = init.transform {
            self.transforms.borrow_mut().insert(handle, transform);
        }
        debug!("DummyCompositor: {} layer {:?} created", kind, handle);
        future::ready(Ok(handle)).boxed_local()
    }
}

impl Default for DummyCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositorBinding for DummyCompositor {
    fn create_quad_layer(
        &self,
        _video: Rc<dyn VideoSource>,
        init: LayerInit,
    ) -> LocalBoxFuture<'static, XrResult<LayerHandle>> {
        self.construct(LayerKind::Quad, init)
    }

    fn create_equirect_layer(
        &self,
        _video: Rc<dyn VideoSource>,
        init: LayerInit,
    ) -> LocalBoxFuture<'static, XrResult<LayerHandle>> {
        self.construct(LayerKind::Equirect, init)
    }

    fn set_layer_transform(&self, layer: LayerHandle, transform: Mat4) {
        self.transforms.borrow_mut().insert(layer, transform);
    }
}

pub struct DummyVideo {
    ready: Cell<ReadyState>,
    time: Cell<f64>,
    duration: f64,
    paused: Cell<bool>,
    looping: Cell<bool>,
    play_calls: Cell<u32>,
}

impl DummyVideo {
    pub fn new(duration: f64) -> Self {
        Self {
            ready: Cell::new(ReadyState::HaveNothing),
            time: Cell::new(0.0),
            duration,
            paused: Cell::new(true),
            looping: Cell::new(false),
            play_calls: Cell::new(0),
        }
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.ready.set(state);
    }

    pub fn play_calls(&self) -> u32 {
        self.play_calls.get()
    }

    pub fn is_looping(&self) -> bool {
        self.looping.get()
    }

    /// Move the playhead forward by `dt` seconds if playing.
    pub fn advance(&self, dt: f64) {
        if self.paused.get() || !(self.duration > 0.0) {
            return;
        }
        let mut t = self.time.get() + dt;
        if t >= self.duration {
            if self.looping.get() {
                t %= self.duration;
            } else {
                t = self.duration;
                self.paused.set(true);
            }
        }
        self.time.set(t);
    }
}

impl VideoSource for DummyVideo {
    fn ready_state(&self) -> ReadyState {
        self.ready.get()
    }

    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.time.set(seconds.clamp(0.0, self.duration.max(0.0)));
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn play(&self) {
        self.play_calls.set(self.play_calls.get() + 1);
        self.paused.set(false);
    }

    fn pause(&self) {
        self.paused.set(true);
    }

    fn is_paused(&self) -> bool {
        self.paused.get()
    }

    fn set_looping(&self, looping: bool) {
        self.looping.set(looping);
    }
}
