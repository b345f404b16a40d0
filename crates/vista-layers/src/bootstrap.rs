//! One-shot provisioning of the session's media layers.
//!
//! The render loop ticks the bootstrap every frame. Once all videos can play
//! through, every layer is requested in one go; the combined creation future
//! is then polled on later frames until it settles. Publication is
//! all-or-nothing and never repeated.

use std::mem;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::future::{self, FutureExt, LocalBoxFuture};
use futures_util::task::noop_waker_ref;
use tracing::{error, info};
use vista_xr::{LayerHandle, LayerKind, VideoSource, XrSession};

use crate::factory::{LayerFactory, LayerOptions};
use crate::registry::LayerName;
use crate::LayerResult;

/// One layer the bootstrap must provision.
pub struct LayerRequest {
    pub name: LayerName,
    pub kind: String,
    pub options: LayerOptions,
    pub video: Rc<dyn VideoSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedLayer {
    pub name: LayerName,
    pub kind: LayerKind,
    pub handle: LayerHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    /// At least one video cannot play through yet.
    WaitingForMedia,
    /// The session has no compositor layer support.
    Unsupported,
    /// Layers requested, creation still in flight.
    Pending,
    /// Layers were published this frame, in request order.
    Published(Vec<CreatedLayer>),
    /// Published on an earlier frame; nothing left to do.
    Idle,
    /// Creation failed on an earlier frame; nothing will be retried.
    Failed,
}

enum Phase {
    Waiting,
    Pending {
        base: Option<LayerHandle>,
        kinds: Vec<LayerKind>,
        creation: LocalBoxFuture<'static, LayerResult<Vec<LayerHandle>>>,
    },
    Published,
    Failed,
}

pub struct SessionBootstrap {
    requests: Vec<LayerRequest>,
    phase: Phase,
}

impl SessionBootstrap {
    pub fn new(requests: Vec<LayerRequest>) -> Self {
        Self {
            requests,
            phase: Phase::Waiting,
        }
    }

    /// Whether layer creation has been started.
    pub fn is_requested(&self) -> bool {
        !matches!(self.phase, Phase::Waiting)
    }

    pub fn is_published(&self) -> bool {
        matches!(self.phase, Phase::Published)
    }

    pub fn requests(&self) -> &[LayerRequest] {
        &self.requests
    }

    fn media_ready(&self) -> bool {
        self.requests
            .iter()
            .all(|request| request.video.ready_state().is_fully_loaded())
    }

    /// Advance by one frame.
    pub fn tick(&mut self, session: &dyn XrSession, factory: &LayerFactory) -> LayerResult<BootstrapStatus> {
        match mem::replace(&mut self.phase, Phase::Failed) {
            Phase::Waiting => {
                if !self.media_ready() {
                    self.phase = Phase::Waiting;
                    return Ok(BootstrapStatus::WaitingForMedia);
                }
                if !session.supports_layers() {
                    self.phase = Phase::Waiting;
                    return Ok(BootstrapStatus::Unsupported);
                }
                self.start(session, factory)?;
                self.poll_creation(session)
            }
            pending @ Phase::Pending { .. } => {
                self.phase = pending;
                self.poll_creation(session)
            }
            Phase::Published => {
                self.phase = Phase::Published;
                Ok(BootstrapStatus::Idle)
            }
            Phase::Failed => Ok(BootstrapStatus::Failed),
        }
    }

    /// Issue every layer request. Leaves the phase `Failed` on a bad kind.
    fn start(&mut self, session: &dyn XrSession, factory: &LayerFactory) -> LayerResult<()> {
        // Validate every kind before any request leaves, so a bad entry
        // cannot strand a half-started set.
        let kinds = self
            .requests
            .iter()
            .map(|request| LayerFactory::parse_kind(&request.kind))
            .collect::<LayerResult<Vec<_>>>()
            .map_err(|err| {
                error!("media layer setup rejected: {}", err);
                err
            })?;

        let base = session.render_state_layers().first().copied();
        let pending: Vec<_> = self
            .requests
            .iter()
            .zip(&kinds)
            .map(|(request, kind)| factory.create(Rc::clone(&request.video), *kind, request.options))
            .collect();
        info!("requested {} media layers", pending.len());

        self.phase = Phase::Pending {
            base,
            kinds,
            creation: future::try_join_all(pending).boxed_local(),
        };
        Ok(())
    }

    fn poll_creation(&mut self, session: &dyn XrSession) -> LayerResult<BootstrapStatus> {
        let Phase::Pending { base, kinds, creation } = &mut self.phase else {
            return Ok(BootstrapStatus::Failed);
        };

        let mut cx = Context::from_waker(noop_waker_ref());
        let handles = match creation.poll_unpin(&mut cx) {
            Poll::Pending => return Ok(BootstrapStatus::Pending),
            Poll::Ready(Ok(handles)) => handles,
            Poll::Ready(Err(err)) => {
                error!("media layer creation failed, session continues without media layers: {}", err);
                self.phase = Phase::Failed;
                return Err(err);
            }
        };

        let mut layers = handles.clone();
        layers.extend(*base);
        session.update_render_state(layers);

        let created: Vec<CreatedLayer> = self
            .requests
            .iter()
            .zip(kinds.iter())
            .zip(handles)
            .map(|((request, kind), handle)| CreatedLayer {
                name: request.name,
                kind: *kind,
                handle,
            })
            .collect();
        self.phase = Phase::Published;

        for request in &self.requests {
            request.video.set_looping(true);
            request.video.play();
        }
        info!("published {} media layers", created.len());
        Ok(BootstrapStatus::Published(created))
    }
}
