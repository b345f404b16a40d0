//! Compositor media layer construction.

use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};
use glam::{Mat4, Vec2};
use tracing::debug;
use vista_xr::{
    CompositorBinding, LayerHandle, LayerInit, LayerKind, ReferenceSpace, ReferenceSpaceKind,
    StereoLayout, VideoSource, XrSession,
};

use crate::{LayerError, LayerResult};

/// Layer creation in flight.
pub type PendingLayer = LocalBoxFuture<'static, LayerResult<LayerHandle>>;

/// Caller-side layer options, merged with the acquired reference space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerOptions {
    pub space: ReferenceSpaceKind,
    pub layout: StereoLayout,
    pub transform: Option<Mat4>,
    pub size: Vec2,
    pub radius: f32,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            space: ReferenceSpaceKind::Local,
            layout: StereoLayout::Mono,
            transform: None,
            size: Vec2::new(1.6, 0.9),
            radius: 0.0,
        }
    }
}

impl LayerOptions {
    pub fn with_space(self, space: ReferenceSpace) -> LayerInit {
        LayerInit {
            space,
            layout: self.layout,
            transform: self.transform,
            size: self.size,
            radius: self.radius,
        }
    }
}

pub struct LayerFactory {
    session: Rc<dyn XrSession>,
    compositor: Rc<dyn CompositorBinding>,
}

impl LayerFactory {
    pub fn new(session: Rc<dyn XrSession>, compositor: Rc<dyn CompositorBinding>) -> Self {
        Self {
            session,
            compositor,
        }
    }

    pub fn parse_kind(kind: &str) -> LayerResult<LayerKind> {
        kind.parse()
            .map_err(|_| LayerError::InvalidLayerKind(kind.to_string()))
    }

    /// Validate `kind` and start creating a layer bound to `video`.
    ///
    /// An unknown kind fails here, before the session is asked for anything.
    pub fn create_layer(
        &self,
        video: Rc<dyn VideoSource>,
        kind: &str,
        options: LayerOptions,
    ) -> LayerResult<PendingLayer> {
        let kind = Self::parse_kind(kind)?;
        Ok(self.create(video, kind, options))
    }

    /// Request the reference space now and resolve to the constructed layer.
    pub fn create(
        &self,
        video: Rc<dyn VideoSource>,
        kind: LayerKind,
        options: LayerOptions,
    ) -> PendingLayer {
        debug!("requesting {:?} reference space for {} layer", options.space, kind);
        let space_request = self.session.request_reference_space(options.space);
        let compositor = Rc::clone(&self.compositor);

        async move {
            let space = space_request
                .await
                .map_err(|e| LayerError::ReferenceSpaceUnavailable(e.to_string()))?;
            let init = options.with_space(space);
            let construct = match kind {
                LayerKind::Quad => compositor.create_quad_layer(video, init),
                LayerKind::Equirect => compositor.create_equirect_layer(video, init),
            };
            let handle = construct
                .await
                .map_err(|e| LayerError::LayerConstruction(e.to_string()))?;
            debug!("{} layer ready as {:?}", kind, handle);
            Ok(handle)
        }
        .boxed_local()
    }
}
