//! Per-session coordinator tying bootstrap, layer records and interaction together.

use std::mem;
use std::rc::Rc;

use tracing::{info, warn};
use vista_xr::{CompositorBinding, ControllerId, InputEvent, Scene, VideoSource, XrSession, MAX_CONTROLLERS};

use crate::bootstrap::{BootstrapStatus, LayerRequest, SessionBootstrap};
use crate::config::LayerConfig;
use crate::factory::LayerFactory;
use crate::interaction::{InteractionMachine, InteractionState};
use crate::record::MediaLayerRecord;
use crate::registry::{LayerName, LayerRegistry, VisibilityMap};
use crate::{LayerError, LayerResult};

pub struct MediaSession {
    session: Rc<dyn XrSession>,
    compositor: Rc<dyn CompositorBinding>,
    factory: LayerFactory,
    bootstrap: SessionBootstrap,
    configs: Vec<LayerConfig>,
    registry: LayerRegistry,
    machine: InteractionMachine,
}

impl MediaSession {
    /// Fails with [`LayerError::DuplicateLayer`] when two entries share a name.
    pub fn new(
        session: Rc<dyn XrSession>,
        compositor: Rc<dyn CompositorBinding>,
        layers: Vec<(LayerConfig, Rc<dyn VideoSource>)>,
    ) -> LayerResult<Self> {
        let mut seen = [false; LayerName::COUNT];
        for (config, _) in &layers {
            if mem::replace(&mut seen[config.name.index()], true) {
                return Err(LayerError::DuplicateLayer(config.name));
            }
        }

        let requests = layers
            .iter()
            .map(|(config, video)| LayerRequest {
                name: config.name,
                kind: config.kind.clone(),
                options: config.options(),
                video: Rc::clone(video),
            })
            .collect();
        let configs = layers.into_iter().map(|(config, _)| config).collect();

        Ok(Self {
            factory: LayerFactory::new(Rc::clone(&session), Rc::clone(&compositor)),
            session,
            compositor,
            bootstrap: SessionBootstrap::new(requests),
            configs,
            registry: LayerRegistry::new(),
            machine: InteractionMachine::new(),
        })
    }

    /// Render loop body: provisioning, hover markers, per-layer ticks.
    ///
    /// A layer creation failure is returned on the frame it happens; the
    /// session then carries on without media layers.
    pub fn on_frame(&mut self, scene: &mut dyn Scene) -> LayerResult<BootstrapStatus> {
        let status = self.bootstrap.tick(self.session.as_ref(), &self.factory)?;

        if let BootstrapStatus::Published(created) = &status {
            for layer in created {
                let Some(config) = self.configs.iter().find(|config| config.name == layer.name) else {
                    continue;
                };
                let Some(request) = self.bootstrap.requests().iter().find(|request| request.name == layer.name) else {
                    continue;
                };
                let record = MediaLayerRecord::build(config, layer.kind, layer.handle, Rc::clone(&request.video), scene);
                if self.registry.insert(record).is_some() {
                    warn!("layer '{}' was already registered", layer.name);
                }
            }
            self.machine.reset();
            info!("{} media layers ready", self.registry.len());
        }

        self.machine.update_markers(&self.registry, scene);
        let compositor = self.compositor.as_ref();
        for record in self.registry.iter_mut() {
            record.on_render_tick(compositor, scene);
        }
        Ok(status)
    }

    /// Deliver one controller event.
    pub fn dispatch(&mut self, event: InputEvent, scene: &mut dyn Scene) {
        self.machine
            .dispatch(event, &mut self.registry, self.compositor.as_ref(), scene);
    }

    pub fn state(&self, controller: ControllerId, name: LayerName) -> InteractionState {
        self.machine.state(controller, name, &self.registry)
    }

    pub fn visibility(&self) -> &VisibilityMap {
        self.machine.visibility()
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn layer(&self, name: LayerName) -> Option<&MediaLayerRecord> {
        self.registry.get(name)
    }

    pub fn is_published(&self) -> bool {
        self.bootstrap.is_published()
    }

    /// Tear down toolbars, overlays and markers when the session ends.
    pub fn end(&mut self, scene: &mut dyn Scene) {
        for slot in 0..MAX_CONTROLLERS {
            self.dispatch(InputEvent::disconnected(ControllerId(slot as u32)), scene);
        }
        for mut record in self.registry.drain() {
            record.hide_toolbar(scene);
        }
        info!("media session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::scene::SceneGraph;
    use vista_xr::dummy::{DummyCompositor, DummySession, DummyVideo};
    use vista_xr::ReadyState;

    fn session_with_default_layers() -> (MediaSession, Rc<DummySession>, Vec<Rc<DummyVideo>>) {
        let session = Rc::new(DummySession::new());
        let compositor = Rc::new(DummyCompositor::new());
        let mut videos = Vec::new();
        let layers = SessionConfig::default()
            .layers
            .into_iter()
            .map(|config| {
                let video = Rc::new(DummyVideo::new(20.0));
                videos.push(video.clone());
                (config, video as Rc<dyn VideoSource>)
            })
            .collect();
        (MediaSession::new(session.clone(), compositor, layers).unwrap(), session, videos)
    }

    #[test]
    fn test_records_built_on_publication() {
        let (mut media, session, videos) = session_with_default_layers();
        let mut scene = SceneGraph::new();

        assert_eq!(media.on_frame(&mut scene).unwrap(), BootstrapStatus::WaitingForMedia);
        assert!(media.registry().is_empty());

        for video in &videos {
            video.set_ready_state(ReadyState::HaveEnoughData);
        }
        assert!(matches!(media.on_frame(&mut scene).unwrap(), BootstrapStatus::Published(_)));
        assert_eq!(media.registry().len(), 2);
        assert!(media.is_published());
        assert!(!media.visibility().any());
        assert_eq!(session.render_state_layers().len(), 3);

        assert_eq!(media.on_frame(&mut scene).unwrap(), BootstrapStatus::Idle);
        assert_eq!(media.registry().len(), 2);
    }

    #[test]
    fn test_duplicate_layer_names_rejected() {
        let session = Rc::new(DummySession::new());
        let compositor = Rc::new(DummyCompositor::new());
        let mut configs = SessionConfig::default().layers;
        configs[1].name = LayerName::Equirect;
        let layers = configs
            .into_iter()
            .map(|config| (config, Rc::new(DummyVideo::new(5.0)) as Rc<dyn VideoSource>))
            .collect();

        let result = MediaSession::new(session.clone(), compositor.clone(), layers);
        assert!(matches!(result, Err(LayerError::DuplicateLayer(LayerName::Equirect))));
        assert_eq!(session.space_requests(), 0);
        assert!(compositor.created().is_empty());
    }

    #[test]
    fn test_end_clears_scene() {
        let (mut media, _session, videos) = session_with_default_layers();
        let mut scene = SceneGraph::new();
        for video in &videos {
            video.set_ready_state(ReadyState::HaveEnoughData);
        }
        media.on_frame(&mut scene).unwrap();

        media.dispatch(InputEvent::select_start(ControllerId::LEFT), &mut scene);
        let groups: Vec<_> = media.registry().iter().map(|record| record.toolbar_group()).collect();
        assert!(groups.iter().all(|group| scene.contains(*group)));

        media.end(&mut scene);
        assert!(media.registry().is_empty());
        assert!(groups.iter().all(|group| !scene.contains(*group)));
        assert!(!media.visibility().any());
    }
}
