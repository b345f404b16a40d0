//! End-to-end session flows against the in-process dummy host.

use std::rc::Rc;

use approx::assert_relative_eq;
use glam::{Mat4, Quat, Vec3};
use vista_layers::{
    BootstrapStatus, InteractionState, LayerError, LayerName, MediaSession, SceneGraph, SessionConfig,
};
use vista_xr::dummy::{DummyCompositor, DummySession, DummyVideo, SpaceMode};
use vista_xr::{ControllerId, InputEvent, ReadyState, Scene, VideoSource, XrSession};

struct Rig {
    session: Rc<DummySession>,
    compositor: Rc<DummyCompositor>,
    videos: Vec<Rc<DummyVideo>>,
    media: MediaSession,
    scene: SceneGraph,
}

impl Rig {
    fn new(mode: SpaceMode) -> Self {
        let session = Rc::new(DummySession::with_mode(mode));
        let compositor = Rc::new(DummyCompositor::new());
        let mut videos = Vec::new();
        let mut layers = Vec::new();
        for config in SessionConfig::default().layers {
            let video = Rc::new(DummyVideo::new(120.0));
            videos.push(video.clone());
            layers.push((config, video as Rc<dyn VideoSource>));
        }
        let media = MediaSession::new(session.clone(), compositor.clone(), layers).unwrap();
        Self {
            session,
            compositor,
            videos,
            media,
            scene: SceneGraph::new(),
        }
    }

    fn frame(&mut self) -> Result<BootstrapStatus, LayerError> {
        self.media.on_frame(&mut self.scene)
    }

    fn ready(&mut self) {
        for video in &self.videos {
            video.set_ready_state(ReadyState::HaveEnoughData);
        }
        assert!(matches!(self.frame(), Ok(BootstrapStatus::Published(_))));
    }

    fn send(&mut self, event: InputEvent) {
        self.media.dispatch(event, &mut self.scene);
    }

    fn aim_from(&mut self, controller: ControllerId, origin: Vec3, target: Vec3) {
        let rotation = Quat::from_rotation_arc(Vec3::NEG_Z, (target - origin).normalize());
        self.scene
            .set_controller_transform(controller, Mat4::from_rotation_translation(rotation, origin));
    }

    fn aim(&mut self, controller: ControllerId, target: Vec3) {
        self.aim_from(controller, Vec3::ZERO, target);
    }

    fn aim_at_nothing(&mut self, controller: ControllerId) {
        self.aim(controller, Vec3::new(0.0, 5.0, 0.1));
    }

    fn world_origin(&self, node: vista_xr::NodeId) -> Vec3 {
        self.scene.world_transform(node).unwrap().transform_point3(Vec3::ZERO)
    }

    fn state(&self, controller: ControllerId, name: LayerName) -> InteractionState {
        self.media.state(controller, name)
    }
}

#[test]
fn test_two_layers_published_ahead_of_base_layer() {
    let mut rig = Rig::new(SpaceMode::Deferred);

    for _ in 0..3 {
        assert_eq!(rig.frame().unwrap(), BootstrapStatus::WaitingForMedia);
    }
    rig.videos[0].set_ready_state(ReadyState::HaveEnoughData);
    assert_eq!(rig.frame().unwrap(), BootstrapStatus::WaitingForMedia);
    rig.videos[1].set_ready_state(ReadyState::HaveEnoughData);

    for _ in 0..4 {
        assert_eq!(rig.frame().unwrap(), BootstrapStatus::Pending);
    }
    assert_eq!(rig.session.space_requests(), 2);

    rig.session.release_spaces();
    let created = match rig.frame().unwrap() {
        BootstrapStatus::Published(created) => created,
        other => panic!("expected publication, got {:?}", other),
    };
    let layers = rig.session.render_state_layers();
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0], created[0].handle);
    assert_eq!(layers[1], created[1].handle);
    assert_eq!(layers[2], DummySession::BASE_LAYER);

    for _ in 0..30 {
        assert_eq!(rig.frame().unwrap(), BootstrapStatus::Idle);
    }
    for video in &rig.videos {
        assert_eq!(video.play_calls(), 1);
        assert!(video.is_looping());
        assert!(!video.is_paused());
    }
    assert_eq!(rig.session.space_requests(), 2);
    assert_eq!(rig.compositor.created().len(), 2);
}

#[test]
fn test_empty_selects_toggle_all_toolbars() {
    let mut rig = Rig::new(SpaceMode::Immediate);
    rig.ready();
    let c = ControllerId::RIGHT;
    rig.aim_at_nothing(c);

    for _ in 0..3 {
        rig.send(InputEvent::select_start(c));
        for name in LayerName::ALL {
            assert_eq!(rig.state(c, name), InteractionState::VisibleIdle);
            assert_eq!(rig.state(ControllerId::LEFT, name), InteractionState::VisibleIdle);
        }
        rig.send(InputEvent::select_end(c));

        rig.send(InputEvent::select_start(c));
        for name in LayerName::ALL {
            assert_eq!(rig.state(c, name), InteractionState::Hidden);
            let group = rig.media.layer(name).unwrap().toolbar_group();
            assert!(!rig.scene.contains(group));
        }
        rig.send(InputEvent::select_end(c));
    }
}

#[test]
fn test_play_button_pauses_and_resumes() {
    let mut rig = Rig::new(SpaceMode::Immediate);
    rig.ready();
    let c = ControllerId::LEFT;
    rig.aim_at_nothing(c);
    rig.send(InputEvent::select_start(c));

    let button = rig.media.layer(LayerName::Equirect).unwrap().toolbar().play_button;
    let target = rig.world_origin(button);
    rig.aim(c, target);

    rig.send(InputEvent::select_start(c));
    assert!(rig.videos[0].is_paused());
    assert!(!rig.videos[1].is_paused());

    // The quad toolbar closed on the previous select; reopen it with the
    // equirect one still under the ray, then resume.
    rig.send(InputEvent::select_start(c));
    assert!(!rig.videos[0].is_paused());
    assert_eq!(rig.state(c, LayerName::Equirect), InteractionState::VisibleIdle);
}

#[test]
fn test_drag_carries_quad_layer() {
    let mut rig = Rig::new(SpaceMode::Immediate);
    rig.ready();
    let c = ControllerId::RIGHT;
    rig.aim_at_nothing(c);
    rig.send(InputEvent::select_start(c));

    let quad = rig.media.layer(LayerName::Quad).unwrap();
    let handle = quad.handle();
    let overlay = quad.overlay().unwrap().node;
    let rest = rig.world_origin(overlay);
    rig.aim(c, rest);

    rig.send(InputEvent::select_start(c));
    assert_eq!(rig.state(c, LayerName::Quad), InteractionState::VisibleDragging);
    assert_eq!(rig.state(ControllerId::LEFT, LayerName::Quad), InteractionState::VisibleIdle);
    assert_eq!(rig.media.layer(LayerName::Quad).unwrap().dragged_by(), Some(c));

    rig.aim_from(c, Vec3::new(0.5, 0.0, 0.0), rest + Vec3::new(0.5, 0.0, 0.0));
    rig.frame().unwrap();
    let pose = rig.compositor.layer_transform(handle).unwrap();
    let carried = pose.transform_point3(Vec3::ZERO);
    assert_relative_eq!(carried.x, rest.x + 0.5, epsilon = 1e-4);
    assert_relative_eq!(carried.z, rest.z, epsilon = 1e-4);

    rig.send(InputEvent::select_end(c));
    assert_eq!(rig.state(c, LayerName::Quad), InteractionState::VisibleIdle);
    assert_eq!(rig.media.layer(LayerName::Quad).unwrap().dragged_by(), None);
    let restored = rig.world_origin(overlay);
    assert_relative_eq!(restored.x, rest.x, epsilon = 1e-5);
    assert_relative_eq!(restored.y, rest.y, epsilon = 1e-5);
}

#[test]
fn test_marker_tracks_hover_and_clears_when_hidden() {
    let mut rig = Rig::new(SpaceMode::Immediate);
    rig.ready();
    let c = ControllerId::LEFT;
    rig.aim_at_nothing(c);
    rig.send(InputEvent::select_start(c));
    rig.frame().unwrap();
    assert_eq!(rig.scene.marker(c), None);

    let track = rig.media.layer(LayerName::Equirect).unwrap().toolbar().track;
    let target = rig.world_origin(track);
    rig.aim(c, target);
    rig.frame().unwrap();
    let marker = rig.scene.marker(c).unwrap();
    assert!(marker.distance(target) < 0.01);

    rig.aim_at_nothing(c);
    rig.send(InputEvent::select_start(c));
    assert!(!rig.media.visibility().any());
    rig.frame().unwrap();
    assert_eq!(rig.scene.marker(c), None);
}

#[test]
fn test_disconnect_hides_toolbars_and_drops_overlay() {
    let mut rig = Rig::new(SpaceMode::Immediate);
    rig.ready();
    let c = ControllerId::LEFT;
    rig.aim_at_nothing(c);
    rig.send(InputEvent::select_start(c));

    let overlay = rig.media.layer(LayerName::Quad).unwrap().overlay().unwrap().node;
    let target = rig.world_origin(overlay);
    rig.aim(c, target);
    rig.send(InputEvent::select_start(c));
    assert_eq!(rig.state(c, LayerName::Quad), InteractionState::VisibleDragging);

    rig.scene.clear_controller(c);
    rig.send(InputEvent::disconnected(c));
    for name in LayerName::ALL {
        assert_eq!(rig.state(c, name), InteractionState::Hidden);
        assert_eq!(rig.state(ControllerId::RIGHT, name), InteractionState::Hidden);
    }
    assert_eq!(rig.media.layer(LayerName::Quad).unwrap().dragged_by(), None);
    assert!(!rig.scene.contains(overlay));
    assert_eq!(rig.scene.marker(c), None);

    // Another controller can still bring the toolbars back.
    rig.aim_at_nothing(ControllerId::RIGHT);
    rig.send(InputEvent::select_start(ControllerId::RIGHT));
    assert!(rig.media.visibility().get(LayerName::Quad));
    assert!(rig.scene.contains(overlay));
}

#[test]
fn test_creation_failure_leaves_session_without_layers() {
    let mut rig = Rig::new(SpaceMode::Immediate);
    rig.compositor.set_failing(true);
    for video in &rig.videos {
        video.set_ready_state(ReadyState::HaveEnoughData);
    }

    assert!(matches!(rig.frame(), Err(LayerError::LayerConstruction(_))));
    for _ in 0..5 {
        assert_eq!(rig.frame().unwrap(), BootstrapStatus::Failed);
    }
    assert!(rig.media.registry().is_empty());
    assert_eq!(rig.session.render_state_layers(), vec![DummySession::BASE_LAYER]);
    assert!(rig.videos.iter().all(|video| video.play_calls() == 0));

    rig.aim_at_nothing(ControllerId::RIGHT);
    rig.send(InputEvent::select_start(ControllerId::RIGHT));
    assert!(!rig.media.visibility().any());
}

#[test]
fn test_end_restores_clean_scene() {
    let mut rig = Rig::new(SpaceMode::Immediate);
    rig.ready();
    let c = ControllerId::RIGHT;
    rig.aim_at_nothing(c);
    rig.send(InputEvent::select_start(c));
    let groups: Vec<_> = rig.media.registry().iter().map(|record| record.toolbar_group()).collect();

    rig.media.end(&mut rig.scene);
    assert!(rig.media.registry().is_empty());
    assert!(groups.iter().all(|group| !rig.scene.contains(*group)));
    assert_eq!(rig.scene.marker(c), None);
}
