//! A managed media layer: compositor handle, toolbar, and interactive objects.

use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};
use tracing::debug;
use vista_xr::{
    CompositorBinding, ControllerId, LayerHandle, LayerKind, NodeId, Parent, Scene, VideoSource,
};

use crate::config::LayerConfig;
use crate::progress::ProgressBar;
use crate::raycast::{self, Hit, Ray};
use crate::registry::LayerName;

/// Gap between toolbar widgets and around the panel edge.
const TOOLBAR_GAP: f32 = 0.02;
/// Widgets sit slightly in front of the panel so they win the nearest hit.
const WIDGET_DEPTH: f32 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRole {
    Panel,
    PlayPause,
    ProgressTrack,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractiveObject {
    pub node: NodeId,
    pub role: ObjectRole,
    pub half_extents: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toolbar {
    pub group: NodeId,
    pub panel: NodeId,
    pub play_button: NodeId,
    pub track: NodeId,
    pub played: NodeId,
    pub remaining: NodeId,
    pub progress: ProgressBar,
}

impl Toolbar {
    fn sync_segments(&mut self, video: &dyn VideoSource, scene: &mut dyn Scene) {
        self.progress.update(video);
        scene.set_local_transform(self.played, self.progress.played().to_mat4());
        scene.set_local_transform(self.remaining, self.progress.remaining().to_mat4());
    }
}

/// Movable panel that a controller can carry while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraggableOverlay {
    pub node: NodeId,
    /// Pose relative to the toolbar group when not carried.
    pub rest: Mat4,
    pub attached_to: Option<ControllerId>,
}

/// What the per-kind behaviour may touch while handling hits or ticks.
pub struct LayerContext<'a> {
    pub handle: LayerHandle,
    pub video: &'a dyn VideoSource,
    pub toolbar: &'a mut Toolbar,
    pub overlay: Option<&'a DraggableOverlay>,
    pub compositor: &'a dyn CompositorBinding,
    pub scene: &'a mut dyn Scene,
}

pub trait LayerBehavior {
    /// React to a select landing on this layer's objects, nearest hit first.
    fn on_intersect(&mut self, hits: &[Hit], ctx: &mut LayerContext<'_>);

    /// Called once per rendered frame.
    fn on_render_tick(&mut self, ctx: &mut LayerContext<'_>);
}

/// Play/pause toggle or seek for the first hit on a playback widget.
fn apply_playback_hit(hits: &[Hit], ctx: &mut LayerContext<'_>) {
    let Some(hit) = hits
        .iter()
        .find(|hit| matches!(hit.role, ObjectRole::PlayPause | ObjectRole::ProgressTrack))
    else {
        return;
    };

    match hit.role {
        ObjectRole::PlayPause => {
            if ctx.video.is_paused() {
                debug!("layer {:?}: play", ctx.handle);
                ctx.video.play();
            } else {
                debug!("layer {:?}: pause", ctx.handle);
                ctx.video.pause();
            }
        }
        ObjectRole::ProgressTrack => {
            let target = ctx.toolbar.progress.scrub(ctx.video, hit.local_point.x);
            debug!("layer {:?}: seek to {:.2}s", ctx.handle, target);
            ctx.toolbar.sync_segments(ctx.video, ctx.scene);
        }
        ObjectRole::Panel | ObjectRole::Overlay => {}
    }
}

#[derive(Debug, Default)]
pub struct EquirectBehavior;

impl LayerBehavior for EquirectBehavior {
    fn on_intersect(&mut self, hits: &[Hit], ctx: &mut LayerContext<'_>) {
        apply_playback_hit(hits, ctx);
    }

    fn on_render_tick(&mut self, ctx: &mut LayerContext<'_>) {
        ctx.toolbar.sync_segments(ctx.video, ctx.scene);
    }
}

/// Quad panels additionally follow their overlay while it is carried.
#[derive(Debug, Default)]
pub struct QuadBehavior {
    last_pose: Option<Mat4>,
}

impl LayerBehavior for QuadBehavior {
    fn on_intersect(&mut self, hits: &[Hit], ctx: &mut LayerContext<'_>) {
        apply_playback_hit(hits, ctx);
    }

    fn on_render_tick(&mut self, ctx: &mut LayerContext<'_>) {
        ctx.toolbar.sync_segments(ctx.video, ctx.scene);

        let Some(overlay) = ctx.overlay else {
            return;
        };
        let Some(pose) = ctx.scene.world_transform(overlay.node) else {
            return;
        };
        if self.last_pose != Some(pose) {
            ctx.compositor.set_layer_transform(ctx.handle, pose);
            self.last_pose = Some(pose);
        }
    }
}

pub struct MediaLayerRecord {
    name: LayerName,
    kind: LayerKind,
    handle: LayerHandle,
    video: Rc<dyn VideoSource>,
    toolbar: Toolbar,
    objects: Vec<InteractiveObject>,
    overlay: Option<DraggableOverlay>,
    behavior: Box<dyn LayerBehavior>,
}

impl MediaLayerRecord {
    /// Build the toolbar nodes for a freshly created compositor layer.
    ///
    /// The toolbar group is created detached; [`show_toolbar`](Self::show_toolbar)
    /// puts it in the scene.
    pub fn build(
        config: &LayerConfig,
        kind: LayerKind,
        handle: LayerHandle,
        video: Rc<dyn VideoSource>,
        scene: &mut dyn Scene,
    ) -> Self {
        let toolbar_cfg = &config.toolbar;
        let group_world = toolbar_cfg.placement.to_mat4();
        let group = scene.create_node(group_world);

        let bar_width = toolbar_cfg.bar_width;
        let button = toolbar_cfg.button_size;
        let row_height = button.max(toolbar_cfg.bar_height);
        let panel_extents = Vec2::new(
            (bar_width + button + 3.0 * TOOLBAR_GAP) / 2.0,
            (row_height + 2.0 * TOOLBAR_GAP) / 2.0,
        );

        let panel = scene.create_node(Mat4::IDENTITY);
        scene.add(panel, Parent::Node(group));

        let button_x = -panel_extents.x + TOOLBAR_GAP + button / 2.0;
        let play_button = scene.create_node(Mat4::from_translation(Vec3::new(button_x, 0.0, WIDGET_DEPTH)));
        scene.add(play_button, Parent::Node(group));

        let track_x = panel_extents.x - TOOLBAR_GAP - bar_width / 2.0;
        let track = scene.create_node(Mat4::from_translation(Vec3::new(track_x, 0.0, WIDGET_DEPTH)));
        scene.add(track, Parent::Node(group));

        let progress = ProgressBar::new(bar_width);
        let played = scene.create_node(progress.played().to_mat4());
        scene.add(played, Parent::Node(track));
        let remaining = scene.create_node(progress.remaining().to_mat4());
        scene.add(remaining, Parent::Node(track));

        let mut objects = vec![
            InteractiveObject {
                node: play_button,
                role: ObjectRole::PlayPause,
                half_extents: Vec2::splat(button / 2.0),
            },
            InteractiveObject {
                node: track,
                role: ObjectRole::ProgressTrack,
                half_extents: Vec2::new(bar_width / 2.0, toolbar_cfg.bar_height / 2.0),
            },
            InteractiveObject {
                node: panel,
                role: ObjectRole::Panel,
                half_extents: panel_extents,
            },
        ];

        let overlay = config.draggable.then(|| {
            let rest = group_world.inverse() * config.layer_transform();
            let node = scene.create_node(rest);
            scene.add(node, Parent::Node(group));
            objects.push(InteractiveObject {
                node,
                role: ObjectRole::Overlay,
                half_extents: Vec2::from_array(config.size) / 2.0,
            });
            DraggableOverlay {
                node,
                rest,
                attached_to: None,
            }
        });

        let behavior: Box<dyn LayerBehavior> = match kind {
            LayerKind::Equirect => Box::new(EquirectBehavior),
            LayerKind::Quad => Box::new(QuadBehavior::default()),
        };

        Self {
            name: config.name,
            kind,
            handle,
            video,
            toolbar: Toolbar {
                group,
                panel,
                play_button,
                track,
                played,
                remaining,
                progress,
            },
            objects,
            overlay,
            behavior,
        }
    }

    pub fn name(&self) -> LayerName {
        self.name
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn handle(&self) -> LayerHandle {
        self.handle
    }

    pub fn video(&self) -> &Rc<dyn VideoSource> {
        &self.video
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn toolbar_group(&self) -> NodeId {
        self.toolbar.group
    }

    pub fn interactive_objects(&self) -> &[InteractiveObject] {
        &self.objects
    }

    pub fn overlay(&self) -> Option<&DraggableOverlay> {
        self.overlay.as_ref()
    }

    pub fn is_draggable(&self) -> bool {
        self.overlay.is_some()
    }

    /// Controller currently carrying the overlay.
    pub fn dragged_by(&self) -> Option<ControllerId> {
        self.overlay.and_then(|overlay| overlay.attached_to)
    }

    /// Hits of `ray` against this layer's own objects, nearest first.
    pub fn intersect(&self, ray: &Ray, scene: &dyn Scene) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .objects
            .iter()
            .filter_map(|object| {
                let world = scene.world_transform(object.node)?;
                let (distance, point, local_point) =
                    raycast::intersect_rect(ray, world, object.half_extents)?;
                Some(Hit {
                    object: object.node,
                    role: object.role,
                    distance,
                    point,
                    local_point,
                })
            })
            .collect();
        raycast::sort_hits(&mut hits);
        hits
    }

    pub fn on_intersect(&mut self, hits: &[Hit], compositor: &dyn CompositorBinding, scene: &mut dyn Scene) {
        let mut ctx = LayerContext {
            handle: self.handle,
            video: self.video.as_ref(),
            toolbar: &mut self.toolbar,
            overlay: self.overlay.as_ref(),
            compositor,
            scene,
        };
        self.behavior.on_intersect(hits, &mut ctx);
    }

    pub fn on_render_tick(&mut self, compositor: &dyn CompositorBinding, scene: &mut dyn Scene) {
        let mut ctx = LayerContext {
            handle: self.handle,
            video: self.video.as_ref(),
            toolbar: &mut self.toolbar,
            overlay: self.overlay.as_ref(),
            compositor,
            scene,
        };
        self.behavior.on_render_tick(&mut ctx);
    }

    pub fn show_toolbar(&self, scene: &mut dyn Scene) {
        scene.add(self.toolbar.group, Parent::Root);
    }

    /// Take the toolbar out of the scene, dropping the overlay from any controller.
    pub fn hide_toolbar(&mut self, scene: &mut dyn Scene) {
        scene.remove(self.toolbar.group);
        self.restore_overlay(scene);
    }

    /// Hand the overlay to `controller`, keeping its current world pose.
    pub fn attach_overlay(&mut self, controller: ControllerId, scene: &mut dyn Scene) -> bool {
        let Some(overlay) = self.overlay.as_mut() else {
            return false;
        };
        scene.attach(overlay.node, Parent::Controller(controller));
        overlay.attached_to = Some(controller);
        true
    }

    /// Put the overlay back at its layer-relative rest pose.
    pub fn restore_overlay(&mut self, scene: &mut dyn Scene) {
        if let Some(overlay) = self.overlay.as_mut() {
            scene.set_local_transform(overlay.node, overlay.rest);
            scene.add(overlay.node, Parent::Node(self.toolbar.group));
            overlay.attached_to = None;
        }
    }
}
