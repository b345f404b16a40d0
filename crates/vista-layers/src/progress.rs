//! Toolbar progress bar: playback position to bar geometry and back.
//!
//! The bar is two unit-width segments laid end to end along local x and
//! centred on the bar origin. The played segment grows from the left edge,
//! the remaining segment fills the rest up to the right edge.

use glam::{Mat4, Quat, Vec3};
use vista_xr::VideoSource;

/// Depth offset keeping segments in front of the track they decorate.
const SEGMENT_DEPTH: f32 = 0.001;
/// Segments never collapse to a singular transform.
const MIN_SEGMENT_SCALE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Horizontal scale, equal to the segment's length in bar units.
    pub scale: f32,
    /// Local x of the segment centre.
    pub center: f32,
}

impl Segment {
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.scale.max(MIN_SEGMENT_SCALE), 1.0, 1.0),
            Quat::IDENTITY,
            Vec3::new(self.center, 0.0, SEGMENT_DEPTH),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    width: f32,
    played: Segment,
    remaining: Segment,
}

impl ProgressBar {
    pub fn new(width: f32) -> Self {
        let mut bar = Self {
            width,
            played: Segment { scale: 0.0, center: 0.0 },
            remaining: Segment { scale: 0.0, center: 0.0 },
        };
        bar.set_progress(0.0);
        bar
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn played(&self) -> Segment {
        self.played
    }

    pub fn remaining(&self) -> Segment {
        self.remaining
    }

    /// Resize both segments from the video's playhead.
    pub fn update(&mut self, video: &dyn VideoSource) {
        self.set_progress(playback_fraction(video.current_time(), video.duration()));
    }

    /// Seek `video` to the time under local bar coordinate `x_local`.
    ///
    /// Returns the requested time. The source may land on a nearby seek
    /// point rather than this exact time.
    pub fn scrub(&self, video: &dyn VideoSource, x_local: f32) -> f64 {
        let duration = video.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return video.current_time();
        }
        let half = self.width / 2.0;
        let fraction = ((x_local + half) / self.width).clamp(0.0, 1.0);
        let target = fraction as f64 * duration;
        video.set_current_time(target);
        target
    }

    fn set_progress(&mut self, fraction: f32) {
        let half = self.width / 2.0;
        let progress = fraction.clamp(0.0, 1.0) * self.width;
        let remaining = self.width - progress;

        self.played = Segment {
            scale: progress,
            center: -half + progress / 2.0,
        };
        self.remaining = Segment {
            scale: remaining,
            center: half - remaining / 2.0,
        };
    }
}

fn playback_fraction(current: f64, duration: f64) -> f32 {
    if !duration.is_finite() || duration <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    (current / duration).clamp(0.0, 1.0) as f32
}
