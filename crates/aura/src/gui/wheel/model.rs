use aurakit::rng::RandomSource;
use aurakit::wheel::{SpinPlan, Wheel, backing_size, clamp_diameter};
use cairo::ImageSurface;
use std::time::Instant;

pub const DEFAULT_DIAMETER: f64 = 520.0;

/// Pre-rendered wheel face, valid for one diameter and scale.
pub struct FaceCache {
    pub surface: ImageSurface,
    pub diameter: f64,
    pub scale: f64,
}

/// Everything the draw function needs besides the spin state itself.
pub struct WheelView {
    pub diameter: f64,
    pub labels: Vec<String>,
    pub face: Option<FaceCache>,
    animation: Option<(SpinPlan, Instant)>,
}

impl WheelView {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            diameter: DEFAULT_DIAMETER,
            labels,
            face: None,
            animation: None,
        }
    }

    /// Returns `true` when the diameter changed and the face must be redrawn.
    pub fn resize(&mut self, container_width: f64, viewport_width: f64) -> bool {
        let d = clamp_diameter(container_width, viewport_width);
        if (d - self.diameter).abs() < f64::EPSILON {
            return false;
        }
        log::debug!("Wheel diameter {} -> {}", self.diameter, d);
        self.diameter = d;
        self.face = None;
        true
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
        self.face = None;
    }

    pub fn face_is_current(&self, scale: f64) -> bool {
        self.face.as_ref().is_some_and(|f| {
            backing_size(f.diameter, f.scale) == backing_size(self.diameter, scale)
                && (f.diameter - self.diameter).abs() < f64::EPSILON
        })
    }

    pub fn start(&mut self, plan: SpinPlan) {
        self.animation = Some((plan, Instant::now()));
    }

    pub fn stop(&mut self) {
        self.animation = None;
    }

    pub fn is_finished(&self) -> bool {
        self.animation
            .as_ref()
            .is_none_or(|(plan, t)| plan.is_finished(t.elapsed()))
    }

    /// Angle to draw the wheel at right now.
    pub fn current_rotation<R: RandomSource>(&self, wheel: &Wheel<R>) -> f64 {
        match &self.animation {
            Some((plan, started)) => plan.rotation_at(started.elapsed()),
            None => wheel.rotation().phase(),
        }
    }
}
