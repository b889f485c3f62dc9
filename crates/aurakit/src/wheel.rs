//! Geometry and spin state for the crystal wheel.
//!
//! Angles are in degrees, measured clockwise from 12 o'clock. At rotation 0,
//! sector `i` spans `[i * step, (i + 1) * step)`. Rotating the wheel by `r`
//! moves a point at wheel angle `a` to screen angle `a + r`.

use crate::rng::RandomSource;
use std::time::Duration;

/// Screen angle of the fixed pointer (top of the wheel).
pub const POINTER_ANGLE: f64 = 0.0;
pub const MIN_TURNS: u32 = 5;
pub const MAX_TURNS: u32 = 7;
pub const SPIN_DURATION: Duration = Duration::from_secs(4);

pub const LABEL_RADIUS_FACTOR: f64 = 0.55; // label distance from center
pub const CHORD_MARGIN: f64 = 0.9;
pub const LINE_HEIGHT_FACTOR: f64 = 1.05;
pub const RIM_PADDING: f64 = 2.0;

pub const MOBILE_VIEWPORT_WIDTH: f64 = 640.0;
pub const MOBILE_DIAMETER_RANGE: (f64, f64) = (260.0, 380.0);
pub const DESKTOP_DIAMETER_RANGE: (f64, f64) = (480.0, 600.0);
pub const COMPACT_WHEEL_DIAMETER: f64 = 420.0;

pub const SECTOR_COLORS: [&str; 16] = [
    "#5D4B8A", "#316B87", "#7A5FA8", "#2F5074", "#8A5675", "#4A3568", "#589E8A", "#A870C9",
    "#D4AF37", "#396982", "#9A6E3A", "#5F2478", "#2F7A55", "#7C3FA2", "#3E365F", "#91783F",
];

pub fn sector_color(index: usize) -> &'static str {
    SECTOR_COLORS[index % SECTOR_COLORS.len()]
}

pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Shortest distance between two angles, in `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelLayout {
    count: usize,
}

impl WheelLayout {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn sector_angle(&self) -> f64 {
        360.0 / self.count.max(1) as f64
    }

    pub fn sector_span(&self, index: usize) -> (f64, f64) {
        let step = self.sector_angle();
        (index as f64 * step, (index + 1) as f64 * step)
    }

    pub fn center_angle(&self, index: usize) -> f64 {
        (index as f64 + 0.5) * self.sector_angle()
    }

    /// Index of the sector whose center is nearest to wheel angle `angle`.
    pub fn nearest_sector(&self, angle: f64) -> usize {
        let angle = normalize_degrees(angle);
        (0..self.count.max(1))
            .min_by(|&a, &b| {
                angle_difference(angle, self.center_angle(a))
                    .total_cmp(&angle_difference(angle, self.center_angle(b)))
            })
            .unwrap_or(0)
    }

    /// Sector sitting under the pointer when the wheel is rotated by `rotation`.
    pub fn sector_under_pointer(&self, rotation: f64) -> usize {
        self.nearest_sector(POINTER_ANGLE - rotation)
    }

    /// Extra rotation in `[0, 360)` that brings the center of `index` under
    /// the pointer, starting from `rotation`.
    pub fn alignment_offset(&self, index: usize, rotation: f64) -> f64 {
        normalize_degrees(POINTER_ANGLE - self.center_angle(index) - rotation)
    }

    pub fn label_radius(&self, wheel_radius: f64) -> f64 {
        wheel_radius * LABEL_RADIUS_FACTOR
    }

    /// Width available to a label at the label radius.
    pub fn label_chord(&self, wheel_radius: f64) -> f64 {
        let r = self.label_radius(wheel_radius);
        let half = self.sector_angle().to_radians() / 2.0;
        if self.sector_angle() >= 180.0 {
            2.0 * r * CHORD_MARGIN
        } else {
            2.0 * r * half.tan() * CHORD_MARGIN
        }
    }

    /// Label anchor relative to the wheel center at rotation 0, in screen
    /// coordinates (y grows downwards).
    pub fn label_anchor(&self, index: usize, wheel_radius: f64) -> (f64, f64) {
        let r = self.label_radius(wheel_radius);
        let a = self.center_angle(index).to_radians();
        (r * a.sin(), -r * a.cos())
    }
}

/// Cumulative wheel rotation kept as whole turns plus a phase in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    turns: u64,
    phase: f64,
}

impl Rotation {
    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn degrees(&self) -> f64 {
        self.turns as f64 * 360.0 + self.phase
    }

    /// Moves forward by `turns` full turns plus `offset` degrees (`offset >= 0`).
    pub fn advanced(self, turns: u32, offset: f64) -> Self {
        let raw = self.phase + offset.max(0.0);
        let carry = (raw / 360.0).floor();
        let mut phase = raw - carry * 360.0;
        let mut turns = self.turns + turns as u64 + carry as u64;
        if phase >= 360.0 {
            phase -= 360.0;
            turns += 1;
        }
        Self {
            turns,
            phase: phase.max(0.0),
        }
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPlan {
    pub target_index: usize,
    pub turns: u32,
    pub offset: f64,
    pub from: Rotation,
    pub to: Rotation,
    pub duration: Duration,
}

impl SpinPlan {
    pub fn total_degrees(&self) -> f64 {
        self.turns as f64 * 360.0 + self.offset
    }

    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Rotation to draw `elapsed` into the animation, normalized to `[0, 360)`.
    pub fn rotation_at(&self, elapsed: Duration) -> f64 {
        let eased = ease_out_cubic(self.progress(elapsed));
        normalize_degrees(self.from.phase() + eased * self.total_degrees())
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinState {
    pub rotation: Rotation,
    pub spinning: bool,
    pub result_index: Option<usize>,
}

pub struct Wheel<R: RandomSource> {
    layout: WheelLayout,
    rng: R,
    rotation: Rotation,
    spinning: bool,
    result_index: Option<usize>,
    pending: Option<SpinPlan>,
    turns_range: (u32, u32),
    duration: Duration,
}

impl<R: RandomSource> Wheel<R> {
    pub fn new(count: usize, rng: R) -> Self {
        Self {
            layout: WheelLayout::new(count),
            rng,
            rotation: Rotation::default(),
            spinning: false,
            result_index: None,
            pending: None,
            turns_range: (MIN_TURNS, MAX_TURNS),
            duration: SPIN_DURATION,
        }
    }

    pub fn with_turns(mut self, min: u32, max: u32) -> Self {
        self.set_turns(min, max);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn set_turns(&mut self, min: u32, max: u32) {
        self.turns_range = (min.min(max), max.max(min));
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Changes the number of sectors. Ignored while a spin is in flight.
    pub fn set_count(&mut self, count: usize) -> bool {
        if self.spinning {
            return false;
        }
        if self.layout.count() != count {
            self.layout = WheelLayout::new(count);
            self.result_index = None;
        }
        true
    }

    /// Starts a spin. Returns `None` (and changes nothing) while another spin
    /// is pending or when the wheel has no sectors.
    pub fn spin(&mut self) -> Option<SpinPlan> {
        if self.spinning || self.layout.is_empty() {
            return None;
        }

        let target_index = self.rng.next_index(self.layout.count());
        let turns = self
            .rng
            .next_in_range(self.turns_range.0, self.turns_range.1);
        let offset = self
            .layout
            .alignment_offset(target_index, self.rotation.phase());

        let plan = SpinPlan {
            target_index,
            turns,
            offset,
            from: self.rotation,
            to: self.rotation.advanced(turns, offset),
            duration: self.duration,
        };

        log::debug!(
            "Spin towards sector {} ({} turns + {:.2} deg)",
            target_index,
            turns,
            offset
        );

        self.spinning = true;
        self.result_index = None;
        self.rotation = plan.to;
        self.pending = Some(plan);
        Some(plan)
    }

    /// Settles the pending spin. The winner is read back from the settled
    /// rotation, not from the planned target.
    pub fn complete(&mut self) -> Option<usize> {
        let plan = self.pending.take()?;
        self.rotation = plan.to;
        self.spinning = false;

        let winner = self.layout.sector_under_pointer(self.rotation.phase());
        if winner != plan.target_index {
            log::warn!(
                "Settled on sector {} instead of planned {}",
                winner,
                plan.target_index
            );
        }
        self.result_index = Some(winner);
        Some(winner)
    }

    /// Called when the wheel is shown again. Clears the last result; a spin
    /// still in flight keeps running and reports when it completes. The
    /// rotation is never rewound.
    pub fn reset(&mut self) {
        self.result_index = None;
        if self.pending.is_none() {
            self.spinning = false;
        }
    }

    pub fn pending(&self) -> Option<&SpinPlan> {
        self.pending.as_ref()
    }

    pub fn layout(&self) -> &WheelLayout {
        &self.layout
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    pub fn result_index(&self) -> Option<usize> {
        self.result_index
    }

    pub fn state(&self) -> SpinState {
        SpinState {
            rotation: self.rotation,
            spinning: self.spinning,
            result_index: self.result_index,
        }
    }
}

/// Drops the first parenthesised part of a name: `"Shungita (Yunguita)"` -> `"Shungita"`.
pub fn label_text(name: &str) -> String {
    match name.find('(') {
        Some(open) => match name[open..].find(')') {
            Some(close) => {
                let head = name[..open].trim_end();
                let tail = &name[open + close + 1..];
                format!("{}{}", head, tail).trim().to_string()
            }
            None => name.trim().to_string(),
        },
        None => name.trim().to_string(),
    }
}

/// Splits `text` into two lines at the first word boundary where both halves
/// fit in `max_width`. Text that fits, or has no workable split, stays whole.
pub fn wrap_label(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if measure(text) <= max_width || words.len() < 2 {
        return vec![text.to_string()];
    }

    (1..words.len())
        .map(|split| (words[..split].join(" "), words[split..].join(" ")))
        .find(|(l1, l2)| measure(l1) <= max_width && measure(l2) <= max_width)
        .map(|(l1, l2)| vec![l1, l2])
        .unwrap_or_else(|| vec![text.to_string()])
}

/// Vertical offsets of each label line around the anchor.
pub fn label_line_offsets(lines: usize, font_size: f64) -> Vec<f64> {
    let line_height = font_size * LINE_HEIGHT_FACTOR;
    if lines <= 1 {
        return vec![0.0];
    }
    let total = line_height * lines as f64;
    (0..lines)
        .map(|i| -total / 2.0 + line_height / 2.0 + i as f64 * line_height)
        .collect()
}

pub fn label_font_size(diameter: f64) -> f64 {
    if diameter < COMPACT_WHEEL_DIAMETER {
        (diameter / 26.0).clamp(12.0, 14.0)
    } else {
        (diameter / 28.0).clamp(16.0, 18.0)
    }
}

pub fn clamp_diameter(container_width: f64, viewport_width: f64) -> f64 {
    let (min, max) = if viewport_width < MOBILE_VIEWPORT_WIDTH {
        MOBILE_DIAMETER_RANGE
    } else {
        DESKTOP_DIAMETER_RANGE
    };
    container_width.clamp(min, max)
}

pub fn wheel_radius(diameter: f64) -> f64 {
    (diameter / 2.0 - RIM_PADDING).max(0.0)
}

/// Backing pixel size for a wheel of `diameter` logical pixels.
pub fn backing_size(diameter: f64, scale: f64) -> i32 {
    (diameter * scale.max(1.0)).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        index: usize,
        turns: u32,
    }

    impl RandomSource for Stub {
        fn next_index(&mut self, bound: usize) -> usize {
            self.index % bound
        }

        fn next_in_range(&mut self, low: u32, high: u32) -> u32 {
            self.turns.clamp(low, high)
        }
    }

    fn stub_wheel(count: usize, index: usize) -> Wheel<Stub> {
        Wheel::new(count, Stub { index, turns: 5 })
    }

    #[test]
    fn test_sixteen_sectors_target_five() {
        let mut wheel = stub_wheel(16, 5);
        let plan = wheel.spin().unwrap();
        assert_eq!(plan.target_index, 5);
        assert!(wheel.is_spinning());

        assert_eq!(wheel.complete(), Some(5));
        assert_eq!(wheel.result_index(), Some(5));
        assert!(!wheel.is_spinning());
    }

    #[test]
    fn test_every_target_settles_under_pointer() {
        for count in 1..=24 {
            for target in 0..count {
                let mut wheel = stub_wheel(count, target);
                // vary the starting rotation with a few prior spins
                for prior in 0..3 {
                    wheel.rng.index = (target + prior * 7) % count;
                    wheel.rng.turns = 5 + (prior as u32 % 3);
                    wheel.spin().unwrap();
                    wheel.complete().unwrap();
                }
                wheel.rng.index = target;
                wheel.spin().unwrap();
                assert_eq!(wheel.complete(), Some(target), "n={} target={}", count, target);

                let phase = wheel.rotation().phase();
                let layout = wheel.layout();
                let under = normalize_degrees(POINTER_ANGLE - phase);
                let best = (0..count)
                    .map(|i| angle_difference(under, layout.center_angle(i)))
                    .fold(f64::INFINITY, f64::min);
                assert!(
                    (angle_difference(under, layout.center_angle(target)) - best).abs() < 1e-9
                );
            }
        }
    }

    #[test]
    fn test_rotation_never_decreases() {
        let mut wheel = Wheel::new(16, crate::rng::Prng::new(99));
        let mut last = wheel.rotation().degrees();
        for _ in 0..200 {
            let plan = wheel.spin().unwrap();
            assert!(plan.total_degrees() >= 5.0 * 360.0);
            assert!(plan.to.degrees() >= last);
            wheel.complete().unwrap();
            let now = wheel.rotation().degrees();
            assert!(now >= last);
            assert!((0.0..360.0).contains(&wheel.rotation().phase()));
            last = now;
        }
    }

    #[test]
    fn test_respin_while_pending_is_noop() {
        let mut wheel = stub_wheel(16, 3);
        wheel.spin().unwrap();
        let before = wheel.state();

        assert!(wheel.spin().is_none());
        assert_eq!(wheel.state(), before);

        assert_eq!(wheel.complete(), Some(3));
        assert_eq!(wheel.complete(), None);
    }

    #[test]
    fn test_reset_keeps_rotation() {
        let mut wheel = stub_wheel(8, 2);
        wheel.spin().unwrap();
        wheel.complete().unwrap();
        let rotation = wheel.rotation();

        wheel.reset();
        assert_eq!(wheel.result_index(), None);
        assert!(!wheel.is_spinning());
        assert_eq!(wheel.rotation(), rotation);
    }

    #[test]
    fn test_reset_during_spin_still_completes() {
        let mut wheel = stub_wheel(8, 6);
        wheel.spin().unwrap();
        wheel.reset();
        assert!(wheel.is_spinning());
        assert!(wheel.spin().is_none());
        assert_eq!(wheel.complete(), Some(6));
    }

    #[test]
    fn test_empty_wheel_does_not_spin() {
        let mut wheel = stub_wheel(0, 0);
        assert!(wheel.spin().is_none());
        assert!(!wheel.is_spinning());
    }

    #[test]
    fn test_set_count_refused_while_spinning() {
        let mut wheel = stub_wheel(8, 1);
        wheel.spin().unwrap();
        assert!(!wheel.set_count(4));
        wheel.complete().unwrap();
        assert!(wheel.set_count(4));
        assert_eq!(wheel.layout().count(), 4);
        assert_eq!(wheel.result_index(), None);
    }

    #[test]
    fn test_layout_spans() {
        let layout = WheelLayout::new(16);
        assert_eq!(layout.sector_angle(), 22.5);
        assert_eq!(layout.sector_span(1), (22.5, 45.0));
        assert_eq!(layout.center_angle(0), 11.25);
        assert_eq!(layout.nearest_sector(359.0), 15);
        assert_eq!(layout.nearest_sector(-1.0), 15);
        assert_eq!(layout.nearest_sector(23.0), 1);
    }

    #[test]
    fn test_rotation_carry() {
        let r = Rotation::default().advanced(5, 350.0).advanced(1, 20.0);
        assert_eq!(r.turns(), 7);
        assert!((r.phase() - 10.0).abs() < 1e-9);
        assert!((r.degrees() - (7.0 * 360.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_animation_endpoints() {
        let mut wheel = stub_wheel(16, 5);
        let plan = wheel.spin().unwrap();
        assert_eq!(plan.rotation_at(Duration::ZERO), plan.from.phase());
        let end = plan.rotation_at(plan.duration);
        assert!(angle_difference(end, plan.to.phase()) < 1e-6);
        assert!(!plan.is_finished(plan.duration / 2));
        assert!(plan.is_finished(plan.duration));
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn test_label_text_strips_parenthesis() {
        assert_eq!(label_text("Cuarzo Cristal (Transparente)"), "Cuarzo Cristal");
        assert_eq!(label_text("Shungita (Yunguita)"), "Shungita");
        assert_eq!(label_text("Ojo de Tigre"), "Ojo de Tigre");
    }

    #[test]
    fn test_wrap_label_greedy() {
        let measure = |s: &str| s.chars().count() as f64 * 10.0;
        assert_eq!(wrap_label("Jade", 50.0, measure), vec!["Jade"]);
        assert_eq!(
            wrap_label("Ojo de Tigre", 70.0, measure),
            vec!["Ojo de", "Tigre"]
        );
        assert_eq!(
            wrap_label("Turmalina Negra", 50.0, measure),
            vec!["Turmalina Negra"]
        );
        assert_eq!(wrap_label("Lapislázuli", 20.0, measure), vec!["Lapislázuli"]);
    }

    #[test]
    fn test_label_geometry() {
        let layout = WheelLayout::new(16);
        let chord = layout.label_chord(100.0);
        let expected = 2.0 * 55.0 * (11.25f64).to_radians().tan() * 0.9;
        assert!((chord - expected).abs() < 1e-9);
        assert!((WheelLayout::new(2).label_chord(100.0) - 99.0).abs() < 1e-9);

        let (x, y) = WheelLayout::new(4).label_anchor(0, 100.0);
        assert!(x > 0.0 && y < 0.0);

        assert_eq!(label_line_offsets(1, 16.0), vec![0.0]);
        let two = label_line_offsets(2, 20.0);
        assert!((two[0] + 10.5).abs() < 1e-9 && (two[1] - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_responsive_sizes() {
        assert_eq!(clamp_diameter(1000.0, 1280.0), 600.0);
        assert_eq!(clamp_diameter(300.0, 1280.0), 480.0);
        assert_eq!(clamp_diameter(500.0, 400.0), 380.0);
        assert_eq!(clamp_diameter(200.0, 400.0), 260.0);

        assert_eq!(label_font_size(260.0), 12.0);
        assert_eq!(label_font_size(380.0), 14.0);
        assert_eq!(label_font_size(600.0), 18.0);
        assert_eq!(label_font_size(480.0), 480.0 / 28.0);

        assert_eq!(backing_size(520.0, 2.0), 1040);
        assert_eq!(wheel_radius(520.0), 258.0);
        assert_eq!(sector_color(17), SECTOR_COLORS[1]);
    }
}
