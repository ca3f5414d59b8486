//! View transition controller: mode toggle, eased camera/box interpolation,
//! interruption and inactivity re-homing.

use super::camera::{CameraPose, SceneFraming, ViewMode, ViewTarget, Viewport, compute_end_pose};
use super::mapper::LayoutParams;

/// Quadratic ease-in-out on `t` clamped to [0, 1].
#[must_use]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[must_use]
fn lerp(a: f64, b: f64, f: f64) -> f64 {
    a + (b - a) * f
}

/// Why a transition was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    Toggle,
    Rehome,
}

/// Start and end of one camera/box interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    pub active: bool,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub start_pose: CameraPose,
    pub end_pose: CameraPose,
    pub start_dims: LayoutParams,
    pub end_dims: LayoutParams,
}

/// Interpolated state at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSample {
    pub pose: CameraPose,
    pub dims: LayoutParams,
    /// Eased interpolation factor.
    pub eased: f64,
    /// Raw progress reached 1.
    pub finished: bool,
}

impl TransitionState {
    /// Inactive state resting at `pose` and `dims`.
    #[must_use]
    pub fn idle(pose: CameraPose, dims: LayoutParams, duration_ms: f64) -> Self {
        Self {
            active: false,
            start_ms: 0.0,
            duration_ms: duration_ms.max(1.0),
            start_pose: pose,
            end_pose: pose,
            start_dims: dims,
            end_dims: dims,
        }
    }

    pub fn begin(
        &mut self,
        now_ms: f64,
        from_pose: CameraPose,
        from_dims: LayoutParams,
        to: ViewTarget,
    ) {
        self.active = true;
        self.start_ms = now_ms;
        self.start_pose = from_pose;
        self.start_dims = from_dims;
        self.end_pose = CameraPose {
            zoom: from_pose.zoom,
            ..to.pose
        };
        self.end_dims = to.dims;
    }

    #[must_use]
    pub fn progress(&self, now_ms: f64) -> f64 {
        ((now_ms - self.start_ms) / self.duration_ms.max(1.0)).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn sample(&self, now_ms: f64) -> TransitionSample {
        let t = self.progress(now_ms);
        if t >= 1.0 {
            return TransitionSample {
                pose: self.end_pose,
                dims: self.end_dims,
                eased: 1.0,
                finished: true,
            };
        }
        let eased = ease_in_out(t);
        let (a, b) = (&self.start_pose, &self.end_pose);

        TransitionSample {
            pose: CameraPose {
                position: a.position.lerp(b.position, eased),
                target: a.target.lerp(b.target, eased),
                orientation: a.orientation.slerp(b.orientation, eased),
                zoom: a.zoom,
            },
            dims: LayoutParams::new(
                lerp(self.start_dims.box_width, self.end_dims.box_width, eased),
                lerp(self.start_dims.box_depth, self.end_dims.box_depth, eased),
            ),
            eased,
            finished: false,
        }
    }
}

/// One-shot timer re-armed by the end of each camera-control gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InactivityTimer {
    delay_ms: f64,
    deadline: Option<f64>,
}

impl InactivityTimer {
    #[must_use]
    pub const fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.delay_ms);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    /// True once when the deadline has passed; the timer is then disarmed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Owns the view mode, the transition state and the inactivity timer.
/// Callers pass the live camera pose and box dimensions in; layout passes
/// stay with the caller.
#[derive(Debug, Clone)]
pub struct TransitionController {
    mode: ViewMode,
    state: TransitionState,
    inactivity: InactivityTimer,
}

impl TransitionController {
    /// Idle controller in orbit mode with the inactivity timer armed at `now_ms`.
    #[must_use]
    pub fn new(
        now_ms: f64,
        pose: CameraPose,
        dims: LayoutParams,
        duration_ms: f64,
        inactivity_ms: f64,
    ) -> Self {
        let mut inactivity = InactivityTimer::new(inactivity_ms);
        inactivity.arm(now_ms);
        Self {
            mode: ViewMode::Orbit,
            state: TransitionState::idle(pose, dims, duration_ms),
            inactivity,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ViewMode {
        self.mode
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.active
    }

    #[must_use]
    pub const fn state(&self) -> &TransitionState {
        &self.state
    }

    #[must_use]
    pub const fn inactivity(&self) -> &InactivityTimer {
        &self.inactivity
    }

    /// Flip the mode and start towards its canonical pose.
    #[allow(clippy::too_many_arguments)]
    pub fn toggle(
        &mut self,
        now_ms: f64,
        pose: CameraPose,
        dims: LayoutParams,
        framing: &SceneFraming,
        viewport: Viewport,
        series_count: usize,
    ) -> ViewMode {
        self.mode = self.mode.toggled();
        self.inactivity.disarm();
        self.start(now_ms, pose, dims, framing, viewport, series_count, TransitionCause::Toggle);
        self.mode
    }

    /// Start back towards the canonical pose of the current mode.
    pub fn rehome(
        &mut self,
        now_ms: f64,
        pose: CameraPose,
        dims: LayoutParams,
        framing: &SceneFraming,
        viewport: Viewport,
        series_count: usize,
    ) {
        self.start(now_ms, pose, dims, framing, viewport, series_count, TransitionCause::Rehome);
    }

    /// Point a running transition at the current mode's canonical pose for
    /// new framing. The start state and clock are kept.
    pub fn retarget(&mut self, framing: &SceneFraming, viewport: Viewport, series_count: usize) {
        if !self.state.active {
            return;
        }
        let target = compute_end_pose(self.mode, framing, viewport, series_count);
        self.state.end_pose = CameraPose {
            zoom: self.state.start_pose.zoom,
            ..target.pose
        };
        self.state.end_dims = target.dims;
    }

    #[allow(clippy::too_many_arguments)]
    fn start(
        &mut self,
        now_ms: f64,
        pose: CameraPose,
        dims: LayoutParams,
        framing: &SceneFraming,
        viewport: Viewport,
        series_count: usize,
        cause: TransitionCause,
    ) {
        let target = compute_end_pose(self.mode, framing, viewport, series_count);
        self.state.begin(now_ms, pose, dims, target);
        log::debug!(
            "transition {cause:?} to {:?} ({:.0}x{:.0})",
            self.mode,
            target.dims.box_width,
            target.dims.box_depth
        );
    }

    /// True when the inactivity deadline passed since the last poll.
    pub fn poll_inactivity(&mut self, now_ms: f64) -> bool {
        self.inactivity.poll(now_ms)
    }

    /// Advance an active transition. The state goes idle on the sample that
    /// reaches the end.
    pub fn step(&mut self, now_ms: f64) -> Option<TransitionSample> {
        if !self.state.active {
            return None;
        }
        let sample = self.state.sample(now_ms);
        if sample.finished {
            self.state.active = false;
            log::debug!("transition finished in {:?}", self.mode);
        }
        Some(sample)
    }

    /// A camera-control gesture began. Returns true when it interrupted a
    /// transition.
    pub fn controls_start(&mut self) -> bool {
        self.inactivity.disarm();
        if self.state.active {
            self.state.active = false;
            log::debug!("transition cancelled by user input");
            true
        } else {
            false
        }
    }

    /// A camera-control gesture ended.
    pub fn controls_end(&mut self, now_ms: f64) {
        self.inactivity.arm(now_ms);
    }

    /// Forget the pending inactivity re-home.
    pub fn disarm_inactivity(&mut self) {
        self.inactivity.disarm();
    }
}
