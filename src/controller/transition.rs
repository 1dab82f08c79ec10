use crate::render::CameraPose;

/// What a camera transition is heading for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionTarget {
    View(String),
    /// Index into the configured object descriptors.
    Object(usize),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub target: TransitionTarget,
    from: CameraPose,
    to: CameraPose,
    duration: f32,
    elapsed: f32,
}

impl Transition {
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn destination(&self) -> &CameraPose {
        &self.to
    }
}

#[derive(Debug, Clone, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    Transitioning(Transition),
}

/// Pose to apply this frame, plus the target when the transition just ended.
#[derive(Debug, Clone)]
pub struct TransitionFrame {
    pub pose: CameraPose,
    pub completed: Option<TransitionTarget>,
}

/// At most one fixed-duration camera transition in flight. Requests made
/// while one is running are dropped.
#[derive(Debug, Default)]
pub struct TransitionMachine {
    state: TransitionState,
}

impl TransitionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning(_))
    }

    pub fn active(&self) -> Option<&Transition> {
        match &self.state {
            TransitionState::Transitioning(transition) => Some(transition),
            TransitionState::Idle => None,
        }
    }

    /// Returns `false` and leaves the in-flight transition untouched when locked.
    pub fn request(
        &mut self,
        target: TransitionTarget,
        from: CameraPose,
        to: CameraPose,
        duration_secs: f32,
    ) -> bool {
        if self.is_locked() {
            log::debug!("Dropping transition to {:?}: another is in flight", target);
            return false;
        }
        self.state = TransitionState::Transitioning(Transition {
            target,
            from,
            to,
            duration: duration_secs.max(1e-3),
            elapsed: 0.0,
        });
        true
    }

    /// Steps the active transition by `dt` seconds. The final frame lands on
    /// the destination pose exactly and returns the machine to idle.
    pub fn advance(&mut self, dt: f32) -> Option<TransitionFrame> {
        let TransitionState::Transitioning(transition) = &mut self.state else {
            return None;
        };
        transition.elapsed += dt.max(0.0);
        if transition.elapsed < transition.duration {
            let t = ease_in_out_quad(transition.progress());
            return Some(TransitionFrame {
                pose: transition.from.lerp(&transition.to, t),
                completed: None,
            });
        }
        let TransitionState::Transitioning(done) = std::mem::take(&mut self.state) else {
            return None;
        };
        Some(TransitionFrame {
            pose: done.to,
            completed: Some(done.target),
        })
    }
}

/// Quadratic ease-in-out ("power2.inOut").
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Quadratic ease-out ("power2.out").
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}
