//! PID controller with forward-Euler integration and anti-windup via
//! back-calculation (Tt).
//!
//! The integral applied on a cycle is the one accumulated *before* that
//! cycle, so the first cycle after [`PidState::reset`] carries no integral
//! contribution. The derivative is zero on that first cycle as well, since
//! there is no previous error to difference against.
//!
//! Zero Ki disables integral; zero Kd disables derivative.

/// Internal state of the PID controller.
///
/// Must be reset (via [`PidState::reset`]) on every setpoint change.
#[derive(Debug, Clone, Copy, Default)]
pub struct PidState {
    /// Integral accumulator (already weighted by Ki).
    integral: f64,
    /// Previous velocity error, `None` right after a reset.
    prev_error: Option<f64>,
    /// Previous raw (unsaturated) PID output, used by anti-windup.
    prev_raw_output: f64,
}

impl PidState {
    /// Reset all internal state to zero.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current integral accumulator.
    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Error seen on the previous cycle, if any.
    #[inline]
    pub fn prev_error(&self) -> Option<f64> {
        self.prev_error
    }
}

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
    /// Anti-windup tracking time constant [s] (0 = disabled).
    pub tt: f64,
    /// Output saturation limit used by anti-windup.
    pub out_max: f64,
}

/// Individual PID contributions of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidTerms {
    /// Proportional term.
    pub p: f64,
    /// Integral term.
    pub i: f64,
    /// Derivative term.
    pub d: f64,
}

impl PidTerms {
    /// Unsaturated PID output.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.p + self.i + self.d
    }
}

/// Compute one PID cycle.
///
/// # Arguments
/// - `state`: Mutable PID internal state.
/// - `gains`: PID gains for this loop.
/// - `error`: Current velocity error (setpoint − measured) [RPM].
/// - `dt`: Cycle period [s].
///
/// # Returns
/// PID terms (unsaturated; the output stage clamps).
#[inline]
pub fn pid_compute(state: &mut PidState, gains: &PidGains, error: f64, dt: f64) -> PidTerms {
    // ── P term ──────────────────────────────────────────────
    let p = gains.kp * error;

    // No elapsed time: integral and derivative memory stay as they are.
    if dt <= 0.0 {
        let i = if gains.ki != 0.0 { state.integral } else { 0.0 };
        return PidTerms { p, i, d: 0.0 };
    }

    // ── I term (forward Euler) ──────────────────────────────
    let i = if gains.ki != 0.0 {
        let applied = state.integral;

        // Back-calculation: feed the saturation excess of the previous
        // cycle back into the accumulator.
        let anti_windup = if gains.tt > 0.0 && gains.out_max > 0.0 {
            let saturated = state.prev_raw_output.clamp(-gains.out_max, gains.out_max);
            (saturated - state.prev_raw_output) / gains.tt
        } else {
            0.0
        };

        state.integral += (gains.ki * error + anti_windup) * dt;
        applied
    } else {
        state.integral = 0.0;
        0.0
    };

    // ── D term ──────────────────────────────────────────────
    let d = match state.prev_error {
        Some(prev) if gains.kd != 0.0 => gains.kd * (error - prev) / dt,
        _ => 0.0,
    };

    state.prev_error = Some(error);

    let terms = PidTerms { p, i, d };
    state.prev_raw_output = terms.sum();
    terms
}

// ─── Tests ──────────────────────────────────────────────────────────
