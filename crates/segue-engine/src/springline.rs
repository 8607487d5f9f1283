//! Cursor-reactive spring line.
//!
//! A decorative horizontal line bends toward the cursor and springs back
//! when it leaves. The simulation is a critically-under-damped spring on
//! one scalar (the vertical bend of the path's control point), advanced
//! one fixed step per frame:
//!
//! ```text
//! velocity += (target - position) * stiffness
//! velocity *= damping
//! position += velocity
//! ```
//!
//! The controller self-stops: once velocity and remaining displacement
//! fall under the rest epsilon it snaps exactly to the straight-line rest
//! state and returns `TickOutcome::Stop`, so an idle line costs nothing.

use segue_config::SpringConfig;

use crate::animation::scheduler::TickOutcome;

/// One frame's worth of spring state, exposed for the host to render.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringState {
    /// Vertical bend of the control point, relative to the resting line.
    pub position: f64,
    /// Current bend velocity.
    pub velocity: f64,
    /// Bend the spring is pulling toward.
    pub target: f64,
    /// Horizontal position of the control point.
    pub control_x: f64,
    /// Horizontal position the control point eases toward.
    pub target_x: f64,
}

/// The bent-line simulator.
#[derive(Debug, Clone)]
pub struct SpringLine {
    config: SpringConfig,
    state: SpringState,
    /// Vertical page position of the resting line.
    line_y: f64,
    last_pointer_y: Option<f64>,
    running: bool,
}

impl SpringLine {
    /// Line resting at page position `line_y`.
    pub fn new(config: SpringConfig, line_y: f64) -> Self {
        Self {
            config,
            state: SpringState::default(),
            line_y,
            last_pointer_y: None,
            running: false,
        }
    }

    /// Current simulation state.
    pub fn state(&self) -> SpringState {
        self.state
    }

    /// The SVG-path control point the host renders: the bend expressed in
    /// page coordinates.
    pub fn control_point(&self) -> (f64, f64) {
        (self.state.control_x, self.line_y + self.state.position)
    }

    /// Whether the update loop should be scheduled.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feed a cursor position.
    ///
    /// Inside the proximity radius the bend target grows as the cursor
    /// nears the line, pushed away from it, plus a boost from the cursor's
    /// recent vertical speed so fast swipes ring harder than slow hovers.
    /// Beyond the radius the target is zero: a cursor parked far away
    /// leaves the line springing back to straight.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        let offset = self.line_y - y;
        let distance = offset.abs();
        let radius = self.config.proximity_radius;
        let target = if distance < radius {
            let boost = self
                .last_pointer_y
                .map(|last| (y - last) * self.config.velocity_boost)
                .unwrap_or(0.0);
            (radius - distance) * self.config.proximity_scale * offset.signum() + boost
        } else {
            0.0
        };
        self.last_pointer_y = Some(y);
        self.state.target = target;
        self.state.target_x = x;
        self.running = true;
    }

    /// The cursor left the line's region; spring back to rest.
    pub fn pointer_left(&mut self) {
        self.state.target = 0.0;
        self.last_pointer_y = None;
        // Keep running until the spring settles.
        self.running = true;
    }

    /// Advance one fixed simulation step.
    pub fn update(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stop;
        }
        let state = &mut self.state;
        state.velocity += (state.target - state.position) * self.config.stiffness;
        state.velocity *= self.config.damping;
        state.position += state.velocity;
        // The control x follows without spring dynamics.
        state.control_x += (state.target_x - state.control_x) * 0.2;

        let eps = self.config.rest_epsilon;
        if state.velocity.abs() < eps && (state.target - state.position).abs() < eps {
            // Snap to exact rest so the rendered path is perfectly
            // straight, not epsilon-bent.
            state.position = state.target;
            state.velocity = 0.0;
            state.control_x = state.target_x;
            self.running = false;
            return TickOutcome::Stop;
        }
        TickOutcome::Continue
    }
}

static_assertions::assert_impl_all!(SpringLine: Send);

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SpringConfig {
        SpringConfig {
            stiffness: 0.08,
            damping: 0.85,
            proximity_radius: 160.0,
            proximity_scale: 0.35,
            velocity_boost: 0.2,
            rest_epsilon: 0.05,
        }
    }

    #[test]
    fn bends_toward_the_target() {
        let mut line = SpringLine::new(config(), 500.0);
        line.pointer_moved(300.0, 420.0);
        assert!(line.state().target > 0.0);

        for _ in 0..30 {
            line.update();
        }
        let state = line.state();
        assert!(state.position > 0.0);
        assert!((state.position - state.target).abs() < state.target.abs());
    }

    #[test]
    fn fast_vertical_swipes_boost_the_target() {
        let mut slow = SpringLine::new(config(), 500.0);
        slow.pointer_moved(300.0, 480.0);
        slow.pointer_moved(300.0, 479.0);
        let slow_target = slow.state().target;

        let mut fast = SpringLine::new(config(), 500.0);
        fast.pointer_moved(300.0, 540.0);
        fast.pointer_moved(300.0, 479.0);
        assert!(fast.state().target < slow_target, "upward swipe pushes target down");
    }

    #[test]
    fn settles_to_exact_rest_and_stops() {
        let mut line = SpringLine::new(config(), 500.0);
        line.pointer_moved(300.0, 430.0);
        for _ in 0..10 {
            line.update();
        }
        line.pointer_left();

        let mut frames = 0;
        loop {
            match line.update() {
                TickOutcome::Continue => frames += 1,
                TickOutcome::Stop => break,
            }
            assert!(frames < 600, "spring failed to settle");
        }
        let state = line.state();
        assert_eq!(state.position, 0.0);
        assert_eq!(state.velocity, 0.0);
        assert!(!line.is_running());
        assert_eq!(line.control_point(), (state.control_x, 500.0));
    }

    #[test]
    fn closer_cursors_bend_further() {
        let mut near = SpringLine::new(config(), 500.0);
        near.pointer_moved(300.0, 480.0);
        let mut far = SpringLine::new(config(), 500.0);
        far.pointer_moved(300.0, 380.0);
        assert!(far.state().target > 0.0);
        assert!(near.state().target > far.state().target);
    }

    #[test]
    fn far_parked_cursor_lets_the_line_rest_straight() {
        let mut line = SpringLine::new(config(), 500.0);
        // Bend it first, then park the cursor well outside the radius
        // without ever reporting pointer-left.
        line.pointer_moved(300.0, 460.0);
        for _ in 0..10 {
            line.update();
        }
        line.pointer_moved(300.0, 100.0);
        assert_eq!(line.state().target, 0.0);

        let mut frames = 0;
        while line.update() == TickOutcome::Continue {
            frames += 1;
            assert!(frames < 600, "spring failed to settle");
        }
        assert_eq!(line.state().position, 0.0);
        assert!(!line.is_running());
    }

    #[test]
    fn stopped_line_reports_stop_without_work() {
        let mut line = SpringLine::new(config(), 500.0);
        assert_eq!(line.update(), TickOutcome::Stop);
        assert_eq!(line.state().position, 0.0);
    }

    #[test]
    fn control_x_follows_the_cursor() {
        let mut line = SpringLine::new(config(), 500.0);
        line.pointer_moved(640.0, 490.0);
        for _ in 0..50 {
            line.update();
        }
        let (x, _) = line.control_point();
        assert!((x - 640.0).abs() < 60.0, "control x eases toward cursor, got {x}");
    }

    #[test]
    fn wakes_again_after_rest() {
        let mut line = SpringLine::new(config(), 500.0);
        line.pointer_moved(300.0, 460.0);
        line.pointer_left();
        while line.update() == TickOutcome::Continue {}
        assert!(!line.is_running());

        line.pointer_moved(200.0, 450.0);
        assert!(line.is_running());
        assert_eq!(line.update(), TickOutcome::Continue);
    }
}
