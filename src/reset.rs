use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bank::{AttitudeBank, RateBank, Role};

/// Which blocks are returned to rest while the motors are stopped.
///
/// The default keeps the rate compensator C2 running across motor stops while
/// every other stateful block is reset.
/// [`ResetPolicy::full`] covers C2 as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPolicy {
    /// Attitude reference model on both axes.
    pub attitude_model: bool,
    /// Rate reference model on both axes.
    pub rate_model: bool,
    /// C1 on both axes.
    pub attitude_compensator: bool,
    /// C2 on both axes.
    pub rate_compensator: bool,
    /// Both feedforward stages on both axes.
    pub feedforward: bool,
    /// Integral of any compensator running as a single-loop PID, even when
    /// the compensator itself is not covered.
    pub legacy_pid_integral: bool,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            attitude_model: true,
            rate_model: true,
            attitude_compensator: true,
            rate_compensator: false,
            feedforward: true,
            legacy_pid_integral: true,
        }
    }
}

impl ResetPolicy {
    /// Every stateful block, C2 included.
    pub fn full() -> Self {
        Self {
            rate_compensator: true,
            ..Self::default()
        }
    }

    /// True when blocks in `role` are returned to rest while stopped.
    pub fn covers(&self, role: Role) -> bool {
        match role {
            Role::AttitudeModel => self.attitude_model,
            Role::RateModel => self.rate_model,
            Role::AttitudeCompensator => self.attitude_compensator,
            Role::RateCompensator => self.rate_compensator,
            Role::FeedforwardStage1 | Role::FeedforwardStage2 => self.feedforward,
        }
    }

    /// Stateful roles left running across a motor stop.
    pub fn uncovered(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL
            .into_iter()
            .filter(move |role| !self.covers(*role))
    }

    fn reset_attitude(&self, bank: &mut AttitudeBank) {
        for axis in bank.axes.iter_mut() {
            if self.attitude_model {
                axis.attitude_model.reset();
            }
            if self.rate_model {
                axis.rate_model.reset();
            }
            if self.attitude_compensator {
                axis.compensator.reset();
            } else if self.legacy_pid_integral {
                axis.compensator.reset_integral();
            }
        }
    }

    fn reset_rate(&self, bank: &mut RateBank) {
        for axis in bank.axes.iter_mut() {
            if self.rate_compensator {
                axis.compensator.reset();
            } else if self.legacy_pid_integral {
                axis.compensator.reset_integral();
            }
            if self.feedforward {
                axis.feedforward_stage1.reset();
                axis.feedforward_stage2.reset();
            }
        }
    }
}

/// Change of the motor-stop level between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTransition {
    Unchanged,
    /// Stop asserted on this tick.
    Stopped,
    /// Stop released on this tick.
    Released,
}

/// Tracks the motor-stop level one loop samples every tick.
#[derive(Debug, Clone, Default)]
pub struct MotorStopMonitor {
    stopped: bool,
    stop_events: u32,
}

impl MotorStopMonitor {
    /// Records this tick's level and reports the edge, if any.
    pub fn sample(&mut self, stopped: bool) -> StopTransition {
        let transition = match (self.stopped, stopped) {
            (false, true) => {
                self.stop_events = self.stop_events.wrapping_add(1);
                StopTransition::Stopped
            }
            (true, false) => StopTransition::Released,
            _ => StopTransition::Unchanged,
        };
        self.stopped = stopped;
        transition
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of stop edges seen, wrapping.
    pub fn stop_events(&self) -> u32 {
        self.stop_events
    }
}

/// Applies the reset policy to one loop's blocks.
///
/// The stop condition is a level: while it holds, the covered blocks are
/// reset on every tick, after that tick's update, so the following tick always
/// starts from rest. Only the edges are logged.
#[derive(Debug, Clone)]
pub struct ResetCoordinator {
    policy: ResetPolicy,
    monitor: MotorStopMonitor,
    scope: &'static str,
}

impl ResetCoordinator {
    /// # Arguments
    ///
    /// * `policy` - Blocks to reset while stopped
    /// * `scope` - Loop name attached to the edge logs
    pub fn new(policy: ResetPolicy, scope: &'static str) -> Self {
        Self {
            policy,
            monitor: MotorStopMonitor::default(),
            scope,
        }
    }

    pub fn policy(&self) -> &ResetPolicy {
        &self.policy
    }

    pub fn monitor(&self) -> &MotorStopMonitor {
        &self.monitor
    }

    /// Samples the stop level and resets the covered attitude-loop blocks
    /// while it holds. Call after the tick's update.
    pub fn attitude(&mut self, motors_stopped: bool, bank: &mut AttitudeBank) -> StopTransition {
        let transition = self.observe(motors_stopped);
        if motors_stopped {
            self.policy.reset_attitude(bank);
        }
        transition
    }

    /// Rate-loop counterpart of [`attitude`](Self::attitude).
    pub fn rate(&mut self, motors_stopped: bool, bank: &mut RateBank) -> StopTransition {
        let transition = self.observe(motors_stopped);
        if motors_stopped {
            self.policy.reset_rate(bank);
        }
        transition
    }

    fn observe(&mut self, motors_stopped: bool) -> StopTransition {
        let transition = self.monitor.sample(motors_stopped);
        match transition {
            StopTransition::Stopped => info!(
                scope = self.scope,
                events = self.monitor.stop_events(),
                "motors stopped, holding controller state at rest"
            ),
            StopTransition::Released => info!(scope = self.scope, "motors released"),
            StopTransition::Unchanged => {}
        }
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{Axis, ControllerBank};
    use crate::config::ControlConfig;

    fn excite(bank: &mut ControllerBank) {
        for axis in bank.attitude.axes.iter_mut() {
            for _ in 0..10 {
                axis.attitude_model.update(5.0);
                axis.rate_model.update(5.0);
                axis.compensator.update(1.0, 0.0, 0.0, 0.001);
            }
        }
        for axis in bank.rate.axes.iter_mut() {
            for _ in 0..10 {
                axis.compensator.update(1.0, 0.0, 0.0, 0.001);
                axis.feedforward_stage1.update(5.0);
                axis.feedforward_stage2.update(5.0);
            }
        }
    }

    #[test]
    fn test_default_policy_leaves_rate_compensator() {
        let policy = ResetPolicy::default();
        let uncovered: Vec<_> = policy.uncovered().collect();
        assert_eq!(uncovered, vec![Role::RateCompensator]);
        assert_eq!(ResetPolicy::full().uncovered().count(), 0);
    }

    #[test]
    fn test_reset_covers_policy_roles_only() {
        let policy = ResetPolicy::default();
        let mut bank = ControllerBank::build(&ControlConfig::default()).unwrap();
        excite(&mut bank);

        let mut attitude = ResetCoordinator::new(policy, "attitude");
        let mut rate = ResetCoordinator::new(policy, "rate");
        attitude.attitude(true, &mut bank.attitude);
        rate.rate(true, &mut bank.rate);

        for entry in bank.entries() {
            assert_eq!(
                entry.block.is_at_rest(),
                policy.covers(entry.role),
                "{:?} {:?}",
                entry.axis,
                entry.role
            );
        }
    }

    #[test]
    fn test_no_reset_while_running() {
        let mut bank = ControllerBank::build(&ControlConfig::default()).unwrap();
        excite(&mut bank);

        let mut coordinator = ResetCoordinator::new(ResetPolicy::full(), "attitude");
        assert_eq!(
            coordinator.attitude(false, &mut bank.attitude),
            StopTransition::Unchanged
        );
        assert!(!bank.attitude.axis(Axis::Roll).attitude_model.is_at_rest());
    }

    #[test]
    fn test_monitor_edges() {
        let mut monitor = MotorStopMonitor::default();
        assert_eq!(monitor.sample(false), StopTransition::Unchanged);
        assert_eq!(monitor.sample(true), StopTransition::Stopped);
        assert_eq!(monitor.sample(true), StopTransition::Unchanged);
        assert!(monitor.is_stopped());
        assert_eq!(monitor.sample(false), StopTransition::Released);
        assert_eq!(monitor.sample(true), StopTransition::Stopped);
        assert_eq!(monitor.stop_events(), 2);
    }
}
