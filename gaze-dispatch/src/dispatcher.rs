use crate::{ControllerLink, DispatchError, PointGoal};

use log::{debug, info};
use std::time::Duration;

/// Connection lifecycle of a [`GoalDispatcher`].
///
/// `Ready` and `Failed` are terminal: a dispatcher that exhausted its
/// handshake attempts stays failed, and the process is expected to abort
/// startup rather than retry forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    Failed,
}

/// Bounds on the startup handshake. The worst-case blocking time of
/// [`GoalDispatcher::connect`] is `attempt_timeout * max_attempts`.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeConfig {
    /// Wait per handshake probe.
    pub attempt_timeout: Duration,
    /// Probes before giving up.
    pub max_attempts: u32,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(2),
            max_attempts: 3,
        }
    }
}

/// Owns the connection to the remote head controller and submits pointing
/// goals over it.
///
/// [`connect`](Self::connect) is executed once, before event processing
/// begins; it is the only operation here that blocks by design. Once
/// ready, [`send_goal`](Self::send_goal) is fire-and-forget: it returns
/// as soon as the transport has taken the goal, and a submission failure
/// is returned to the caller without being retried.
pub struct GoalDispatcher<L> {
    link: L,
    handshake: HandshakeConfig,
    state: ConnectionState,
}

impl<L: ControllerLink> GoalDispatcher<L> {
    pub fn new(link: L, handshake: HandshakeConfig) -> Self {
        Self {
            link,
            handshake,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Performs the bounded-retry handshake with the controller.
    ///
    /// Blocks at most `attempt_timeout` per probe for up to `max_attempts`
    /// probes. On exhaustion the dispatcher transitions to the terminal
    /// `Failed` state and every later call keeps returning
    /// [`DispatchError::ActuatorUnavailable`].
    pub fn connect(&mut self) -> Result<(), DispatchError> {
        match self.state {
            ConnectionState::Ready => return Ok(()),
            ConnectionState::Failed => {
                return Err(DispatchError::ActuatorUnavailable {
                    attempts: self.handshake.max_attempts,
                })
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => {}
        }
        self.state = ConnectionState::Connecting;
        for attempt in 1..=self.handshake.max_attempts {
            debug!(
                "waiting for the head controller to come up (attempt {}/{})",
                attempt, self.handshake.max_attempts
            );
            if self.link.wait_for_server(self.handshake.attempt_timeout) {
                info!("head controller is up after {} attempt(s)", attempt);
                self.state = ConnectionState::Ready;
                return Ok(());
            }
        }
        self.state = ConnectionState::Failed;
        Err(DispatchError::ActuatorUnavailable {
            attempts: self.handshake.max_attempts,
        })
    }

    /// Submits one goal to the controller and returns once the transport
    /// has taken it. Never waits for the motion to complete; a goal
    /// submitted while a previous one is still executing supersedes it on
    /// the controller side.
    ///
    /// Fails with [`DispatchError::NotConnected`] unless the handshake has
    /// completed. A transport failure is reported as
    /// [`DispatchError::Submission`] and leaves the dispatcher ready for
    /// the next goal.
    pub fn send_goal(&mut self, goal: PointGoal) -> Result<(), DispatchError> {
        if self.state != ConnectionState::Ready {
            return Err(DispatchError::NotConnected { state: self.state });
        }
        self.link.send_goal(goal).map_err(DispatchError::Submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GoalConfig, LinkError};
    use gaze_core::nalgebra::Point3;
    use gaze_core::OpticalPoint;
    use std::thread;
    use std::time::Instant;

    /// Mock link whose handshake succeeds only after a set number of
    /// failed probes, each consuming its full timeout.
    struct FlakyLink {
        fail_probes: u32,
        probes: u32,
        fail_sends: bool,
        sent: Vec<PointGoal>,
    }

    impl FlakyLink {
        fn new(fail_probes: u32) -> Self {
            Self {
                fail_probes,
                probes: 0,
                fail_sends: false,
                sent: Vec::new(),
            }
        }
    }

    impl ControllerLink for FlakyLink {
        fn wait_for_server(&mut self, timeout: Duration) -> bool {
            self.probes += 1;
            if self.probes > self.fail_probes {
                true
            } else {
                thread::sleep(timeout);
                false
            }
        }

        fn send_goal(&mut self, goal: PointGoal) -> Result<(), LinkError> {
            if self.fail_sends {
                return Err(LinkError::Disconnected);
            }
            self.sent.push(goal);
            Ok(())
        }
    }

    fn any_goal() -> PointGoal {
        GoalConfig::default().goal(OpticalPoint(Point3::new(0.0, 0.0, 1.0)))
    }

    fn quick_handshake() -> HandshakeConfig {
        HandshakeConfig {
            attempt_timeout: Duration::from_millis(50),
            max_attempts: 3,
        }
    }

    #[test]
    fn connects_on_first_successful_probe() {
        let mut dispatcher = GoalDispatcher::new(FlakyLink::new(0), quick_handshake());
        assert_eq!(dispatcher.state(), ConnectionState::Disconnected);
        dispatcher.connect().unwrap();
        assert_eq!(dispatcher.state(), ConnectionState::Ready);
        assert_eq!(dispatcher.link().probes, 1);
    }

    #[test]
    fn retries_then_connects() {
        let mut dispatcher = GoalDispatcher::new(FlakyLink::new(2), quick_handshake());
        dispatcher.connect().unwrap();
        assert_eq!(dispatcher.state(), ConnectionState::Ready);
        assert_eq!(dispatcher.link().probes, 3);
    }

    #[test]
    fn exhausts_exactly_max_attempts_then_fails() {
        let mut dispatcher = GoalDispatcher::new(FlakyLink::new(u32::MAX), quick_handshake());
        let start = Instant::now();
        let err = dispatcher.connect().unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(
            err,
            DispatchError::ActuatorUnavailable { attempts: 3 }
        ));
        assert_eq!(dispatcher.state(), ConnectionState::Failed);
        assert_eq!(dispatcher.link().probes, 3);
        // Total blocking time is attempts x timeout, within scheduling slop.
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(5));

        // Failed is terminal: connecting again does not probe anew.
        assert!(dispatcher.connect().is_err());
        assert_eq!(dispatcher.link().probes, 3);
    }

    #[test]
    fn goals_are_rejected_until_ready() {
        let mut dispatcher = GoalDispatcher::new(FlakyLink::new(0), quick_handshake());
        assert!(matches!(
            dispatcher.send_goal(any_goal()),
            Err(DispatchError::NotConnected {
                state: ConnectionState::Disconnected
            })
        ));
        dispatcher.connect().unwrap();
        dispatcher.send_goal(any_goal()).unwrap();
        assert_eq!(dispatcher.link().sent.len(), 1);
    }

    #[test]
    fn submission_failure_is_reported_and_not_fatal() {
        let mut dispatcher = GoalDispatcher::new(FlakyLink::new(0), quick_handshake());
        dispatcher.connect().unwrap();

        dispatcher.link.fail_sends = true;
        assert!(matches!(
            dispatcher.send_goal(any_goal()),
            Err(DispatchError::Submission(LinkError::Disconnected))
        ));
        // The dispatcher stays ready and the next goal goes through.
        assert_eq!(dispatcher.state(), ConnectionState::Ready);
        dispatcher.link.fail_sends = false;
        dispatcher.send_goal(any_goal()).unwrap();
        assert_eq!(dispatcher.link().sent.len(), 1);
    }
}
