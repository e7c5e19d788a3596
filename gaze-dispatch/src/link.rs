use crate::{LinkError, PointGoal};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often [`ChannelLink::wait_for_server`] re-checks controller
/// availability while blocked.
const PROBE_INTERVAL: Duration = Duration::from_millis(10);

/// The transport seam between the dispatcher and a head controller.
///
/// `send_goal` must hand the goal off for delivery and return; a transport
/// that blocks until the controller finishes moving is a broken
/// implementation of this trait, not a slow one.
pub trait ControllerLink {
    /// Probes the controller, blocking at most `timeout`. Returns true
    /// once the controller is up and accepting goals.
    fn wait_for_server(&mut self, timeout: Duration) -> bool;

    /// Queues one goal for delivery to the controller.
    fn send_goal(&mut self, goal: PointGoal) -> Result<(), LinkError>;
}

/// In-process [`ControllerLink`] backed by a crossbeam channel to a
/// [`SimController`] thread.
pub struct ChannelLink {
    goals: Sender<PointGoal>,
    up: Arc<AtomicBool>,
}

impl ControllerLink for ChannelLink {
    fn wait_for_server(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.up.load(Ordering::Acquire) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(PROBE_INTERVAL.min(deadline - now));
        }
    }

    fn send_goal(&mut self, goal: PointGoal) -> Result<(), LinkError> {
        // Unbounded queue: this never blocks on the controller's motion.
        self.goals.send(goal).map_err(|_| LinkError::Disconnected)
    }
}

/// A simulated head controller running on its own thread.
///
/// It comes up after `start_delay`, then executes each accepted goal for
/// `execution_time`. A goal arriving mid-motion supersedes the one in
/// progress, mirroring how a preemptive pointing controller behaves. The
/// thread exits once its link is dropped; [`join`](SimController::join)
/// then reports how many goals were accepted.
pub struct SimController {
    worker: JoinHandle<usize>,
}

impl SimController {
    /// Spawns the controller and returns it together with a link to it.
    pub fn spawn(
        name: &str,
        start_delay: Duration,
        execution_time: Duration,
    ) -> (Self, ChannelLink) {
        let (goals, rx) = unbounded();
        let up = Arc::new(AtomicBool::new(false));
        let thread_up = up.clone();
        let thread_name = name.to_owned();
        let worker =
            thread::spawn(move || run(thread_name, rx, thread_up, start_delay, execution_time));
        (Self { worker }, ChannelLink { goals, up })
    }

    /// Waits for the controller thread to exit and returns the number of
    /// goals it accepted. The thread exits when the link has been dropped.
    pub fn join(self) -> usize {
        self.worker.join().unwrap_or(0)
    }
}

fn run(
    name: String,
    rx: Receiver<PointGoal>,
    up: Arc<AtomicBool>,
    start_delay: Duration,
    execution_time: Duration,
) -> usize {
    thread::sleep(start_delay);
    up.store(true, Ordering::Release);
    debug!("{}: accepting goals", name);

    let mut accepted = 0usize;
    let mut active = rx.recv().ok();
    while let Some(goal) = active.take() {
        accepted += 1;
        let bearing = goal.target.point.bearing();
        info!(
            "{}: pointing {} towards ({:.4}, {:.4}, {:.4})",
            name, goal.pointing_frame, bearing.x, bearing.y, bearing.z
        );
        // Simulated motion. Receiving here is what makes a new goal
        // preempt the current one.
        match rx.recv_timeout(execution_time) {
            Ok(next) => {
                debug!("{}: goal superseded before completion", name);
                active = Some(next);
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!("{}: goal reached", name);
                active = rx.recv().ok();
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GoalConfig;
    use gaze_core::nalgebra::Point3;
    use gaze_core::OpticalPoint;

    fn any_goal() -> PointGoal {
        GoalConfig::default().goal(OpticalPoint(Point3::new(0.1, -0.2, 1.0)))
    }

    #[test]
    fn wait_for_server_times_out_while_controller_is_down() {
        let (controller, mut link) =
            SimController::spawn("head", Duration::from_secs(30), Duration::from_millis(10));
        let start = Instant::now();
        assert!(!link.wait_for_server(Duration::from_millis(100)));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(5));
        drop(link);
        assert_eq!(controller.join(), 0);
    }

    #[test]
    fn send_goal_does_not_wait_for_execution() {
        // Execution takes far longer than the whole test is allowed to.
        let (controller, mut link) =
            SimController::spawn("head", Duration::ZERO, Duration::from_secs(60));
        assert!(link.wait_for_server(Duration::from_secs(2)));

        let start = Instant::now();
        link.send_goal(any_goal()).unwrap();
        link.send_goal(any_goal()).unwrap();
        assert!(
            start.elapsed() < Duration::from_millis(250),
            "submission blocked on controller execution"
        );

        drop(link);
        assert_eq!(controller.join(), 2);
    }

    #[test]
    fn slow_goals_are_superseded_by_new_ones() {
        let (controller, mut link) =
            SimController::spawn("head", Duration::ZERO, Duration::from_millis(20));
        assert!(link.wait_for_server(Duration::from_secs(2)));
        for _ in 0..3 {
            link.send_goal(any_goal()).unwrap();
        }
        // Let the last goal's simulated motion finish.
        thread::sleep(Duration::from_millis(100));
        drop(link);
        assert_eq!(controller.join(), 3);
    }
}
