//! Dispatch of pointing goals to a remote head controller.
//!
//! The controller is a separate process which may start after us, respond
//! slowly, or never come up at all, so [`GoalDispatcher`] owns an explicit
//! connection lifecycle: a bounded-retry handshake executed once at
//! startup, then fire-and-forget goal submission. Submitting a goal hands
//! it to the transport for delivery and returns immediately; the
//! controller's motion is never awaited, and each new goal supersedes
//! whatever the controller was still executing.
//!
//! The transport itself is behind the [`ControllerLink`] trait.
//! [`ChannelLink`] and [`SimController`] provide an in-process
//! implementation used by the sandbox binary and the tests.

mod dispatcher;
mod goal;
mod link;

pub use dispatcher::*;
pub use goal::*;
pub use link::*;

/// Failure modes of the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The handshake exhausted every attempt without the controller
    /// coming up. Fatal at startup: the operator must fix the environment
    /// and restart.
    #[error("head controller not available after {attempts} handshake attempts")]
    ActuatorUnavailable { attempts: u32 },
    /// A goal was submitted while the dispatcher was not in the ready
    /// state.
    #[error("goal rejected: dispatcher is {state:?}, not ready")]
    NotConnected { state: ConnectionState },
    /// The transport failed to take the goal. The goal is dropped, not
    /// retried; pointing intents are ephemeral and at-most-once.
    #[error("goal submission failed")]
    Submission(#[source] LinkError),
}

/// Failure modes of a [`ControllerLink`] transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// The controller endpoint has gone away.
    #[error("the controller endpoint is disconnected")]
    Disconnected,
}
