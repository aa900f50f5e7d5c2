//! Session step vocabulary.
//!
//! A sync session is executed step by step: the host passes a
//! [`StepCommand`] in, the engine answers with a [`StepDirective`] telling
//! the host what to do next (send the assembled SyncML message, feed the
//! received one, call again, or stop). Commands and directives share one
//! numbering space on the module boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the host instructs the engine to do in a session step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum StepCommand {
    /// Start a client session (user-initiated).
    ClientStart = 1,
    /// Start a client session (timer/server-alerted).
    ClientAutoStart = 2,
    /// Continue processing.
    Step = 3,
    /// The host has written received data into the buffer.
    GotData = 4,
    /// The host has sent the assembled message.
    SentData = 5,
    /// Suspend the session at the next safe point.
    Suspend = 6,
    /// Abort the session.
    Abort = 7,
    /// The transport failed; the engine decides whether to retry.
    TransportFailed = 8,
    /// The transport timed out.
    Timeout = 9,
}

impl StepCommand {
    /// Raw code for the module boundary.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::ClientStart),
            2 => Some(Self::ClientAutoStart),
            3 => Some(Self::Step),
            4 => Some(Self::GotData),
            5 => Some(Self::SentData),
            6 => Some(Self::Suspend),
            7 => Some(Self::Abort),
            8 => Some(Self::TransportFailed),
            9 => Some(Self::Timeout),
            _ => None,
        }
    }
}

/// What the engine tells the host to do after a session step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum StepDirective {
    /// Call `session_step` again with [`StepCommand::Step`].
    Ok = 10,
    /// A message is assembled; send it, then report [`StepCommand::SentData`].
    SendData = 11,
    /// The engine needs the peer's message; receive it, write it, then
    /// report [`StepCommand::GotData`].
    NeedData = 12,
    /// Resend the previously assembled message unchanged.
    ResendData = 13,
    /// Session wants to run again from the start (e.g. after settings
    /// changed mid-session).
    Restart = 14,
    /// Session has ended; close it.
    Done = 15,
}

impl StepDirective {
    /// Raw code for the module boundary.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            10 => Some(Self::Ok),
            11 => Some(Self::SendData),
            12 => Some(Self::NeedData),
            13 => Some(Self::ResendData),
            14 => Some(Self::Restart),
            15 => Some(Self::Done),
            _ => None,
        }
    }
}

/// Outcome of a single session step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStep {
    /// What the host should do next.
    pub directive: StepDirective,
    /// Progress information produced by this step, if any.
    pub progress: Option<ProgressInfo>,
}

impl SessionStep {
    /// A step outcome with no progress info.
    pub fn directive(directive: StepDirective) -> Self {
        Self {
            directive,
            progress: None,
        }
    }
}

/// Progress event classification.
///
/// The event space is owned by the engine; the constants below are the
/// events every engine reports.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressEvent(u16);

impl ProgressEvent {
    /// Nothing in particular (keepalive).
    pub const NOP: ProgressEvent = ProgressEvent(0);
    /// Session started.
    pub const SESSION_START: ProgressEvent = ProgressEvent(1);
    /// Session ended, `extra1` is the final status code.
    pub const SESSION_END: ProgressEvent = ProgressEvent(2);
    /// Started assembling an outgoing message.
    pub const SEND_START: ProgressEvent = ProgressEvent(3);
    /// Finished assembling an outgoing message.
    pub const SEND_END: ProgressEvent = ProgressEvent(4);
    /// Started processing a received message.
    pub const RECV_START: ProgressEvent = ProgressEvent(5);
    /// Finished processing a received message.
    pub const RECV_END: ProgressEvent = ProgressEvent(6);
    /// Datastore sync started, `target_id` identifies the datastore.
    pub const SYNC_START: ProgressEvent = ProgressEvent(7);
    /// Datastore sync ended.
    pub const SYNC_END: ProgressEvent = ProgressEvent(8);
    /// Item received, `extra1`/`extra2` are done/total counts.
    pub const ITEM_RECEIVED: ProgressEvent = ProgressEvent(9);
    /// Item sent, `extra1`/`extra2` are done/total counts.
    pub const ITEM_SENT: ProgressEvent = ProgressEvent(10);
    /// Non-fatal error, `extra1` is the status code.
    pub const ERROR: ProgressEvent = ProgressEvent(11);
    /// Engine is waiting (e.g. for the transport).
    pub const WAIT: ProgressEvent = ProgressEvent(12);

    /// Construct from a raw event code.
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    /// Raw event code.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Name of the event if it is one of the well-known ones.
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("nop"),
            1 => Some("session-start"),
            2 => Some("session-end"),
            3 => Some("send-start"),
            4 => Some("send-end"),
            5 => Some("recv-start"),
            6 => Some("recv-end"),
            7 => Some("sync-start"),
            8 => Some("sync-end"),
            9 => Some("item-received"),
            10 => Some("item-sent"),
            11 => Some("error"),
            12 => Some("wait"),
            _ => None,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "event-{}", self.0),
        }
    }
}

impl fmt::Debug for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgressEvent({})", self)
    }
}

/// Progress information optionally produced by a session step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Event classification.
    pub event: ProgressEvent,
    /// Datastore/target the event refers to, 0 for session-global events.
    pub target_id: i32,
    /// Event-specific detail.
    pub extra1: i32,
    /// Event-specific detail.
    pub extra2: i32,
    /// Event-specific detail.
    pub extra3: i32,
}

impl ProgressInfo {
    /// A session-global event with no extra detail.
    pub fn event(event: ProgressEvent) -> Self {
        Self {
            event,
            target_id: 0,
            extra1: 0,
            extra2: 0,
            extra3: 0,
        }
    }
}

/// Result of draining the outgoing SyncML message buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRead {
    /// Bytes copied into the caller's buffer by this call.
    pub read: usize,
    /// Size of the whole message, including bytes already returned.
    ///
    /// When larger than the sum of bytes read so far, the caller repeats
    /// the read to fetch the next chunk.
    pub message_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_command_roundtrips_raw_code() {
        for cmd in [
            StepCommand::ClientStart,
            StepCommand::ClientAutoStart,
            StepCommand::Step,
            StepCommand::GotData,
            StepCommand::SentData,
            StepCommand::Suspend,
            StepCommand::Abort,
            StepCommand::TransportFailed,
            StepCommand::Timeout,
        ] {
            assert_eq!(StepCommand::from_u16(cmd.as_u16()), Some(cmd));
        }
        assert_eq!(StepCommand::from_u16(0), None);
    }

    #[test]
    fn step_directive_roundtrips_raw_code() {
        for dir in [
            StepDirective::Ok,
            StepDirective::SendData,
            StepDirective::NeedData,
            StepDirective::ResendData,
            StepDirective::Restart,
            StepDirective::Done,
        ] {
            assert_eq!(StepDirective::from_u16(dir.as_u16()), Some(dir));
        }
    }

    #[test]
    fn commands_and_directives_share_one_numbering_space() {
        // Directive codes must never collide with command codes.
        for dir in 10..=15u16 {
            assert_eq!(StepCommand::from_u16(dir), None);
        }
        for cmd in 1..=9u16 {
            assert_eq!(StepDirective::from_u16(cmd), None);
        }
    }

    #[test]
    fn progress_event_names() {
        assert_eq!(ProgressEvent::SESSION_START.to_string(), "session-start");
        assert_eq!(ProgressEvent::from_raw(200).to_string(), "event-200");
        assert_eq!(ProgressEvent::from_raw(200).name(), None);
    }

    #[test]
    fn session_step_without_progress() {
        let step = SessionStep::directive(StepDirective::SendData);
        assert_eq!(step.directive, StepDirective::SendData);
        assert!(step.progress.is_none());
    }
}
