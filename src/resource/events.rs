use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::docker::ResourceType;

/// Default delay between a change and the coalesced `UiUpdate`.
pub const UI_UPDATE_DELAY: Duration = Duration::from_millis(100);

/// A lifecycle operation a manager can run in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Stop,
    Restart,
    DeleteMany,
    Pull,
    Tag,
    Create,
    Connect,
    Disconnect,
    Prune,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Restart => "restart",
            Operation::DeleteMany => "batch delete",
            Operation::Pull => "pull",
            Operation::Tag => "tag",
            Operation::Create => "create",
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Prune => "prune",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change notifications published by a resource manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// `refresh` was answered from the cache.
    CacheHit(ResourceType),
    LoadingStarted(ResourceType),
    LoadingComplete(ResourceType),
    LoadingError { kind: ResourceType, error: String },
    DeleteComplete { kind: ResourceType, id: String },
    DeleteError { kind: ResourceType, id: String, error: String },
    OperationStarted { kind: ResourceType, op: Operation, target: String },
    /// A line of streamed output from a long-running operation.
    Progress { kind: ResourceType, op: Operation, line: String },
    OperationComplete { kind: ResourceType, op: Operation, target: String, message: String },
    OperationError { kind: ResourceType, op: Operation, target: String, error: String },
    /// Search, filters or contents changed; views should redraw.
    UiUpdate(ResourceType),
}

/// Fan-out of events to every live subscriber.
///
/// Dropping a receiver unsubscribes it; dead senders are pruned on the next
/// notification.
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Vec<Sender<ResourceEvent>>,
}

impl Subscribers {
    pub fn subscribe(&mut self) -> Receiver<ResourceEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    pub fn notify(&mut self, event: ResourceEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Trailing-edge debouncer: every `schedule` pushes the deadline out, and
/// `fire_due` reports true once after the quiet period elapses.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(UI_UPDATE_DELAY)
    }
}
