//! User-facing notice queue.
//!
//! Notices are short messages ("desk 4 is now occupied") shown for a few
//! seconds and then dismissed. The queue is bounded and evicts the oldest
//! entry when full; live subscribers receive each notice as it is pushed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::broadcast;

/// Display time used when a notice does not ask for one.
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(5000);

/// Default number of notices retained.
pub const DEFAULT_NOTICE_CAPACITY: usize = 50;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// A queued notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Monotonic id, unique per queue
    pub id: u64,
    pub kind: NoticeKind,
    /// Empty when the producer gave no title
    pub title: String,
    pub message: String,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub created_at: DateTime<Utc>,
}

/// Notice as requested by a producer; missing fields take the defaults.
#[derive(Debug, Clone, Default)]
pub struct NewNotice {
    pub kind: Option<NoticeKind>,
    pub title: Option<String>,
    pub message: String,
    pub duration: Option<Duration>,
}

impl NewNotice {
    /// Info notice with a title.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: Some(NoticeKind::Info),
            title: Some(title.into()),
            message: message.into(),
            duration: None,
        }
    }
}

/// Bounded FIFO of notices with a broadcast side channel.
pub struct NoticeQueue {
    entries: RwLock<VecDeque<Notice>>,
    capacity: usize,
    next_id: AtomicU64,
    default_duration: Duration,
    sender: broadcast::Sender<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_NOTICE_CAPACITY, DEFAULT_NOTICE_DURATION)
    }

    /// Queue with a custom capacity and default display time.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_settings(capacity: usize, default_duration: Duration) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_id: AtomicU64::new(1),
            default_duration,
            sender,
        }
    }

    /// Enqueue a notice, evicting the oldest if at capacity.
    pub fn push(&self, new: NewNotice) -> Notice {
        let notice = Notice {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind: new.kind.unwrap_or_default(),
            title: new.title.unwrap_or_default(),
            message: new.message,
            duration: new.duration.unwrap_or(self.default_duration),
            created_at: Utc::now(),
        };

        {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(notice.clone());
        }

        // No receivers is fine
        let _ = self.sender.send(notice.clone());
        notice
    }

    /// Remove a notice by id. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// All queued notices, oldest first.
    pub fn snapshot(&self) -> Vec<Notice> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Take every queued notice, leaving the queue empty.
    pub fn drain(&self) -> Vec<Notice> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive notices pushed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
