use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: u64,
    pub level: Level,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    notices: Vec<Notice>,
}

/// User-visible notifications, kept until dismissed.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    inner: Arc<Mutex<Inner>>,
}

impl Notices {
    pub fn new() -> Self {
        Default::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, level: Level, message: impl Into<String>) -> u64 {
        let message = message.into();
        match level {
            Level::Error => error!(notice = %message),
            Level::Success => info!(notice = %message),
        }
        let mut inner = self.inner();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.notices.push(Notice {
            id,
            level,
            message,
            raised_at: Utc::now(),
        });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(Level::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(Level::Error, message)
    }

    /// Returns false when no notice has that id.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut inner = self.inner();
        let before = inner.notices.len();
        inner.notices.retain(|notice| notice.id != id);
        inner.notices.len() != before
    }

    pub fn list(&self) -> Vec<Notice> {
        self.inner().notices.clone()
    }
}

#[test]
fn dismiss_removes_only_that_notice() {
    let notices = Notices::new();
    let first = notices.error("first");
    let second = notices.success("second");
    assert!(notices.dismiss(first));
    assert!(!notices.dismiss(first));
    let remaining = notices.list();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second);
}
