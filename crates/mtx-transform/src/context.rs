use chrono::{DateTime, Utc};

use crate::functions::now;

/// Per-translation inputs that are not part of the MT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformContext {
    pub request_id: Option<String>,
    /// Fixed for the whole translation so every `$now` agrees.
    pub now: DateTime<Utc>,
}

impl TransformContext {
    pub fn new(request_id: Option<String>) -> Self {
        Self::at(request_id, Utc::now())
    }

    pub fn at(request_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self { request_id, now }
    }

    pub fn timestamp(&self) -> String {
        now(self.now)
    }
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new(None)
    }
}
