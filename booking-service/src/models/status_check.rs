use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on records returned by a single list query.
pub const STATUS_LIST_LIMIT: i64 = 1000;

/// A client ping. `id` and `timestamp` are always assigned server-side.
///
/// `timestamp` is stored as an RFC 3339 string, the same shape older records
/// were written in, and parsed back into a UTC instant on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

impl StatusCheck {
    pub fn new(client_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_name,
            timestamp: Utc::now(),
        }
    }
}
