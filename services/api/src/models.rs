//! Report models: posts, their status, and the notifications they emit

use chrono::{DateTime, Utc};
use common::identity::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a report, stored as a small integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    Done = 0,
    Active = 1,
}

impl ReportState {
    pub fn code(self) -> i16 {
        self as i16
    }

    /// Any code other than 0 reads as active, matching the column default.
    pub fn from_code(code: i16) -> Self {
        if code == 0 {
            ReportState::Done
        } else {
            ReportState::Active
        }
    }
}

/// A lost/found report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    #[serde(rename = "keterangan")]
    pub description: String,
    #[serde(rename = "ruangan")]
    pub location: String,
    pub image_url: String,
    #[serde(rename = "itemType")]
    pub item_type: String,
    pub created_at: DateTime<Utc>,
}

/// Singleton lifecycle state of a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub id: Uuid,
    pub post_id: Uuid,
    pub status: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_image: Option<String>,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
}

impl Status {
    pub fn state(&self) -> ReportState {
        ReportState::from_code(self.status)
    }
}

/// Append-only event tied to a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub post_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A post joined with its status; the only shape in which posts leave the engine
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    #[serde(flatten)]
    pub post: Post,
    pub status: Status,
}

/// A notification joined with its parent post's title
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub notification: Notification,
    pub post_title: String,
}

/// Request for creating a report
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    pub title: String,
    #[serde(rename = "keterangan")]
    pub description: String,
    #[serde(rename = "ruangan")]
    pub location: String,
    pub image_url: String,
    #[serde(rename = "itemType")]
    pub item_type: String,
}

/// Partial update of a report; `item_type` is deliberately absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportChanges {
    pub title: Option<String>,
    #[serde(rename = "keterangan")]
    pub description: Option<String>,
    #[serde(rename = "ruangan")]
    pub location: Option<String>,
    pub image_url: Option<String>,
}

impl ReportChanges {
    /// Drop blank fields; they leave the column untouched.
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            title: keep(self.title),
            description: keep(self.description),
            location: keep(self.location),
            image_url: keep(self.image_url),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.image_url.is_none()
    }
}

/// Request for marking a report as done
#[derive(Debug, Clone, Deserialize)]
pub struct MarkDone {
    pub claimer_name: String,
    #[serde(default)]
    pub proof_image: Option<String>,
}
