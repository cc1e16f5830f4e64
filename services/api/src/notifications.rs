//! Notification Reader: pure presentation of notification rows

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::NotificationRecord;

/// Kind of event a notification describes, derived from its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NewPost,
    Claim,
    Update,
    Info,
}

/// Ordered classification rules; the first rule with a matching marker wins.
const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["created"], Category::NewPost),
    (&["claim", "taken"], Category::Claim),
    (&["update", "status"], Category::Update),
];

/// Classify a message by case-insensitive substring match
pub fn categorize(message: &str) -> Category {
    let message = message.to_lowercase();

    CATEGORY_RULES
        .iter()
        .find(|(markers, _)| markers.iter().any(|marker| message.contains(marker)))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Info)
}

/// Accent used by clients to colour the notification icon
pub fn accent_tag(category: Category, is_read: bool) -> &'static str {
    if is_read {
        return "bg-gray-400";
    }

    match category {
        Category::NewPost => "bg-green-500",
        Category::Claim => "bg-purple-500",
        Category::Update => "bg-orange-500",
        Category::Info => "bg-blue-500",
    }
}

/// Human-relative age of `created_at` as seen at `now`
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);

    if elapsed < Duration::minutes(1) {
        "just now".to_string()
    } else if elapsed < Duration::hours(1) {
        format!("{} minutes ago", elapsed.num_minutes())
    } else if elapsed < Duration::days(1) {
        format!("{} hours ago", elapsed.num_hours())
    } else if elapsed < Duration::days(30) {
        format!("{} days ago", elapsed.num_days())
    } else {
        created_at.format("%d %b %Y").to_string()
    }
}

/// A notification as clients receive it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub time: String,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(rename = "iconColor")]
    pub icon_color: &'static str,
    pub post_title: String,
}

pub fn present(record: &NotificationRecord, now: DateTime<Utc>) -> NotificationView {
    let n = &record.notification;
    let category = categorize(&n.message);

    NotificationView {
        id: n.id,
        post_id: n.post_id,
        message: n.message.clone(),
        is_read: n.is_read,
        created_at: n.created_at,
        time: time_ago(n.created_at, now),
        category,
        icon_color: accent_tag(category, n.is_read),
        post_title: record.post_title.clone(),
    }
}
