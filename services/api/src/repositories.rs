//! Persistence contract for reports
//!
//! Multi-entity writes go through a `ReportTx`; everything else is a
//! single statement against the store. Posts are only ever read joined
//! with their status, so a post whose status row is missing is invisible.

use async_trait::async_trait;
use common::{error::DatabaseResult, identity::UserId};
use uuid::Uuid;

use crate::models::{NewReport, Notification, NotificationRecord, Post, Report, ReportChanges, Status};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgReportStore;

/// An open transaction.
///
/// Dropping it without `commit` discards every write made through it,
/// which is what happens when a request is cancelled mid-flight.
#[async_trait]
pub trait ReportTx: Send {
    async fn insert_post(&mut self, author: UserId, report: &NewReport) -> DatabaseResult<Post>;

    /// Insert the initial, active status of a post
    async fn insert_status(&mut self, post_id: Uuid, updated_by: UserId) -> DatabaseResult<Status>;

    async fn insert_notification(
        &mut self,
        post_id: Uuid,
        message: &str,
    ) -> DatabaseResult<Notification>;

    /// Load a post's status, locking it for the rest of the transaction
    async fn status_for_post(&mut self, post_id: Uuid) -> DatabaseResult<Option<Status>>;

    async fn save_status(&mut self, status: &Status) -> DatabaseResult<Status>;

    async fn find_post(&mut self, post_id: Uuid) -> DatabaseResult<Option<Post>>;

    async fn commit(self: Box<Self>) -> DatabaseResult<()>;

    async fn rollback(self: Box<Self>) -> DatabaseResult<()>;
}

/// Report persistence
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn begin(&self) -> DatabaseResult<Box<dyn ReportTx>>;

    /// All reports, newest first
    async fn list_reports(&self) -> DatabaseResult<Vec<Report>>;

    async fn get_report(&self, id: Uuid) -> DatabaseResult<Option<Report>>;

    /// Apply the present fields; `false` when the post does not exist
    async fn update_post(&self, id: Uuid, changes: &ReportChanges) -> DatabaseResult<bool>;

    /// Delete a post together with its status and notifications;
    /// `false` when the post does not exist
    async fn delete_post(&self, id: Uuid) -> DatabaseResult<bool>;

    /// Trimmed, non-empty, deduplicated locations in ascending order
    async fn distinct_locations(&self) -> DatabaseResult<Vec<String>>;

    /// All notifications with their post titles, newest first
    async fn list_notifications(&self) -> DatabaseResult<Vec<NotificationRecord>>;
}
