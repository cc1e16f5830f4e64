//! In-memory report store for tests
//!
//! A transaction buffers its own inserts and status saves and applies
//! only those on commit, so uncommitted writes are never visible to
//! readers and concurrent committed changes survive.
//! Notification inserts can be made to fail to exercise rollback.

use async_trait::async_trait;
use chrono::Utc;
use common::{
    error::{DatabaseError, DatabaseResult},
    identity::UserId,
};
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};
use uuid::Uuid;

use super::{ReportStore, ReportTx};
use crate::models::{
    NewReport, Notification, NotificationRecord, Post, Report, ReportChanges, ReportState, Status,
};

#[derive(Debug, Default, Clone)]
struct Tables {
    posts: Vec<Post>,
    statuses: Vec<Status>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn report(&self, post: &Post) -> Option<Report> {
        self.statuses
            .iter()
            .find(|s| s.post_id == post.id)
            .map(|status| Report {
                post: post.clone(),
                status: status.clone(),
            })
    }
}

#[derive(Default, Clone)]
pub struct MemoryReportStore {
    tables: Arc<Mutex<Tables>>,
    fail_notification_inserts: Arc<AtomicBool>,
}

impl MemoryReportStore {
    /// Make every subsequent notification insert fail
    pub fn fail_notification_inserts(&self, fail: bool) {
        self.fail_notification_inserts.store(fail, Ordering::SeqCst);
    }

    /// Committed post rows, including any without a status
    pub fn post_rows(&self) -> usize {
        self.lock().posts.len()
    }

    /// Committed status rows
    pub fn status_rows(&self) -> usize {
        self.lock().statuses.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn begin(&self) -> DatabaseResult<Box<dyn ReportTx>> {
        Ok(Box::new(MemoryTx {
            shared: self.tables.clone(),
            staged: Tables::default(),
            saved_statuses: Vec::new(),
            fail_notification_inserts: self.fail_notification_inserts.load(Ordering::SeqCst),
        }))
    }

    async fn list_reports(&self) -> DatabaseResult<Vec<Report>> {
        let tables = self.lock();
        let mut reports: Vec<Report> = tables
            .posts
            .iter()
            .filter_map(|post| tables.report(post))
            .collect();
        reports.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(reports)
    }

    async fn get_report(&self, id: Uuid) -> DatabaseResult<Option<Report>> {
        let tables = self.lock();
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|post| tables.report(post)))
    }

    async fn update_post(&self, id: Uuid, changes: &ReportChanges) -> DatabaseResult<bool> {
        let mut tables = self.lock();
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };

        if let Some(title) = &changes.title {
            post.title = title.clone();
        }
        if let Some(description) = &changes.description {
            post.description = description.clone();
        }
        if let Some(location) = &changes.location {
            post.location = location.clone();
        }
        if let Some(image_url) = &changes.image_url {
            post.image_url = image_url.clone();
        }
        Ok(true)
    }

    async fn delete_post(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.lock();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }

        tables.statuses.retain(|s| s.post_id != id);
        tables.notifications.retain(|n| n.post_id != id);
        Ok(true)
    }

    async fn distinct_locations(&self) -> DatabaseResult<Vec<String>> {
        let mut locations: Vec<String> = self
            .lock()
            .posts
            .iter()
            .map(|p| p.location.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        locations.sort();
        locations.dedup();
        Ok(locations)
    }

    async fn list_notifications(&self) -> DatabaseResult<Vec<NotificationRecord>> {
        let tables = self.lock();
        let mut records: Vec<NotificationRecord> = tables
            .notifications
            .iter()
            .filter_map(|n| {
                tables
                    .posts
                    .iter()
                    .find(|p| p.id == n.post_id)
                    .map(|post| NotificationRecord {
                        notification: n.clone(),
                        post_title: post.title.clone(),
                    })
            })
            .collect();
        records.sort_by(|a, b| b.notification.created_at.cmp(&a.notification.created_at));
        Ok(records)
    }
}

struct MemoryTx {
    shared: Arc<Mutex<Tables>>,
    /// Rows inserted by this transaction
    staged: Tables,
    /// Committed status rows rewritten by this transaction
    saved_statuses: Vec<Status>,
    fail_notification_inserts: bool,
}

impl MemoryTx {
    fn shared(&self) -> MutexGuard<'_, Tables> {
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ReportTx for MemoryTx {
    async fn insert_post(&mut self, author: UserId, report: &NewReport) -> DatabaseResult<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            user_id: author,
            title: report.title.clone(),
            description: report.description.clone(),
            location: report.location.clone(),
            image_url: report.image_url.clone(),
            item_type: report.item_type.clone(),
            created_at: Utc::now(),
        };
        self.staged.posts.push(post.clone());
        Ok(post)
    }

    async fn insert_status(&mut self, post_id: Uuid, updated_by: UserId) -> DatabaseResult<Status> {
        let taken = self.staged.statuses.iter().any(|s| s.post_id == post_id)
            || self.shared().statuses.iter().any(|s| s.post_id == post_id);
        if taken {
            return Err(DatabaseError::UniqueViolation(
                "statuses_post_id_key".to_string(),
            ));
        }

        let status = Status {
            id: Uuid::new_v4(),
            post_id,
            status: ReportState::Active.code(),
            claimer_name: None,
            proof_image: None,
            updated_by,
            updated_at: Utc::now(),
        };
        self.staged.statuses.push(status.clone());
        Ok(status)
    }

    async fn insert_notification(
        &mut self,
        post_id: Uuid,
        message: &str,
    ) -> DatabaseResult<Notification> {
        if self.fail_notification_inserts {
            return Err(DatabaseError::Query(sqlx::Error::Protocol(
                "injected notification insert failure".to_string(),
            )));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            post_id,
            message: message.to_string(),
            is_read: false,
            created_at: Utc::now(),
        };
        self.staged.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn status_for_post(&mut self, post_id: Uuid) -> DatabaseResult<Option<Status>> {
        let own = self
            .saved_statuses
            .iter()
            .chain(self.staged.statuses.iter())
            .find(|s| s.post_id == post_id)
            .cloned();
        if own.is_some() {
            return Ok(own);
        }

        Ok(self
            .shared()
            .statuses
            .iter()
            .find(|s| s.post_id == post_id)
            .cloned())
    }

    async fn save_status(&mut self, status: &Status) -> DatabaseResult<Status> {
        if let Some(row) = self.staged.statuses.iter_mut().find(|s| s.id == status.id) {
            *row = status.clone();
            return Ok(row.clone());
        }
        if !self.shared().statuses.iter().any(|s| s.id == status.id) {
            return Err(DatabaseError::Query(sqlx::Error::RowNotFound));
        }

        self.saved_statuses.retain(|s| s.id != status.id);
        self.saved_statuses.push(status.clone());
        Ok(status.clone())
    }

    async fn find_post(&mut self, post_id: Uuid) -> DatabaseResult<Option<Post>> {
        let own = self.staged.posts.iter().find(|p| p.id == post_id).cloned();
        if own.is_some() {
            return Ok(own);
        }

        Ok(self.shared().posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        let MemoryTx {
            shared,
            staged,
            saved_statuses,
            ..
        } = *self;
        let mut tables = shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for saved in saved_statuses {
            // A status deleted since it was loaded stays deleted.
            if let Some(row) = tables.statuses.iter_mut().find(|s| s.id == saved.id) {
                *row = saved;
            }
        }
        tables.posts.extend(staged.posts);
        tables.statuses.extend(staged.statuses);
        tables.notifications.extend(staged.notifications);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DatabaseResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(title: &str) -> NewReport {
        NewReport {
            title: title.to_string(),
            description: "Left on a bench".to_string(),
            location: "Lab 1".to_string(),
            image_url: "https://img.example/1.png".to_string(),
            item_type: "found".to_string(),
        }
    }

    async fn committed_report(store: &MemoryReportStore, author: UserId, title: &str) -> Uuid {
        let mut tx = store.begin().await.unwrap();
        let post = tx.insert_post(author, &report(title)).await.unwrap();
        tx.insert_status(post.id, author).await.unwrap();
        tx.commit().await.unwrap();
        post.id
    }

    #[tokio::test]
    async fn commit_keeps_changes_made_while_the_transaction_was_open() {
        let store = MemoryReportStore::default();
        let author = UserId::new();
        let deleted = committed_report(&store, author, "Scarf").await;
        let edited = committed_report(&store, author, "Keys").await;

        let mut tx = store.begin().await.unwrap();
        let post = tx.insert_post(author, &report("Wallet")).await.unwrap();
        tx.insert_status(post.id, author).await.unwrap();

        assert!(store.delete_post(deleted).await.unwrap());
        let changes = ReportChanges {
            title: Some("House keys".to_string()),
            ..Default::default()
        };
        assert!(store.update_post(edited, &changes).await.unwrap());
        tx.commit().await.unwrap();

        assert!(store.get_report(deleted).await.unwrap().is_none());
        assert_eq!(
            store.get_report(edited).await.unwrap().unwrap().post.title,
            "House keys"
        );
        assert!(store.get_report(post.id).await.unwrap().is_some());
        assert_eq!(store.post_rows(), 2);
    }

    #[tokio::test]
    async fn saved_status_applies_on_commit_only() {
        let store = MemoryReportStore::default();
        let author = UserId::new();
        let id = committed_report(&store, author, "Keys").await;

        let mut tx = store.begin().await.unwrap();
        let mut status = tx.status_for_post(id).await.unwrap().unwrap();
        status.status = ReportState::Done.code();
        tx.save_status(&status).await.unwrap();
        assert_eq!(
            tx.status_for_post(id).await.unwrap().unwrap().state(),
            ReportState::Done
        );
        assert_eq!(
            store.get_report(id).await.unwrap().unwrap().status.state(),
            ReportState::Active
        );

        tx.commit().await.unwrap();
        assert_eq!(
            store.get_report(id).await.unwrap().unwrap().status.state(),
            ReportState::Done
        );
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_nothing() {
        let store = MemoryReportStore::default();
        let author = UserId::new();

        let mut tx = store.begin().await.unwrap();
        let post = tx.insert_post(author, &report("Wallet")).await.unwrap();
        tx.insert_status(post.id, author).await.unwrap();
        drop(tx);

        assert_eq!(store.post_rows(), 0);
        assert_eq!(store.status_rows(), 0);
    }
}
