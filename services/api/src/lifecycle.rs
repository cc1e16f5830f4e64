//! Report Lifecycle Engine
//!
//! Owns the post/status/notification triple. Every write touching more
//! than one of them runs inside a single `ReportTx`; a failing step rolls
//! the whole transaction back before the error is returned.

use std::sync::Arc;

use chrono::Utc;
use common::{
    error::{ServiceError, ServiceResult},
    gate::AuthGate,
    identity::UserId,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    models::{MarkDone, NewReport, NotificationRecord, Post, Report, ReportChanges, ReportState, Status},
    repositories::{ReportStore, ReportTx},
};

fn report_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Report {} not found", id))
}

fn created_message(actor: UserId, title: &str) -> String {
    format!("New post created by user {}: {}", actor, title)
}

fn claimed_message(title: &str, claimer: &str) -> String {
    format!("Report '{}' was claimed by {}", title, claimer)
}

fn require_field(name: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", name)));
    }
    Ok(())
}

fn validate_new_report(report: &NewReport) -> ServiceResult<()> {
    require_field("title", &report.title)?;
    require_field("keterangan", &report.description)?;
    require_field("ruangan", &report.location)?;
    require_field("image_url", &report.image_url)?;
    require_field("itemType", &report.item_type)
}

async fn insert_report(
    tx: &mut dyn ReportTx,
    actor: UserId,
    report: &NewReport,
) -> ServiceResult<Post> {
    let post = tx.insert_post(actor, report).await?;
    tx.insert_status(post.id, actor).await?;
    tx.insert_notification(post.id, &created_message(actor, &post.title))
        .await?;
    Ok(post)
}

async fn complete_report(
    tx: &mut dyn ReportTx,
    actor: UserId,
    post_id: Uuid,
    claim: &MarkDone,
) -> ServiceResult<Status> {
    let mut status = tx
        .status_for_post(post_id)
        .await?
        .ok_or_else(|| report_not_found(post_id))?;

    if status.state() == ReportState::Done {
        // Re-claiming overwrites the claim and emits another notification.
        warn!("Report {} is already done, overwriting its claim", post_id);
    }

    status.status = ReportState::Done.code();
    status.claimer_name = Some(claim.claimer_name.trim().to_string());
    status.proof_image = claim
        .proof_image
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    status.updated_by = actor;
    status.updated_at = Utc::now();
    let status = tx.save_status(&status).await?;

    let post = tx
        .find_post(post_id)
        .await?
        .ok_or_else(|| report_not_found(post_id))?;
    let claimer = status.claimer_name.as_deref().unwrap_or_default();
    tx.insert_notification(post_id, &claimed_message(&post.title, claimer))
        .await?;

    Ok(status)
}

/// Discard an in-flight transaction after a failed step
async fn abandon(tx: Box<dyn ReportTx>, operation: &str, cause: &ServiceError) {
    warn!("Rolling back {}: {}", operation, cause);
    if let Err(e) = tx.rollback().await {
        // The connection drops the transaction anyway; nothing was committed.
        error!("Rollback of {} failed: {}", operation, e);
    }
}

/// Entry point for every report operation
#[derive(Clone)]
pub struct ReportEngine {
    store: Arc<dyn ReportStore>,
    gate: AuthGate,
}

impl ReportEngine {
    pub fn new(store: Arc<dyn ReportStore>, gate: AuthGate) -> Self {
        Self { store, gate }
    }

    /// Create a post, its active status and its creation notification atomically.
    pub async fn create_report(&self, actor: UserId, report: &NewReport) -> ServiceResult<Report> {
        validate_new_report(report)?;
        info!("User {} creating report '{}'", actor, report.title);

        let mut tx = self.store.begin().await?;
        let post = match insert_report(tx.as_mut(), actor, report).await {
            Ok(post) => post,
            Err(e) => {
                abandon(tx, "report creation", &e).await;
                return Err(e);
            }
        };
        tx.commit().await?;

        info!("Created report {}", post.id);
        self.get_report(post.id).await
    }

    pub async fn list_reports(&self) -> ServiceResult<Vec<Report>> {
        Ok(self.store.list_reports().await?)
    }

    pub async fn get_report(&self, id: Uuid) -> ServiceResult<Report> {
        self.store
            .get_report(id)
            .await?
            .ok_or_else(|| report_not_found(id))
    }

    /// Admin only. Blank or absent fields are left as they are.
    pub async fn update_report(
        &self,
        actor: UserId,
        id: Uuid,
        changes: ReportChanges,
    ) -> ServiceResult<Report> {
        self.gate.require_admin(actor).await?;

        let changes = changes.normalized();
        if !changes.is_empty() && !self.store.update_post(id, &changes).await? {
            return Err(report_not_found(id));
        }

        info!("User {} updated report {}", actor, id);
        self.get_report(id).await
    }

    /// Admin only. Status and notifications go with the post.
    pub async fn delete_report(&self, actor: UserId, id: Uuid) -> ServiceResult<()> {
        self.gate.require_admin(actor).await?;

        if !self.store.delete_post(id).await? {
            return Err(report_not_found(id));
        }

        info!("User {} deleted report {}", actor, id);
        Ok(())
    }

    /// Admin only. Moves the report to done and records who claimed it.
    pub async fn mark_done(
        &self,
        actor: UserId,
        post_id: Uuid,
        claim: &MarkDone,
    ) -> ServiceResult<Status> {
        self.gate.require_admin(actor).await?;
        require_field("claimer_name", &claim.claimer_name)?;

        let mut tx = self.store.begin().await?;
        let status = match complete_report(tx.as_mut(), actor, post_id, claim).await {
            Ok(status) => status,
            Err(e) => {
                abandon(tx, "mark done", &e).await;
                return Err(e);
            }
        };
        tx.commit().await?;

        info!("Report {} marked done by {}", post_id, actor);
        Ok(status)
    }

    pub async fn list_locations(&self) -> ServiceResult<Vec<String>> {
        Ok(self.store.distinct_locations().await?)
    }

    /// Admin only. Every admin sees every notification.
    pub async fn list_notifications(&self, actor: UserId) -> ServiceResult<Vec<NotificationRecord>> {
        self.gate.require_admin(actor).await?;
        Ok(self.store.list_notifications().await?)
    }
}
