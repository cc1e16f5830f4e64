//! Postgres report store
//!
//! Status and notification rows cascade from `posts` through their
//! foreign keys, so deleting a post is a single statement.

use async_trait::async_trait;
use common::{error::DatabaseResult, identity::UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::{ReportStore, ReportTx};
use crate::models::{
    NewReport, Notification, NotificationRecord, Post, Report, ReportChanges, ReportState, Status,
};

const POST_COLUMNS: &str =
    "id, user_id, title, keterangan, ruangan, image_url, item_type, created_at";

const STATUS_COLUMNS: &str =
    "id, post_id, status, claimer_name, proof_image, updated_by, updated_at";

const NOTIFICATION_COLUMNS: &str = "id, post_id, message, is_read, created_at";

const REPORT_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.title, p.keterangan, p.ruangan, p.image_url, p.item_type,
           p.created_at,
           s.id AS status_id, s.post_id, s.status, s.claimer_name, s.proof_image,
           s.updated_by, s.updated_at
    FROM posts p
    JOIN statuses s ON s.post_id = p.id
"#;

/// Byte-wise ordering, independent of the database collation
const LOCATIONS_SELECT: &str = r#"
    SELECT DISTINCT btrim(ruangan) COLLATE "C" AS location
    FROM posts
    WHERE btrim(ruangan) <> ''
    ORDER BY location
"#;

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        user_id: UserId(row.get("user_id")),
        title: row.get("title"),
        description: row.get("keterangan"),
        location: row.get("ruangan"),
        image_url: row.get("image_url"),
        item_type: row.get("item_type"),
        created_at: row.get("created_at"),
    }
}

fn status_from_row(row: &PgRow, id_column: &str) -> Status {
    Status {
        id: row.get(id_column),
        post_id: row.get("post_id"),
        status: row.get("status"),
        claimer_name: row.get("claimer_name"),
        proof_image: row.get("proof_image"),
        updated_by: UserId(row.get("updated_by")),
        updated_at: row.get("updated_at"),
    }
}

fn report_from_row(row: &PgRow) -> Report {
    Report {
        post: post_from_row(row),
        status: status_from_row(row, "status_id"),
    }
}

fn notification_from_row(row: &PgRow) -> Notification {
    Notification {
        id: row.get("id"),
        post_id: row.get("post_id"),
        message: row.get("message"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}

/// Report store over a Postgres pool
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn begin(&self) -> DatabaseResult<Box<dyn ReportTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgReportTx { tx }))
    }

    async fn list_reports(&self) -> DatabaseResult<Vec<Report>> {
        let rows = sqlx::query(&format!("{REPORT_SELECT} ORDER BY p.created_at DESC"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(report_from_row).collect())
    }

    async fn get_report(&self, id: Uuid) -> DatabaseResult<Option<Report>> {
        let row = sqlx::query(&format!("{REPORT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(report_from_row))
    }

    async fn update_post(&self, id: Uuid, changes: &ReportChanges) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                keterangan = COALESCE($3, keterangan),
                ruangan = COALESCE($4, ruangan),
                image_url = COALESCE($5, image_url)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.location)
        .bind(&changes.image_url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("Deleted {} post row(s) for {}", result.rows_affected(), id);
        Ok(result.rows_affected() > 0)
    }

    async fn distinct_locations(&self) -> DatabaseResult<Vec<String>> {
        let locations: Vec<String> = sqlx::query_scalar(LOCATIONS_SELECT)
            .fetch_all(&self.pool)
            .await?;

        Ok(locations)
    }

    async fn list_notifications(&self) -> DatabaseResult<Vec<NotificationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.post_id, n.message, n.is_read, n.created_at, p.title AS post_title
            FROM notifications n
            JOIN posts p ON p.id = n.post_id
            ORDER BY n.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| NotificationRecord {
                notification: notification_from_row(row),
                post_title: row.get("post_title"),
            })
            .collect())
    }
}

/// A live Postgres transaction; sqlx rolls it back when dropped uncommitted
struct PgReportTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReportTx for PgReportTx {
    async fn insert_post(&mut self, author: UserId, report: &NewReport) -> DatabaseResult<Post> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO posts (user_id, title, keterangan, ruangan, image_url, item_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(author.0)
        .bind(&report.title)
        .bind(&report.description)
        .bind(&report.location)
        .bind(&report.image_url)
        .bind(&report.item_type)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(post_from_row(&row))
    }

    async fn insert_status(&mut self, post_id: Uuid, updated_by: UserId) -> DatabaseResult<Status> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO statuses (post_id, status, updated_by)
            VALUES ($1, $2, $3)
            RETURNING {STATUS_COLUMNS}
            "#
        ))
        .bind(post_id)
        .bind(ReportState::Active.code())
        .bind(updated_by.0)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(status_from_row(&row, "id"))
    }

    async fn insert_notification(
        &mut self,
        post_id: Uuid,
        message: &str,
    ) -> DatabaseResult<Notification> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notifications (post_id, message, is_read)
            VALUES ($1, $2, FALSE)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(post_id)
        .bind(message)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(notification_from_row(&row))
    }

    async fn status_for_post(&mut self, post_id: Uuid) -> DatabaseResult<Option<Status>> {
        let row = sqlx::query(&format!(
            "SELECT {STATUS_COLUMNS} FROM statuses WHERE post_id = $1 FOR UPDATE"
        ))
        .bind(post_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(|row| status_from_row(row, "id")))
    }

    async fn save_status(&mut self, status: &Status) -> DatabaseResult<Status> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE statuses
            SET status = $2, claimer_name = $3, proof_image = $4, updated_by = $5, updated_at = $6
            WHERE id = $1
            RETURNING {STATUS_COLUMNS}
            "#
        ))
        .bind(status.id)
        .bind(status.status)
        .bind(&status.claimer_name)
        .bind(&status.proof_image)
        .bind(status.updated_by.0)
        .bind(status.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(status_from_row(&row, "id"))
    }

    async fn find_post(&mut self, post_id: Uuid) -> DatabaseResult<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(post_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        let PgReportTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DatabaseResult<()> {
        let PgReportTx { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
