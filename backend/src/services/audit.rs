//! Append-only audit trail of admin actions
//!
//! Recording is fire and forget: a failed insert is logged and dropped so
//! the audited operation itself never fails because of the trail.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::AppResult;
use shared::{AdminLog, PaginatedResponse, Pagination, PaginationMeta};

#[derive(Debug, Default, Deserialize)]
pub struct AuditFilters {
    pub admin_id: Option<Uuid>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an admin action without blocking the caller
    pub fn record(&self, admin_id: Uuid, action: &str, description: String) {
        let db = self.db.clone();
        let action = action.to_string();
        tokio::spawn(async move {
            let result = sqlx::query(
                "INSERT INTO admin_logs (id, admin_id, action, description) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(admin_id)
            .bind(&action)
            .bind(&description)
            .execute(&db)
            .await;

            if let Err(e) = result {
                tracing::warn!(%admin_id, action, error = %e, "audit record failed");
            }
        });
    }

    /// Paged log listing, newest first. SUPERADMIN only at the route layer.
    pub async fn list(
        &self,
        filters: AuditFilters,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<AdminLog>> {
        let pagination = pagination.clamped();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM admin_logs WHERE true");
        let mut query = QueryBuilder::new("SELECT * FROM admin_logs WHERE true");
        for builder in [&mut count, &mut query] {
            if let Some(admin_id) = filters.admin_id {
                builder.push(" AND admin_id = ").push_bind(admin_id);
            }
            if let Some(ref action) = filters.action {
                builder.push(" AND action = ").push_bind(action.clone());
            }
            if let Some(from) = filters.from {
                builder.push(" AND created_at >= ").push_bind(from);
            }
            if let Some(to) = filters.to {
                builder.push(" AND created_at <= ").push_bind(to);
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        query.push(" ORDER BY created_at DESC");
        query.push(" LIMIT ").push_bind(i64::from(pagination.limit));
        query.push(" OFFSET ").push_bind(pagination.offset());

        let items = query.build_query_as::<AdminLog>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse {
            items,
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }
}
