//! The persistence sink: a pooled PostgreSQL client realizing the
//! "relational store" contract of `spec.md` §1 and the single wide-table
//! schema of §6. Created once at startup — the one long-lived resource per
//! `spec.md` §9 — and released at shutdown by simply dropping it.
//!
//! Persistence failure is logged and downgraded to a `saved_to_db: false`
//! flag on the response (`spec.md` §4.E, §7): the judging verdict is the
//! authoritative observation, losing the database must never change what
//! the caller is told executed.

use sqlx::postgres::{PgPool, PgPoolOptions};

use judge::model::PersistenceRecord;

error_chain::error_chain! {
    foreign_links {
        Sqlx(::sqlx::Error);
        Serde(::serde_json::Error);
    }
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS submissions (
    submission_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    question_id TEXT NOT NULL,
    language TEXT NOT NULL,
    source TEXT NOT NULL,
    verdicts JSONB NOT NULL,
    summary JSONB NOT NULL,
    execution_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)
"#;

/// A bounded pool with per-acquire checkout, safe for concurrent use across
/// requests; the only shared mutable resource in the system (`spec.md` §5).
pub struct PersistenceSink {
    pool: PgPool,
}

impl PersistenceSink {
    /// Connect, bound the pool, and create the schema if this is the first
    /// use ("created on first use if absent", `spec.md` §6).
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(PersistenceSink { pool })
    }

    /// Persist one submission's verdict set. Idempotent on `submission_id`:
    /// a retried submit does not duplicate the row.
    pub async fn persist(&self, record: &PersistenceRecord) -> Result<()> {
        let verdicts = serde_json::to_value(&record.verdicts)?;
        let summary = serde_json::to_value(&record.summary)?;

        sqlx::query(
            "INSERT INTO submissions \
             (submission_id, user_id, question_id, language, source, verdicts, summary, execution_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (submission_id) DO NOTHING",
        )
        .bind(&record.submission_id)
        .bind(&record.user_id)
        .bind(&record.question_id)
        .bind(&record.language)
        .bind(&record.source)
        .bind(&verdicts)
        .bind(&summary)
        .bind(record.execution_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
