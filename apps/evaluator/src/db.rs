use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Idempotent schema bootstrap, applied in order at startup.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id               UUID PRIMARY KEY,
        title            TEXT NOT NULL,
        description      TEXT NOT NULL,
        required_skills  TEXT[] NOT NULL DEFAULT '{}',
        experience_level TEXT NOT NULL,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS jobs_created_at_idx ON jobs (created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS applicants (
        id              UUID PRIMARY KEY,
        job_id          UUID NOT NULL REFERENCES jobs (id),
        name            TEXT NOT NULL,
        email           TEXT NOT NULL,
        github_url      TEXT NOT NULL,
        github_username TEXT NOT NULL,
        resume_path     TEXT NOT NULL,
        status          TEXT NOT NULL DEFAULT 'submitted',
        created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS applicants_job_created_idx ON applicants (job_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS evaluations (
        id           UUID PRIMARY KEY,
        applicant_id UUID NOT NULL,
        job_id       UUID NOT NULL,
        final_score  INTEGER NOT NULL CHECK (final_score BETWEEN 0 AND 100),
        decision     TEXT NOT NULL,
        ai_summary   TEXT NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL,
        UNIQUE (applicant_id, job_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS evaluation_queue (
        id           UUID PRIMARY KEY,
        applicant_id UUID NOT NULL,
        job_id       UUID NOT NULL,
        status       TEXT NOT NULL
                     CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
        error        TEXT,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS evaluation_queue_status_idx ON evaluation_queue (status, created_at)",
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the tables and indexes the service needs if they do not exist yet.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    for (i, statement) in SCHEMA.iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("schema statement {} failed", i + 1))?;
    }
    info!("Database schema ready ({} statements)", SCHEMA.len());
    Ok(())
}
