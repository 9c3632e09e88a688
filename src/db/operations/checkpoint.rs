use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::store::StoreError;
use crate::db::DatabaseProxy;
use crate::models::CheckpointRecord;

const CHECKPOINT_COLUMNS: &str = r#""learnerId", "tierNumber", "isPassed", "attempts", "lastAttemptAt", "passedAt", "submittedCode""#;

pub async fn select_user_checkpoints(
    proxy: &DatabaseProxy,
    learner_id: &str,
) -> Result<Vec<CheckpointRecord>, StoreError> {
    let sql = format!(
        r#"SELECT {CHECKPOINT_COLUMNS} FROM "tier_checkpoints" WHERE "learnerId" = $1 ORDER BY "tierNumber" ASC"#
    );
    let rows = sqlx::query(&sql)
        .bind(learner_id)
        .fetch_all(proxy.pool())
        .await?;

    rows.iter().map(map_checkpoint_row).collect()
}

pub async fn select_checkpoint(
    proxy: &DatabaseProxy,
    learner_id: &str,
    tier: u8,
) -> Result<Option<CheckpointRecord>, StoreError> {
    let sql = format!(
        r#"SELECT {CHECKPOINT_COLUMNS} FROM "tier_checkpoints" WHERE "learnerId" = $1 AND "tierNumber" = $2 LIMIT 1"#
    );
    let row = sqlx::query(&sql)
        .bind(learner_id)
        .bind(i16::from(tier))
        .fetch_optional(proxy.pool())
        .await?;

    row.as_ref().map(map_checkpoint_row).transpose()
}

/// The increment happens in SQL so concurrent attempts never lose a count.
pub async fn increment_attempt(
    proxy: &DatabaseProxy,
    learner_id: &str,
    tier: u8,
    code: &str,
    at: DateTime<Utc>,
) -> Result<Option<CheckpointRecord>, StoreError> {
    let sql = format!(
        r#"
        UPDATE "tier_checkpoints"
        SET "attempts" = "attempts" + 1,
            "lastAttemptAt" = $1,
            "submittedCode" = $2,
            "updatedAt" = $1
        WHERE "learnerId" = $3 AND "tierNumber" = $4
        RETURNING {CHECKPOINT_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(at)
        .bind(code)
        .bind(learner_id)
        .bind(i16::from(tier))
        .fetch_optional(proxy.pool())
        .await?;

    row.as_ref().map(map_checkpoint_row).transpose()
}

pub async fn set_passed(
    proxy: &DatabaseProxy,
    learner_id: &str,
    tier: u8,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        UPDATE "tier_checkpoints"
        SET "isPassed" = TRUE,
            "passedAt" = COALESCE("passedAt", $1),
            "updatedAt" = $1
        WHERE "learnerId" = $2 AND "tierNumber" = $3
        "#,
    )
    .bind(at)
    .bind(learner_id)
    .bind(i16::from(tier))
    .execute(proxy.pool())
    .await?;

    Ok(())
}

pub async fn insert_initial_checkpoints(
    proxy: &DatabaseProxy,
    learner_id: &str,
    tiers: &[u8],
) -> Result<bool, StoreError> {
    let mut tx = proxy.pool().begin().await?;
    let mut inserted = 0u64;

    for &tier in tiers {
        let result = sqlx::query(
            r#"
            INSERT INTO "tier_checkpoints" ("learnerId", "tierNumber", "isPassed", "attempts")
            VALUES ($1, $2, FALSE, 0)
            ON CONFLICT ("learnerId", "tierNumber") DO NOTHING
            "#,
        )
        .bind(learner_id)
        .bind(i16::from(tier))
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted > 0)
}

fn map_checkpoint_row(row: &PgRow) -> Result<CheckpointRecord, StoreError> {
    let tier: i16 = row.try_get("tierNumber")?;
    let attempts: i32 = row.try_get("attempts")?;

    Ok(CheckpointRecord {
        learner_id: row.try_get("learnerId")?,
        tier: u8::try_from(tier).map_err(|_| StoreError::Corrupt {
            table: "tier_checkpoints",
            message: format!("tierNumber out of range: {tier}"),
        })?,
        is_passed: row.try_get("isPassed")?,
        attempts: u32::try_from(attempts).map_err(|_| StoreError::Corrupt {
            table: "tier_checkpoints",
            message: format!("negative attempts: {attempts}"),
        })?,
        last_attempt_at: row.try_get("lastAttemptAt")?,
        passed_at: row.try_get("passedAt")?,
        submitted_code: row.try_get("submittedCode")?,
    })
}
