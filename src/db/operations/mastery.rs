use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;

use crate::db::store::StoreError;
use crate::db::DatabaseProxy;
use crate::models::MasteryRecord;

pub async fn select_user_mastery(
    proxy: &DatabaseProxy,
    learner_id: &str,
) -> Result<Vec<MasteryRecord>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT "learnerId", "topicKey", "confidence", "solvedProblems", "updatedAt"
        FROM "user_mastery"
        WHERE "learnerId" = $1
        ORDER BY "topicKey" ASC
        "#,
    )
    .bind(learner_id)
    .fetch_all(proxy.pool())
    .await?;

    rows.iter().map(map_mastery_row).collect()
}

pub async fn select_mastery(
    proxy: &DatabaseProxy,
    learner_id: &str,
    topic_key: &str,
) -> Result<Option<MasteryRecord>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT "learnerId", "topicKey", "confidence", "solvedProblems", "updatedAt"
        FROM "user_mastery"
        WHERE "learnerId" = $1 AND "topicKey" = $2
        LIMIT 1
        "#,
    )
    .bind(learner_id)
    .bind(topic_key)
    .fetch_optional(proxy.pool())
    .await?;

    row.as_ref().map(map_mastery_row).transpose()
}

pub async fn upsert_mastery(proxy: &DatabaseProxy, record: &MasteryRecord) -> Result<(), StoreError> {
    let solved: Vec<&String> = record.solved_problems.iter().collect();

    sqlx::query(
        r#"
        INSERT INTO "user_mastery" ("learnerId", "topicKey", "confidence", "solvedProblems", "updatedAt")
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT ("learnerId", "topicKey") DO UPDATE SET
            "confidence" = EXCLUDED."confidence",
            "solvedProblems" = EXCLUDED."solvedProblems",
            "updatedAt" = EXCLUDED."updatedAt"
        "#,
    )
    .bind(&record.learner_id)
    .bind(&record.topic_key)
    .bind(record.confidence)
    .bind(Json(solved))
    .bind(record.updated_at)
    .execute(proxy.pool())
    .await?;

    Ok(())
}

pub async fn insert_initial_mastery(
    proxy: &DatabaseProxy,
    learner_id: &str,
    topic_keys: &[String],
) -> Result<(), StoreError> {
    let mut tx = proxy.pool().begin().await?;

    for topic_key in topic_keys {
        sqlx::query(
            r#"
            INSERT INTO "user_mastery" ("learnerId", "topicKey", "confidence", "solvedProblems")
            VALUES ($1, $2, 0, '[]'::jsonb)
            ON CONFLICT ("learnerId", "topicKey") DO NOTHING
            "#,
        )
        .bind(learner_id)
        .bind(topic_key)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

fn map_mastery_row(row: &PgRow) -> Result<MasteryRecord, StoreError> {
    let Json(solved): Json<Vec<String>> = row.try_get("solvedProblems")?;
    let updated_at: DateTime<Utc> = row.try_get("updatedAt")?;

    Ok(MasteryRecord {
        learner_id: row.try_get("learnerId")?,
        topic_key: row.try_get("topicKey")?,
        confidence: row.try_get("confidence")?,
        solved_problems: solved.into_iter().collect::<BTreeSet<_>>(),
        updated_at,
    })
}
