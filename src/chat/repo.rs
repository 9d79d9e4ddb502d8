use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{ConversationSession, Message, SessionRow};

pub async fn insert_session(db: &PgPool, s: &ConversationSession) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO chat_sessions
            (id, session_type, messages, completed, household_id, user_id, extracted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(s.id)
    .bind(s.phase.as_str())
    .bind(Json(&s.messages))
    .bind(s.completed)
    .bind(s.household_id)
    .bind(s.user_id)
    .bind(s.extracted.as_ref().map(Json))
    .bind(s.created_at)
    .bind(s.updated_at)
    .execute(db)
    .await
    .context("insert chat session")?;
    Ok(())
}

pub async fn get_session(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ConversationSession>> {
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT id, session_type, messages, completed, household_id, user_id, extracted,
               created_at, updated_at
          FROM chat_sessions
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get chat session")?;
    row.map(ConversationSession::try_from).transpose()
}

/// Appends `appended` to the stored history and writes the session state.
/// Messages already stored are never rewritten, and `completed` never goes
/// back to false. Fails if the row is gone.
pub async fn update_session(
    db: &PgPool,
    s: &ConversationSession,
    appended: &[Message],
) -> anyhow::Result<()> {
    let res = sqlx::query(
        r#"
        UPDATE chat_sessions
           SET messages = messages || $2, completed = completed OR $3, household_id = $4,
               extracted = $5, updated_at = $6
         WHERE id = $1
        "#,
    )
    .bind(s.id)
    .bind(Json(appended))
    .bind(s.completed)
    .bind(s.household_id)
    .bind(s.extracted.as_ref().map(Json))
    .bind(s.updated_at)
    .execute(db)
    .await
    .context("update chat session")?;
    if res.rows_affected() == 0 {
        anyhow::bail!("chat session {} not found", s.id);
    }
    Ok(())
}
