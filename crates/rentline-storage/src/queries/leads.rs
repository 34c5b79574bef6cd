// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead record CRUD operations.
//!
//! One JSON blob per conversation. An unreadable blob is repaired by
//! discarding it: the caller sees "no record" and the interview restarts,
//! which is always safe because the record only ever accumulates answers.

use rentline_core::{ConversationId, Lead, RentlineError};
use rusqlite::params;
use tracing::warn;

use crate::database::{map_tr_err, Database};

/// Loads the record for a conversation, if one exists and parses.
pub async fn load_lead(
    db: &Database,
    conversation: ConversationId,
) -> Result<Option<Lead>, RentlineError> {
    let id = conversation.0;
    let blob: Option<String> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT data FROM leads WHERE conversation_id = ?1")?;
            let result = stmt.query_row(params![id], |row| row.get::<_, String>(0));
            match result {
                Ok(data) => Ok(Some(data)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match blob {
        None => Ok(None),
        Some(raw) => match serde_json::from_str::<Lead>(&raw) {
            Ok(lead) => Ok(Some(lead)),
            Err(e) => {
                // Unknown keys are dropped and missing keys defaulted by
                // serde; only a blob that is not JSON at all lands here.
                warn!(
                    conversation = id,
                    error = %e,
                    "discarding unreadable lead blob"
                );
                Ok(None)
            }
        },
    }
}

/// Upserts the whole record, stamping its timestamps.
pub async fn save_lead(db: &Database, lead: &Lead) -> Result<(), RentlineError> {
    let mut lead = lead.clone();
    lead.touch();
    let id = lead.conversation_id;
    let data = serde_json::to_string(&lead).map_err(|e| RentlineError::Storage {
        source: Box::new(e),
    })?;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO leads (conversation_id, data) VALUES (?1, ?2)
                 ON CONFLICT(conversation_id) DO UPDATE SET data = excluded.data",
                params![id, data],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes the record entirely.
pub async fn delete_lead(db: &Database, conversation: ConversationId) -> Result<(), RentlineError> {
    let id = conversation.0;
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM leads WHERE conversation_id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
