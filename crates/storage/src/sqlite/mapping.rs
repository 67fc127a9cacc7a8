use sqlx::Row;
use uuid::Uuid;
use voice_core::model::{Metrics, SessionId, SessionRecord, UserId};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn user_id_from_text(raw: &str) -> Result<UserId, StorageError> {
    Uuid::parse_str(raw)
        .map(UserId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid user_id: {raw}")))
}

fn u8_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u16_from_i64(field: &'static str, v: i64) -> Result<u16, StorageError> {
    u16::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Rebuild a domain record from a row, re-validating every bound.
///
/// Malformed rows (out-of-range scores, bad UUIDs) are rejected here with
/// a typed error rather than trusted into the domain type.
pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRecord, StorageError> {
    let id = SessionId::new(row.try_get::<i64, _>("id").map_err(ser)?);
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let created_at = row.try_get("created_at").map_err(ser)?;
    let audio_path: Option<String> = row.try_get("audio_path").map_err(ser)?;
    let duration_sec = u32_from_i64(
        "duration_sec",
        row.try_get::<i64, _>("duration_sec").map_err(ser)?,
    )?;
    let notes: Option<String> = row.try_get("notes").map_err(ser)?;

    let metrics = Metrics::from_persisted(
        u8_from_i64("clarity", row.try_get::<i64, _>("clarity").map_err(ser)?)?,
        u8_from_i64(
            "pronunciation",
            row.try_get::<i64, _>("pronunciation").map_err(ser)?,
        )?,
        u8_from_i64(
            "articulation",
            row.try_get::<i64, _>("articulation").map_err(ser)?,
        )?,
        u8_from_i64(
            "consistency",
            row.try_get::<i64, _>("consistency").map_err(ser)?,
        )?,
        u8_from_i64(
            "pitch_control",
            row.try_get::<i64, _>("pitch_control").map_err(ser)?,
        )?,
        u8_from_i64("breath", row.try_get::<i64, _>("breath").map_err(ser)?)?,
        u16_from_i64("wpm", row.try_get::<i64, _>("wpm").map_err(ser)?)?,
    )
    .map_err(ser)?;

    let day_streak_after = u32_from_i64(
        "day_streak_after",
        row.try_get::<i64, _>("day_streak_after").map_err(ser)?,
    )?;
    let credit_points_after: i64 = row.try_get("credit_points_after").map_err(ser)?;

    SessionRecord::from_persisted(
        id,
        user_id,
        created_at,
        audio_path,
        duration_sec,
        notes,
        metrics,
        day_streak_after,
        credit_points_after,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parse_rejects_garbage() {
        let err = user_id_from_text("not-a-uuid").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn narrowing_helpers_reject_out_of_range() {
        assert!(u8_from_i64("clarity", 256).is_err());
        assert!(u8_from_i64("clarity", -1).is_err());
        assert!(u16_from_i64("wpm", 70_000).is_err());
        assert!(u32_from_i64("duration_sec", -5).is_err());
    }
}
