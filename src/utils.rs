use chrono::{DateTime, FixedOffset, Utc};
use lazy_regex::regex_captures;
use sqlx::SqlitePool;

pub(crate) async fn is_table_exists(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<bool, sqlx::Error> {
    Ok(
        sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?
            .is_some(),
    )
}

pub fn get_now(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Parses `+HH:MM` / `-HH:MM` into a fixed offset.
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let (_, sign, hours, minutes) = regex_captures!(r"^([+-])(\d{2}):(\d{2})$", s.trim())?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    if sign == "-" {
        FixedOffset::west_opt(seconds)
    } else {
        FixedOffset::east_opt(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("+00:00"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("+07:00"), FixedOffset::east_opt(7 * 3600));
        assert_eq!(
            parse_utc_offset("-05:30"),
            FixedOffset::west_opt(5 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn rejects_bad_offsets() {
        assert_eq!(parse_utc_offset("7"), None);
        assert_eq!(parse_utc_offset("+7:00"), None);
        assert_eq!(parse_utc_offset("+25:00"), None);
        assert_eq!(parse_utc_offset("Z"), None);
    }
}
