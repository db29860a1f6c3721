use chrono::{NaiveDateTime, Timelike};

/// Format used for every timestamp written into the task log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// This is the standard way of converting a moment to a string in ticker.
pub fn format_timestamp(moment: NaiveDateTime) -> String {
    moment.format(TIMESTAMP_FORMAT).to_string()
}

/// Drops sub-second precision. Records are stored with second precision only.
pub fn truncate_to_seconds(moment: NaiveDateTime) -> NaiveDateTime {
    moment.with_nanosecond(0).unwrap_or(moment)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{format_timestamp, truncate_to_seconds, TIMESTAMP_FORMAT};

    #[test]
    fn formats_with_second_precision() {
        let moment = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_milli_opt(9, 5, 7, 999)
            .unwrap();

        assert_eq!(format_timestamp(moment), "2025-01-01 09:05:07");
    }

    #[test]
    fn formatted_timestamp_parses_back() {
        let moment = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 500)
            .unwrap();

        let parsed =
            NaiveDateTime::parse_from_str(&format_timestamp(moment), TIMESTAMP_FORMAT).unwrap();

        assert_eq!(parsed, truncate_to_seconds(moment));
    }
}
