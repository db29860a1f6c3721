use std::fmt::Display;

use chrono::NaiveDateTime;

use crate::{
    agent::prompt::TaskText,
    utils::time::{format_timestamp, truncate_to_seconds},
};

/// First line of every freshly created task log.
pub const LOG_HEADER: &str = "Timestamp,Event";

/// Direction of a session transition as it is written into the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    In,
    Out,
}

impl Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::In => write!(f, "in"),
            SessionEvent::Out => write!(f, "out"),
        }
    }
}

/// One line of the task log.
///
/// Task entries reuse the `in` tag and are told apart from session entries only by their third
/// field. Existing log files depend on that shape, so it must stay as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Session {
        at: NaiveDateTime,
        event: SessionEvent,
    },
    Task {
        at: NaiveDateTime,
        task: TaskText,
    },
}

impl LogRecord {
    pub fn session(at: NaiveDateTime, event: SessionEvent) -> Self {
        LogRecord::Session {
            at: truncate_to_seconds(at),
            event,
        }
    }

    pub fn task(at: NaiveDateTime, task: TaskText) -> Self {
        LogRecord::Task {
            at: truncate_to_seconds(at),
            task,
        }
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogRecord::Session { at, event } => write!(f, "{},{event}", format_timestamp(*at)),
            LogRecord::Task { at, task } => {
                write!(f, "{},{},{}", format_timestamp(*at), SessionEvent::In, task)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, Timelike};

    use crate::agent::prompt::validate;

    use super::{LogRecord, SessionEvent};

    fn moment() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 0, 250)
            .unwrap()
    }

    #[test]
    fn session_records_have_two_fields() {
        assert_eq!(
            LogRecord::session(moment(), SessionEvent::Out).to_string(),
            "2025-01-01 12:30:00,out"
        );
        assert_eq!(
            LogRecord::session(moment(), SessionEvent::In).to_string(),
            "2025-01-01 12:30:00,in"
        );
    }

    #[test]
    fn task_records_reuse_the_in_tag() {
        let task = validate("  Reviewed quarterly report ").unwrap();

        assert_eq!(
            LogRecord::task(moment(), task).to_string(),
            "2025-01-01 12:30:00,in,Reviewed quarterly report"
        );
    }

    #[test]
    fn timestamps_drop_sub_second_precision() {
        let LogRecord::Session { at, .. } = LogRecord::session(moment(), SessionEvent::In) else {
            panic!("expected a session record");
        };

        assert_eq!(at, moment().with_nanosecond(0).unwrap());
    }
}
