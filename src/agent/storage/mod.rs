//! Storage of the task log.
//!  - [record::LogRecord] is a single line of the log.
//!  - [appender::LogAppender] owns nothing but the path and appends one record at a time.

pub mod appender;
pub mod record;
