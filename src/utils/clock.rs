use chrono::{Local, NaiveDateTime};

/// Represents an entity responsible for providing dates across application. This allows
/// timestamps to be pinned during testing.
pub trait Clock: Sync + Send + 'static {
    /// Current wall clock time in the local timezone.
    fn now(&self) -> NaiveDateTime;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
