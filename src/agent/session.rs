use anyhow::Result;
use tracing::{error, info};

use super::storage::record::SessionEvent;

/// Reason attached to a session change notification. Codes follow `WM_WTSSESSION_CHANGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionReason {
    ConsoleConnect,
    ConsoleDisconnect,
    RemoteConnect,
    RemoteDisconnect,
    Logon,
    Logoff,
    Lock,
    Unlock,
    RemoteControl,
    Create,
    Terminate,
    Unknown(u32),
}

impl SessionReason {
    pub fn from_code(code: u32) -> Self {
        match code {
            0x1 => SessionReason::ConsoleConnect,
            0x2 => SessionReason::ConsoleDisconnect,
            0x3 => SessionReason::RemoteConnect,
            0x4 => SessionReason::RemoteDisconnect,
            0x5 => SessionReason::Logon,
            0x6 => SessionReason::Logoff,
            0x7 => SessionReason::Lock,
            0x8 => SessionReason::Unlock,
            0x9 => SessionReason::RemoteControl,
            0xA => SessionReason::Create,
            0xB => SessionReason::Terminate,
            other => SessionReason::Unknown(other),
        }
    }
}

/// Maps a notification to the event that gets logged. Everything that isn't a lock, unlock,
/// logon or logoff is not worth a record.
pub fn classify(reason: SessionReason) -> Option<SessionEvent> {
    match reason {
        SessionReason::Lock | SessionReason::Logoff => Some(SessionEvent::Out),
        SessionReason::Unlock | SessionReason::Logon => Some(SessionEvent::In),
        _ => None,
    }
}

/// Intended to serve as a contract for registering with the OS session notification channel.
/// Notifications themselves are delivered by the host through the agent's event channel.
#[cfg_attr(test, mockall::automock)]
pub trait SessionNotifier {
    fn register(&mut self) -> Result<()>;

    fn unregister(&mut self) -> Result<()>;
}

/// Registration that lasts until [SessionSubscription::release] or drop, whichever comes first.
pub struct SessionSubscription {
    notifier: Box<dyn SessionNotifier>,
    active: bool,
}

impl SessionSubscription {
    pub fn acquire(mut notifier: Box<dyn SessionNotifier>) -> Result<Self> {
        notifier.register()?;
        info!("Subscribed to session notifications");
        Ok(Self {
            notifier,
            active: true,
        })
    }

    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.notifier.unregister()?;
        info!("Unsubscribed from session notifications");
        Ok(())
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            error!("Failed to unsubscribe from session notifications {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use crate::agent::storage::record::SessionEvent;

    use super::{classify, MockSessionNotifier, SessionReason, SessionSubscription};

    #[test]
    fn lock_and_logoff_are_out() {
        assert_eq!(classify(SessionReason::Lock), Some(SessionEvent::Out));
        assert_eq!(classify(SessionReason::Logoff), Some(SessionEvent::Out));
    }

    #[test]
    fn unlock_and_logon_are_in() {
        assert_eq!(classify(SessionReason::Unlock), Some(SessionEvent::In));
        assert_eq!(classify(SessionReason::Logon), Some(SessionEvent::In));
    }

    #[test]
    fn other_reasons_are_ignored() {
        for code in [1, 2, 3, 4, 9, 10, 11, 0, 42] {
            assert_eq!(classify(SessionReason::from_code(code)), None, "code {code}");
        }
    }

    #[test]
    fn codes_match_the_windows_constants() {
        assert_eq!(SessionReason::from_code(5), SessionReason::Logon);
        assert_eq!(SessionReason::from_code(6), SessionReason::Logoff);
        assert_eq!(SessionReason::from_code(7), SessionReason::Lock);
        assert_eq!(SessionReason::from_code(8), SessionReason::Unlock);
        assert_eq!(SessionReason::from_code(42), SessionReason::Unknown(42));
    }

    #[test]
    fn release_unregisters_once() {
        let mut notifier = MockSessionNotifier::new();
        notifier.expect_register().times(1).returning(|| Ok(()));
        notifier.expect_unregister().times(1).returning(|| Ok(()));

        let subscription = SessionSubscription::acquire(Box::new(notifier)).unwrap();
        subscription.release().unwrap();
    }

    #[test]
    fn drop_unregisters() {
        let mut notifier = MockSessionNotifier::new();
        notifier.expect_register().times(1).returning(|| Ok(()));
        notifier.expect_unregister().times(1).returning(|| Ok(()));

        let subscription = SessionSubscription::acquire(Box::new(notifier)).unwrap();
        drop(subscription);
    }

    #[test]
    fn failed_registration_is_not_released() {
        let mut notifier = MockSessionNotifier::new();
        notifier
            .expect_register()
            .times(1)
            .returning(|| Err(anyhow!("no session service")));
        notifier.expect_unregister().never();

        assert!(SessionSubscription::acquire(Box::new(notifier)).is_err());
    }
}
