//! Background agent that records when the desktop session is locked or unlocked, plus ad-hoc
//! tasks typed into a tray prompt, into an append-only `TickerLog.csv`.

pub mod agent;
pub mod autostart;
pub mod platform;
pub mod utils;
