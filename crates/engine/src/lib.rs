//! Notice domain services: notice types, per-medium settings, notice
//! lifecycle, user lookups and one-time flash messages.

pub mod flash;
pub mod notice_types;
pub mod notices;
pub mod settings;
pub mod users;
