//! Messaging platform implementations

mod telegram;

pub use telegram::TelegramClient;
