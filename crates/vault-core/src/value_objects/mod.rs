//! Value objects - immutable types that represent domain concepts

mod chat_id;

pub use chat_id::{ChatId, ChatIdParseError, MessageId};
