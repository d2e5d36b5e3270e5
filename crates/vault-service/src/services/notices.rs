//! User-facing texts sent alongside a retrieval

use std::fmt::Write as _;
use std::time::Duration;

use vault_core::MissingChannel;

/// Combined prompt listing every channel still to be joined
pub fn join_prompt(missing: &[MissingChannel], retry_link: Option<&str>) -> String {
    let mut text = String::from("Join the channels below to get your files:\n");
    for (index, channel) in missing.iter().enumerate() {
        let action = if channel.mode.is_request_gated() {
            "Request to join"
        } else {
            "Join"
        };
        let _ = write!(text, "\n{}. {action}: {}", index + 1, channel.join_url);
    }
    if let Some(link) = retry_link {
        let _ = write!(text, "\n\nThen try again: {link}");
    }
    text
}

pub fn invalid_link() -> &'static str {
    "This link is invalid or has been removed."
}

pub fn expired_link() -> &'static str {
    "This link has expired."
}

pub fn delivery_failed() -> &'static str {
    "Could not send your files right now. Please try the link again later."
}

/// Summary after a batch; `None` when there is nothing worth saying
pub fn delivery_summary(
    delivered: usize,
    requested: usize,
    auto_delete: Option<Duration>,
) -> Option<String> {
    let mut lines = Vec::new();
    if delivered < requested {
        lines.push(format!("Sent {delivered} out of {requested} files."));
    }
    if let Some(ttl) = auto_delete {
        lines.push(format!(
            "These files will be deleted in {}. Save them elsewhere.",
            humanize(ttl)
        ));
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn humanize(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0..=59 => format!("{secs} seconds"),
        60..=3599 if secs % 60 == 0 => format!("{} minutes", secs / 60),
        3600.. if secs % 3600 == 0 => format!("{} hours", secs / 3600),
        _ => format!("{} minutes", secs.div_ceil(60)),
    }
}
