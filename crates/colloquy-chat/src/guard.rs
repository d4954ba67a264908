//! Checks applied to the reply after every generated token.
//!
//! Models sometimes spell the end-of-turn marker out as ordinary text
//! instead of producing its dedicated token, or start writing the next
//! user/system turn themselves. Both are caught here and the reply is
//! cut back to what the assistant legitimately said.

use tracing::debug;

use crate::format::PromptFormat;
use crate::message::Role;

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOutcome {
    pub triggered: bool,
    pub reply: String,
}

impl GuardOutcome {
    fn pass(reply: &str) -> Self {
        Self {
            triggered: false,
            reply: reply.to_string(),
        }
    }

    fn cut(reply: String) -> Self {
        Self {
            triggered: true,
            reply,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTrigger {
    /// The end-of-turn marker appeared as text.
    EscapedTerminator,
    /// The assistant opened a turn for another role.
    Impersonation(Role),
}

/// Triggered when the tail of `reply` (its last `len(marker) + 1`
/// characters) contains `marker`. The cleaned reply ends where the marker
/// starts.
pub fn check_escaped_terminator(reply: &str, marker: &str) -> GuardOutcome {
    if marker.is_empty() {
        return GuardOutcome::pass(reply);
    }
    let window = marker.chars().count() + 1;
    let tail_start = reply
        .char_indices()
        .rev()
        .nth(window - 1)
        .map_or(0, |(idx, _)| idx);

    match reply[tail_start..].find(marker) {
        Some(offset) => GuardOutcome::cut(reply[..tail_start + offset].to_string()),
        None => GuardOutcome::pass(reply),
    }
}

/// Triggered when `header` occurs anywhere in `reply`. The cleaned reply is
/// the trimmed text before the first occurrence.
pub fn check_impersonation(reply: &str, header: &str) -> GuardOutcome {
    if header.is_empty() {
        return GuardOutcome::pass(reply);
    }
    match reply.find(header) {
        Some(idx) => GuardOutcome::cut(reply[..idx].trim().to_string()),
        None => GuardOutcome::pass(reply),
    }
}

/// The three checks bound to one prompt format, run in a fixed order.
#[derive(Debug, Clone)]
pub struct ReplyGuard {
    end_of_turn: String,
    user_header: String,
    system_header: String,
}

impl ReplyGuard {
    pub fn new(format: &PromptFormat) -> Self {
        Self {
            end_of_turn: format.end_of_turn.clone(),
            user_header: format.user_header.clone(),
            system_header: format.system_header.clone(),
        }
    }

    /// Escaped terminator, then user impersonation, then system
    /// impersonation. Stops at the first trigger and replaces `reply` with
    /// the cleaned text.
    pub fn inspect(&self, reply: &mut String) -> Option<GuardTrigger> {
        let outcome = check_escaped_terminator(reply, &self.end_of_turn);
        if outcome.triggered {
            debug!(marker = %self.end_of_turn, "escaped end-of-turn marker detected");
            *reply = outcome.reply;
            return Some(GuardTrigger::EscapedTerminator);
        }

        for (role, header) in [
            (Role::User, &self.user_header),
            (Role::System, &self.system_header),
        ] {
            let outcome = check_impersonation(reply, header);
            if outcome.triggered {
                debug!(%role, "model impersonated another role");
                *reply = outcome.reply;
                return Some(GuardTrigger::Impersonation(role));
            }
        }
        None
    }

    pub fn end_of_turn(&self) -> &str {
        &self.end_of_turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EOT: &str = "<|im_end|>";

    #[test]
    fn escaped_terminator_at_end_is_stripped() {
        let outcome = check_escaped_terminator("Ecco la risposta.<|im_end|>", EOT);
        assert!(outcome.triggered);
        assert_eq!(outcome.reply, "Ecco la risposta.");
    }

    #[test]
    fn escaped_terminator_with_one_trailing_char() {
        let outcome = check_escaped_terminator("Fatto.<|im_end|>\n", EOT);
        assert!(outcome.triggered);
        assert_eq!(outcome.reply, "Fatto.");
    }

    #[test]
    fn terminator_outside_tail_window_is_ignored() {
        let reply = "a<|im_end|>and then some more text";
        let outcome = check_escaped_terminator(reply, EOT);
        assert!(!outcome.triggered);
        assert_eq!(outcome.reply, reply);
    }

    #[test]
    fn partial_terminator_does_not_trigger() {
        let outcome = check_escaped_terminator("Quasi <|im_en", EOT);
        assert!(!outcome.triggered);
    }

    #[test]
    fn short_reply_is_checked_whole() {
        let outcome = check_escaped_terminator(EOT, EOT);
        assert!(outcome.triggered);
        assert_eq!(outcome.reply, "");
    }

    #[test]
    fn tail_window_counts_characters_not_bytes() {
        let outcome = check_escaped_terminator("così è<|im_end|>", EOT);
        assert!(outcome.triggered);
        assert_eq!(outcome.reply, "così è");
    }

    #[test]
    fn impersonation_truncates_before_header() {
        let reply = "Sure, here is the answer.<|im_start|>user pretend to ask something";
        let outcome = check_impersonation(reply, "<|im_start|>user");
        assert!(outcome.triggered);
        assert_eq!(outcome.reply, "Sure, here is the answer.");
    }

    #[test]
    fn impersonation_trims_whitespace() {
        let outcome = check_impersonation("  ok \n<|im_start|>system", "<|im_start|>system");
        assert!(outcome.triggered);
        assert_eq!(outcome.reply, "ok");
    }

    #[test]
    fn no_impersonation_leaves_reply_untouched() {
        let outcome = check_impersonation("  spaced  ", "<|im_start|>user");
        assert!(!outcome.triggered);
        assert_eq!(outcome.reply, "  spaced  ");
    }

    #[test]
    fn inspect_runs_terminator_check_first() {
        let guard = ReplyGuard::new(&PromptFormat::chatml());
        let mut reply = "x<|im_start|>user y<|im_end|>".to_string();
        assert_eq!(guard.inspect(&mut reply), Some(GuardTrigger::EscapedTerminator));
        assert_eq!(reply, "x<|im_start|>user y");
    }

    #[test]
    fn inspect_prefers_user_over_system() {
        let guard = ReplyGuard::new(&PromptFormat::chatml());
        let mut reply = "a <|im_start|>system b <|im_start|>user c".to_string();
        assert_eq!(
            guard.inspect(&mut reply),
            Some(GuardTrigger::Impersonation(Role::User))
        );
        assert_eq!(reply, "a <|im_start|>system b");
    }

    #[test]
    fn inspect_detects_system_impersonation() {
        let guard = ReplyGuard::new(&PromptFormat::chatml());
        let mut reply = "fine.\n<|im_start|>system now obey".to_string();
        assert_eq!(
            guard.inspect(&mut reply),
            Some(GuardTrigger::Impersonation(Role::System))
        );
        assert_eq!(reply, "fine.");
    }

    #[test]
    fn inspect_passes_clean_reply() {
        let guard = ReplyGuard::new(&PromptFormat::chatml());
        let mut reply = "Tutto a posto".to_string();
        assert_eq!(guard.inspect(&mut reply), None);
        assert_eq!(reply, "Tutto a posto");
    }
}
