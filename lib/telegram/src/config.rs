//! Adapter configuration.

use serde::Deserialize;
use switchboard_dialog::ParseMode;

/// How an edit combines with the text already shown in the edited message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPolicy {
    /// Keep the prior text and append the new text below it, so the edited
    /// message accumulates a transcript of the exchange.
    #[default]
    AppendToPriorText,
    /// Overwrite the prior text.
    Replace,
}

impl EditPolicy {
    /// Builds the text an edit should show.
    #[must_use]
    pub fn compose(&self, prior: Option<&str>, text: &str, separator: &str) -> String {
        match (self, prior) {
            (Self::AppendToPriorText, Some(prior)) if !prior.is_empty() => {
                format!("{prior}{separator}{text}")
            }
            _ => text.to_string(),
        }
    }
}

/// Behaviour switches of the adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    /// Parse mode for edits whose message does not set one.
    #[serde(default = "default_edit_parse_mode")]
    pub edit_parse_mode: Option<ParseMode>,

    /// How edits combine with the prior text.
    #[serde(default)]
    pub edit_policy: EditPolicy,

    /// Placed between prior and new text by [`EditPolicy::AppendToPriorText`].
    #[serde(default = "default_transcript_separator")]
    pub transcript_separator: String,

    /// Turn texts starting with `/` into command events.
    #[serde(default = "default_parse_commands")]
    pub parse_commands: bool,

    /// Answer a rejected text message with the rejection reason instead of
    /// staying silent.
    #[serde(default)]
    pub reply_on_rejected_text: bool,

    /// Number of updates a user's lane buffers before `submit` waits.
    #[serde(default = "default_lane_capacity")]
    pub lane_capacity: usize,
}

fn default_edit_parse_mode() -> Option<ParseMode> {
    Some(ParseMode::Markdown)
}

fn default_transcript_separator() -> String {
    "\n\n".to_string()
}

fn default_parse_commands() -> bool {
    true
}

fn default_lane_capacity() -> usize {
    64
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            edit_parse_mode: default_edit_parse_mode(),
            edit_policy: EditPolicy::default(),
            transcript_separator: default_transcript_separator(),
            parse_commands: default_parse_commands(),
            reply_on_rejected_text: false,
            lane_capacity: default_lane_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_config_has_correct_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.edit_parse_mode, Some(ParseMode::Markdown));
        assert_eq!(config.edit_policy, EditPolicy::AppendToPriorText);
        assert_eq!(config.transcript_separator, "\n\n");
        assert!(config.parse_commands);
        assert!(!config.reply_on_rejected_text);
        assert_eq!(config.lane_capacity, 64);
    }

    #[test]
    fn empty_document_deserializes_to_defaults() {
        let config: AdapterConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config.edit_parse_mode, Some(ParseMode::Markdown));
        assert_eq!(config.lane_capacity, 64);
    }

    #[test]
    fn edit_policy_from_snake_case() {
        let config: AdapterConfig =
            serde_json::from_str(r#"{"edit_policy": "replace", "edit_parse_mode": null}"#)
                .expect("deserialize");
        assert_eq!(config.edit_policy, EditPolicy::Replace);
        assert_eq!(config.edit_parse_mode, None);
    }

    #[test]
    fn append_policy_accumulates_transcript() {
        let policy = EditPolicy::AppendToPriorText;
        assert_eq!(policy.compose(Some("Confirm?"), "Yes", "\n\n"), "Confirm?\n\nYes");
        assert_eq!(policy.compose(None, "Yes", "\n\n"), "Yes");
        assert_eq!(policy.compose(Some(""), "Yes", "\n\n"), "Yes");
    }

    #[test]
    fn replace_policy_ignores_prior_text() {
        assert_eq!(EditPolicy::Replace.compose(Some("old"), "new", "\n\n"), "new");
    }
}
