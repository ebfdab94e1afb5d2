use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::SourceRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Assigned by `ConversationMemory` on append.
    pub sequence: u64,
    pub role: TurnRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            role,
            text: text.into(),
            sources: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn assistant(text: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        Self {
            sources,
            ..Self::new(TurnRole::Assistant, text)
        }
    }

    /// One transcript entry: `"<Role>: <text>\n\n"`.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}\n\n", self.role.transcript_label(), self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }

    /// Label used by the downloadable chat history.
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Bot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_line() {
        assert_eq!(ConversationTurn::user("hi").transcript_line(), "User: hi\n\n");
        assert_eq!(
            ConversationTurn::assistant("hello", Vec::new()).transcript_line(),
            "Bot: hello\n\n"
        );
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ConversationTurn::user("q")).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("sources").is_none());
    }
}
