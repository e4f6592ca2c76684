use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

/// One turn in a thread. Messages are never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Latency annotation, bot messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// `Some(true)` when the text came from paste capture instead of the
    /// backend. Kept as read so an explicit `false` survives a rewrite.
    #[serde(default, rename = "isPasted", skip_serializing_if = "Option::is_none")]
    pub is_pasted: Option<bool>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            reasoning: None,
            is_pasted: None,
        }
    }

    pub fn bot(text: impl Into<String>, reasoning: Option<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            reasoning,
            is_pasted: None,
        }
    }

    pub fn pasted(text: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            reasoning: Some(reasoning.into()),
            is_pasted: Some(true),
        }
    }

    pub fn is_pasted(&self) -> bool {
        self.is_pasted == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_serializes_without_optional_fields() {
        let json = serde_json::to_string(&Message::user("Hola")).unwrap();
        assert_eq!(json, r#"{"role":"user","text":"Hola"}"#);
    }

    #[test]
    fn test_pasted_message_uses_camel_case_flag() {
        let json = serde_json::to_string(&Message::pasted("x", "label")).unwrap();
        assert_eq!(
            json,
            r#"{"role":"bot","text":"x","reasoning":"label","isPasted":true}"#
        );
    }

    #[test]
    fn test_deserialize_legacy_bot_message() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"bot","text":"hi","reasoning":"r"}"#).unwrap();
        assert_eq!(msg.role, Role::Bot);
        assert_eq!(msg.reasoning.as_deref(), Some("r"));
        assert!(!msg.is_pasted());
    }

    #[test]
    fn test_explicit_false_paste_flag_is_kept() {
        let raw = r#"{"role":"bot","text":"x","isPasted":false}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert!(!msg.is_pasted());
        assert_eq!(serde_json::to_string(&msg).unwrap(), raw);
    }
}
