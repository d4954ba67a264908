use serde::{Deserialize, Serialize};
use std::fmt;

/// Short hex id attached to the tracing span of a single reply.
pub fn new_turn_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_id_is_short_hex() {
        let id = new_turn_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn turn_ids_differ() {
        assert_ne!(new_turn_id(), new_turn_id());
    }

    #[test]
    fn session_id_is_uuid_v4() {
        let sid = SessionId::new();
        let parsed = uuid::Uuid::parse_str(sid.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(sid.to_string(), sid.as_str());
    }

    #[test]
    fn session_id_serialization() {
        let sid = SessionId::default();
        let json = serde_json::to_string(&sid).unwrap();
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(sid, back);
    }
}
