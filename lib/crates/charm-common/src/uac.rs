use serde_json::Value;

use crate::types::Uac;

pub const DEFAULT_AGENT_NAME: &str = "Untitled Agent";
pub const DEFAULT_DESCRIPTION: &str = "";
pub const DEFAULT_VERSION: &str = "0.0.1";

/// The three fields the registry reads out of a submitted UAC document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDraft {
    pub name: String,
    pub description: String,
    pub version: String,
}

impl AgentDraft {
    /// Extract `persona.name`, `persona.description` and `version`, falling
    /// back to the registry defaults when a field is absent, not a string,
    /// or (for name and version) blank.
    #[must_use]
    pub fn from_uac(uac: &Uac) -> Self {
        let persona = uac.get("persona").and_then(Value::as_object);
        let persona_str = |key: &str| {
            persona
                .and_then(|p| p.get(key))
                .and_then(Value::as_str)
        };

        let name = persona_str("name")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_AGENT_NAME);
        let description = persona_str("description").unwrap_or(DEFAULT_DESCRIPTION);
        let version = uac
            .get("version")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_VERSION);

        Self {
            name: name.to_string(),
            description: description.to_string(),
            version: version.to_string(),
        }
    }
}
