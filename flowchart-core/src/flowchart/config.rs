//! Flowchart configuration.

use serde::{Deserialize, Serialize};

/// Settings used when constructing a [`Flowchart`](super::Flowchart).
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowchartConfig {
    /// Title shown at the head of the dump.
    pub title: String,

    /// Expected number of real nodes, used to pre-size the arena.
    pub capacity: usize,
}

impl FlowchartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for FlowchartConfig {
    fn default() -> Self {
        Self {
            title: "Flowchart".to_string(),
            capacity: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FlowchartConfig::default();
        assert_eq!(config.title, "Flowchart");
        assert_eq!(config.capacity, 16);
    }

    #[test]
    fn builder_overrides() {
        let config = FlowchartConfig::new().with_title("Onboarding").with_capacity(64);
        assert_eq!(config.title, "Onboarding");
        assert_eq!(config.capacity, 64);
    }

    #[test]
    fn partial_config_deserializes() {
        let config: FlowchartConfig = serde_json::from_str(r#"{"title": "Triage"}"#).unwrap();
        assert_eq!(config.title, "Triage");
        assert_eq!(config.capacity, 16);
    }
}
