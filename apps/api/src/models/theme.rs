use serde::{Deserialize, Serialize};

/// Color tokens passed through to the rendered markup. Never affects heights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub text: String,
    pub accent: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#1f2937".to_string(),
            secondary: "#4b5563".to_string(),
            text: "#111827".to_string(),
            accent: "#2563eb".to_string(),
        }
    }
}
