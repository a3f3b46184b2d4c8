//! Site-wide settings stored as a singleton in the `settings` collection.

use serde::{Deserialize, Serialize};

/// Default time limit in minutes for each exercise type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultTimeLimits {
    pub reading: u32,
    pub listening: u32,
    pub grammar: u32,
    pub writing: u32,
}

/// The `system` settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemSettings {
    pub site_title: String,
    pub allow_registration: bool,
    pub maintenance_mode: bool,
    pub default_time_limit: DefaultTimeLimits,
    /// UI language code, e.g. "en" or "de".
    pub language: String,
    pub show_correct_answers: bool,
    pub allow_test_retake: bool,
    pub demo_access_level: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            site_title: "Telc Mate".to_string(),
            allow_registration: false,
            maintenance_mode: false,
            default_time_limit: DefaultTimeLimits {
                reading: 20,
                listening: 15,
                grammar: 15,
                writing: 30,
            },
            language: "en".to_string(),
            show_correct_answers: true,
            allow_test_retake: true,
            demo_access_level: "limited".to_string(),
        }
    }
}
