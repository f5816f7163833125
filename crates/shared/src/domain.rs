use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier the backend hands out for an accepted generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Upload,
    Manual,
    Untappd,
}

impl InputMode {
    pub const ALL: [InputMode; 3] = [InputMode::Upload, InputMode::Manual, InputMode::Untappd];

    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Upload => "upload",
            InputMode::Manual => "manual",
            InputMode::Untappd => "untappd",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }

    /// Path of the submission endpoint, relative to the server root.
    pub fn endpoint(self) -> &'static str {
        match self {
            InputMode::Upload => "upload",
            InputMode::Manual => "generate_manual",
            InputMode::Untappd => "generate_untappd",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Theme key that switches the wizard to a free-text theme.
pub const CUSTOM_THEME: &str = "Custom";

pub const DEFAULT_THEME: &str = "Beer";

pub const THEME_OPTIONS: [&str; 4] = ["Beer", "Brewery", "Festival", CUSTOM_THEME];

pub const DEFAULT_MODEL_PROVIDER: &str = "google";

pub const MODEL_PROVIDERS: [&str; 3] = ["google", "dalle", "pollinations"];

pub const DEFAULT_STYLE: &str = "dali";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleDetails {
    pub key: &'static str,
    pub image: &'static str,
    pub description: &'static str,
}

pub const STYLE_CATALOGUE: [StyleDetails; 5] = [
    StyleDetails {
        key: "dali",
        image: "/images/dali.png",
        description: "\"Dreamlike visuals with melting forms and bizarre landscapes.\"",
    },
    StyleDetails {
        key: "scarry",
        image: "/images/richard_scarry.png",
        description: "\"Busy, colorful, detailed 1970s illustration style.\"",
    },
    StyleDetails {
        key: "picasso",
        image: "/images/picasso.png",
        description: "\"Geometric shapes, fragmented perspectives, and abstract forms.\"",
    },
    StyleDetails {
        key: "cyberpunk",
        image: "/images/steampunk.png",
        description: "\"Neon lights, high-tech low-life, futuristic cityscapes.\"",
    },
    StyleDetails {
        key: "technology",
        image: "/images/abstracttech.png",
        description: "\"Clean lines, circuit board patterns, and modern digital aesthetics.\"",
    },
];

pub fn style_details(key: &str) -> Option<&'static StyleDetails> {
    STYLE_CATALOGUE.iter().find(|style| style.key == key)
}
