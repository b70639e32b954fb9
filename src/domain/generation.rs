use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const SYSTEM_INSTRUCTION: &str =
    "You are an expert SEO blog writer. Write clear, structured, SEO-optimized blogs.";

/// Minimum length requested from the model. Not enforced on the output.
const MIN_WORDS: u32 = 800;

/// Writing tone for a generated post.
///
/// The three named tones are what the dashboard offers; anything else is
/// accepted as free text and passed through to the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Informative,
    Custom(String),
}

impl Tone {
    /// Absent or blank input falls back to `Professional`.
    pub fn parse(raw: Option<&str>) -> Self {
        let trimmed = match raw.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Tone::Professional,
        };

        match trimmed.to_ascii_lowercase().as_str() {
            "professional" => Tone::Professional,
            "casual" => Tone::Casual,
            "informative" => Tone::Informative,
            _ => Tone::Custom(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Informative => "informative",
            Tone::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Tone {
    fn from(value: String) -> Self {
        Tone::parse(Some(&value))
    }
}

impl From<Tone> for String {
    fn from(value: Tone) -> Self {
        value.as_str().to_string()
    }
}

/// System + user instruction pair sent to the text generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

impl ChatPrompt {
    pub fn blog_post(topic: &str, tone: &Tone) -> Self {
        Self {
            system: SYSTEM_INSTRUCTION.to_string(),
            user: format!(
                "Write a {} blog post about \"{}\". Aim for at least {} words. \
                 Include headings and a conclusion.",
                tone, topic, MIN_WORDS
            ),
        }
    }
}

/// One successful generation, appended to the owning account's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub account_id: String,
    pub topic: String,
    pub tone: Tone,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn new(account_id: String, topic: String, tone: Tone, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            topic,
            tone,
            content,
            created_at: Utc::now(),
        }
    }
}
