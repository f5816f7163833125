use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::domain::TaskId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub task_id: TaskId,
    pub words: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    AnalyzingImage,
    WaitingForInput,
    GeneratingArt,
    Completed,
    Failed,
    /// Any status this client does not know about yet.
    #[serde(other)]
    Other,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Words extracted by the backend, either a flat list or grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskWords {
    Flat(Vec<String>),
    Categorized(CategorizedWords),
}

impl TaskWords {
    /// Flat lists as-is; categories in wire order, then list order.
    pub fn flatten(&self) -> Vec<&str> {
        match self {
            TaskWords::Flat(words) => words.iter().map(String::as_str).collect(),
            TaskWords::Categorized(categories) => categories
                .iter()
                .flat_map(|(_, words)| words.iter().map(String::as_str))
                .collect(),
        }
    }
}

/// Category map that keeps the order the server sent the keys in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedWords(Vec<(String, Vec<String>)>);

impl CategorizedWords {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(category, words)| (category.as_str(), words.as_slice()))
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for CategorizedWords {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(category, words)| (category.into(), words))
                .collect(),
        )
    }
}

impl Serialize for CategorizedWords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, words) in &self.0 {
            map.serialize_entry(category, words)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategorizedWords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = CategorizedWords;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from category name to a list of words")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((category, words)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((category, words));
                }
                Ok(CategorizedWords(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<TaskWords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatusResponse {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            progress: None,
            words: None,
            image_url: None,
            reasoning: None,
            generated_prompt: None,
            error: None,
        }
    }

    /// Progress as a whole percentage, clamped to 0..=100.
    pub fn progress_percent(&self) -> Option<u8> {
        self.progress
            .filter(|value| value.is_finite())
            .map(|value| value.round().clamp(0.0, 100.0) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorized_words_keep_wire_order() {
        let raw = r#"{"status":"generating_art","progress":60,"words":{"style":["tropical"],"flavor":["citrus","hazy"]}}"#;
        let response: TaskStatusResponse = serde_json::from_str(raw).expect("decode");
        let words = response.words.expect("words");
        assert_eq!(words.flatten(), vec!["tropical", "citrus", "hazy"]);
    }

    #[test]
    fn flat_words_decode_as_list() {
        let raw = r#"{"status":"completed","progress":100,"words":["hops","malt"],"image_url":"/img/x.png"}"#;
        let response: TaskStatusResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(
            response.words,
            Some(TaskWords::Flat(vec!["hops".into(), "malt".into()]))
        );
        assert_eq!(response.image_url.as_deref(), Some("/img/x.png"));
        assert!(response.status.is_terminal());
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let raw = r#"{"status":"enriching_prompt","progress":40,"word_count":12}"#;
        let response: TaskStatusResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(response.status, TaskStatus::Other);
        assert!(!response.status.is_terminal());
        assert_eq!(response.progress_percent(), Some(40));
    }

    #[test]
    fn progress_is_clamped() {
        let mut response = TaskStatusResponse::new(TaskStatus::Queued);
        response.progress = Some(140.0);
        assert_eq!(response.progress_percent(), Some(100));
        response.progress = Some(-3.0);
        assert_eq!(response.progress_percent(), Some(0));
        response.progress = None;
        assert_eq!(response.progress_percent(), None);
    }

    #[test]
    fn categorized_words_serialize_as_map() {
        let words: CategorizedWords = [("beer_styles", vec!["IPA".to_string()])]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&TaskWords::Categorized(words)).expect("encode");
        assert_eq!(json, r#"{"beer_styles":["IPA"]}"#);
    }
}
