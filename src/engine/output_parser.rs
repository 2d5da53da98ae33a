use serde_json::Value;

use crate::model::agent_output::{AgentOutput, GuideOutput, GuidePayload, StrategistOutput};
use crate::model::round::ProgressionDirective;

/// Token in `is_end` that ends the session.
pub const AFFIRMATIVE: &str = "yes";

/// Labeled fields the text agents answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabeledField {
    Scene,
    Type,
    Thoughts,
}

impl LabeledField {
    pub fn key(self) -> &'static str {
        match self {
            LabeledField::Scene => "Scene",
            LabeledField::Type => "Type",
            LabeledField::Thoughts => "Thoughts",
        }
    }
}

/// Returns the value of the last `key:` line (case-insensitive), skipping any
/// reasoning the model wrote before it. Falls back per field when no line
/// carries the label.
pub fn extract_labeled(text: &str, field: LabeledField) -> String {
    let key = field.key();

    let labeled = text
        .lines()
        .filter_map(|line| strip_label(line.trim(), key))
        .last();
    if let Some(value) = labeled {
        return value.trim().to_string();
    }

    match field {
        LabeledField::Scene => after_last_key(text, key)
            .map(|rest| rest.trim_start_matches([':', '：', ' ']).trim().to_string())
            .unwrap_or_else(|| text.trim().to_string()),
        LabeledField::Thoughts => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .unwrap_or("")
            .to_string(),
        LabeledField::Type => text.to_string(),
    }
}

fn strip_label<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let head = line.get(..key.len())?;
    if !head.eq_ignore_ascii_case(key) {
        return None;
    }
    let rest = line[key.len()..].trim_start();
    rest.strip_prefix(':').or_else(|| rest.strip_prefix('：'))
}

fn after_last_key<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let pos = lowered.rfind(&key.to_ascii_lowercase())?;
    Some(&text[pos + key.len()..])
}

/// Pulls the outermost JSON object out of a reply that may be fenced or
/// wrapped in prose.
fn json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn parse_guide(text: &str) -> GuideOutput {
    match try_parse_guide(text) {
        Some(payload) => AgentOutput::Parsed(payload),
        None => {
            tracing::warn!("guide output unparsable, using defaults");
            AgentOutput::Fallback {
                value: GuidePayload::default(),
                raw: text.to_string(),
            }
        }
    }
}

fn try_parse_guide(text: &str) -> Option<GuidePayload> {
    let map = json_object(text)?;

    let guidance_suggestions: Vec<String> = match map.get("guidance_suggestions")? {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| non_empty_str(Some(v)))
            .take(2)
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    };
    if guidance_suggestions.is_empty() {
        return None;
    }

    let memory_summary = non_empty_str(map.get("memory_summary_curr"))?;

    Some(GuidePayload {
        guidance_suggestions,
        memory_summary,
    })
}

pub fn parse_strategist(text: &str) -> StrategistOutput {
    match try_parse_strategist(text) {
        Some(directive) => AgentOutput::Parsed(directive),
        None => {
            tracing::warn!("strategist output missing progression_directives, using default");
            AgentOutput::Fallback {
                value: ProgressionDirective::default(),
                raw: text.to_string(),
            }
        }
    }
}

fn try_parse_strategist(text: &str) -> Option<ProgressionDirective> {
    let map = json_object(text)?;
    let directives = map.get("progression_directives")?.as_object()?;

    let next_scene_directive = non_empty_str(directives.get("next_scene_directive"))?;
    let next_thought_directive = non_empty_str(directives.get("next_thought_directive"))?;
    let is_end = directives.get("is_end")?;

    Some(ProgressionDirective {
        next_scene_directive,
        next_thought_directive,
        is_end: is_affirmative(is_end),
    })
}

/// Only an explicit yes ends the session.
pub fn is_affirmative(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case(AFFIRMATIVE),
        _ => false,
    }
}
