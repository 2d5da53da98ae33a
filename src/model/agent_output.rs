use serde::{Deserialize, Serialize};

use crate::model::round::ProgressionDirective;

pub const DEFAULT_SUGGESTION: &str = "建议生成失败";
pub const DEFAULT_MEMORY_SUMMARY: &str = "记忆摘要生成失败";

/// Placeholder for any text field the parser could not fill.
pub const FAILED_TEXT: &str = "[生成失败]";

/// Result of parsing an agent response.
///
/// `Fallback` still carries a usable value, so callers always get something to
/// commit, but they have to look at the branch to know it is a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutput<T> {
    Parsed(T),
    Fallback { value: T, raw: String },
}

#[cfg(test)]
impl<T> AgentOutput<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, AgentOutput::Fallback { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            AgentOutput::Parsed(value) | AgentOutput::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            AgentOutput::Parsed(value) | AgentOutput::Fallback { value, .. } => value,
        }
    }
}

/// Guide agent payload: suggestions plus this round's memory summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidePayload {
    pub guidance_suggestions: Vec<String>,
    pub memory_summary: String,
}

impl Default for GuidePayload {
    fn default() -> Self {
        Self {
            guidance_suggestions: vec![DEFAULT_SUGGESTION.into()],
            memory_summary: DEFAULT_MEMORY_SUMMARY.into(),
        }
    }
}

pub type GuideOutput = AgentOutput<GuidePayload>;
pub type StrategistOutput = AgentOutput<ProgressionDirective>;
