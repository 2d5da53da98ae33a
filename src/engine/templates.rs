use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::engine::prompts;

/// Substituted for any placeholder that has no binding.
pub const MISSING_MARKER: &str = "信息缺失";

pub type Bindings = BTreeMap<&'static str, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemplateKey {
    TriggerFirst,
    TriggerNext,
    DevilFirst,
    DevilSeeded,
    DevilNext,
    Guide,
    Strategist,
    Soother,
    JourneySummary,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 9] = [
        TemplateKey::TriggerFirst,
        TemplateKey::TriggerNext,
        TemplateKey::DevilFirst,
        TemplateKey::DevilSeeded,
        TemplateKey::DevilNext,
        TemplateKey::Guide,
        TemplateKey::Strategist,
        TemplateKey::Soother,
        TemplateKey::JourneySummary,
    ];

    /// Name of the persona answering this template, used in logs and warnings.
    pub fn agent(self) -> &'static str {
        match self {
            TemplateKey::TriggerFirst | TemplateKey::TriggerNext => "Trigger",
            TemplateKey::DevilFirst | TemplateKey::DevilSeeded | TemplateKey::DevilNext => {
                "Devil"
            }
            TemplateKey::Guide => "Guide",
            TemplateKey::Strategist => "Strategist",
            TemplateKey::Soother => "Soother",
            TemplateKey::JourneySummary => "Summary",
        }
    }

    pub fn persona(self) -> &'static str {
        match self {
            TemplateKey::TriggerFirst | TemplateKey::TriggerNext => prompts::TRIGGER_PERSONA,
            TemplateKey::DevilFirst | TemplateKey::DevilSeeded | TemplateKey::DevilNext => {
                prompts::DEVIL_PERSONA
            }
            TemplateKey::Guide => prompts::GUIDE_PERSONA,
            TemplateKey::Strategist => prompts::STRATEGIST_PERSONA,
            TemplateKey::Soother => prompts::SOOTHER_PERSONA,
            TemplateKey::JourneySummary => prompts::SUMMARY_PERSONA,
        }
    }

    fn source(self) -> &'static str {
        match self {
            TemplateKey::TriggerFirst => prompts::TRIGGER_FIRST,
            TemplateKey::TriggerNext => prompts::TRIGGER_NEXT,
            TemplateKey::DevilFirst => prompts::DEVIL_FIRST,
            TemplateKey::DevilSeeded => prompts::DEVIL_SEEDED,
            TemplateKey::DevilNext => prompts::DEVIL_NEXT,
            TemplateKey::Guide => prompts::GUIDE,
            TemplateKey::Strategist => prompts::STRATEGIST,
            TemplateKey::Soother => prompts::SOOTHER,
            TemplateKey::JourneySummary => prompts::JOURNEY_SUMMARY,
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template {key} uses {{{name}}} but the prompt builder never binds it")]
    UnboundVariable { key: TemplateKey, name: String },
    #[error("no template registered for {0}")]
    Missing(TemplateKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A template split once into literal text and `{name}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let ident_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());

            if ident_len > 0 && after[ident_len..].starts_with('}') {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(after[..ident_len].to_string()));
                rest = &after[ident_len + 1..];
            } else {
                literal.push('{');
                rest = after;
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// Placeholder names in order of first appearance.
    pub fn required_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    pub fn render(&self, bindings: &Bindings) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match bindings.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(MISSING_MARKER),
                },
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: HashMap<TemplateKey, Template>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        let templates = TemplateKey::ALL
            .iter()
            .map(|key| (*key, Template::compile(key.source())))
            .collect();
        Self { templates }
    }
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_template(mut self, key: TemplateKey, source: &str) -> Self {
        self.templates.insert(key, Template::compile(source));
        self
    }

    pub fn get(&self, key: TemplateKey) -> Result<&Template, TemplateError> {
        self.templates.get(&key).ok_or(TemplateError::Missing(key))
    }

    /// Renders `key`. An unregistered key renders as the missing marker, which
    /// `validate` rules out at startup.
    pub fn render(&self, key: TemplateKey, bindings: &Bindings) -> String {
        match self.templates.get(&key) {
            Some(template) => template.render(bindings),
            None => MISSING_MARKER.to_string(),
        }
    }

    /// Checks every template against the variables its caller binds.
    pub fn validate<F>(&self, supplied: F) -> Result<(), TemplateError>
    where
        F: Fn(TemplateKey) -> &'static [&'static str],
    {
        for key in TemplateKey::ALL {
            let template = self.get(key)?;
            let bound = supplied(key);
            if let Some(name) = template
                .required_variables()
                .into_iter()
                .find(|name| !bound.iter().any(|b| b == name))
            {
                return Err(TemplateError::UnboundVariable {
                    key,
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}
