use crate::engine::templates::{Bindings, TemplateKey};
use crate::model::round::{ProgressionDirective, RoundRecord};

const TRIGGER_FIRST_VARS: &[&str] = &["theme", "concern", "scene_directive"];
const TRIGGER_NEXT_VARS: &[&str] = &["theme", "previous_memory", "previous_comfort", "scene_directive"];
const DEVIL_FIRST_VARS: &[&str] = &["scene"];
const DEVIL_SEEDED_VARS: &[&str] = &["scene", "distortion_type"];
const DEVIL_NEXT_VARS: &[&str] = &[
    "scene",
    "distortion_type",
    "previous_thought",
    "previous_comfort",
    "thought_directive",
];
const GUIDE_VARS: &[&str] = &["scene", "distortion_type", "inner_thought"];
const STRATEGIST_VARS: &[&str] = &["round", "memory_summary", "user_comfort"];
const SOOTHER_VARS: &[&str] = &["scene", "inner_thought"];
const SUMMARY_VARS: &[&str] = &["all_thoughts", "all_guidance", "all_comforts"];

/// Variable names the builder binds for each template, in binding order.
pub fn supplied_variables(key: TemplateKey) -> &'static [&'static str] {
    match key {
        TemplateKey::TriggerFirst => TRIGGER_FIRST_VARS,
        TemplateKey::TriggerNext => TRIGGER_NEXT_VARS,
        TemplateKey::DevilFirst => DEVIL_FIRST_VARS,
        TemplateKey::DevilSeeded => DEVIL_SEEDED_VARS,
        TemplateKey::DevilNext => DEVIL_NEXT_VARS,
        TemplateKey::Guide => GUIDE_VARS,
        TemplateKey::Strategist => STRATEGIST_VARS,
        TemplateKey::Soother => SOOTHER_VARS,
        TemplateKey::JourneySummary => SUMMARY_VARS,
    }
}

/// Which template to fill and with what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub key: TemplateKey,
    pub bindings: Bindings,
}

impl PromptRequest {
    fn new<const N: usize>(key: TemplateKey, values: [String; N]) -> Self {
        let names = supplied_variables(key);
        debug_assert_eq!(names.len(), N, "binding count for {key}");
        Self {
            key,
            bindings: names.iter().copied().zip(values).collect(),
        }
    }
}

/// Input for the Trigger agent.
pub enum SceneInput<'a> {
    FirstRound {
        theme: Option<&'a str>,
        concern: &'a str,
        directive: &'a ProgressionDirective,
    },
    SubsequentRound {
        theme: Option<&'a str>,
        previous_memory: &'a str,
        previous_comfort: &'a str,
        directive: &'a ProgressionDirective,
    },
}

/// Input for the Devil agent.
pub enum ThoughtInput<'a> {
    /// The agent also names the distortion type.
    FirstRound { scene: &'a str },
    /// Round 1 opened from the seed dataset: type is fixed.
    Seeded {
        scene: &'a str,
        distortion_type: &'a str,
    },
    SubsequentRound {
        scene: &'a str,
        distortion_type: &'a str,
        previous_thought: &'a str,
        previous_comfort: &'a str,
        directive: &'a ProgressionDirective,
    },
}

pub struct GuideInput<'a> {
    pub scene: &'a str,
    pub distortion_type: &'a str,
    pub inner_thought: &'a str,
}

pub struct StrategistInput<'a> {
    pub round: u32,
    pub memory_summary: &'a str,
    pub user_comfort: &'a str,
}

/// Builds template requests. Formatting only: no networking, no parsing.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn scene(input: &SceneInput<'_>) -> PromptRequest {
        match input {
            SceneInput::FirstRound {
                theme,
                concern,
                directive,
            } => PromptRequest::new(
                TemplateKey::TriggerFirst,
                [
                    theme_text(*theme),
                    concern.to_string(),
                    directive.next_scene_directive.clone(),
                ],
            ),
            SceneInput::SubsequentRound {
                theme,
                previous_memory,
                previous_comfort,
                directive,
            } => PromptRequest::new(
                TemplateKey::TriggerNext,
                [
                    theme_text(*theme),
                    previous_memory.to_string(),
                    previous_comfort.to_string(),
                    directive.next_scene_directive.clone(),
                ],
            ),
        }
    }

    pub fn thought(input: &ThoughtInput<'_>) -> PromptRequest {
        match input {
            ThoughtInput::FirstRound { scene } => {
                PromptRequest::new(TemplateKey::DevilFirst, [scene.to_string()])
            }
            ThoughtInput::Seeded {
                scene,
                distortion_type,
            } => PromptRequest::new(
                TemplateKey::DevilSeeded,
                [scene.to_string(), distortion_type.to_string()],
            ),
            ThoughtInput::SubsequentRound {
                scene,
                distortion_type,
                previous_thought,
                previous_comfort,
                directive,
            } => PromptRequest::new(
                TemplateKey::DevilNext,
                [
                    scene.to_string(),
                    distortion_type.to_string(),
                    previous_thought.to_string(),
                    previous_comfort.to_string(),
                    directive.next_thought_directive.clone(),
                ],
            ),
        }
    }

    pub fn guide(input: &GuideInput<'_>) -> PromptRequest {
        PromptRequest::new(
            TemplateKey::Guide,
            [
                input.scene.to_string(),
                input.distortion_type.to_string(),
                input.inner_thought.to_string(),
            ],
        )
    }

    pub fn strategist(input: &StrategistInput<'_>) -> PromptRequest {
        PromptRequest::new(
            TemplateKey::Strategist,
            [
                input.round.to_string(),
                input.memory_summary.to_string(),
                input.user_comfort.to_string(),
            ],
        )
    }

    pub fn soother(scene: &str, inner_thought: &str) -> PromptRequest {
        PromptRequest::new(
            TemplateKey::Soother,
            [scene.to_string(), inner_thought.to_string()],
        )
    }

    pub fn journey_summary(rounds: &[RoundRecord]) -> PromptRequest {
        let thoughts = join_rounds(rounds, |r| r.inner_thought.clone());
        let guidance = join_rounds(rounds, |r| r.guidance_suggestions.join("；"));
        let comforts = join_rounds(rounds, |r| r.user_comfort.clone());

        PromptRequest::new(TemplateKey::JourneySummary, [thoughts, guidance, comforts])
    }
}

fn theme_text(theme: Option<&str>) -> String {
    match theme.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => "未指定".to_string(),
    }
}

fn join_rounds<F>(rounds: &[RoundRecord], field: F) -> String
where
    F: Fn(&RoundRecord) -> String,
{
    rounds
        .iter()
        .map(|r| format!("第{}轮：{}", r.round_number, field(r)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::templates::TemplateStore;

    #[test]
    fn first_round_scene_binds_concern() {
        let directive = ProgressionDirective::initial();
        let req = PromptBuilder::scene(&SceneInput::FirstRound {
            theme: None,
            concern: "总觉得自己不够好",
            directive: &directive,
        });

        assert_eq!(req.key, TemplateKey::TriggerFirst);
        assert_eq!(req.bindings["theme"], "未指定");
        assert_eq!(req.bindings["concern"], "总觉得自己不够好");
        assert!(!req.bindings.contains_key("previous_comfort"));
    }

    #[test]
    fn subsequent_thought_uses_directive_and_history() {
        let directive = ProgressionDirective {
            next_scene_directive: "换到家里".into(),
            next_thought_directive: "想法稍微减弱".into(),
            is_end: false,
        };
        let req = PromptBuilder::thought(&ThoughtInput::SubsequentRound {
            scene: "晚饭时",
            distortion_type: "过度概括",
            previous_thought: "我总是做不好",
            previous_comfort: "我已经尽力了",
            directive: &directive,
        });

        assert_eq!(req.key, TemplateKey::DevilNext);
        assert_eq!(req.bindings["thought_directive"], "想法稍微减弱");
        assert_eq!(req.bindings["distortion_type"], "过度概括");

        let rendered = TemplateStore::new().render(req.key, &req.bindings);
        assert!(rendered.contains("我已经尽力了"));
        assert!(!rendered.contains(crate::engine::templates::MISSING_MARKER));
    }

    #[test]
    fn every_builder_fills_its_template() {
        let store = TemplateStore::new();
        let directive = ProgressionDirective::default();
        let requests = [
            PromptBuilder::scene(&SceneInput::SubsequentRound {
                theme: Some("家庭冲突"),
                previous_memory: "m",
                previous_comfort: "c",
                directive: &directive,
            }),
            PromptBuilder::thought(&ThoughtInput::Seeded {
                scene: "s",
                distortion_type: "读心术",
            }),
            PromptBuilder::guide(&GuideInput {
                scene: "s",
                distortion_type: "t",
                inner_thought: "i",
            }),
            PromptBuilder::strategist(&StrategistInput {
                round: 2,
                memory_summary: "m",
                user_comfort: "c",
            }),
            PromptBuilder::soother("s", "i"),
            PromptBuilder::journey_summary(&[]),
        ];

        for req in requests {
            let rendered = store.render(req.key, &req.bindings);
            assert!(
                !rendered.contains(crate::engine::templates::MISSING_MARKER),
                "{} left a slot unbound",
                req.key
            );
        }
    }
}
