use serde::{Deserialize, Serialize};

/// Directive used when the strategist output cannot be parsed.
pub const DEFAULT_SCENE_DIRECTIVE: &str = "maintain current scene state";
pub const DEFAULT_THOUGHT_DIRECTIVE: &str = "no significant change";

/// Directive seeded at session start, before any strategist has run.
pub const INITIAL_SCENE_DIRECTIVE: &str =
    "根据用户陈述的困扰，生成一个贴近现实的初始场景";
pub const INITIAL_THOUGHT_DIRECTIVE: &str =
    "根据场景生成体现某种认知扭曲的初始内心想法";

/// Instruction carried from round i into round i+1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionDirective {
    pub next_scene_directive: String,
    pub next_thought_directive: String,
    pub is_end: bool,
}

impl ProgressionDirective {
    pub fn initial() -> Self {
        Self {
            next_scene_directive: INITIAL_SCENE_DIRECTIVE.into(),
            next_thought_directive: INITIAL_THOUGHT_DIRECTIVE.into(),
            is_end: false,
        }
    }
}

impl Default for ProgressionDirective {
    fn default() -> Self {
        Self {
            next_scene_directive: DEFAULT_SCENE_DIRECTIVE.into(),
            next_thought_directive: DEFAULT_THOUGHT_DIRECTIVE.into(),
            is_end: false,
        }
    }
}

/// A committed round. Never mutated after it enters the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u32,
    pub scene: String,
    pub distortion_type: String,
    pub inner_thought: String,
    pub guidance_suggestions: Vec<String>,
    pub memory_summary: String,
    pub user_comfort: String,
    pub progression_directive: ProgressionDirective,
}

/// Working buffer for the round currently being produced.
///
/// Fields fill in stage by stage; `into_record` is only possible once the
/// guide and strategist have run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDraft {
    pub round_number: u32,
    pub scene: String,
    pub distortion_type: String,
    pub inner_thought: String,
    pub user_comfort: Option<String>,
}

impl RoundDraft {
    pub fn new(round_number: u32) -> Self {
        Self {
            round_number,
            ..Default::default()
        }
    }

    pub fn into_record(
        self,
        guidance_suggestions: Vec<String>,
        memory_summary: String,
        progression_directive: ProgressionDirective,
    ) -> RoundRecord {
        RoundRecord {
            round_number: self.round_number,
            scene: self.scene,
            distortion_type: self.distortion_type,
            inner_thought: self.inner_thought,
            guidance_suggestions,
            memory_summary,
            user_comfort: self.user_comfort.unwrap_or_default(),
            progression_directive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_keeps_going() {
        let d = ProgressionDirective::default();
        assert_eq!(d.next_scene_directive, DEFAULT_SCENE_DIRECTIVE);
        assert_eq!(d.next_thought_directive, DEFAULT_THOUGHT_DIRECTIVE);
        assert!(!d.is_end);
    }

    #[test]
    fn draft_carries_fields_into_record() {
        let mut draft = RoundDraft::new(3);
        draft.scene = "会议室里".into();
        draft.distortion_type = "读心术".into();
        draft.inner_thought = "他们都在笑我".into();
        draft.user_comfort = Some("没人在笑你".into());

        let record = draft.into_record(
            vec!["深呼吸".into()],
            "摘要".into(),
            ProgressionDirective::default(),
        );

        assert_eq!(record.round_number, 3);
        assert_eq!(record.distortion_type, "读心术");
        assert_eq!(record.user_comfort, "没人在笑你");
        assert_eq!(record.guidance_suggestions, vec!["深呼吸".to_string()]);
    }
}
