//! Round state machine.
//!
//! ```text
//! AwaitingInput --submit_concern--> GeneratingSceneAndThought
//!     --generate_scene_and_thought--> AwaitingUserComfort
//!     --submit_comfort--> GeneratingGuidanceAndPlan
//!     --generate_guidance_and_plan--> GeneratingSceneAndThought (next round) | Finished
//! any --reset--> AwaitingInput
//! ```
//!
//! Every backend call is blocking and issued one after another: each prompt
//! embeds text produced by the call before it.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::llm_client::{ChatBackend, Generation, OutputFormat, TextGenerationClient};
use crate::engine::output_parser::{extract_labeled, parse_guide, parse_strategist, LabeledField};
use crate::engine::prompt_builder::{
    supplied_variables, GuideInput, PromptBuilder, PromptRequest, SceneInput, StrategistInput,
    ThoughtInput,
};
use crate::engine::templates::{TemplateError, TemplateKey};
use crate::model::agent_output::{AgentOutput, FAILED_TEXT};
use crate::model::event_result::{TransitionReport, TransitionWarning};
use crate::model::history::HistoryError;
use crate::model::round::{ProgressionDirective, RoundDraft};
use crate::model::seed::SeedDataset;
use crate::model::session::{SessionSnapshot, SessionState, Stage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("please describe your concern first")]
    EmptyConcern,
    #[error("please write a comforting response first")]
    EmptyComfort,
    #[error("{operation} is not allowed while {stage}")]
    WrongStage {
        operation: &'static str,
        stage: Stage,
    },
    #[error("no completed rounds to summarize yet")]
    NothingToSummarize,
    #[error("{agent} could not generate a reply: {detail}")]
    GenerationFailed { agent: &'static str, detail: String },
    #[error("{0} returned an empty reply")]
    EmptyReply(&'static str),
    #[error("no round in progress while {0}")]
    MissingDraft(Stage),
    #[error("round {0} has no previous round in history")]
    MissingPreviousRound(u32),
    #[error(transparent)]
    Invariant(#[from] HistoryError),
}

impl TransitionError {
    /// Contract violations inside the orchestrator; no user input causes these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransitionError::Invariant(_)
                | TransitionError::MissingDraft(_)
                | TransitionError::MissingPreviousRound(_)
        )
    }
}

pub struct Orchestrator<B> {
    client: TextGenerationClient<B>,
    session: SessionState,
    seed: Option<SeedDataset>,
    rng: StdRng,
}

impl<B: ChatBackend> Orchestrator<B> {
    /// Fails if any template uses a variable the prompt builder never binds.
    pub fn new(client: TextGenerationClient<B>) -> Result<Self, TemplateError> {
        client.templates().validate(supplied_variables)?;

        Ok(Self {
            client,
            session: SessionState::new(),
            seed: None,
            rng: StdRng::from_entropy(),
        })
    }

    #[cfg(test)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn client(&self) -> &TextGenerationClient<B> {
        &self.client
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.clone(),
            seed_dataset_entries: self.seed.as_ref().map(SeedDataset::len),
        }
    }

    /// Round 1 scenes are drawn from `dataset` until it is detached.
    pub fn attach_seed_dataset(&mut self, dataset: SeedDataset) {
        self.seed = Some(dataset);
    }

    pub fn detach_seed_dataset(&mut self) {
        self.seed = None;
    }

    fn expect_stage(&self, operation: &'static str, expected: Stage) -> Result<(), TransitionError> {
        if self.session.stage != expected {
            return Err(TransitionError::WrongStage {
                operation,
                stage: self.session.stage,
            });
        }
        Ok(())
    }

    pub fn submit_concern(
        &mut self,
        theme: Option<String>,
        concern: &str,
    ) -> Result<TransitionReport, TransitionError> {
        self.expect_stage("submit_concern", Stage::AwaitingInput)?;

        let concern = concern.trim();
        if concern.is_empty() {
            return Err(TransitionError::EmptyConcern);
        }

        self.session = SessionState {
            round: 1,
            stage: Stage::GeneratingSceneAndThought,
            theme: theme
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            concern: concern.to_string(),
            directive: ProgressionDirective::initial(),
            ..SessionState::new()
        };

        tracing::info!(theme = ?self.session.theme, "session started");
        Ok(TransitionReport::new(self.session.stage))
    }

    pub fn generate_scene_and_thought(&mut self) -> Result<TransitionReport, TransitionError> {
        self.expect_stage("generate_scene_and_thought", Stage::GeneratingSceneAndThought)?;

        let round = self.session.round;
        let mut warnings = Vec::new();

        let draft = if round == 1 {
            self.first_round_draft(&mut warnings)
        } else {
            self.next_round_draft(round, &mut warnings)?
        };

        tracing::info!(round, distortion_type = %draft.distortion_type, "scene and thought ready");

        self.session.draft = Some(draft);
        self.session.stage = Stage::AwaitingUserComfort;

        Ok(TransitionReport {
            stage: self.session.stage,
            warnings,
        })
    }

    fn first_round_draft(&mut self, warnings: &mut Vec<TransitionWarning>) -> RoundDraft {
        let mut draft = RoundDraft::new(1);

        let seed = self
            .seed
            .as_ref()
            .and_then(|dataset| dataset.choose(&mut self.rng))
            .cloned();

        if let Some(entry) = seed {
            tracing::debug!(distortion_type = %entry.distortion_type, "round 1 seeded from dataset");
            draft.scene = entry.scene;
            draft.distortion_type = entry.distortion_type;

            let reply = self.call(
                PromptBuilder::thought(&ThoughtInput::Seeded {
                    scene: &draft.scene,
                    distortion_type: &draft.distortion_type,
                }),
                OutputFormat::Text,
                warnings,
            );
            draft.inner_thought = labeled(&reply, LabeledField::Thoughts, warnings);
            return draft;
        }

        let reply = self.call(
            PromptBuilder::scene(&SceneInput::FirstRound {
                theme: self.session.theme.as_deref(),
                concern: &self.session.concern,
                directive: &self.session.directive,
            }),
            OutputFormat::Text,
            warnings,
        );
        draft.scene = labeled(&reply, LabeledField::Scene, warnings);

        let reply = self.call(
            PromptBuilder::thought(&ThoughtInput::FirstRound {
                scene: &draft.scene,
            }),
            OutputFormat::Text,
            warnings,
        );
        draft.distortion_type = labeled(&reply, LabeledField::Type, warnings);
        draft.inner_thought = labeled(&reply, LabeledField::Thoughts, warnings);
        draft
    }

    fn next_round_draft(
        &self,
        round: u32,
        warnings: &mut Vec<TransitionWarning>,
    ) -> Result<RoundDraft, TransitionError> {
        let previous = self
            .session
            .history
            .last()
            .ok_or(TransitionError::MissingPreviousRound(round))?;
        let distortion_type = self
            .session
            .locked_distortion_type()
            .ok_or(TransitionError::MissingPreviousRound(round))?
            .to_string();
        let directive = &self.session.directive;

        let mut draft = RoundDraft::new(round);

        let previous_memory = self
            .session
            .memory_summary
            .as_deref()
            .unwrap_or(&previous.memory_summary);
        let reply = self.call(
            PromptBuilder::scene(&SceneInput::SubsequentRound {
                theme: self.session.theme.as_deref(),
                previous_memory,
                previous_comfort: &previous.user_comfort,
                directive,
            }),
            OutputFormat::Text,
            warnings,
        );
        draft.scene = labeled(&reply, LabeledField::Scene, warnings);

        let reply = self.call(
            PromptBuilder::thought(&ThoughtInput::SubsequentRound {
                scene: &draft.scene,
                distortion_type: &distortion_type,
                previous_thought: &previous.inner_thought,
                previous_comfort: &previous.user_comfort,
                directive,
            }),
            OutputFormat::Text,
            warnings,
        );
        draft.inner_thought = labeled(&reply, LabeledField::Thoughts, warnings);
        draft.distortion_type = distortion_type;

        Ok(draft)
    }

    /// Rejects empty text without touching the session.
    pub fn submit_comfort(&mut self, comfort: &str) -> Result<TransitionReport, TransitionError> {
        self.expect_stage("submit_comfort", Stage::AwaitingUserComfort)?;

        let comfort = comfort.trim();
        if comfort.is_empty() {
            return Err(TransitionError::EmptyComfort);
        }

        let stage = self.session.stage;
        let draft = self
            .session
            .draft
            .as_mut()
            .ok_or(TransitionError::MissingDraft(stage))?;
        draft.user_comfort = Some(comfort.to_string());
        self.session.stage = Stage::GeneratingGuidanceAndPlan;

        Ok(TransitionReport::new(self.session.stage))
    }

    pub fn generate_guidance_and_plan(&mut self) -> Result<TransitionReport, TransitionError> {
        self.expect_stage("generate_guidance_and_plan", Stage::GeneratingGuidanceAndPlan)?;

        let draft = self
            .session
            .draft
            .clone()
            .ok_or(TransitionError::MissingDraft(self.session.stage))?;
        let comfort = draft.user_comfort.clone().unwrap_or_default();
        let mut warnings = Vec::new();

        let reply = self.call(
            PromptBuilder::guide(&GuideInput {
                scene: &draft.scene,
                distortion_type: &draft.distortion_type,
                inner_thought: &draft.inner_thought,
            }),
            OutputFormat::GuideJson,
            &mut warnings,
        );
        let guide = fallback_warning(parse_guide(&reply), TemplateKey::Guide, &mut warnings);

        let reply = self.call(
            PromptBuilder::strategist(&StrategistInput {
                round: draft.round_number,
                memory_summary: &guide.memory_summary,
                user_comfort: &comfort,
            }),
            OutputFormat::StrategistJson,
            &mut warnings,
        );
        let directive =
            fallback_warning(parse_strategist(&reply), TemplateKey::Strategist, &mut warnings);

        let round = draft.round_number;
        let record = draft.into_record(
            guide.guidance_suggestions,
            guide.memory_summary.clone(),
            directive.clone(),
        );
        self.session.history.append(record)?;

        self.session.draft = None;
        self.session.memory_summary = Some(guide.memory_summary);
        self.session.stage = if directive.is_end {
            Stage::Finished
        } else {
            self.session.round += 1;
            Stage::GeneratingSceneAndThought
        };
        self.session.directive = directive;

        tracing::info!(round, stage = %self.session.stage, "round committed");

        Ok(TransitionReport {
            stage: self.session.stage,
            warnings,
        })
    }

    /// Runs the generation step the current stage is waiting on.
    pub fn advance(&mut self) -> Result<TransitionReport, TransitionError> {
        match self.session.stage {
            Stage::GeneratingSceneAndThought => self.generate_scene_and_thought(),
            Stage::GeneratingGuidanceAndPlan => self.generate_guidance_and_plan(),
            stage => Err(TransitionError::WrongStage {
                operation: "advance",
                stage,
            }),
        }
    }

    /// Allowed from any stage. An attached seed dataset stays attached.
    pub fn reset(&mut self) {
        tracing::info!(rounds = self.session.history.len(), "session reset");
        self.session = SessionState::new();
    }

    /// First-person comforting draft for the round awaiting the user's reply.
    pub fn suggest_comfort(&self) -> Result<String, TransitionError> {
        self.expect_stage("suggest_comfort", Stage::AwaitingUserComfort)?;
        let draft = self
            .session
            .draft
            .as_ref()
            .ok_or(TransitionError::MissingDraft(self.session.stage))?;

        self.standalone_text(PromptBuilder::soother(&draft.scene, &draft.inner_thought))
    }

    pub fn summarize_journey(&mut self) -> Result<String, TransitionError> {
        if self.session.stage.is_generating() {
            return Err(TransitionError::WrongStage {
                operation: "summarize_journey",
                stage: self.session.stage,
            });
        }
        if self.session.history.is_empty() {
            return Err(TransitionError::NothingToSummarize);
        }

        let summary =
            self.standalone_text(PromptBuilder::journey_summary(self.session.history.all()))?;

        self.session.journey_summary = Some(summary.clone());
        Ok(summary)
    }

    /// Text for operations outside the round flow. Failures are handed back
    /// to the caller instead of being written into the session.
    fn standalone_text(&self, request: PromptRequest) -> Result<String, TransitionError> {
        let agent = request.key.agent();
        let Generation { text, error } = self.client.generate(&request, OutputFormat::Text);
        if let Some(detail) = error {
            return Err(TransitionError::GenerationFailed { agent, detail });
        }
        match text.trim() {
            "" => Err(TransitionError::EmptyReply(agent)),
            text => Ok(text.to_string()),
        }
    }

    fn call(
        &self,
        request: PromptRequest,
        format: OutputFormat,
        warnings: &mut Vec<TransitionWarning>,
    ) -> String {
        let Generation { text, error } = self.client.generate(&request, format);
        if let Some(detail) = error {
            warnings.push(TransitionWarning::GenerationFailed {
                agent: request.key.agent().to_string(),
                detail,
            });
        }
        text
    }
}

/// Parses `field`, substituting the failure placeholder for empty results.
fn labeled(reply: &str, field: LabeledField, warnings: &mut Vec<TransitionWarning>) -> String {
    let value = extract_labeled(reply, field);
    let value = value.trim();
    if value.is_empty() {
        let agent = match field {
            LabeledField::Scene => "Trigger",
            LabeledField::Type | LabeledField::Thoughts => "Devil",
        };
        warnings.push(TransitionWarning::EmptyField {
            agent: agent.to_string(),
            field: field.key().to_string(),
        });
        return FAILED_TEXT.to_string();
    }
    value.to_string()
}

fn fallback_warning<T>(
    output: AgentOutput<T>,
    key: TemplateKey,
    warnings: &mut Vec<TransitionWarning>,
) -> T {
    match output {
        AgentOutput::Parsed(value) => value,
        AgentOutput::Fallback { value, raw } => {
            warnings.push(TransitionWarning::ParseFallback {
                agent: key.agent().to_string(),
                raw,
            });
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::llm_client::testing::ScriptedBackend;
    use crate::engine::llm_client::ERROR_MARKER;
    use crate::engine::templates::TemplateStore;
    use crate::model::agent_output::{DEFAULT_MEMORY_SUMMARY, DEFAULT_SUGGESTION};
    use crate::model::seed::SeedEntry;
    use serde_json::json;

    const FIRST_DEVIL: &str = "这个想法以偏概全。\nType: 过度概括\nThoughts: 我总是做不好";

    fn orchestrator(backend: ScriptedBackend) -> Orchestrator<ScriptedBackend> {
        Orchestrator::new(TextGenerationClient::new(backend, TemplateStore::new()))
            .unwrap()
            .with_rng(StdRng::seed_from_u64(42))
    }

    fn scene(n: u32) -> String {
        format!("先想一想氛围。\nScene: 场景{n}")
    }

    fn guide(n: u32) -> String {
        json!({
            "guidance_suggestions": [format!("建议{n}")],
            "memory_summary_curr": format!("摘要{n}"),
        })
        .to_string()
    }

    fn strategist(n: u32, is_end: &str) -> String {
        json!({
            "progression_directives": {
                "next_scene_directive": format!("场景方向{n}"),
                "next_thought_directive": format!("想法方向{n}"),
                "is_end": is_end,
            }
        })
        .to_string()
    }

    /// Queues one full round's worth of replies.
    fn queue_round(backend: &ScriptedBackend, n: u32, is_end: &str) {
        backend.push_reply(scene(n));
        if n == 1 {
            backend.push_reply(FIRST_DEVIL);
        } else {
            backend.push_reply(format!("Type: 灾难化\nThoughts: 想法{n}"));
        }
        backend.push_reply(guide(n));
        backend.push_reply(strategist(n, is_end));
    }

    fn play_round(o: &mut Orchestrator<ScriptedBackend>, comfort: &str) -> TransitionReport {
        o.generate_scene_and_thought().unwrap();
        o.submit_comfort(comfort).unwrap();
        o.generate_guidance_and_plan().unwrap()
    }

    #[test]
    fn plays_rounds_until_strategist_says_yes() {
        let backend = ScriptedBackend::new();
        queue_round(&backend, 1, "No");
        queue_round(&backend, 2, "maybe");
        queue_round(&backend, 3, "YES");
        let mut o = orchestrator(backend);

        o.submit_concern(Some("工作压力".into()), "总是担心被裁员").unwrap();
        assert_eq!(o.session().round, 1);

        let r1 = play_round(&mut o, "我已经很努力了");
        assert_eq!(r1.stage, Stage::GeneratingSceneAndThought);
        assert!(r1.warnings.is_empty());
        let r2 = play_round(&mut o, "一次失误不代表全部");
        assert_eq!(r2.stage, Stage::GeneratingSceneAndThought);
        let r3 = play_round(&mut o, "我可以接纳现在的自己");
        assert_eq!(r3.stage, Stage::Finished);

        let history = o.session().history.all();
        assert_eq!(history.len(), 3);
        for (i, record) in history.iter().enumerate() {
            assert_eq!(record.round_number, i as u32 + 1);
            assert_eq!(record.distortion_type, "过度概括");
        }
        assert_eq!(history[0].scene, "场景1");
        assert_eq!(history[0].inner_thought, "我总是做不好");
        assert_eq!(history[1].inner_thought, "想法2");
        assert_eq!(history[2].guidance_suggestions, vec!["建议3".to_string()]);
        assert!(history[2].progression_directive.is_end);
        assert_eq!(o.client().backend().remaining(), 0);

        assert!(matches!(
            o.advance(),
            Err(TransitionError::WrongStage { stage: Stage::Finished, .. })
        ));
    }

    #[test]
    fn directive_of_round_one_steers_round_two() {
        let backend = ScriptedBackend::new();
        queue_round(&backend, 1, "No");
        queue_round(&backend, 2, "No");
        let mut o = orchestrator(backend);

        o.submit_concern(None, "和家人吵架").unwrap();
        play_round(&mut o, "他们也在意我");
        assert_eq!(o.session().directive.next_scene_directive, "场景方向1");
        o.generate_scene_and_thought().unwrap();

        let calls = o.client().backend().calls.borrow();
        // trigger, devil, guide, strategist, trigger, devil
        assert_eq!(calls.len(), 6);
        assert!(calls[4].prompt.contains("场景方向1"));
        assert!(calls[4].prompt.contains("他们也在意我"));
        assert!(calls[4].prompt.contains("摘要1"));
        assert!(calls[5].prompt.contains("想法方向1"));
        assert!(calls[5].prompt.contains("我总是做不好"));
        assert!(calls[5].prompt.contains("过度概括"));
        assert!(calls[3].prompt.contains("摘要1"));
        assert!(calls[2].want_json && calls[3].want_json);
        assert!(!calls[0].want_json);
    }

    #[test]
    fn missing_directives_fall_back_and_continue() {
        let backend = ScriptedBackend::new()
            .reply(scene(1))
            .reply(FIRST_DEVIL)
            .reply(guide(1))
            .reply(json!({"plan": "whatever"}).to_string());
        let mut o = orchestrator(backend);

        o.submit_concern(None, "失眠").unwrap();
        let report = play_round(&mut o, "慢慢来");

        assert_eq!(report.stage, Stage::GeneratingSceneAndThought);
        assert!(matches!(
            report.warnings.as_slice(),
            [TransitionWarning::ParseFallback { agent, .. }] if agent == "Strategist"
        ));
        assert_eq!(o.session().round, 2);
        assert_eq!(o.session().directive, ProgressionDirective::default());
        assert_eq!(
            o.session().history.all()[0].progression_directive,
            ProgressionDirective::default()
        );
    }

    #[test]
    fn unparsable_guide_still_commits() {
        let backend = ScriptedBackend::new()
            .reply(scene(1))
            .reply(FIRST_DEVIL)
            .reply("I think you should relax.")
            .reply(strategist(1, "No"));
        let mut o = orchestrator(backend);

        o.submit_concern(None, "考试焦虑").unwrap();
        let report = play_round(&mut o, "考不好也没关系");

        let record = o.session().history.last().unwrap();
        assert_eq!(record.guidance_suggestions, vec![DEFAULT_SUGGESTION.to_string()]);
        assert_eq!(record.memory_summary, DEFAULT_MEMORY_SUMMARY);
        assert_eq!(record.user_comfort, "考不好也没关系");
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, TransitionWarning::ParseFallback { agent, .. } if agent == "Guide")));
    }

    #[test]
    fn later_rounds_inherit_round_one_type() {
        let backend = ScriptedBackend::new();
        queue_round(&backend, 1, "No");
        backend.push_reply(scene(2));
        backend.push_reply("Type: 非黑即白\nThoughts: 一切都完了");
        let mut o = orchestrator(backend);

        o.submit_concern(None, "分手了").unwrap();
        play_round(&mut o, "我值得被爱");
        o.generate_scene_and_thought().unwrap();

        let draft = o.session().draft.as_ref().unwrap();
        assert_eq!(draft.distortion_type, "过度概括");
        assert_eq!(draft.inner_thought, "一切都完了");
    }

    #[test]
    fn empty_inputs_are_rejected_without_state_change() {
        let backend = ScriptedBackend::new().reply(scene(1)).reply(FIRST_DEVIL);
        let mut o = orchestrator(backend);

        assert_eq!(o.submit_concern(None, "   "), Err(TransitionError::EmptyConcern));
        assert_eq!(o.session().stage, Stage::AwaitingInput);
        assert_eq!(o.session().round, 0);

        o.submit_concern(None, "孤独").unwrap();
        o.advance().unwrap();
        assert_eq!(o.submit_comfort(" \n"), Err(TransitionError::EmptyComfort));
        assert_eq!(o.session().stage, Stage::AwaitingUserComfort);
        assert_eq!(o.session().draft.as_ref().unwrap().user_comfort, None);
    }

    #[test]
    fn transitions_out_of_order_are_rejected() {
        let mut o = orchestrator(ScriptedBackend::new());

        assert!(matches!(
            o.submit_comfort("hi"),
            Err(TransitionError::WrongStage { stage: Stage::AwaitingInput, .. })
        ));
        assert!(o.generate_guidance_and_plan().is_err());
        assert!(o.advance().is_err());

        o.submit_concern(None, "x").unwrap();
        assert!(matches!(
            o.submit_concern(None, "y"),
            Err(TransitionError::WrongStage { .. })
        ));
        assert_eq!(o.session().concern, "x");
    }

    #[test]
    fn reset_from_every_stage() {
        let backend = ScriptedBackend::new();
        queue_round(&backend, 1, "No");
        queue_round(&backend, 2, "yes");
        let mut o = orchestrator(backend);

        let mut seen = Vec::new();
        let mut check = |o: &mut Orchestrator<ScriptedBackend>| {
            seen.push(o.session().stage);
            let mut copy_state = o.session().clone();
            o.reset();
            assert_eq!(o.session().stage, Stage::AwaitingInput);
            assert_eq!(o.session().round, 0);
            assert!(o.session().history.is_empty());
            assert!(o.session().draft.is_none());
            // put the session back to keep walking the state machine
            std::mem::swap(&mut o.session, &mut copy_state);
        };

        check(&mut o);
        o.submit_concern(None, "压力").unwrap();
        check(&mut o);
        o.advance().unwrap();
        check(&mut o);
        o.submit_comfort("没事").unwrap();
        check(&mut o);
        o.advance().unwrap();
        o.advance().unwrap();
        o.submit_comfort("还好").unwrap();
        o.advance().unwrap();
        check(&mut o);

        assert_eq!(
            seen,
            vec![
                Stage::AwaitingInput,
                Stage::GeneratingSceneAndThought,
                Stage::AwaitingUserComfort,
                Stage::GeneratingGuidanceAndPlan,
                Stage::Finished,
            ]
        );
    }

    #[test]
    fn seeded_first_round_only_asks_for_the_thought() {
        let backend = ScriptedBackend::new().reply("Thoughts: 他们一定讨厌我");
        let mut o = orchestrator(backend);
        o.attach_seed_dataset(SeedDataset::new(vec![SeedEntry {
            scene: "同事聚餐没叫我".into(),
            distortion_type: "读心术".into(),
        }]));

        o.submit_concern(None, "人际关系").unwrap();
        o.generate_scene_and_thought().unwrap();

        let draft = o.session().draft.as_ref().unwrap();
        assert_eq!(draft.scene, "同事聚餐没叫我");
        assert_eq!(draft.distortion_type, "读心术");
        assert_eq!(draft.inner_thought, "他们一定讨厌我");

        let calls = o.client().backend().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("读心术"));
        assert_eq!(o.snapshot().seed_dataset_entries, Some(1));
    }

    #[test]
    fn backend_failures_degrade_to_placeholders() {
        let backend = ScriptedBackend::new()
            .fail("connection refused")
            .reply("")
            .fail("connection refused")
            .fail("connection refused");
        let mut o = orchestrator(backend);

        o.submit_concern(None, "没动力").unwrap();
        let report = o.generate_scene_and_thought().unwrap();
        let draft = o.session().draft.clone().unwrap();
        assert!(draft.scene.starts_with(ERROR_MARKER));
        assert_eq!(draft.inner_thought, FAILED_TEXT);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, TransitionWarning::GenerationFailed { agent, .. } if agent == "Trigger")));

        o.submit_comfort("休息一下吧").unwrap();
        let report = o.generate_guidance_and_plan().unwrap();
        assert_eq!(report.stage, Stage::GeneratingSceneAndThought);
        assert_eq!(o.session().history.len(), 1);
        let record = o.session().history.last().unwrap();
        assert!(record.memory_summary.contains("connection refused"));
        assert!(!record.progression_directive.is_end);
    }

    #[test]
    fn soother_draft_and_journey_summary() {
        let backend = ScriptedBackend::new()
            .reply(scene(1))
            .reply(FIRST_DEVIL)
            .reply("  我已经做得很好了。 ")
            .reply(guide(1))
            .reply(strategist(1, "Yes"));
        let mut o = orchestrator(backend);

        assert_eq!(o.summarize_journey(), Err(TransitionError::NothingToSummarize));

        o.submit_concern(None, "自卑").unwrap();
        o.advance().unwrap();
        assert_eq!(o.suggest_comfort().unwrap(), "我已经做得很好了。");
        assert_eq!(o.session().stage, Stage::AwaitingUserComfort);

        o.submit_comfort("我已经做得很好了。").unwrap();
        o.advance().unwrap();
        assert_eq!(o.session().stage, Stage::Finished);

        o.client().backend().push_reply("这段旅程让我看见了自己。");
        let summary = o.summarize_journey().unwrap();
        assert_eq!(summary, "这段旅程让我看见了自己。");
        assert_eq!(o.session().journey_summary.as_deref(), Some(summary.as_str()));

        let calls = o.client().backend().calls.borrow();
        let last = calls.last().unwrap();
        assert!(last.prompt.contains("我总是做不好"));
        assert!(last.prompt.contains("建议1"));
        assert!(last.prompt.contains("我已经做得很好了。"));
    }

    #[test]
    fn failed_or_empty_soother_never_becomes_comfort() {
        let backend = ScriptedBackend::new()
            .reply(scene(1))
            .reply(FIRST_DEVIL)
            .fail("401 unauthorized")
            .reply("   ");
        let mut o = orchestrator(backend);
        o.submit_concern(None, "自卑").unwrap();
        o.advance().unwrap();

        let err = o.suggest_comfort().unwrap_err();
        assert_eq!(
            err,
            TransitionError::GenerationFailed {
                agent: "Soother",
                detail: "401 unauthorized".into(),
            }
        );
        assert!(!err.is_fatal());
        assert_eq!(o.suggest_comfort(), Err(TransitionError::EmptyReply("Soother")));

        let draft = o.session().draft.as_ref().unwrap();
        assert!(draft.user_comfort.is_none());
        assert_eq!(o.session().stage, Stage::AwaitingUserComfort);
    }

    #[test]
    fn failed_or_empty_journey_summary_is_not_stored() {
        let backend = ScriptedBackend::new();
        queue_round(&backend, 1, "Yes");
        let mut o = orchestrator(backend);
        o.submit_concern(None, "拖延").unwrap();
        play_round(&mut o, "没关系");
        assert_eq!(o.session().stage, Stage::Finished);

        o.client().backend().push_reply("   ");
        assert_eq!(o.summarize_journey(), Err(TransitionError::EmptyReply("Summary")));
        assert!(o.session().journey_summary.is_none());

        let before = o.client().backend().calls.borrow().len();
        let err = o.summarize_journey().unwrap_err();
        assert!(matches!(err, TransitionError::GenerationFailed { .. }));
        assert!(!err.to_string().is_empty());
        assert!(o.session().journey_summary.is_none());
        assert_eq!(o.client().backend().calls.borrow().len(), before + 1);
    }
}
