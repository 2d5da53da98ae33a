use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::history::History;
use crate::model::round::{ProgressionDirective, RoundDraft};

/// Preset concern themes offered by the UI. Free text is accepted too.
pub const THEMES: [&str; 4] = ["工作压力", "家庭冲突", "情感问题", "理想与现实落差"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    AwaitingInput,
    GeneratingSceneAndThought,
    AwaitingUserComfort,
    GeneratingGuidanceAndPlan,
    Finished,
}

impl Stage {
    pub fn is_generating(self) -> bool {
        matches!(
            self,
            Stage::GeneratingSceneAndThought | Stage::GeneratingGuidanceAndPlan
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::AwaitingInput => "awaiting input",
            Stage::GeneratingSceneAndThought => "generating scene and thought",
            Stage::AwaitingUserComfort => "awaiting comfort",
            Stage::GeneratingGuidanceAndPlan => "generating guidance and plan",
            Stage::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// Everything one conversation needs. Owned by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub round: u32,
    pub stage: Stage,
    pub theme: Option<String>,
    pub concern: String,
    pub draft: Option<RoundDraft>,
    pub directive: ProgressionDirective,
    pub history: History,
    /// Memory summary of the latest committed round.
    pub memory_summary: Option<String>,
    pub journey_summary: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Round 1's label, which every later round inherits.
    pub fn locked_distortion_type(&self) -> Option<&str> {
        self.history
            .first()
            .map(|r| r.distortion_type.as_str())
            .or_else(|| {
                self.draft
                    .as_ref()
                    .filter(|d| d.round_number == 1 && !d.distortion_type.is_empty())
                    .map(|d| d.distortion_type.as_str())
            })
    }
}

/// Read-only copy handed to the presentation layer after every transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub seed_dataset_entries: Option<usize>,
}
