use serde::{Deserialize, Serialize};

use crate::model::session::Stage;

/// Something degraded during a transition but did not stop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionWarning {
    GenerationFailed { agent: String, detail: String },
    ParseFallback { agent: String, raw: String },
    EmptyField { agent: String, field: String },
}

impl TransitionWarning {
    pub fn describe(&self) -> String {
        match self {
            TransitionWarning::GenerationFailed { agent, detail } => {
                format!("⚠ {agent}: generation failed ({detail})")
            }
            TransitionWarning::ParseFallback { agent, .. } => {
                format!("⚠ {agent}: output could not be parsed, defaults used")
            }
            TransitionWarning::EmptyField { agent, field } => {
                format!("⚠ {agent}: no {field} in output, placeholder used")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    pub stage: Stage,
    pub warnings: Vec<TransitionWarning>,
}

impl TransitionReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            warnings: Vec::new(),
        }
    }
}
