use std::path::PathBuf;

use crate::model::event_result::TransitionWarning;
use crate::model::session::SessionSnapshot;

/// Presentation layer -> engine thread.
pub enum EngineCommand {
    SubmitConcern {
        theme: Option<String>,
        concern: String,
    },
    SubmitComfort(String),
    SuggestComfort,
    SummarizeJourney,
    LoadSeedDataset(PathBuf),
    ClearSeedDataset,
    TestConnection,
    Reset,
}

/// Engine thread -> presentation layer.
pub enum EngineResponse {
    Session(SessionSnapshot),
    Warnings(Vec<TransitionWarning>),
    Rejected(String),
    ComfortSuggestion(String),
    Status(String),
}
