use std::ops::ControlFlow;
use std::sync::mpsc::{Receiver, Sender};

use crate::engine::llm_client::ChatBackend;
use crate::engine::orchestrator::{Orchestrator, TransitionError};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::event_result::TransitionReport;
use crate::model::seed::SeedDataset;

/// Owns the orchestrator on its own thread so blocking backend calls never
/// stall the UI.
pub struct Engine<B> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    orchestrator: Orchestrator<B>,
}

impl<B: ChatBackend> Engine<B> {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        orchestrator: Orchestrator<B>,
    ) -> Self {
        Self {
            rx,
            tx,
            orchestrator,
        }
    }

    /// Handles commands until the UI hangs up or an invariant breaks.
    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            if let ControlFlow::Break(err) = self.handle(cmd) {
                tracing::error!("engine stopped: {err}");
                self.send(EngineResponse::Rejected(format!(
                    "Internal error, please restart: {err}"
                )));
                break;
            }
        }
    }

    fn handle(&mut self, cmd: EngineCommand) -> ControlFlow<TransitionError> {
        match cmd {
            EngineCommand::SubmitConcern { theme, concern } => {
                let result = self.orchestrator.submit_concern(theme, &concern);
                return self.then_generate(result);
            }

            EngineCommand::SubmitComfort(text) => {
                let result = self.orchestrator.submit_comfort(&text);
                return self.then_generate(result);
            }

            EngineCommand::SuggestComfort => match self.orchestrator.suggest_comfort() {
                Ok(text) => self.send(EngineResponse::ComfortSuggestion(text)),
                Err(err) => return self.reject(err),
            },

            EngineCommand::SummarizeJourney => {
                let result = self.orchestrator.summarize_journey();
                if let Err(err) = result {
                    return self.reject(err);
                }
                self.send_session();
            }

            EngineCommand::LoadSeedDataset(path) => match SeedDataset::load(&path) {
                Ok(dataset) => {
                    let entries = dataset.len();
                    self.orchestrator.attach_seed_dataset(dataset);
                    self.send(EngineResponse::Status(format!(
                        "Seed dataset loaded ({entries} entries)"
                    )));
                    self.send_session();
                }
                Err(err) => {
                    tracing::warn!("seed dataset rejected: {err:#}");
                    self.send(EngineResponse::Rejected(format!("{err:#}")));
                }
            },

            EngineCommand::ClearSeedDataset => {
                self.orchestrator.detach_seed_dataset();
                self.send_session();
            }

            EngineCommand::TestConnection => {
                let status = match self.orchestrator.client().backend().test_connection() {
                    Ok(status) => status,
                    Err(err) => format!("Connection failed: {err:#}"),
                };
                self.send(EngineResponse::Status(status));
            }

            EngineCommand::Reset => {
                self.orchestrator.reset();
                self.send_session();
            }
        }

        ControlFlow::Continue(())
    }

    fn then_generate(
        &mut self,
        result: Result<TransitionReport, TransitionError>,
    ) -> ControlFlow<TransitionError> {
        match self.report(result) {
            Ok(()) => self.advance_generation(),
            Err(err) => self.reject(err),
        }
    }

    /// Runs generation steps until the session waits on the user again.
    fn advance_generation(&mut self) -> ControlFlow<TransitionError> {
        while self.orchestrator.session().stage.is_generating() {
            let result = self.orchestrator.advance();
            if let Err(err) = self.report(result) {
                return self.reject(err);
            }
        }
        ControlFlow::Continue(())
    }

    /// Publishes the session after a transition; hands the error back on failure.
    fn report(
        &self,
        result: Result<TransitionReport, TransitionError>,
    ) -> Result<(), TransitionError> {
        let report = result?;
        if !report.warnings.is_empty() {
            self.send(EngineResponse::Warnings(report.warnings));
        }
        self.send_session();
        Ok(())
    }

    fn reject(&self, err: TransitionError) -> ControlFlow<TransitionError> {
        if err.is_fatal() {
            return ControlFlow::Break(err);
        }
        tracing::debug!("transition rejected: {err}");
        self.send(EngineResponse::Rejected(err.to_string()));
        ControlFlow::Continue(())
    }

    fn send_session(&self) {
        self.send(EngineResponse::Session(self.orchestrator.snapshot()));
    }

    fn send(&self, response: EngineResponse) {
        let _ = self.tx.send(response);
    }
}
