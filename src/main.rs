mod config;
mod engine;
mod model;
mod ui;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::engine::llm_client::{OpenAiBackend, TextGenerationClient};
use crate::engine::orchestrator::Orchestrator;
use crate::engine::templates::TemplateStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mind_dialogue=info")),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(model = %config.model, base_url = %config.base_url, "backend configured");

    let backend = OpenAiBackend::new(config)?;
    let orchestrator = Orchestrator::new(TextGenerationClient::new(backend, TemplateStore::new()))
        .context("prompt templates are inconsistent")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MIND 内心对话",
        options,
        Box::new(|cc| Ok(Box::new(ui::app::MindApp::new(cc, orchestrator)))),
    )
    .map_err(|e| anyhow::anyhow!("UI failed: {e}"))
}
