use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::time::Duration;

use crate::engine::engine::Engine;
use crate::engine::llm_client::ChatBackend;
use crate::engine::orchestrator::Orchestrator;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::message::{transcript, Message};
use crate::model::session::{SessionSnapshot, THEMES};
use crate::ui::center_panel::draw_center_panel;
use crate::ui::fonts::install_cjk_font;
use crate::ui::left_panel::draw_left_panel;
use crate::ui::right_panel::draw_right_panel;
use crate::ui::settings::UiSettings;
use crate::ui::settings_io::{load_settings, save_settings};

const MAX_NOTICES: usize = 50;

/* =========================
   Tabs
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RightTab {
    #[default]
    History,
    Notices,
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub theme_choice: String,
    pub concern_text: String,
    pub comfort_text: String,

    pub snapshot: SessionSnapshot,
    pub rendered_messages: Vec<Message>,

    /// Warnings, rejections and status lines, newest last.
    pub notices: Vec<String>,

    /// A command is in flight and its answer has not arrived yet.
    pub busy: bool,
    pub should_auto_scroll: bool,
    pub show_settings_window: bool,

    pub right_tab: RightTab,
}

impl UiState {
    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.notices.push(text.into());
        if self.notices.len() > MAX_NOTICES {
            let overflow = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..overflow);
        }
    }

    fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.rendered_messages = transcript(&snapshot.state);
        self.busy = snapshot.state.stage.is_generating();
        self.snapshot = snapshot;
        self.should_auto_scroll = true;
    }

    fn apply_response(&mut self, resp: EngineResponse) {
        match resp {
            EngineResponse::Session(snapshot) => self.apply_snapshot(snapshot),
            EngineResponse::Warnings(warnings) => {
                for warning in warnings {
                    self.push_notice(warning.describe());
                }
            }
            EngineResponse::Rejected(reason) => {
                self.busy = false;
                self.push_notice(format!("❌ {reason}"));
            }
            EngineResponse::ComfortSuggestion(text) => {
                self.busy = false;
                self.comfort_text = text;
            }
            EngineResponse::Status(text) => {
                self.busy = false;
                self.push_notice(format!("ℹ {text}"));
            }
        }
    }
}

/* =========================
   App
   ========================= */

pub struct MindApp {
    pub ui: UiState,
    pub settings: UiSettings,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl MindApp {
    pub fn new<B>(cc: &eframe::CreationContext<'_>, orchestrator: Orchestrator<B>) -> Self
    where
        B: ChatBackend + Send + 'static,
    {
        let settings = load_settings();
        install_cjk_font(&cc.egui_ctx, settings.cjk_font_path.as_deref());

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, orchestrator);
            engine.run();
        });

        Self {
            ui: UiState {
                theme_choice: THEMES[0].to_string(),
                ..Default::default()
            },
            settings,
            cmd_tx,
            resp_rx,
        }
    }

    pub fn send_command(&mut self, cmd: EngineCommand) {
        let waits_for_answer = !matches!(
            cmd,
            EngineCommand::Reset | EngineCommand::ClearSeedDataset
        );
        if self.cmd_tx.send(cmd).is_err() {
            self.ui.push_notice("❌ Engine stopped, please restart the app");
            return;
        }
        if waits_for_answer {
            self.ui.busy = true;
        }
    }

    pub fn save_settings(&self) {
        save_settings(&self.settings);
    }

    pub fn draw_message(&self, ui: &mut egui::Ui, msg: &Message) {
        let (bg, right, text) = match msg {
            Message::User(t) => (self.settings.color("User"), true, t.clone()),
            Message::Persona { speaker, text } => {
                (self.settings.color(speaker.settings_key()), false, text.clone())
            }
            Message::System(t) => (self.settings.color("System"), false, t.clone()),
        };

        ui.add_space(6.0);

        if right {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, bg, &text);
            });
        } else {
            bubble(ui, bg, &text);
        }
    }

    fn draw_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.ui.show_settings_window;
        let mut changed = false;
        let mut test_connection = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("UI Scale");
                changed |= ui
                    .add(egui::Slider::new(&mut self.settings.ui_scale, 0.75..=2.0))
                    .changed();

                ui.separator();
                ui.label("Speaker colors");
                for key in crate::ui::settings::SPEAKER_KEYS {
                    let mut color = self.settings.color(key);
                    ui.horizontal(|ui| {
                        if ui.color_edit_button_srgba(&mut color).changed() {
                            self.settings.set_color(key, color);
                            changed = true;
                        }
                        ui.label(key);
                    });
                }

                ui.separator();
                test_connection = ui.button("Test connection").clicked();
            });

        self.ui.show_settings_window = open;
        if test_connection {
            self.send_command(EngineCommand::TestConnection);
        }
        if changed {
            self.save_settings();
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for MindApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.ui.apply_response(resp);
        }

        draw_left_panel(ctx, self);
        draw_right_panel(ctx, self);
        draw_center_panel(ctx, self);
        self.draw_settings_window(ctx);

        self.ui.should_auto_scroll = false;

        // The engine thread has no handle on the context, so poll while waiting.
        if self.ui.busy {
            ctx.request_repaint_after(Duration::from_millis(150));
        }
    }
}

/* =========================
   UI Helpers
   ========================= */

pub fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event_result::TransitionWarning;
    use crate::model::session::Stage;

    #[test]
    fn stopped_engine_does_not_leave_app_busy() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (_resp_tx, resp_rx) = mpsc::channel();
        drop(cmd_rx);

        let mut app = MindApp {
            ui: UiState::default(),
            settings: UiSettings::default(),
            cmd_tx,
            resp_rx,
        };
        app.send_command(EngineCommand::TestConnection);

        assert!(!app.ui.busy);
        assert!(app.ui.notices[0].contains("Engine stopped"));
    }

    #[test]
    fn generating_snapshot_keeps_busy() {
        let mut state = UiState::default();
        let mut snapshot = SessionSnapshot::default();
        snapshot.state.stage = Stage::GeneratingSceneAndThought;
        snapshot.state.concern = "失眠".into();

        state.apply_response(EngineResponse::Session(snapshot.clone()));
        assert!(state.busy);
        assert!(!state.rendered_messages.is_empty());

        snapshot.state.stage = Stage::AwaitingUserComfort;
        state.apply_response(EngineResponse::Session(snapshot));
        assert!(!state.busy);
    }

    #[test]
    fn suggestion_fills_comfort_box_and_notices_are_capped() {
        let mut state = UiState {
            busy: true,
            ..Default::default()
        };
        state.apply_response(EngineResponse::ComfortSuggestion("抱抱你".into()));
        assert_eq!(state.comfort_text, "抱抱你");
        assert!(!state.busy);

        for i in 0..(MAX_NOTICES + 5) {
            state.apply_response(EngineResponse::Warnings(vec![
                TransitionWarning::EmptyField {
                    agent: "Devil".into(),
                    field: format!("f{i}"),
                },
            ]));
        }
        assert_eq!(state.notices.len(), MAX_NOTICES);
        assert!(state.notices.last().is_some_and(|n| n.contains(&format!("f{}", MAX_NOTICES + 4))));
    }
}
