use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::session::{Stage, THEMES};
use crate::ui::app::MindApp;

/// Combo entry meaning "no preset theme".
const NO_THEME: &str = "不指定";

pub fn draw_left_panel(ctx: &egui::Context, app: &mut MindApp) {
    egui::SidePanel::left("left")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                draw_session_start(ui, app);
                ui.separator();
                draw_seed_dataset(ui, app);
                ui.separator();
                draw_controls(ui, app);
            });
        });
}

fn draw_session_start(ui: &mut egui::Ui, app: &mut MindApp) {
    let state = &app.ui.snapshot.state;
    let can_start = state.stage == Stage::AwaitingInput && !app.ui.busy;

    ui.heading("新的对话");
    ui.label(format!("阶段: {}", state.stage));
    if state.round > 0 {
        ui.label(format!("轮次: {}", state.round));
    }
    if let Some(kind) = state.locked_distortion_type() {
        ui.label(format!("认知扭曲: {kind}"));
    }

    ui.add_space(4.0);

    ui.add_enabled_ui(can_start, |ui| {
        egui::ComboBox::from_label("主题")
            .selected_text(app.ui.theme_choice.as_str())
            .show_ui(ui, |ui| {
                for theme in THEMES.iter().chain(std::iter::once(&NO_THEME)) {
                    ui.selectable_value(&mut app.ui.theme_choice, theme.to_string(), *theme);
                }
            });

        ui.label("你的困扰");
        ui.add(
            egui::TextEdit::multiline(&mut app.ui.concern_text)
                .desired_rows(4)
                .hint_text("例如：最近总觉得自己什么都做不好"),
        );

        if ui.button("开始").clicked() {
            let concern = app.ui.concern_text.trim().to_string();
            if concern.is_empty() {
                app.ui.push_notice("❌ 请先写下你的困扰");
                return;
            }
            let theme = Some(app.ui.theme_choice.clone()).filter(|t| t != NO_THEME);
            app.send_command(EngineCommand::SubmitConcern { theme, concern });
        }
    });
}

fn draw_seed_dataset(ui: &mut egui::Ui, app: &mut MindApp) {
    ui.heading("种子数据集");

    match app.ui.snapshot.seed_dataset_entries {
        Some(n) => ui.label(format!("已加载 {n} 条")),
        None => ui.label("未加载"),
    };

    ui.horizontal(|ui| {
        if ui.button("Load…").clicked() {
            let picked = rfd::FileDialog::new()
                .add_filter("Seed dataset", &["json", "csv"])
                .pick_file();

            if let Some(path) = picked {
                app.send_command(EngineCommand::LoadSeedDataset(path));
            }
        }

        let loaded = app.ui.snapshot.seed_dataset_entries.is_some();
        if ui.add_enabled(loaded, egui::Button::new("Clear")).clicked() {
            app.send_command(EngineCommand::ClearSeedDataset);
        }
    });
}

fn draw_controls(ui: &mut egui::Ui, app: &mut MindApp) {
    ui.horizontal(|ui| {
        if ui
            .add_enabled(!app.ui.busy, egui::Button::new("Reset"))
            .clicked()
        {
            app.ui.concern_text.clear();
            app.ui.comfort_text.clear();
            app.send_command(EngineCommand::Reset);
        }

        if ui.button("⚙ Settings").clicked() {
            app.ui.show_settings_window = !app.ui.show_settings_window;
        }
    });
}
