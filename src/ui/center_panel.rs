use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::session::Stage;
use super::app::MindApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut MindApp) {
    let input_id = egui::Id::new("comfort_input_box");
    let stage = app.ui.snapshot.state.stage;
    let can_comfort = stage == Stage::AwaitingUserComfort && !app.ui.busy;

    // ---------- Input bar ----------
    egui::TopBottomPanel::bottom("comfort_input").show(ctx, |ui| {
        if stage == Stage::Finished {
            ui.label("对话已结束。可以在右侧生成自我融合总结，或重置开始新的对话。");
            return;
        }

        let mut send_now = false;
        let mut suggest = false;

        ui.horizontal(|ui| {
            let response = ui.add_enabled_ui(can_comfort, |ui| {
                ui.add_sized(
                    [ui.available_width() - 120.0, 60.0],
                    egui::TextEdit::multiline(&mut app.ui.comfort_text)
                        .id(input_id)
                        .hint_text("对内心的声音说些安慰的话…")
                        .lock_focus(true),
                )
            });

            // Enter sends, Shift+Enter breaks the line
            if response.inner.has_focus() {
                let enter = ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);
                if enter {
                    send_now = true;
                }
            }

            ui.vertical(|ui| {
                if ui.add_enabled(can_comfort, egui::Button::new("Send")).clicked() {
                    send_now = true;
                }
                if ui
                    .add_enabled(can_comfort, egui::Button::new("Suggest"))
                    .on_hover_text("让安抚者起草一段安慰")
                    .clicked()
                {
                    suggest = true;
                }
            });

            if app.ui.busy {
                ui.spinner();
            }
        });

        if suggest {
            app.send_command(EngineCommand::SuggestComfort);
        }

        if send_now && can_comfort {
            let text = app.ui.comfort_text.trim().to_string();

            if !text.is_empty() {
                app.send_command(EngineCommand::SubmitComfort(text));
                app.ui.comfort_text.clear();
            }

            ui.memory_mut(|m| m.request_focus(input_id));
        }
    });

    // ---------- Dialogue ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        if app.ui.rendered_messages.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label("在左侧选择主题并写下你的困扰，开始一次内心对话。");
            });
            return;
        }

        egui::ScrollArea::vertical()
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                for msg in &app.ui.rendered_messages {
                    app.draw_message(ui, msg);
                }
            });
    });
}
