use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::round::{ProgressionDirective, RoundRecord};
use crate::ui::app::{MindApp, RightTab};

pub fn draw_right_panel(ctx: &egui::Context, app: &mut MindApp) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(320.0)
        .min_width(240.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut app.ui.right_tab, RightTab::History, "History");
                let notices = format!("Notices ({})", app.ui.notices.len());
                ui.selectable_value(&mut app.ui.right_tab, RightTab::Notices, notices);
            });

            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| match app.ui.right_tab {
                RightTab::History => draw_history(ui, app),
                RightTab::Notices => draw_notices(ui, app),
            });
        });
}

/* =========================
   History
   ========================= */

fn draw_history(ui: &mut egui::Ui, app: &mut MindApp) {
    let state = &app.ui.snapshot.state;

    ui.heading("下一轮计划");
    draw_directive(ui, &state.directive);

    if let Some(memory) = &state.memory_summary {
        ui.collapsing("记忆摘要", |ui| {
            ui.label(memory);
        });
    }

    ui.separator();
    ui.heading("已完成的轮次");

    if state.history.is_empty() {
        ui.label("None");
    }
    for record in state.history.all() {
        draw_record(ui, record);
    }

    ui.separator();

    let can_summarize =
        !state.history.is_empty() && !state.stage.is_generating() && !app.ui.busy;
    if ui
        .add_enabled(can_summarize, egui::Button::new("🪞 生成自我融合总结"))
        .clicked()
    {
        app.send_command(EngineCommand::SummarizeJourney);
    }
}

fn draw_directive(ui: &mut egui::Ui, directive: &ProgressionDirective) {
    if directive.is_end {
        ui.label("🏁 对话结束");
        return;
    }
    ui.label(format!("场景: {}", directive.next_scene_directive));
    ui.label(format!("想法: {}", directive.next_thought_directive));
}

fn draw_record(ui: &mut egui::Ui, record: &RoundRecord) {
    ui.collapsing(format!("第 {} 轮", record.round_number), |ui| {
        ui.label(format!("场景: {}", record.scene));
        ui.label(format!("扭曲类型: {}", record.distortion_type));
        ui.label(format!("内心想法: {}", record.inner_thought));
        ui.label(format!("你的安慰: {}", record.user_comfort));

        ui.label("引导建议:");
        for suggestion in &record.guidance_suggestions {
            ui.label(format!("• {suggestion}"));
        }

        ui.label(format!("记忆: {}", record.memory_summary));
        ui.separator();
        draw_directive(ui, &record.progression_directive);
    });
}

/* =========================
   Notices
   ========================= */

fn draw_notices(ui: &mut egui::Ui, app: &mut MindApp) {
    if ui.small_button("Clear").clicked() {
        app.ui.notices.clear();
    }
    ui.separator();

    if app.ui.notices.is_empty() {
        ui.label("None");
    }
    for notice in app.ui.notices.iter().rev() {
        ui.label(notice);
        ui.add_space(2.0);
    }
}
