use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const SPEAKER_KEYS: [&str; 6] = ["User", "Trigger", "Devil", "Guide", "Strategist", "System"];

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UiSettings {
    pub ui_scale: f32,

    // Speaker → color mapping
    pub speaker_colors: HashMap<String, [u8; 4]>,

    /// Font with CJK glyphs. Common system fonts are tried when unset.
    pub cjk_font_path: Option<PathBuf>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut speaker_colors = HashMap::new();

        speaker_colors.insert("User".into(), [40, 70, 120, 255]);
        speaker_colors.insert("Trigger".into(), [70, 80, 95, 255]);
        speaker_colors.insert("Devil".into(), [120, 40, 50, 255]);
        speaker_colors.insert("Guide".into(), [40, 90, 60, 255]);
        speaker_colors.insert("Strategist".into(), [90, 60, 120, 255]);
        speaker_colors.insert("System".into(), [80, 80, 80, 255]);

        Self {
            ui_scale: 1.0,
            speaker_colors,
            cjk_font_path: None,
        }
    }
}

impl UiSettings {
    pub fn color(&self, key: &str) -> Color32 {
        self.speaker_colors
            .get(key)
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::DARK_GRAY)
    }

    pub fn set_color(&mut self, key: &str, color: Color32) {
        self.speaker_colors.insert(
            key.to_string(),
            [color.r(), color.g(), color.b(), color.a()],
        );
    }
}
