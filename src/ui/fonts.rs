use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FONT_NAME: &str = "cjk";

const SYSTEM_CJK_FONTS: [&str; 6] = [
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
];

fn candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_CJK_FONTS.iter().map(PathBuf::from))
        .collect()
}

/// Adds the first readable CJK font as a fallback for both families.
pub fn install_cjk_font(ctx: &egui::Context, configured: Option<&Path>) {
    let Some((path, bytes)) = candidates(configured)
        .into_iter()
        .find_map(|path| std::fs::read(&path).ok().map(|bytes| (path, bytes)))
    else {
        tracing::warn!("no CJK font found, Chinese text may not render");
        return;
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        FONT_NAME.to_owned(),
        Arc::new(egui::FontData::from_owned(bytes)),
    );
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push(FONT_NAME.to_owned());
    }
    ctx.set_fonts(fonts);

    tracing::info!("using CJK font {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_font_is_tried_first() {
        let list = candidates(Some(Path::new("/fonts/mine.ttf")));
        assert_eq!(list[0], PathBuf::from("/fonts/mine.ttf"));
        assert_eq!(list.len(), SYSTEM_CJK_FONTS.len() + 1);
        assert_eq!(candidates(None).len(), SYSTEM_CJK_FONTS.len());
    }
}
