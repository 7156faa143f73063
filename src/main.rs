use eframe::egui;

use dynamic_card::GlyphFont;

mod app;

use app::settings::DemoSettings;
use app::DemoApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let settings = DemoSettings::from_env();
    log::info!("Starting demo with {:?}", settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dynamic Card",
        options,
        Box::new(move |cc| {
            // CJK fallback so UI and labels share one font chain
            let mut fonts = egui::FontDefinitions::default();
            let font_paths = [
                "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
                "/System/Library/Fonts/HiraginoSans-W3.otf",
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
                "C:\\Windows\\Fonts\\msyh.ttc",
            ];
            for path in &font_paths {
                if let Ok(data) = std::fs::read(path) {
                    fonts
                        .font_data
                        .insert("cjk".to_owned(), egui::FontData::from_owned(data));
                    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                        if let Some(list) = fonts.families.get_mut(&family) {
                            list.push("cjk".to_owned());
                        }
                    }
                    log::debug!("Loaded fallback font {}", path);
                    break;
                }
            }

            let label_font = GlyphFont::from_definitions(&fonts, &egui::FontFamily::Proportional)?;
            cc.egui_ctx.set_fonts(fonts);

            Ok(Box::new(DemoApp::new(settings, label_font)))
        }),
    )
}
