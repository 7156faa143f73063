//! Toolbar for `DemoApp`: card toggle, remount, theme and live status.

use eframe::egui;

use super::DemoApp;

impl DemoApp {
    /// Render the top toolbar strip.
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(4.0);

            let was_shown = self.show_card;
            ui.toggle_value(&mut self.show_card, "Card");
            if was_shown && !self.show_card {
                self.card.unmount();
            }

            if ui
                .add_enabled(self.show_card, egui::Button::new("\u{21BB} Remount"))
                .clicked()
            {
                self.remount();
            }

            let dark_label = if self.dark_mode { "\u{263E}" } else { "\u{2600}" };
            if ui.button(dark_label).clicked() {
                self.dark_mode = !self.dark_mode;
            }

            ui.separator();

            let stats = self.card.stats();
            let phase = match self.card.phase() {
                Some(p) => format!("{:?}", p),
                None => "unmounted".to_string(),
            };
            ui.label(
                egui::RichText::new(format!(
                    "nodes {} | textures {} | listeners {} | frames {} | {} | remounts {}",
                    self.card.node_count(),
                    stats.textures,
                    stats.listeners,
                    stats.frames,
                    phase,
                    self.remounts
                ))
                .monospace()
                .small(),
            );

            if let Some(seed) = self.settings.seed {
                ui.label(egui::RichText::new(format!("seed {}", seed)).small().weak());
            }

            if let Some(err) = self.card.error() {
                ui.colored_label(ui.visuals().error_fg_color, err.to_string());
            }
        });
    }
}
