//! Home panel: hero copy beside the framed card, plus the selection window.

use eframe::egui;

use super::backdrop;
use super::DemoApp;

/// Window width where hero and card sit side by side.
const TWO_COLUMN_WIDTH: f32 = 900.0;

impl DemoApp {
    pub fn draw_home(&mut self, ui: &mut egui::Ui) {
        let window_width = ui.ctx().screen_rect().width();
        if window_width >= TWO_COLUMN_WIDTH {
            ui.columns(2, |cols| {
                draw_hero(&mut cols[0]);
                self.draw_card(&mut cols[1], window_width);
            });
        } else {
            draw_hero(ui);
            ui.add_space(16.0);
            self.draw_card(ui, window_width);
        }
    }

    fn draw_card(&mut self, ui: &mut egui::Ui, window_width: f32) {
        let wanted = egui::vec2(ui.available_width(), backdrop::card_height(window_width));
        // A mounted card keeps its size until remounted
        let size = self.card.mounted_size().unwrap_or(wanted);
        let rect = egui::Rect::from_min_size(ui.cursor().min, size);
        let time = self.app_start.elapsed().as_secs_f64();
        backdrop::paint(ui.painter(), rect, self.dark_mode, time);

        if !self.show_card {
            ui.allocate_exact_size(size, egui::Sense::hover());
            ui.ctx().request_repaint();
            return;
        }

        let out = self.card.show(ui, size);
        for hit in out.selected {
            self.record_selection(hit);
        }
    }

    /// Non-blocking window listing the latest selected nodes.
    pub fn draw_selection_window(&mut self, ctx: &egui::Context) {
        if self.selections.is_empty() {
            return;
        }
        let mut open = self.selection_open;
        egui::Window::new("Selected node")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                if let Some(latest) = self.selections.first() {
                    ui.heading(&latest.text);
                    ui.label(egui::RichText::new(format!("node #{}", latest.index)).weak());
                }
                if self.selections.len() > 1 {
                    ui.separator();
                    for hit in self.selections.iter().skip(1) {
                        ui.label(egui::RichText::new(&hit.text).small());
                    }
                }
            });
        self.selection_open = open;
    }
}

fn draw_hero(ui: &mut egui::Ui) {
    ui.add_space(48.0);
    ui.label(
        egui::RichText::new("Innovation Driven\nTechnology Focused")
            .size(40.0)
            .strong(),
    );
    ui.add_space(16.0);
    ui.add(
        egui::Label::new(
            egui::RichText::new(
                "Dedicated to building high-performance applications, providing excellent \
                 user experience and innovative technical solutions.",
            )
            .size(16.0)
            .weak(),
        )
        .wrap(),
    );
    ui.add_space(8.0);
    ui.label(egui::RichText::new("Drag the sphere to spin it, click a node to select it.").small());
}
