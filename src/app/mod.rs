//! `DemoApp`: the portfolio home panel hosting the dynamic card.
//!
//! Methods are split across the sibling sub-modules:
//!
//! - `toolbar`:  theme and remount controls, resource status line
//! - `home`:     hero text, card framing and the selection window
//! - `backdrop`: gradient, shadow and star field painting
//! - `settings`: environment overrides

pub mod backdrop;
pub mod home;
pub mod settings;
pub mod toolbar;

use std::sync::Arc;

use eframe::egui;

use dynamic_card::{CardWidget, GlyphFont, NodeHit};

use settings::DemoSettings;

/// Selections kept for the window.
const HISTORY_LEN: usize = 8;

pub struct DemoApp {
    pub settings: DemoSettings,
    pub card: CardWidget,
    pub show_card: bool,
    pub dark_mode: bool,
    /// Most recent selection first
    pub selections: Vec<NodeHit>,
    pub selection_open: bool,
    pub remounts: u32,
    pub app_start: std::time::Instant,
}

impl DemoApp {
    pub fn new(settings: DemoSettings, font: GlyphFont) -> Self {
        let card = CardWidget::new(settings.card_config(), Arc::new(font)).with_seed(settings.seed);
        Self {
            settings,
            card,
            show_card: true,
            dark_mode: true,
            selections: Vec::new(),
            selection_open: false,
            remounts: 0,
            app_start: std::time::Instant::now(),
        }
    }

    /// Drop the current card; the next frame mounts a fresh one.
    pub fn remount(&mut self) {
        self.card.unmount();
        self.remounts += 1;
        log::info!("Remounting card (#{})", self.remounts);
    }

    pub fn record_selection(&mut self, hit: NodeHit) {
        self.selections.insert(0, hit);
        self.selections.truncate(HISTORY_LEN);
        self.selection_open = true;
    }
}

impl eframe::App for DemoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_home(ui);
        });

        self.draw_selection_window(ctx);
    }

    fn raw_input_hook(&mut self, _ctx: &egui::Context, raw_input: &mut egui::RawInput) {
        self.card.suppress_gestures(raw_input);
    }
}
