//! Dream Mixer - craft your perfect sleep soundscape
//!
//! Entry point and presentation shell. All mixing state lives in the
//! engine; this layer only translates gestures into engine intents and
//! renders the latest snapshot.

use anyhow::Result;
use eframe::egui;
use dreammixer_audio::{EngineConfig, MixerEngine, MixerSnapshot, SoundCatalog};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Dream Mixer starting...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 640.0])
            .with_title("Dream Mixer"),
        ..Default::default()
    };

    eframe::run_native(
        "Dream Mixer",
        options,
        Box::new(|_cc| Ok(Box::new(DreammixerApp::new()))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    Ok(())
}

struct DreammixerApp {
    engine: MixerEngine,
}

impl DreammixerApp {
    fn new() -> Self {
        let catalog = SoundCatalog::builtin();
        let engine = MixerEngine::with_system_audio(&catalog, EngineConfig::default());
        Self { engine }
    }
}

impl eframe::App for DreammixerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Any pointer press counts as the unlocking gesture, mirroring the
        // document-level touchstart/click listeners on the web.
        if ctx.input(|i| i.pointer.any_pressed()) {
            self.engine.on_user_gesture();
        }

        self.engine.pump();
        let snapshot = self.engine.snapshot();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Dream Mixer");
                ui.label("Craft your perfect sleep soundscape");
                ui.label(format!("Active Sounds: {}", snapshot.playing_count));
            });
            ui.separator();

            channel_list(ui, &mut self.engine, &snapshot);

            ui.separator();
            master_controls(ui, &mut self.engine, &snapshot);
        });

        // Ramps and async loads progress between frames.
        ctx.request_repaint_after(std::time::Duration::from_millis(50));
    }
}

fn channel_list(ui: &mut egui::Ui, engine: &mut MixerEngine, snapshot: &MixerSnapshot) {
    for view in snapshot.channels.iter().filter(|c| c.available) {
        ui.horizontal(|ui| {
            let label = if view.playing {
                egui::RichText::new(&view.display_name).strong()
            } else {
                egui::RichText::new(&view.display_name)
            };
            if ui
                .add_sized([90.0, 24.0], egui::Button::new(label))
                .clicked()
            {
                engine.toggle(&view.id);
            }

            let mut volume = view.volume.percent();
            let slider = egui::Slider::new(&mut volume, 0..=100).show_value(false);
            if ui.add(slider).changed() {
                engine.set_volume(&view.id, volume);
            }
            ui.label(format!("{}", view.volume));
        });
    }
}

fn master_controls(ui: &mut egui::Ui, engine: &mut MixerEngine, snapshot: &MixerSnapshot) {
    ui.horizontal(|ui| {
        ui.label("Master Volume");
        let mut master = snapshot.master_volume.percent();
        let slider = egui::Slider::new(&mut master, 0..=100).show_value(false);
        if ui.add(slider).changed() {
            engine.set_master_volume(master);
        }
        ui.label(format!("{}", snapshot.master_volume));
    });

    ui.vertical_centered(|ui| {
        if ui.button("Turn Off All Sounds").clicked() {
            engine.stop_all();
        }
        if !matches!(snapshot.activation, dreammixer_audio::ActivationState::Ready) {
            ui.label(format!("Audio: {:?} (tap anywhere to start)", snapshot.activation));
        }
    });
}
