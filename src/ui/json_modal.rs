//! Read-only preview of the schema as pretty JSON.

use super::highlighters::highlight_json;
use super::state::SchemaBuilderApp;
use eframe::egui;

impl SchemaBuilderApp {
    /// Shows the JSON preview window while `show_json` is set.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `now` - Current `egui` input time, used for the copy toast
    pub fn draw_json_preview(&mut self, ctx: &egui::Context, now: f64) {
        if !self.show_json {
            return;
        }

        let json = match self.schema.to_json() {
            Ok(json) => json,
            Err(err) => {
                log::error!("Failed to serialize schema: {err}");
                self.push_toast(format!("Could not serialize schema: {err}"), now);
                self.show_json = false;
                return;
            }
        };

        let dark_mode = self.settings.dark_mode;
        let mut open = true;
        let mut copy = false;
        let mut close = false;

        egui::Window::new("Schema JSON Preview")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_size(egui::vec2(560.0, 480.0))
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} cards, {} links",
                    self.schema.nodes.len(),
                    self.schema.links.len()
                ));
                ui.separator();

                let mut layouter = |ui: &egui::Ui, text: &dyn egui::TextBuffer, wrap_width: f32| {
                    let font_id = egui::TextStyle::Monospace.resolve(ui.style());
                    let mut job = highlight_json(text.as_str(), font_id, dark_mode);
                    job.wrap.max_width = wrap_width;
                    ui.painter().layout_job(job)
                };
                let mut text = json.as_str();
                egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut text)
                            .code_editor()
                            .desired_width(f32::INFINITY)
                            .layouter(&mut layouter),
                    );
                });

                ui.separator();
                ui.horizontal(|ui| {
                    copy = ui.button("Copy").clicked();
                    close = ui.button("Close").clicked();
                });
            });

        if copy {
            ctx.copy_text(json);
            self.push_toast("Schema JSON copied to clipboard", now);
        }
        if close || !open {
            self.show_json = false;
        }
    }
}
