//! User interface of the schema builder.
//!
//! This module contains the main application struct, the canvas, card and link
//! rendering, the stage panels, the palette and the JSON preview.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main `SchemaBuilderApp`
//! - `canvas` - Canvas navigation, card dragging and link creation
//! - `rendering` - Drawing cards, links, dots and the grid
//! - `links` - Link dots, the link action menu and its overlays
//! - `panels` - Stage cascade panels under result cards
//! - `forms` - Editors shown inside stage panels and overlays
//! - `palette` - Catalog of addable cards
//! - `json_modal` - Schema JSON preview
//! - `highlighters` - JSON syntax highlighting

mod canvas;
mod forms;
mod highlighters;
mod json_modal;
mod links;
mod palette;
mod panels;
mod rendering;
mod state;

#[cfg(test)]
mod tests;

pub use state::{EditorSettings, SchemaBuilderApp};

use eframe::egui::{self, RichText};
use rendering::{MUTED, SURFACE};

const MIN_PALETTE_WIDTH: f32 = 180.0;

impl eframe::App for SchemaBuilderApp {
    /// Persists editor settings between restarts. The schema is not saved.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    /// Main update function called by egui for each frame.
    ///
    /// Lays out the header bar, the palette on the right, the canvas in the
    /// middle, then the JSON preview and toasts on top.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `_frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        let now = ctx.input(|i| i.time);
        self.expire_toasts(now);
        self.handle_escape_key(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.draw_header(ui);
        });

        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let max_width = (viewport_width * 0.9).max(MIN_PALETTE_WIDTH);
        let clamped_width = self.settings.palette_width.clamp(MIN_PALETTE_WIDTH, max_width);

        egui::SidePanel::right("palette")
            .resizable(true)
            .default_width(clamped_width)
            .show(ctx, |ui| {
                self.settings.palette_width = ui.available_width().clamp(MIN_PALETTE_WIDTH, max_width);
                self.draw_palette(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(ctx.style().visuals.extreme_bg_color))
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });

        self.draw_json_preview(ctx, now);
        self.draw_toasts(ctx);

        if !self.toasts.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }
}

impl SchemaBuilderApp {
    /// Draws the header bar: schema name, view toggles and "Apply changes".
    fn draw_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Schema").color(MUTED));
            ui.add(
                egui::TextEdit::singleline(&mut self.schema.name)
                    .hint_text("Untitled schema")
                    .desired_width(200.0),
            );

            ui.separator();
            ui.checkbox(&mut self.settings.dark_mode, "Dark mode");
            ui.checkbox(&mut self.settings.show_grid, "Grid");
            ui.checkbox(&mut self.settings.snap_on_release, "Snap to grid");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Apply changes").clicked() {
                    log::debug!(
                        "Previewing schema with {} cards and {} links",
                        self.schema.nodes.len(),
                        self.schema.links.len()
                    );
                    self.show_json = true;
                }
            });
        });
    }

    /// Renders the canvas with cards, links and stage cascades, and handles
    /// pointer interaction.
    ///
    /// Widgets that sit on the canvas (link dots, proximity dots, "+" nodes and
    /// the egui areas of menus and panels) are registered before dragging and
    /// panning run, so a press on them never moves a card or the canvas.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        self.canvas.origin = canvas_rect.min;
        let painter = painter.with_clip_rect(canvas_rect);
        let ctx = ui.ctx().clone();
        let now = ui.input(|i| i.time);
        let suppress_previews = ui.input(|i| i.modifiers.command);

        if self.settings.show_grid {
            self.draw_grid(&painter, canvas_rect);
        }

        for node in &self.schema.nodes {
            if let Some((state, layout)) = self.flow_layout(node) {
                self.draw_flow_connectors(&painter, node, &layout, &state);
            }
        }
        for node in &self.schema.nodes {
            self.draw_card(&painter, node);
        }

        self.draw_links(ui, &painter);
        let pairs = self.current_proximity_pairs(suppress_previews);
        self.draw_proximity_pairs(ui, &painter, &pairs, now);
        self.draw_plus_nodes(ui, &painter);

        self.draw_stage_panels(&ctx);
        self.draw_link_menus(&ctx);
        self.draw_link_overlay(&ctx, now);

        self.handle_node_dragging(ui, &response);
        self.handle_canvas_panning(ui, &response);

        if self.schema.nodes.is_empty() {
            draw_intro(&painter, canvas_rect);
        }
        painter.text(
            canvas_rect.left_bottom() + egui::vec2(10.0, -10.0),
            egui::Align2::LEFT_BOTTOM,
            format!(
                "Canvas offset: {:.0}px, {:.0}px",
                self.canvas.offset.x, self.canvas.offset.y
            ),
            egui::FontId::monospace(11.0),
            MUTED,
        );
    }

    /// Shows pending toasts stacked above the bottom edge of the window.
    fn draw_toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
            .order(egui::Order::Tooltip)
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    egui::Frame::new()
                        .fill(SURFACE)
                        .stroke(egui::Stroke::new(1.0, MUTED))
                        .corner_radius(6.0)
                        .inner_margin(egui::Margin::symmetric(12, 8))
                        .show(ui, |ui| {
                            ui.label(RichText::new(&toast.message).color(egui::Color32::WHITE));
                        });
                    ui.add_space(4.0);
                }
            });
    }
}

/// Placeholder shown on an empty canvas.
fn draw_intro(painter: &egui::Painter, canvas_rect: egui::Rect) {
    let centre = canvas_rect.center();
    painter.text(
        centre - egui::vec2(0.0, 12.0),
        egui::Align2::CENTER_CENTER,
        "Build your schema",
        egui::FontId::proportional(20.0),
        MUTED,
    );
    painter.text(
        centre + egui::vec2(0.0, 14.0),
        egui::Align2::CENTER_CENTER,
        "Pick a field from the palette, then drag cards next to each other to link them",
        egui::FontId::proportional(13.0),
        MUTED.gamma_multiply(0.7),
    );
}
