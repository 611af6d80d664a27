//! Palette of addable card kinds, shown in the right side panel.

use super::rendering::{hex_color, MUTED};
use super::state::SchemaBuilderApp;
use crate::catalog::{self, NodeKind, CATEGORIES};
use crate::constants::{SPAWN_MIN, SPAWN_SPREAD};
use crate::error::SchemaResult;
use crate::types::*;
use eframe::egui::{self, RichText};
use rand::Rng;

impl SchemaBuilderApp {
    /// Adds a card of the given kind at a random spot near the top left of the
    /// world.
    ///
    /// # Returns
    ///
    /// The id of the new card, or an error if the store refuses it
    pub fn add_node_from_kind(&mut self, kind: &NodeKind) -> SchemaResult<NodeId> {
        let mut rng = rand::rng();
        let position = Point::new(
            SPAWN_MIN + rng.random::<f32>() * SPAWN_SPREAD,
            SPAWN_MIN + rng.random::<f32>() * SPAWN_SPREAD,
        );
        self.add_node_at(kind, position)
    }

    /// Adds a card of the given kind with its top-left corner at `position`.
    pub fn add_node_at(&mut self, kind: &NodeKind, position: Point) -> SchemaResult<NodeId> {
        let node = SchemaNode::new(
            kind.id,
            kind.label,
            kind.analyte,
            position,
            catalog::initial_data(kind),
        );
        let id = self.schema.add_node(node)?;
        log::info!("Added {} card {id} at ({:.0}, {:.0})", kind.id, position.x, position.y);
        Ok(id)
    }

    /// Draws the palette.
    ///
    /// # Arguments
    ///
    /// * `ui` - The side panel UI
    pub fn draw_palette(&mut self, ui: &mut egui::Ui) {
        ui.heading("Fields");
        ui.label(RichText::new("Click a field to add it to the canvas").small().color(MUTED));
        ui.separator();

        let mut picked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for category in CATEGORIES {
                egui::CollapsingHeader::new(category.label())
                    .default_open(true)
                    .show(ui, |ui| {
                        for kind in catalog::kinds_in_category(category) {
                            if palette_tile(ui, kind).clicked() {
                                picked = Some(kind);
                            }
                        }
                    });
            }
        });

        if let Some(kind) = picked {
            if let Err(err) = self.add_node_from_kind(kind) {
                log::warn!("Failed to add {} card: {err}", kind.id);
            }
        }
    }
}

/// One palette entry. Result kinds preview their latest demo result.
fn palette_tile(ui: &mut egui::Ui, kind: &NodeKind) -> egui::Response {
    let title = match catalog::icon(kind.id) {
        "" => kind.label.to_string(),
        icon => format!("{icon}  {}", kind.label),
    };

    let Some(analyte) = kind.analyte else {
        return ui.add(
            egui::Button::new(title)
                .min_size(egui::vec2(ui.available_width(), 28.0)),
        );
    };

    let preset = catalog::palette_preview(analyte);
    let accent = hex_color(analyte.accent_hex());
    let mut job = egui::text::LayoutJob::default();
    let style = ui.style();
    RichText::new(format!("{title}\n")).strong().append_to(
        &mut job,
        style,
        egui::FontSelection::Default,
        egui::Align::LEFT,
    );
    RichText::new(format!("{} · {}\n", preset.test_name, preset.timestamp))
        .small()
        .color(MUTED)
        .append_to(&mut job, style, egui::FontSelection::Default, egui::Align::LEFT);
    RichText::new(format!(
        "{}{}  {:.*} {}",
        if preset.warns { "⚠ " } else { "" },
        preset.status,
        analyte.decimals(),
        preset.value,
        analyte.unit()
    ))
    .small()
    .color(accent)
    .append_to(&mut job, style, egui::FontSelection::Default, egui::Align::LEFT);

    ui.add(
        egui::Button::new(job)
            .stroke(egui::Stroke::new(1.0, accent.gamma_multiply(0.5)))
            .min_size(egui::vec2(ui.available_width(), 52.0)),
    )
}
