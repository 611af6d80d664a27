//! Rendering functionality for the canvas.
//!
//! This module draws the dotted grid, result and field cards, link connectors
//! and dots, and the dashed connectors of each card's stage cascade. Everything
//! is painted in screen space from world geometry.

use super::state::SchemaBuilderApp;
use crate::catalog::{self, AnalyteSummary, DEFAULT_BORDER_HEX};
use crate::constants::{CARD_CORNER_RADIUS, DOT_RADIUS, DOT_SPACING, FLOW_NODE_RADIUS, LINK_DOT_RADIUS};
use crate::flow::{FlowLayout, FlowState, PlusNode};
use crate::geometry::{self, card_rect_at};
use crate::types::*;
use eframe::egui::{self, Color32};
use eframe::epaint::StrokeKind;

/// Card and panel background.
pub const SURFACE: Color32 = Color32::from_rgb(0x1a, 0x1a, 0x1a);
/// Subtle outline used by dots and nodes.
pub const OUTLINE: Color32 = Color32::from_rgb(0x2a, 0x2a, 0x2a);
/// Primary text on dark surfaces.
pub const TEXT: Color32 = Color32::from_rgb(0xed, 0xed, 0xed);
/// Secondary text.
pub const MUTED: Color32 = Color32::from_rgb(0xa0, 0xa0, 0xa0);
const SELECTED: Color32 = Color32::from_rgb(0xfa, 0xcc, 0x15);

/// Parses a `#rrggbb` colour, falling back to grey.
pub fn hex_color(hex: &str) -> Color32 {
    Color32::from_hex(hex).unwrap_or(Color32::GRAY)
}

/// Bar heights of the mini visualizer, as fractions of its height.
pub fn visualizer_bars() -> [f32; 12] {
    std::array::from_fn(|i| {
        let normalized = (i % 6) as f32 / 5.0;
        (45.0 + (normalized * std::f32::consts::PI).sin() * 25.0) / 100.0
    })
}

/// Paints a dashed segment.
pub fn dashed_line(painter: &egui::Painter, points: [egui::Pos2; 2], stroke: egui::Stroke) {
    painter.extend(egui::Shape::dashed_line(&points, stroke, 6.0, 4.0));
}

impl SchemaBuilderApp {
    /// Draws the dotted background grid.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    /// * `canvas_rect` - The screen-space rectangle defining visible area
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let color = Color32::from_rgba_unmultiplied(128, 128, 128, 48);

        let top_left_world = self.screen_to_world(canvas_rect.min);
        let bottom_right_world = self.screen_to_world(canvas_rect.max);
        let start_x = (top_left_world.x / DOT_SPACING).floor() * DOT_SPACING;
        let start_y = (top_left_world.y / DOT_SPACING).floor() * DOT_SPACING;

        let mut x = start_x;
        while x <= bottom_right_world.x {
            let mut y = start_y;
            while y <= bottom_right_world.y {
                painter.circle_filled(self.world_to_screen(egui::pos2(x, y)), DOT_RADIUS, color);
                y += DOT_SPACING;
            }
            x += DOT_SPACING;
        }
    }

    /// Renders a single card at its live position.
    ///
    /// Result cards show their analyte summary, other cards show their label,
    /// data type and data payload.
    pub fn draw_card(&self, painter: &egui::Painter, node: &SchemaNode) {
        let rect = self.world_rect_to_screen(card_rect_at(self.live_position(node)));
        let dragging = self.interaction.dragging_node == Some(node.id);

        match catalog::analyte_summary(node) {
            Some(summary) => draw_analyte_card(painter, rect, &summary, dragging),
            None => draw_field_card(painter, rect, node, dragging),
        }

        if !dragging && self.interaction.selected_node == Some(node.id) {
            painter.rect_stroke(
                rect.expand(3.0),
                CARD_CORNER_RADIUS + 3.0,
                egui::Stroke::new(2.0, SELECTED),
                StrokeKind::Outside,
            );
        }
    }

    /// Draws the connectors and dot of an existing link.
    ///
    /// The dot is only drawn while the cards stay within twice the snap radius.
    ///
    /// # Returns
    ///
    /// The screen rectangle of the dot when it is shown
    pub fn draw_link(&self, painter: &egui::Painter, link: &CardLink) -> Option<egui::Rect> {
        let source = self.schema.node(link.source_node_id)?;
        let target = self.schema.node(link.target_node_id)?;
        let source_rect = card_rect_at(self.live_position(source));
        let target_rect = card_rect_at(self.live_position(target));

        let hovered = self.interaction.hovered_link == Some(link.id);
        let alpha = if hovered { 0.6 } else { 0.4 };
        let accent = hex_color(catalog::line_hex(source));
        let stroke = egui::Stroke::new(1.5, accent.gamma_multiply(alpha));

        let lines = geometry::link_connectors(source_rect, target_rect, link);
        let mut segments = vec![lines.source, lines.target];
        segments.extend(lines.leader);
        for segment in segments {
            painter.line_segment(segment.map(|p| self.world_to_screen(p)), stroke);
        }

        if let Some(menu) = link.menu_node_position.filter(|_| link.is_menu_open()) {
            painter.circle_filled(self.world_to_screen(menu.into()), 4.0, accent);
        }

        if !geometry::link_dot_visible(source_rect, target_rect) {
            return None;
        }
        let centre = self.world_to_screen(link.link_dot_position.into());
        draw_link_dot(painter, centre, accent, true, hovered);
        Some(egui::Rect::from_center_size(centre, egui::Vec2::splat(LINK_DOT_RADIUS * 2.0)))
    }

    /// Draws the dashed connectors of a result card's stage cascade.
    pub fn draw_flow_connectors(
        &self,
        painter: &egui::Painter,
        node: &SchemaNode,
        layout: &FlowLayout,
        state: &FlowState,
    ) {
        let stroke = egui::Stroke::new(1.5, hex_color(catalog::line_hex(node)).gamma_multiply(0.6));
        let show_root = !self.schema.is_linked(node.id);
        for segment in layout.connector_lines(state, show_root) {
            dashed_line(painter, segment.map(|p| self.world_to_screen(p)), stroke);
        }
    }
}

/// Draws a link dot: open while it only proposes a link, filled once linked.
pub fn draw_link_dot(
    painter: &egui::Painter,
    centre: egui::Pos2,
    accent: Color32,
    linked: bool,
    hovered: bool,
) {
    let border = if hovered { accent } else { OUTLINE };
    painter.circle_filled(centre, LINK_DOT_RADIUS, SURFACE);
    painter.circle_stroke(centre, LINK_DOT_RADIUS, egui::Stroke::new(2.0, border));
    let (glyph, color) = if linked { ("●", MUTED) } else { ("○", Color32::from_gray(0x66)) };
    painter.text(
        centre,
        egui::Align2::CENTER_CENTER,
        glyph,
        egui::FontId::proportional(12.0),
        color,
    );
}

/// Draws a "+" stage node with the tag of the stage it opens.
pub fn draw_plus_node(
    painter: &egui::Painter,
    centre: egui::Pos2,
    node: &PlusNode,
    accent: Color32,
    hovered: bool,
) {
    let highlight = node.active || node.menu_open;
    let fill = if highlight { accent } else { SURFACE };
    let border = if highlight || hovered { accent } else { OUTLINE };
    painter.circle_filled(centre, FLOW_NODE_RADIUS, fill);
    painter.circle_stroke(centre, FLOW_NODE_RADIUS, egui::Stroke::new(2.0, border));

    let glyph = if node.menu_open { "×" } else { "+" };
    let text_color = if highlight { Color32::WHITE } else { MUTED };
    painter.text(
        centre,
        egui::Align2::CENTER_CENTER,
        glyph,
        egui::FontId::proportional(14.0),
        text_color,
    );
    painter.text(
        centre + egui::vec2(FLOW_NODE_RADIUS + 6.0, 0.0),
        egui::Align2::LEFT_CENTER,
        node.opens.tag(),
        egui::FontId::monospace(10.0),
        MUTED,
    );
}

fn draw_analyte_card(painter: &egui::Painter, rect: egui::Rect, summary: &AnalyteSummary, dragging: bool) {
    let border = hex_color(&summary.border_hex);
    let accent = hex_color(&summary.accent_hex);
    let small = egui::FontId::monospace(10.0);

    // Header strip
    let header = egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), 24.0));
    painter.rect_filled(header, CARD_CORNER_RADIUS, SURFACE);
    painter.rect_stroke(header, CARD_CORNER_RADIUS, egui::Stroke::new(1.0, border), StrokeKind::Inside);
    painter.text(
        header.left_center() + egui::vec2(8.0, 0.0),
        egui::Align2::LEFT_CENTER,
        &summary.test_name,
        small.clone(),
        Color32::WHITE,
    );
    painter.text(
        header.right_center() - egui::vec2(8.0, 0.0),
        egui::Align2::RIGHT_CENTER,
        &summary.timestamp,
        small.clone(),
        Color32::from_gray(0xc1),
    );

    // Value panel
    let body = egui::Rect::from_min_max(rect.min + egui::vec2(0.0, 30.0), rect.max);
    painter.rect_filled(body, CARD_CORNER_RADIUS, SURFACE);
    let body_stroke = if dragging {
        egui::Stroke::new(2.0, accent)
    } else {
        egui::Stroke::new(1.0, border)
    };
    painter.rect_stroke(body, CARD_CORNER_RADIUS, body_stroke, StrokeKind::Outside);

    let inner = body.shrink(10.0);
    painter.text(
        inner.left_top(),
        egui::Align2::LEFT_TOP,
        &summary.analyte_label,
        egui::FontId::proportional(12.0),
        Color32::WHITE,
    );

    let badge_text = if summary.warns {
        format!("⚠ {}", summary.status)
    } else {
        summary.status.clone()
    };
    let badge_galley = painter.layout_no_wrap(badge_text, small.clone(), Color32::WHITE);
    let badge = egui::Rect::from_min_size(
        egui::pos2(inner.max.x - badge_galley.size().x - 12.0, inner.min.y - 2.0),
        badge_galley.size() + egui::vec2(12.0, 8.0),
    );
    painter.rect_filled(badge, 3.0, Color32::from_gray(0x20));
    painter.rect_stroke(badge, 3.0, egui::Stroke::new(1.0, Color32::from_gray(0x2c)), StrokeKind::Inside);
    painter.galley(badge.min + egui::vec2(6.0, 4.0), badge_galley, Color32::WHITE);

    let value_pos = inner.left_top() + egui::vec2(0.0, 36.0);
    let value_galley = painter.layout_no_wrap(summary.value_text(), egui::FontId::proportional(24.0), Color32::WHITE);
    let value_width = value_galley.size().x;
    painter.galley(value_pos, value_galley, Color32::WHITE);
    painter.text(
        value_pos + egui::vec2(value_width + 6.0, 12.0),
        egui::Align2::LEFT_CENTER,
        &summary.unit,
        small,
        Color32::from_gray(0xd9),
    );

    let visualizer = egui::Rect::from_min_size(
        egui::pos2(inner.max.x - 106.0, value_pos.y - 4.0),
        egui::vec2(106.0, 36.0),
    );
    draw_mini_visualizer(painter, visualizer, accent);

    let track = egui::Rect::from_min_size(
        egui::pos2(inner.min.x, inner.max.y - 7.0),
        egui::vec2(inner.width(), 7.0),
    );
    painter.rect_filled(track, 2.0, Color32::from_gray(0x16));
    let mut fill = track;
    fill.set_width(track.width() * summary.progress as f32);
    painter.rect_filled(fill, 2.0, hex_color(&summary.progress_hex));
}

fn draw_mini_visualizer(painter: &egui::Painter, rect: egui::Rect, color: Color32) {
    let bars = visualizer_bars();
    let gap = 2.0;
    let width = (rect.width() - gap * (bars.len() as f32 - 1.0)) / bars.len() as f32;
    for (i, height) in bars.iter().enumerate() {
        let x = rect.min.x + i as f32 * (width + gap);
        let bar = egui::Rect::from_min_max(
            egui::pos2(x, rect.max.y - rect.height() * height),
            egui::pos2(x + width, rect.max.y),
        );
        painter.rect_filled(bar, 1.0, color);
    }
}

fn draw_field_card(painter: &egui::Painter, rect: egui::Rect, node: &SchemaNode, dragging: bool) {
    let accent = hex_color(catalog::line_hex(node));
    painter.rect_filled(rect, 8.0, SURFACE);
    let border = if dragging { accent } else { hex_color(DEFAULT_BORDER_HEX) };
    painter.rect_stroke(rect, 8.0, egui::Stroke::new(1.0, border), StrokeKind::Outside);

    // Accent bar on the left edge
    let bar = egui::Rect::from_min_size(rect.min, egui::vec2(3.0, rect.height()));
    painter.rect_filled(bar, 2.0, accent);

    let icon = catalog::icon(&node.kind);
    let text_x = if icon.is_empty() { 16.0 } else { 44.0 };
    if !icon.is_empty() {
        painter.text(
            rect.left_top() + egui::vec2(16.0, 14.0),
            egui::Align2::LEFT_TOP,
            icon,
            egui::FontId::proportional(18.0),
            TEXT,
        );
    }
    painter.text(
        rect.left_top() + egui::vec2(text_x, 12.0),
        egui::Align2::LEFT_TOP,
        &node.label,
        egui::FontId::proportional(14.0),
        TEXT,
    );
    painter.text(
        rect.left_top() + egui::vec2(text_x, 30.0),
        egui::Align2::LEFT_TOP,
        catalog::data_type_label(&node.kind),
        egui::FontId::proportional(11.0),
        Color32::from_gray(0x66),
    );

    let divider_y = rect.min.y + 52.0;
    painter.line_segment(
        [egui::pos2(rect.min.x, divider_y), egui::pos2(rect.max.x, divider_y)],
        egui::Stroke::new(1.0, OUTLINE),
    );

    let data = serde_json::to_string_pretty(&node.data).unwrap_or_else(|_| "No data".to_string());
    let body = egui::Rect::from_min_max(egui::pos2(rect.min.x + 16.0, divider_y + 10.0), rect.max - egui::vec2(8.0, 8.0));
    painter.with_clip_rect(body).text(
        body.min,
        egui::Align2::LEFT_TOP,
        data,
        egui::FontId::monospace(11.0),
        MUTED,
    );
}
