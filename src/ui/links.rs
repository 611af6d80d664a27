//! Linking between cards: proximity dots, link dots, the link action menu and
//! the overlays opened from it.

use super::forms;
use super::panels::panel_frame;
use super::rendering::{dashed_line, draw_link_dot, hex_color};
use super::state::{LinkOverlay, SchemaBuilderApp};
use crate::catalog;
use crate::constants::{LINK_DOT_RADIUS, MENU_WIDTH, OVERLAY_DROP, OVERLAY_WIDTH};
use crate::flow::FlowStage;
use crate::geometry::{self, ProximityPair};
use crate::rules::{self, CombinedDraft};
use crate::types::*;
use eframe::egui::{self, Color32, RichText};

/// Toast shown after a combined condition is saved.
pub const COMBINED_SAVED: &str = "Combined condition saved. Agrilo will monitor these nutrients.";

/// Actions offered by the menu hanging under a link dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Edit the combined condition of both cards
    CombinedCondition,
    /// Edit the source card's condition
    SetCondition,
    /// Open a stage under the source card
    OpenStage(FlowStage),
}

/// An entry of the link action menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkMenuEntry {
    /// Button caption
    pub label: &'static str,
    /// What the entry does
    pub action: LinkAction,
    /// Drawn with a dashed outline
    pub dashed: bool,
}

/// Entries of the link action menu, top to bottom.
pub const LINK_MENU: [LinkMenuEntry; 5] = [
    LinkMenuEntry { label: "Combined condition", action: LinkAction::CombinedCondition, dashed: false },
    LinkMenuEntry { label: "Set condition", action: LinkAction::SetCondition, dashed: false },
    LinkMenuEntry { label: "Compare trend", action: LinkAction::OpenStage(FlowStage::Compare), dashed: false },
    LinkMenuEntry { label: "Record action", action: LinkAction::OpenStage(FlowStage::Record), dashed: false },
    LinkMenuEntry { label: "Recommendation", action: LinkAction::OpenStage(FlowStage::Notify), dashed: true },
];

impl SchemaBuilderApp {
    /// Opens the action menu of a link under its dot, or closes it if open.
    pub fn toggle_link_menu(&mut self, link_id: LinkId) {
        let Some(link) = self.schema.link(link_id) else {
            return;
        };
        let update = if link.is_menu_open() {
            LinkUpdate {
                menu_open: Some(false),
                ..Default::default()
            }
        } else {
            LinkUpdate {
                menu_node_position: Some(geometry::link_menu_anchor(link.link_dot_position.into()).into()),
                menu_open: Some(true),
                ..Default::default()
            }
        };
        if let Err(err) = self.schema.update_link(link_id, update) {
            log::warn!("Failed to toggle link menu: {err}");
        }
    }

    /// Applies a pick from the link action menu. The menu closes either way.
    pub fn choose_link_action(&mut self, link_id: LinkId, action: LinkAction) {
        let closed = LinkUpdate {
            menu_open: Some(false),
            ..Default::default()
        };
        if let Err(err) = self.schema.update_link(link_id, closed) {
            log::warn!("Failed to close link menu: {err}");
            return;
        }
        let Some(link) = self.schema.link(link_id).cloned() else {
            return;
        };

        match action {
            LinkAction::CombinedCondition => {
                let (Some(source), Some(target)) = (
                    self.schema.node(link.source_node_id),
                    self.schema.node(link.target_node_id),
                ) else {
                    return;
                };
                let draft = CombinedDraft::seed(link.combined_condition.as_ref(), source, target);
                self.overlay = Some(LinkOverlay::Combined { link: link_id, draft });
            }
            LinkAction::SetCondition => {
                let source = link.source_node_id;
                let Some(node) = self.schema.node(source) else {
                    return;
                };
                let mut config = node.config_or_default();
                rules::seed_condition(&mut config);
                self.commit_config(source, config);
                self.drafts.conditions.remove(&source);
                self.drafts.saved_conditions.remove(&source);
                self.overlay = Some(LinkOverlay::Condition {
                    link: link_id,
                    node: source,
                });
            }
            LinkAction::OpenStage(stage) => self.open_stage(link.source_node_id, stage),
        }
    }

    /// Stores a combined condition on its link and closes the overlay.
    pub fn save_combined(&mut self, link_id: LinkId, draft: &CombinedDraft, now: f64) {
        let update = LinkUpdate {
            combined_condition: Some(draft.to_config()),
            ..Default::default()
        };
        match self.schema.update_link(link_id, update) {
            Ok(()) => {
                log::info!("Saved combined condition on {link_id}: {}", draft.summary());
                self.overlay = None;
                self.push_toast(COMBINED_SAVED, now);
            }
            Err(err) => log::warn!("Failed to save combined condition: {err}"),
        }
    }

    /// Draws existing links and handles clicks on their dots.
    ///
    /// A primary click toggles the action menu; the context menu offers
    /// removing the link.
    pub fn draw_links(&mut self, ui: &mut egui::Ui, painter: &egui::Painter) {
        let mut hovered = None;
        let mut toggled = None;
        let mut removed = None;

        for link in &self.schema.links {
            let Some(dot) = self.draw_link(painter, link) else {
                continue;
            };
            let response = ui
                .interact(dot, ui.id().with(("link-dot", link.id)), egui::Sense::click())
                .on_hover_text("Manage link");
            if response.hovered() {
                hovered = Some(link.id);
            }
            if response.clicked() {
                toggled = Some(link.id);
            }
            response.context_menu(|ui| {
                if ui.button("Remove link").clicked() {
                    removed = Some(link.id);
                    ui.close();
                }
            });
        }

        self.interaction.hovered_link = hovered;
        if let Some(link_id) = toggled {
            self.toggle_link_menu(link_id);
        }
        if let Some(link_id) = removed {
            self.remove_link(link_id);
        }
    }

    /// Draws the dashed previews and open dots of proximity pairs.
    ///
    /// Clicking a dot links the pair.
    pub fn draw_proximity_pairs(
        &mut self,
        ui: &mut egui::Ui,
        painter: &egui::Painter,
        pairs: &[ProximityPair],
        now: f64,
    ) {
        let mut clicked = None;
        for pair in pairs {
            let (Some(source), Some(target)) = (self.schema.node(pair.source), self.schema.node(pair.target)) else {
                continue;
            };
            let accent = hex_color(catalog::line_hex(source));
            let stroke = egui::Stroke::new(1.5, accent.gamma_multiply(0.4));
            let dot = self.world_to_screen(pair.midpoint);
            for card in [source, target] {
                let rect = geometry::card_rect_at(self.live_position(card));
                dashed_line(painter, [self.world_to_screen(rect.center_bottom()), dot], stroke);
            }

            let rect = egui::Rect::from_center_size(dot, egui::Vec2::splat(LINK_DOT_RADIUS * 2.0));
            let response = ui
                .interact(rect, ui.id().with(("proximity", pair.source, pair.target)), egui::Sense::click())
                .on_hover_text("Link cards");
            draw_link_dot(painter, dot, accent, false, response.hovered());
            if response.clicked() {
                clicked = Some(*pair);
            }
        }

        if let Some(pair) = clicked {
            self.create_link(&pair, now);
        }
    }

    /// Shows the action menus of links whose menu is open.
    pub fn draw_link_menus(&mut self, ctx: &egui::Context) {
        let menus: Vec<(LinkId, egui::Pos2)> = self
            .schema
            .links
            .iter()
            .filter(|l| l.is_menu_open())
            .filter_map(|l| l.menu_node_position.map(|p| (l.id, p.into())))
            .collect();

        for (link_id, anchor) in menus {
            let origin = self.world_to_screen(anchor) - egui::vec2((MENU_WIDTH / 2.0).floor(), 0.0);
            let picked = egui::Area::new(egui::Id::new(("link-menu", link_id)))
                .fixed_pos(origin)
                .constrain(false)
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    panel_frame()
                        .show(ui, |ui| {
                            ui.set_width(MENU_WIDTH - 20.0);
                            let mut picked = None;
                            for entry in LINK_MENU {
                                let mut button = egui::Button::new(RichText::new(entry.label).size(10.0))
                                    .min_size(egui::vec2(ui.available_width(), 26.0));
                                if entry.dashed {
                                    button = button
                                        .fill(Color32::TRANSPARENT)
                                        .stroke(egui::Stroke::new(1.0, Color32::from_gray(0x96)));
                                }
                                if ui.add(button).clicked() {
                                    picked = Some(entry.action);
                                }
                            }
                            picked
                        })
                        .inner
                })
                .inner;

            if let Some(action) = picked {
                self.choose_link_action(link_id, action);
            }
        }
    }

    /// Shows the overlay opened from a link menu, if any.
    pub fn draw_link_overlay(&mut self, ctx: &egui::Context, now: f64) {
        let Some(overlay) = self.overlay.clone() else {
            return;
        };
        let Some(anchor) = self
            .schema
            .link(overlay.link())
            .and_then(|l| l.menu_node_position)
        else {
            self.overlay = None;
            return;
        };
        let origin = self.world_to_screen(anchor.into()) + egui::vec2(-OVERLAY_WIDTH / 2.0, OVERLAY_DROP);

        let area = egui::Area::new(egui::Id::new(("link-overlay", overlay.link())))
            .fixed_pos(origin)
            .constrain(false)
            .order(egui::Order::Foreground);

        match overlay {
            LinkOverlay::Condition { node, .. } => {
                let close = area
                    .show(ctx, |ui| {
                        panel_frame()
                            .show(ui, |ui| {
                                ui.set_width(OVERLAY_WIDTH - 20.0);
                                let close = ui
                                    .horizontal(|ui| {
                                        ui.label(RichText::new("Set condition").strong());
                                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                            ui.small_button("×").clicked()
                                        })
                                        .inner
                                    })
                                    .inner;
                                self.condition_contents(ui, node);
                                close
                            })
                            .inner
                    })
                    .inner;
                if close {
                    self.overlay = None;
                }
            }
            LinkOverlay::Combined { link, mut draft } => {
                let outcome = area
                    .show(ctx, |ui| {
                        panel_frame()
                            .show(ui, |ui| {
                                ui.set_width(OVERLAY_WIDTH - 20.0);
                                forms::combined_form(ui, &mut draft, egui::Id::new(("combined", link)))
                            })
                            .inner
                    })
                    .inner;
                if outcome.save {
                    self.save_combined(link, &draft, now);
                } else if outcome.close {
                    self.overlay = None;
                } else {
                    self.overlay = Some(LinkOverlay::Combined { link, draft });
                }
            }
        }
    }
}
