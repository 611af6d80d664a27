//! Stage cascade of result cards: "+" nodes, stage menus and stage panels.
//!
//! Panels are egui areas placed at the frame positions computed by
//! [`FlowLayout`]. The height each panel actually takes is measured after it is
//! shown and fed back into the card's [`FlowState`], so later stages and
//! connectors move with it on the next frame.

use super::forms::{self, FormOutcome};
use super::rendering::{draw_plus_node, hex_color, OUTLINE, SURFACE};
use super::state::SchemaBuilderApp;
use crate::catalog;
use crate::constants::{CARD_CORNER_RADIUS, FLOW_NODE_RADIUS, MENU_WIDTH};
use crate::flow::{FlowLayout, FlowStage, FlowState, MENU_OPTIONS};
use crate::geometry::card_rect_at;
use crate::trend;
use crate::types::*;
use eframe::egui::{self, Color32, RichText};

/// Frame shared by stage panels, menus and overlays.
pub fn panel_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(SURFACE)
        .stroke(egui::Stroke::new(1.0, OUTLINE))
        .corner_radius(CARD_CORNER_RADIUS)
        .inner_margin(egui::Margin::same(10))
}

/// Today's date for action records.
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

impl SchemaBuilderApp {
    /// Flow state and layout of a result card at its live position.
    ///
    /// # Returns
    ///
    /// `None` for cards without an analyte, which have no stages
    pub fn flow_layout(&self, node: &SchemaNode) -> Option<(FlowState, FlowLayout)> {
        node.analyte_type?;
        let state = self.flows.get(&node.id).cloned().unwrap_or_default();
        let layout = FlowLayout::compute(card_rect_at(self.live_position(node)), &state);
        Some((state, layout))
    }

    /// Stores a card configuration, logging if the card has gone away.
    pub fn commit_config(&mut self, node_id: NodeId, config: TestResultConfig) {
        if let Err(err) = self.schema.update_node_config(node_id, config) {
            log::warn!("Failed to update card config: {err}");
        }
    }

    /// Opens a stage under a card and enables its feature.
    pub fn open_stage(&mut self, node_id: NodeId, stage: FlowStage) {
        let Some(node) = self.schema.node(node_id) else {
            return;
        };
        let mut config = node.config_or_default();
        self.flow_mut(node_id).select_menu(stage, &mut config);
        if stage == FlowStage::Compare {
            trend::ensure_defaults(&mut config);
        }
        self.commit_config(node_id, config);
    }

    /// Closes a stage under a card and disables its feature.
    pub fn close_stage(&mut self, node_id: NodeId, stage: FlowStage) {
        let Some(node) = self.schema.node(node_id) else {
            return;
        };
        let mut config = node.config_or_default();
        self.flow_mut(node_id).close_stage(stage, &mut config);
        self.commit_config(node_id, config);
    }

    /// Draws the "+" nodes of every result card and handles their clicks.
    pub fn draw_plus_nodes(&mut self, ui: &mut egui::Ui, painter: &egui::Painter) {
        let mut toggled = Vec::new();
        for node in &self.schema.nodes {
            let Some((state, layout)) = self.flow_layout(node) else {
                continue;
            };
            let accent = hex_color(catalog::line_hex(node));
            for plus in layout.plus_nodes(&state, self.schema.is_linked(node.id)) {
                let centre = self.world_to_screen(plus.position);
                let rect = egui::Rect::from_center_size(centre, egui::Vec2::splat(FLOW_NODE_RADIUS * 2.0));
                let response = ui.interact(rect, ui.id().with(("plus", node.id, plus.opens)), egui::Sense::click());
                draw_plus_node(painter, centre, &plus, accent, response.hovered());
                if response.clicked() {
                    toggled.push((node.id, plus.opens));
                }
            }
        }
        for (node_id, stage) in toggled {
            self.flow_mut(node_id).toggle_menu(stage);
        }
    }

    /// Shows the open stage menus and stage panels of every result card.
    pub fn draw_stage_panels(&mut self, ctx: &egui::Context) {
        let cards: Vec<(NodeId, FlowState, FlowLayout, Color32)> = self
            .schema
            .nodes
            .iter()
            .filter_map(|node| {
                let (state, layout) = self.flow_layout(node)?;
                Some((node.id, state, layout, hex_color(catalog::line_hex(node))))
            })
            .collect();

        for (node_id, state, layout, accent) in cards {
            if let Some(stage) = state.active_menu() {
                let origin = self.world_to_screen(layout.menu_origin(stage, &state));
                self.draw_stage_menu(ctx, node_id, stage, origin);
            }
            for stage in state.open_stages() {
                let origin = self.world_to_screen(layout.frame_pos(stage));
                let height = self.draw_stage_panel(ctx, node_id, stage, origin, accent);
                if self.flow_mut(node_id).set_stage_height(stage, height) {
                    log::debug!("{} stage of {node_id} measured at {height}", stage.tag());
                    ctx.request_repaint();
                }
            }
        }
    }

    fn draw_stage_menu(&mut self, ctx: &egui::Context, node_id: NodeId, stage: FlowStage, origin: egui::Pos2) {
        let picked = egui::Area::new(egui::Id::new(("stage-menu", node_id, stage)))
            .fixed_pos(origin)
            .constrain(false)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                panel_frame()
                    .show(ui, |ui| {
                        ui.set_width(MENU_WIDTH - 20.0);
                        let mut picked = None;
                        for option in MENU_OPTIONS {
                            let mut button = egui::Button::new(RichText::new(option.label).size(10.0))
                                .min_size(egui::vec2(ui.available_width(), 26.0));
                            if option.dashed {
                                button = button
                                    .fill(Color32::TRANSPARENT)
                                    .stroke(egui::Stroke::new(1.0, Color32::from_gray(0x96)));
                            }
                            if ui.add(button).clicked() {
                                picked = Some(option.target);
                            }
                        }
                        picked
                    })
                    .inner
            })
            .inner;

        if let Some(target) = picked {
            self.open_stage(node_id, target);
        }
    }

    /// Shows one stage panel.
    ///
    /// # Returns
    ///
    /// The height the panel took on screen
    fn draw_stage_panel(
        &mut self,
        ctx: &egui::Context,
        node_id: NodeId,
        stage: FlowStage,
        origin: egui::Pos2,
        accent: Color32,
    ) -> f32 {
        let response = egui::Area::new(egui::Id::new(("stage", node_id, stage)))
            .fixed_pos(origin)
            .constrain(false)
            .show(ctx, |ui| {
                panel_frame()
                    .show(ui, |ui| {
                        ui.set_width(stage.width() - 20.0);
                        let close = ui
                            .horizontal(|ui| {
                                ui.label(RichText::new(stage.title()).strong().color(accent));
                                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                    ui.small_button("×").clicked()
                                })
                                .inner
                            })
                            .inner;
                        ui.separator();
                        let outcome = self.stage_contents(ui, node_id, stage, accent);
                        close || outcome.close
                    })
                    .inner
            });

        if response.inner {
            self.close_stage(node_id, stage);
        }
        response.response.rect.height()
    }

    fn stage_contents(
        &mut self,
        ui: &mut egui::Ui,
        node_id: NodeId,
        stage: FlowStage,
        accent: Color32,
    ) -> FormOutcome {
        match stage {
            FlowStage::Condition => self.condition_contents(ui, node_id),
            FlowStage::Compare => {
                let Some(node) = self.schema.node(node_id) else {
                    return FormOutcome::default();
                };
                let current = node.value();
                let mut config = node.config_or_default();
                let salt = ui.id().with(node_id);
                let outcome = forms::compare_panel(ui, &mut config, current, accent, salt);
                if outcome.changed {
                    self.commit_config(node_id, config);
                }
                outcome
            }
            FlowStage::Record => self.record_contents(ui, node_id),
            FlowStage::Notify => {
                let Some(node) = self.schema.node(node_id) else {
                    return FormOutcome::default();
                };
                let mut config = node.config_or_default();
                let outcome = forms::notify_panel(ui, &mut config);
                if outcome.changed {
                    self.commit_config(node_id, config);
                }
                outcome
            }
        }
    }

    /// Condition editor of a card, shared by the condition stage and the
    /// link overlay. Once saved only the summary is shown.
    pub fn condition_contents(&mut self, ui: &mut egui::Ui, node_id: NodeId) -> FormOutcome {
        let Some(node) = self.schema.node(node_id) else {
            return FormOutcome::default();
        };
        let analyte = node
            .analyte_type
            .map(AnalyteType::display_name)
            .unwrap_or(node.label.as_str())
            .to_string();
        let unit = node.unit().unwrap_or("PPM").to_string();
        let mut config = node.config_or_default();

        let rule = self
            .drafts
            .conditions
            .entry(node_id)
            .or_insert_with(|| ConditionRule::from_config(&config));

        if self.drafts.saved_conditions.contains(&node_id) {
            ui.label(RichText::new(rule.summary(&analyte, &unit)).size(11.0));
            if ui.small_button("Edit").clicked() {
                self.drafts.saved_conditions.remove(&node_id);
            }
            return FormOutcome::default();
        }

        let salt = ui.id().with(node_id);
        let outcome = forms::condition_form(ui, rule, &analyte, &unit, salt);
        if outcome.save {
            rule.apply_to(&mut config);
            log::info!("Saved condition for {node_id}: {}", rule.summary(&analyte, &unit));
            self.drafts.saved_conditions.insert(node_id);
            self.commit_config(node_id, config);
        }
        outcome
    }

    fn record_contents(&mut self, ui: &mut egui::Ui, node_id: NodeId) -> FormOutcome {
        let Some(node) = self.schema.node(node_id) else {
            return FormOutcome::default();
        };
        let today = today();
        let mut config = node.config_or_default();
        let record = self.drafts.records.entry(node_id).or_insert_with(|| {
            config
                .boron_action_record
                .clone()
                .unwrap_or_else(|| ActionRecord::with_defaults(today))
        });

        if self.drafts.saved_records.contains(&node_id) {
            ui.label(RichText::new(record.summary(today)).size(11.0));
            if ui.small_button("Edit").clicked() {
                self.drafts.saved_records.remove(&node_id);
            }
            return FormOutcome::default();
        }

        let salt = ui.id().with(node_id);
        let outcome = forms::record_form(ui, record, today, salt);
        if outcome.save {
            config.boron_action_record = Some(record.clone());
            log::info!("Saved action for {node_id}: {}", record.summary(today));
            self.drafts.saved_records.insert(node_id);
            self.commit_config(node_id, config);
        }
        outcome
    }
}
