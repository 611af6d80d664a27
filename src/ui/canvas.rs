//! Canvas interaction and navigation functionality.
//!
//! This module handles canvas panning, card dragging, hit testing, link
//! creation from proximity dots, and coordinate transformations between screen
//! and world space.

use super::state::SchemaBuilderApp;
use crate::geometry::{self, card_rect_at, ProximityPair};
use crate::types::*;
use eframe::egui;

impl SchemaBuilderApp {
    /// Converts screen coordinates to world coordinates accounting for pan.
    ///
    /// # Arguments
    ///
    /// * `screen_pos` - Position in screen space (pixels)
    ///
    /// # Returns
    ///
    /// The corresponding position in world space
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        screen_pos - self.canvas.origin.to_vec2() - self.canvas.offset
    }

    /// Converts world coordinates to screen coordinates accounting for pan.
    ///
    /// # Arguments
    ///
    /// * `world_pos` - Position in world space
    ///
    /// # Returns
    ///
    /// The corresponding position in screen space (pixels)
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos + self.canvas.origin.to_vec2() + self.canvas.offset
    }

    /// Converts a world rectangle to screen space.
    pub fn world_rect_to_screen(&self, rect: egui::Rect) -> egui::Rect {
        rect.translate(self.canvas.origin.to_vec2() + self.canvas.offset)
    }

    /// Handles canvas panning with the middle button, or the primary button on
    /// empty canvas.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let should_pan = ui.input(|i| {
            i.pointer.middle_down()
                || (i.pointer.primary_down() && self.interaction.dragging_node.is_none())
        });

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    self.canvas.offset += current_pos - last_pos;
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Handles card dragging with the primary button.
    ///
    /// A drag starts when the button is pressed over a card. The card follows
    /// the pointer while the button is held and the schema is only updated when
    /// it is released.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_node_dragging(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (pressed, down) = ui.input(|i| (i.pointer.primary_pressed(), i.pointer.primary_down()));

        if down && !self.interaction.is_panning {
            if let Some(current_pos) = response.interact_pointer_pos() {
                let world_pos = self.screen_to_world(current_pos);
                match self.interaction.dragging_node {
                    Some(_) => self.update_dragged_node_position(world_pos),
                    None if pressed => {
                        if let Some(node_id) = self.find_node_at_position(world_pos) {
                            self.interaction.selected_node = Some(node_id);
                            self.start_node_drag(node_id, world_pos);
                        }
                    }
                    None => {}
                }
            }
        } else if let Some(node_id) = self.interaction.dragging_node.take() {
            self.finish_node_drag(node_id);
        }
    }

    /// Starts dragging the specified card.
    ///
    /// # Arguments
    ///
    /// * `node_id` - ID of the card to start dragging
    /// * `world_pos` - Current pointer position in world space
    fn start_node_drag(&mut self, node_id: NodeId, world_pos: egui::Pos2) {
        let Some(node) = self.schema.node(node_id) else {
            return;
        };
        let top_left: egui::Pos2 = node.position().into();
        self.interaction.dragging_node = Some(node_id);
        self.interaction.drag_offset = top_left - world_pos;
        self.interaction.drag_world_pos = Some(top_left);
        log::debug!("Started dragging {node_id}");
    }

    /// Moves the live position of the dragged card under the pointer.
    fn update_dragged_node_position(&mut self, world_pos: egui::Pos2) {
        self.interaction.drag_world_pos = Some(world_pos + self.interaction.drag_offset);
    }

    /// Writes the dropped position of a card to the schema.
    fn finish_node_drag(&mut self, node_id: NodeId) {
        let Some(pos) = self.interaction.drag_world_pos.take() else {
            return;
        };
        let pos = if self.settings.snap_on_release {
            geometry::snap_to_grid(pos)
        } else {
            pos
        };
        match self.schema.move_node(node_id, pos.x, pos.y) {
            Ok(()) => log::debug!("Dropped {node_id} at ({}, {})", pos.x, pos.y),
            Err(err) => log::warn!("Failed to move card: {err}"),
        }
    }

    /// Closes every open stage menu, link menu and link overlay.
    pub fn close_menus(&mut self) {
        for flow in self.flows.values_mut() {
            flow.close_menu();
        }
        let open: Vec<LinkId> = self
            .schema
            .links
            .iter()
            .filter(|l| l.is_menu_open())
            .map(|l| l.id)
            .collect();
        for link_id in open {
            let update = LinkUpdate {
                menu_open: Some(false),
                ..Default::default()
            };
            if let Err(err) = self.schema.update_link(link_id, update) {
                log::warn!("Failed to close link menu: {err}");
            }
        }
        self.overlay = None;
    }

    /// Closes menus on Escape unless a text field has keyboard focus.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    pub fn handle_escape_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close_menus();
        }
    }

    /// Finds the topmost card at the given world position, if any.
    ///
    /// # Arguments
    ///
    /// * `pos` - Position in world space to check
    ///
    /// # Returns
    ///
    /// The ID of the card at that position, or `None` if no card is there
    pub fn find_node_at_position(&self, pos: egui::Pos2) -> Option<NodeId> {
        self.schema
            .nodes
            .iter()
            .rev()
            .find(|node| card_rect_at(self.live_position(node)).contains(pos))
            .map(|node| node.id)
    }

    /// World rectangles of every card at their live positions.
    pub fn live_card_rects(&self) -> Vec<(NodeId, egui::Rect)> {
        self.schema
            .nodes
            .iter()
            .map(|node| (node.id, card_rect_at(self.live_position(node))))
            .collect()
    }

    /// Proximity pairs offered for linking this frame.
    ///
    /// Holding Cmd/Ctrl hides them so cards can be placed side by side without
    /// link prompts.
    pub fn current_proximity_pairs(&self, suppress: bool) -> Vec<ProximityPair> {
        if suppress {
            return Vec::new();
        }
        geometry::proximity_pairs(&self.live_card_rects(), &self.schema.links)
    }

    /// Links the two cards of a proximity pair.
    ///
    /// A rejected link is reported through a toast.
    ///
    /// # Arguments
    ///
    /// * `pair` - The pair whose dot was clicked
    /// * `now` - Current `egui` input time
    pub fn create_link(&mut self, pair: &ProximityPair, now: f64) {
        match self
            .schema
            .add_link(pair.source, pair.target, pair.midpoint.into())
        {
            Ok(id) => log::info!("Linked {} and {} as {id}", pair.source, pair.target),
            Err(err) => {
                log::warn!("Link rejected: {err}");
                self.push_toast(err.to_string(), now);
            }
        }
    }

    /// Removes a link and closes any overlay hanging from it.
    pub fn remove_link(&mut self, link_id: LinkId) {
        match self.schema.remove_link(link_id) {
            Ok(link) => {
                log::info!(
                    "Removed link between {} and {}",
                    link.source_node_id,
                    link.target_node_id
                );
                if self.overlay.as_ref().is_some_and(|o| o.link() == link_id) {
                    self.overlay = None;
                }
            }
            Err(err) => log::warn!("Failed to remove link: {err}"),
        }
    }
}
