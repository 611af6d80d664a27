//! Application state management structures.
//!
//! This module contains the state the editor keeps between frames: persisted
//! editor settings, canvas navigation, pointer interactions, per-card flow state,
//! open link overlays, panel drafts and toasts.

use crate::constants::TOAST_SECONDS;
use crate::flow::FlowState;
use crate::rules::CombinedDraft;
use crate::types::*;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Editor preferences persisted through eframe storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Whether the dotted grid is drawn
    pub show_grid: bool,
    /// Remembered width of the palette panel
    pub palette_width: f32,
    /// Whether dropped cards snap to the grid
    pub snap_on_release: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_grid: true,
            palette_width: 280.0,
            snap_on_release: true,
        }
    }
}

/// State related to canvas navigation.
#[derive(Debug, Default)]
pub struct CanvasState {
    /// Pan applied to world coordinates
    pub offset: egui::Vec2,
    /// Top-left of the canvas widget on screen, refreshed every frame
    pub origin: egui::Pos2,
}

/// State related to pointer interactions with cards and the canvas.
#[derive(Debug, Default)]
pub struct InteractionState {
    /// Card last clicked
    pub selected_node: Option<NodeId>,
    /// Card currently being dragged
    pub dragging_node: Option<NodeId>,
    /// Offset from the pointer to the dragged card's top-left corner
    pub drag_offset: egui::Vec2,
    /// Live world position of the dragged card
    pub drag_world_pos: Option<egui::Pos2>,
    /// Whether the canvas is being panned
    pub is_panning: bool,
    /// Last pointer position while panning
    pub last_pan_pos: Option<egui::Pos2>,
    /// Link whose dot is hovered
    pub hovered_link: Option<LinkId>,
}

/// Overlay card opened from a link menu.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOverlay {
    /// Condition editor for the link's source card
    Condition {
        /// Link the overlay hangs from
        link: LinkId,
        /// Card whose condition is edited
        node: NodeId,
    },
    /// Combined condition editor
    Combined {
        /// Link the overlay hangs from
        link: LinkId,
        /// Working copy of the condition
        draft: CombinedDraft,
    },
}

impl LinkOverlay {
    /// Link the overlay belongs to.
    pub fn link(&self) -> LinkId {
        match self {
            LinkOverlay::Condition { link, .. } | LinkOverlay::Combined { link, .. } => *link,
        }
    }
}

/// Drafts edited by the stage panels, keyed by card.
#[derive(Debug, Default)]
pub struct PanelDrafts {
    /// Condition rules being edited
    pub conditions: HashMap<NodeId, ConditionRule>,
    /// Cards whose condition has been saved
    pub saved_conditions: HashSet<NodeId>,
    /// Action records being edited
    pub records: HashMap<NodeId, ActionRecord>,
    /// Cards whose action record has been saved
    pub saved_records: HashSet<NodeId>,
}

/// A transient message shown in the corner of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Text shown
    pub message: String,
    /// `egui` input time after which the toast disappears
    pub expires_at: f64,
}

/// Main application state for the schema builder.
///
/// Only `settings` is persisted; the schema lives for the session.
pub struct SchemaBuilderApp {
    /// The schema being edited
    pub schema: Schema,
    /// Persisted editor preferences
    pub settings: EditorSettings,
    /// Canvas navigation state
    pub canvas: CanvasState,
    /// Pointer interaction state
    pub interaction: InteractionState,
    /// Stage cascade per result card
    pub flows: HashMap<NodeId, FlowState>,
    /// Overlay opened from a link menu
    pub overlay: Option<LinkOverlay>,
    /// Stage panel drafts
    pub drafts: PanelDrafts,
    /// Whether the JSON preview is open
    pub show_json: bool,
    /// Toasts waiting to expire
    pub toasts: Vec<Toast>,
}

impl Default for SchemaBuilderApp {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            settings: EditorSettings::default(),
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            flows: HashMap::new(),
            overlay: None,
            drafts: PanelDrafts::default(),
            show_json: false,
            toasts: Vec::new(),
        }
    }
}

impl SchemaBuilderApp {
    /// Creates the app, restoring editor settings from eframe storage.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = cc
            .storage
            .and_then(|storage| eframe::get_value::<EditorSettings>(storage, eframe::APP_KEY))
            .unwrap_or_default();
        log::debug!("Restored editor settings: {settings:?}");
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Queues a toast.
    ///
    /// # Arguments
    ///
    /// * `message` - Text to show
    /// * `now` - Current `egui` input time
    pub fn push_toast(&mut self, message: impl Into<String>, now: f64) {
        self.toasts.push(Toast {
            message: message.into(),
            expires_at: now + TOAST_SECONDS,
        });
    }

    /// Drops toasts that have expired.
    pub fn expire_toasts(&mut self, now: f64) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    /// Flow state of a card, created on first use.
    pub fn flow_mut(&mut self, id: NodeId) -> &mut FlowState {
        self.flows.entry(id).or_default()
    }

    /// Where a card is drawn: the live drag position, or its stored position.
    pub fn live_position(&self, node: &SchemaNode) -> egui::Pos2 {
        match (self.interaction.dragging_node, self.interaction.drag_world_pos) {
            (Some(id), Some(pos)) if id == node.id => pos,
            _ => node.position().into(),
        }
    }
}
