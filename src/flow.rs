//! Cascading layout of the configuration stages hanging under a result card.
//!
//! Stages always appear in the same order. Open stages stack downwards from the
//! card, each separated by a fixed gap, and closed stages take no space. The
//! layout is recomputed every frame from the card rectangle and the measured
//! stage heights, so connectors follow panels as they resize.

use crate::constants::{CONNECTOR_DROP, FRAME_GAP, HEIGHT_EPSILON, MENU_TOP_OFFSET, MENU_WIDTH};
use crate::types::TestResultConfig;
use eframe::egui::{self, Pos2, Rect};
use serde::{Deserialize, Serialize};

/// One of the configuration panels attachable to a result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStage {
    /// Threshold condition
    Condition,
    /// Trend comparison
    Compare,
    /// Record a field action
    Record,
    /// Notification settings
    Notify,
}

impl FlowStage {
    /// Stages in layout order.
    pub const SEQUENCE: [FlowStage; 4] = [
        FlowStage::Condition,
        FlowStage::Compare,
        FlowStage::Record,
        FlowStage::Notify,
    ];

    /// Position of the stage in [`FlowStage::SEQUENCE`].
    pub fn index(self) -> usize {
        match self {
            FlowStage::Condition => 0,
            FlowStage::Compare => 1,
            FlowStage::Record => 2,
            FlowStage::Notify => 3,
        }
    }

    /// Width of the stage frame.
    pub fn width(self) -> f32 {
        match self {
            FlowStage::Notify => 300.0,
            _ => 248.0,
        }
    }

    /// Height assumed until the panel has been measured.
    pub fn default_height(self) -> f32 {
        match self {
            FlowStage::Condition => 260.0,
            FlowStage::Compare => 220.0,
            FlowStage::Record => 280.0,
            FlowStage::Notify => 220.0,
        }
    }

    /// Lowercase tag shown next to "+" nodes.
    pub fn tag(self) -> &'static str {
        match self {
            FlowStage::Condition => "condition",
            FlowStage::Compare => "compare",
            FlowStage::Record => "record",
            FlowStage::Notify => "notify",
        }
    }

    /// Panel title.
    pub fn title(self) -> &'static str {
        match self {
            FlowStage::Condition => "Condition",
            FlowStage::Compare => "Compare trend",
            FlowStage::Record => "Record action",
            FlowStage::Notify => "Notify",
        }
    }

    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<FlowStage> {
        FlowStage::SEQUENCE.get(self.index() + 1).copied()
    }

    /// Turns the config feature backing this stage on or off.
    fn set_feature(self, config: &mut TestResultConfig, on: bool) {
        match self {
            FlowStage::Condition => config.schedule_follow_up = on,
            FlowStage::Compare => config.compare_trend_enabled = Some(on),
            FlowStage::Record => config.record_action_enabled = Some(on),
            FlowStage::Notify => config.notifications = on,
        }
    }
}

/// An entry of the "+" node menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuOption {
    /// Button caption
    pub label: &'static str,
    /// Stage opened by the option
    pub target: FlowStage,
    /// Drawn with a dashed outline
    pub dashed: bool,
}

/// Options offered by every "+" node menu.
pub const MENU_OPTIONS: [MenuOption; 4] = [
    MenuOption { label: "Set condition", target: FlowStage::Condition, dashed: false },
    MenuOption { label: "Compare trend", target: FlowStage::Compare, dashed: false },
    MenuOption { label: "Record action", target: FlowStage::Record, dashed: false },
    MenuOption { label: "Recommendation", target: FlowStage::Notify, dashed: true },
];

/// Per-card state of the stage cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    open: [bool; 4],
    heights: [f32; 4],
    active_menu: Option<FlowStage>,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            open: [false; 4],
            heights: FlowStage::SEQUENCE.map(FlowStage::default_height),
            active_menu: None,
        }
    }
}

impl FlowState {
    /// Whether a stage is open.
    pub fn is_open(&self, stage: FlowStage) -> bool {
        self.open[stage.index()]
    }

    /// Whether any stage is open.
    pub fn any_open(&self) -> bool {
        self.open.iter().any(|&o| o)
    }

    /// Open stages in layout order.
    pub fn open_stages(&self) -> impl Iterator<Item = FlowStage> + '_ {
        FlowStage::SEQUENCE.into_iter().filter(|s| self.is_open(*s))
    }

    /// Current (measured or default) height of a stage.
    pub fn height(&self, stage: FlowStage) -> f32 {
        self.heights[stage.index()]
    }

    /// Stage whose "+" menu is showing.
    pub fn active_menu(&self) -> Option<FlowStage> {
        self.active_menu
    }

    /// Opens a stage and enables the matching config feature.
    pub fn open_stage(&mut self, stage: FlowStage, config: &mut TestResultConfig) {
        self.open[stage.index()] = true;
        config.enabled = true;
        stage.set_feature(config, true);
        log::debug!("Opened {} stage", stage.tag());
    }

    /// Closes a stage and disables the matching config feature.
    pub fn close_stage(&mut self, stage: FlowStage, config: &mut TestResultConfig) {
        self.open[stage.index()] = false;
        stage.set_feature(config, false);
        log::debug!("Closed {} stage", stage.tag());
    }

    /// Records the measured height of a stage panel.
    ///
    /// # Returns
    ///
    /// `true` if the stored height changed. Changes smaller than one unit are
    /// ignored so that a panel settling on fractional sizes does not relayout.
    pub fn set_stage_height(&mut self, stage: FlowStage, height: f32) -> bool {
        let slot = &mut self.heights[stage.index()];
        if (*slot - height).abs() < HEIGHT_EPSILON {
            return false;
        }
        *slot = height;
        true
    }

    /// Shows the menu for `stage`, or hides it if it is already showing.
    pub fn toggle_menu(&mut self, stage: FlowStage) {
        self.active_menu = if self.active_menu == Some(stage) { None } else { Some(stage) };
    }

    /// Handles a menu pick: opens the chosen stage and closes the menu.
    pub fn select_menu(&mut self, stage: FlowStage, config: &mut TestResultConfig) {
        self.open_stage(stage, config);
        self.active_menu = None;
    }

    /// Hides any open menu.
    pub fn close_menu(&mut self) {
        self.active_menu = None;
    }
}

/// A "+" node drawn in the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlusNode {
    /// Stage whose menu the node toggles
    pub opens: FlowStage,
    /// Centre in world space
    pub position: Pos2,
    /// Whether a later stage is already open
    pub active: bool,
    /// Whether this node's menu is showing
    pub menu_open: bool,
}

/// Resolved positions of every stage for one card.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLayout {
    card: Rect,
    frames: [Pos2; 4],
    connectors: [Option<Pos2>; 4],
    nodes: [Pos2; 4],
}

impl FlowLayout {
    /// Lays out the cascade under a card.
    ///
    /// # Arguments
    ///
    /// * `card` - The card rectangle in world space
    /// * `state` - Open stages and their heights
    pub fn compute(card: Rect, state: &FlowState) -> Self {
        let centre_x = card.center().x;
        let mut frames = [Pos2::ZERO; 4];
        let mut connectors = [None; 4];
        let mut stack_y = card.max.y + FRAME_GAP;

        for stage in FlowStage::SEQUENCE {
            let i = stage.index();
            frames[i] = egui::pos2(centre_x - stage.width() / 2.0, stack_y);
            if state.is_open(stage) {
                let height = state.height(stage);
                connectors[i] = Some(egui::pos2(centre_x, stack_y + height + CONNECTOR_DROP));
                stack_y += height + FRAME_GAP;
            }
        }

        let mut nodes = [Pos2::ZERO; 4];
        for stage in FlowStage::SEQUENCE {
            let i = stage.index();
            nodes[i] = match stage {
                FlowStage::Condition => egui::pos2(centre_x, card.max.y + FRAME_GAP),
                _ => connectors[i]
                    .unwrap_or_else(|| egui::pos2(centre_x, frames[i].y - CONNECTOR_DROP)),
            };
        }

        Self {
            card,
            frames,
            connectors,
            nodes,
        }
    }

    /// Card rectangle the layout was computed for.
    pub fn card(&self) -> Rect {
        self.card
    }

    /// Top-left corner of a stage frame.
    pub fn frame_pos(&self, stage: FlowStage) -> Pos2 {
        self.frames[stage.index()]
    }

    /// Full rectangle of a stage frame.
    pub fn frame_rect(&self, stage: FlowStage, state: &FlowState) -> Rect {
        Rect::from_min_size(
            self.frame_pos(stage),
            egui::vec2(stage.width(), state.height(stage)),
        )
    }

    /// Connector under an open stage.
    pub fn connector(&self, stage: FlowStage) -> Option<Pos2> {
        self.connectors[stage.index()]
    }

    /// Where a stage's "+" node sits.
    pub fn node_position(&self, stage: FlowStage) -> Pos2 {
        self.nodes[stage.index()]
    }

    /// The connector of the nearest open stage at or before `stage`.
    fn nearest_open_connector(&self, stage: FlowStage, state: &FlowState) -> Option<Pos2> {
        FlowStage::SEQUENCE[..=stage.index()]
            .iter()
            .rev()
            .find(|s| state.is_open(**s))
            .and_then(|s| self.connector(*s))
    }

    /// Point a stage's menu hangs from.
    pub fn menu_anchor(&self, stage: FlowStage, state: &FlowState) -> Pos2 {
        match stage {
            FlowStage::Condition => self.node_position(FlowStage::Condition),
            _ => self
                .nearest_open_connector(stage, state)
                .unwrap_or_else(|| self.node_position(stage)),
        }
    }

    /// Top-left corner of a stage's menu.
    pub fn menu_origin(&self, stage: FlowStage, state: &FlowState) -> Pos2 {
        let anchor = self.menu_anchor(stage, state);
        let anchor_x = match stage {
            FlowStage::Condition => self.card.center().x,
            _ => anchor.x,
        };
        egui::pos2(anchor_x - MENU_WIDTH / 2.0, anchor.y + MENU_TOP_OFFSET)
    }

    /// Dashed connector segments of the cascade.
    ///
    /// # Arguments
    ///
    /// * `state` - Open stages, heights and active menu
    /// * `show_root` - Whether the root "+" node is shown for this card
    pub fn connector_lines(&self, state: &FlowState, show_root: bool) -> Vec<[Pos2; 2]> {
        let card_bottom = self.card.center_bottom();
        let mut lines = Vec::new();

        if !state.any_open() {
            if show_root {
                let root = self.node_position(FlowStage::Condition);
                lines.push([card_bottom, root]);
                if state.active_menu() == Some(FlowStage::Condition) {
                    lines.push([root, root + egui::vec2(0.0, FRAME_GAP)]);
                }
            }
            return lines;
        }

        let mut previous = card_bottom;
        for stage in state.open_stages() {
            let frame = self.frame_rect(stage, state);
            lines.push([previous, frame.center_top()]);
            if let Some(connector) = self.connector(stage) {
                lines.push([frame.center_bottom(), connector]);
                previous = connector;
            }
        }
        lines
    }

    /// "+" nodes to draw.
    ///
    /// # Arguments
    ///
    /// * `state` - Open stages and active menu
    /// * `linked` - Whether the card takes part in a link, which hides the root node
    pub fn plus_nodes(&self, state: &FlowState, linked: bool) -> Vec<PlusNode> {
        let mut nodes = Vec::new();
        if !linked && !state.any_open() {
            nodes.push(PlusNode {
                opens: FlowStage::Condition,
                position: self.node_position(FlowStage::Condition),
                active: false,
                menu_open: state.active_menu() == Some(FlowStage::Condition),
            });
        }

        for stage in state.open_stages() {
            let (Some(next), Some(position)) = (stage.next(), self.connector(stage)) else {
                continue;
            };
            let active = FlowStage::SEQUENCE[next.index()..]
                .iter()
                .any(|s| state.is_open(*s));
            nodes.push(PlusNode {
                opens: next,
                position,
                active,
                menu_open: state.active_menu() == Some(next),
            });
        }
        nodes
    }
}
