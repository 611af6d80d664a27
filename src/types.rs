//! Core data types and the in-memory schema store.
//!
//! This module defines the schema aggregate (cards, links and their automation
//! configuration) together with the discrete edit operations the editor applies
//! to it. Field names serialize in the same camelCase shape the JSON preview shows.

use std::collections::HashSet;

use crate::error::{SchemaError, SchemaResult};
use eframe::egui;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for schema cards.
pub type NodeId = Uuid;

/// Unique identifier for links between cards.
pub type LinkId = Uuid;

/// A position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for egui::Pos2 {
    fn from(p: Point) -> Self {
        egui::pos2(p.x, p.y)
    }
}

impl From<egui::Pos2> for Point {
    fn from(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Lab analytes a result card can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyteType {
    /// Nitrate
    Nitrate,
    /// Phosphate
    Phosphate,
    /// Boron
    Boron,
    /// Potassium
    Potassium,
    /// Soil pH
    Ph,
}

impl AnalyteType {
    /// Human readable analyte name.
    pub fn display_name(self) -> &'static str {
        match self {
            AnalyteType::Nitrate => "Nitrate",
            AnalyteType::Phosphate => "Phosphate",
            AnalyteType::Boron => "Boron",
            AnalyteType::Potassium => "Potassium",
            AnalyteType::Ph => "pH",
        }
    }
}

/// Palette grouping of card kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Cards that relate a schema to other records
    Relational,
    /// Plain data fields and recent results
    Normal,
    /// Automation actions
    Automation,
}

/// How often a follow-up check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FollowUpFrequency {
    /// Whenever a new lab result arrives
    OnNewResult,
    /// Every day
    Daily,
    /// Every week
    Weekly,
    /// Every two weeks
    Biweekly,
    /// Every month
    Monthly,
    /// Every `customDays` days
    Custom,
}

impl FollowUpFrequency {
    /// All frequencies in menu order.
    pub const ALL: [FollowUpFrequency; 6] = [
        FollowUpFrequency::OnNewResult,
        FollowUpFrequency::Daily,
        FollowUpFrequency::Weekly,
        FollowUpFrequency::Biweekly,
        FollowUpFrequency::Monthly,
        FollowUpFrequency::Custom,
    ];

    /// Label shown in frequency pickers.
    pub fn label(self) -> &'static str {
        match self {
            FollowUpFrequency::OnNewResult => "On new result",
            FollowUpFrequency::Daily => "Daily",
            FollowUpFrequency::Weekly => "Weekly",
            FollowUpFrequency::Biweekly => "Every 2 weeks",
            FollowUpFrequency::Monthly => "Monthly",
            FollowUpFrequency::Custom => "Custom…",
        }
    }

    /// Cadence phrase used in rule summaries.
    pub fn cadence(self, custom_days: u32) -> String {
        match self {
            FollowUpFrequency::Custom => format!("Every {custom_days} days"),
            other => other.label().to_string(),
        }
    }
}

/// Direction a configured threshold alert watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdDirection {
    /// Alert when the value rises above the threshold
    Above,
    /// Alert when the value falls below the threshold
    Below,
    /// Alert on either side
    Both,
}

/// Direction of a single rule comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Greater than
    Above,
    /// Less than
    Below,
}

impl Direction {
    /// Capitalised label.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Above => "Above",
            Direction::Below => "Below",
        }
    }

    /// Comparison symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Direction::Above => ">",
            Direction::Below => "<",
        }
    }
}

impl From<Direction> for ThresholdDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Above => ThresholdDirection::Above,
            Direction::Below => ThresholdDirection::Below,
        }
    }
}

/// Surfaces a notification can be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    /// In-app notification
    App,
    /// Email
    Email,
    /// Text message
    Sms,
}

impl NotificationChannel {
    /// All channels in display order.
    pub const ALL: [NotificationChannel; 3] = [
        NotificationChannel::App,
        NotificationChannel::Email,
        NotificationChannel::Sms,
    ];

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            NotificationChannel::App => "App",
            NotificationChannel::Email => "Email",
            NotificationChannel::Sms => "SMS",
        }
    }

    /// Identifier used in summaries and JSON.
    pub fn id(self) -> &'static str {
        match self {
            NotificationChannel::App => "app",
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
        }
    }

    /// Whether delivering to this channel needs explicit recipients.
    pub fn needs_recipients(self) -> bool {
        !matches!(self, NotificationChannel::App)
    }
}

/// Window of history a trend comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareTimeRange {
    /// Last 14 days
    #[serde(rename = "14d")]
    Days14,
    /// Last 30 days
    #[serde(rename = "30d")]
    Days30,
    /// Last 60 days
    #[serde(rename = "60d")]
    Days60,
    /// Last 90 days
    #[serde(rename = "90d")]
    Days90,
    /// Full growing season
    #[serde(rename = "season")]
    Season,
}

impl CompareTimeRange {
    /// All ranges in menu order.
    pub const ALL: [CompareTimeRange; 5] = [
        CompareTimeRange::Days14,
        CompareTimeRange::Days30,
        CompareTimeRange::Days60,
        CompareTimeRange::Days90,
        CompareTimeRange::Season,
    ];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            CompareTimeRange::Days14 => "Last 14 days",
            CompareTimeRange::Days30 => "Last 30 days",
            CompareTimeRange::Days60 => "Last 60 days",
            CompareTimeRange::Days90 => "Last 90 days",
            CompareTimeRange::Season => "Full Season",
        }
    }
}

/// Kind of field action being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    /// Boron fertilizer was applied
    BoronFertilizerApplied,
    /// Boron specific soil amendment
    SoilAmendment,
    /// Foliar spray application
    FoliarSpray,
    /// Irrigation schedule adjusted
    IrrigationAdjustment,
    /// Free-form action described in `actionDescription`
    Other,
}

impl ActionType {
    /// All action types in menu order.
    pub const ALL: [ActionType; 5] = [
        ActionType::BoronFertilizerApplied,
        ActionType::SoilAmendment,
        ActionType::FoliarSpray,
        ActionType::IrrigationAdjustment,
        ActionType::Other,
    ];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            ActionType::BoronFertilizerApplied => "Boron Fertilizer Applied",
            ActionType::SoilAmendment => "Soil Amendment (Boron specific)",
            ActionType::FoliarSpray => "Foliar Spray Application",
            ActionType::IrrigationAdjustment => "Irrigation Adjustment",
            ActionType::Other => "Other…",
        }
    }
}

/// Material used by a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    /// Sodium borate
    Borax,
    /// Boron chelate
    Solubor,
    /// Organic boron source
    Organic,
    /// Multi-nutrient blend
    Blended,
    /// Free-form material described in `materialDescription`
    Custom,
}

impl Material {
    /// All materials in menu order.
    pub const ALL: [Material; 5] = [
        Material::Borax,
        Material::Solubor,
        Material::Organic,
        Material::Blended,
        Material::Custom,
    ];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Material::Borax => "Borax (Sodium Borate)",
            Material::Solubor => "Solubor (Boron Chelate)",
            Material::Organic => "Organic Boron Source",
            Material::Blended => "Blended Multi-Nutrient Mix",
            Material::Custom => "Custom…",
        }
    }
}

/// Unit of an applied amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountUnit {
    /// Grams
    G,
    /// Kilograms
    Kg,
    /// Millilitres
    Ml,
    /// Litres
    L,
    /// Percent solution
    Percent,
}

impl AmountUnit {
    /// All units in menu order.
    pub const ALL: [AmountUnit; 5] = [
        AmountUnit::G,
        AmountUnit::Kg,
        AmountUnit::Ml,
        AmountUnit::L,
        AmountUnit::Percent,
    ];

    /// Short label.
    pub fn label(self) -> &'static str {
        match self {
            AmountUnit::G => "g",
            AmountUnit::Kg => "kg",
            AmountUnit::Ml => "ml",
            AmountUnit::L => "L",
            AmountUnit::Percent => "% solution",
        }
    }
}

/// Details of a field action recorded against a result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// What kind of action was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    /// Free-form description when the type is `other`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_description: Option<String>,
    /// Material applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    /// Free-form material when the material is `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_description: Option<String>,
    /// Amount applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Unit of `amount`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_unit: Option<AmountUnit>,
    /// ISO date (YYYY-MM-DD) of the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_applied: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Threshold rule configured from a card's condition panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRule {
    /// Threshold value in the card's unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Which side of the threshold triggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_direction: Option<Direction>,
    /// Check cadence
    pub frequency: FollowUpFrequency,
    /// Days between checks for a custom cadence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<u32>,
    /// Where to notify
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_channels: Option<Vec<NotificationChannel>>,
    /// Comma separated recipients for email/sms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<String>,
}

/// Per-card automation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultConfig {
    /// Whether any automation is attached
    pub enabled: bool,
    /// Whether follow-up checks are scheduled
    pub schedule_follow_up: bool,
    /// Follow-up cadence
    pub follow_up_frequency: FollowUpFrequency,
    /// Days between follow-ups for a custom cadence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<u32>,
    /// Whether threshold alerting is on
    pub threshold_alert: bool,
    /// Threshold value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_value: Option<f64>,
    /// Threshold direction
    pub threshold_direction: ThresholdDirection,
    /// Whether notifications are sent
    pub notifications: bool,
    /// Next scheduled test date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_test_date: Option<String>,
    /// Notification surfaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_channels: Option<Vec<NotificationChannel>>,
    /// Full condition rule as edited in the condition panel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_rule: Option<ConditionRule>,
    /// Whether the record-action stage is on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_action_enabled: Option<bool>,
    /// Recorded action details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boron_action_record: Option<ActionRecord>,
    /// Whether the compare-trend stage is on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_trend_enabled: Option<bool>,
    /// History window for trend comparison
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_time_range: Option<CompareTimeRange>,
}

impl Default for TestResultConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            schedule_follow_up: false,
            follow_up_frequency: FollowUpFrequency::Weekly,
            custom_days: None,
            threshold_alert: false,
            threshold_value: None,
            threshold_direction: ThresholdDirection::Above,
            notifications: false,
            next_test_date: None,
            notification_channels: None,
            condition_rule: None,
            record_action_enabled: None,
            boron_action_record: None,
            compare_trend_enabled: None,
            compare_time_range: None,
        }
    }
}

/// How the thresholds of a combined condition are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinedLogic {
    /// OR: any threshold crossing triggers
    Any,
    /// AND: all thresholds must be crossed
    All,
}

/// Severity attached to a combined condition alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Critical
    Critical,
}

impl Severity {
    /// All severities in display order.
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Critical];

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }
}

/// Unit of a combined threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdUnit {
    /// Parts per million
    #[serde(rename = "PPM")]
    Ppm,
}

impl ThresholdUnit {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            ThresholdUnit::Ppm => "PPM",
        }
    }
}

/// One side of a combined condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedThreshold {
    /// Card the threshold watches
    pub node_id: NodeId,
    /// Label of the watched analyte
    pub analyte_label: String,
    /// Comparison direction
    pub direction: Direction,
    /// Threshold value
    pub value: f64,
    /// Unit of `value`
    pub unit: ThresholdUnit,
}

/// Rule spanning the thresholds of both cards of a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedConditionConfig {
    /// AND/OR evaluation
    pub logic: CombinedLogic,
    /// One threshold per linked card
    pub thresholds: Vec<CombinedThreshold>,
    /// Check cadence
    pub frequency: FollowUpFrequency,
    /// Days between checks for a custom cadence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<u32>,
    /// Where to notify
    pub notification_channels: Vec<NotificationChannel>,
    /// Recipients for email/sms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<String>,
    /// Alert severity
    pub severity: Severity,
}

/// A card on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// Unique identifier for this card
    pub id: NodeId,
    /// Catalog kind id (e.g. `phosphate-result`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Left edge in world space
    pub x: f32,
    /// Top edge in world space
    pub y: f32,
    /// Display label
    pub label: String,
    /// Analyte classification for result cards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyte_type: Option<AnalyteType>,
    /// Free-form data payload
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Automation configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_config: Option<TestResultConfig>,
}

impl SchemaNode {
    /// Creates a new card with a fresh id.
    ///
    /// # Arguments
    ///
    /// * `kind` - Catalog kind id
    /// * `label` - Display label
    /// * `analyte_type` - Analyte classification, if the card is a result
    /// * `position` - Top-left corner in world space
    /// * `data` - Initial data payload
    pub fn new(
        kind: impl Into<String>,
        label: impl Into<String>,
        analyte_type: Option<AnalyteType>,
        position: Point,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            x: position.x,
            y: position.y,
            label: label.into(),
            analyte_type,
            data,
            test_config: None,
        }
    }

    /// Top-left corner of the card.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Numeric `data` entry, if present.
    pub fn data_number(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(|v| v.as_f64())
    }

    /// String `data` entry, if present.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Measurement unit declared in the card data.
    pub fn unit(&self) -> Option<&str> {
        self.data_str("unit")
    }

    /// Latest result value declared in the card data.
    pub fn value(&self) -> Option<f64> {
        self.data_number("value")
    }

    /// The card's configuration, or the disabled default.
    pub fn config_or_default(&self) -> TestResultConfig {
        self.test_config.clone().unwrap_or_default()
    }
}

/// An undirected association between two cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLink {
    /// Unique identifier for this link
    pub id: LinkId,
    /// First card
    pub source_node_id: NodeId,
    /// Second card
    pub target_node_id: NodeId,
    /// Where the link dot sits in world space
    pub link_dot_position: Point,
    /// Anchor of the link action menu
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_node_position: Option<Point>,
    /// Whether the action menu is showing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_open: Option<bool>,
    /// Rule spanning both cards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_condition: Option<CombinedConditionConfig>,
}

impl CardLink {
    /// Creates a new link with a fresh id.
    pub fn new(source: NodeId, target: NodeId, link_dot_position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_node_id: source,
            target_node_id: target,
            link_dot_position,
            menu_node_position: None,
            menu_open: None,
            combined_condition: None,
        }
    }

    /// Whether this link joins `a` and `b`, in either order.
    pub fn joins(&self, a: NodeId, b: NodeId) -> bool {
        (self.source_node_id == a && self.target_node_id == b)
            || (self.source_node_id == b && self.target_node_id == a)
    }

    /// Whether `id` is one of the endpoints.
    pub fn involves(&self, id: NodeId) -> bool {
        self.source_node_id == id || self.target_node_id == id
    }

    /// Whether the action menu is showing.
    pub fn is_menu_open(&self) -> bool {
        self.menu_open.unwrap_or(false)
    }
}

/// Partial update applied to a link. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkUpdate {
    /// New menu anchor
    pub menu_node_position: Option<Point>,
    /// New menu visibility
    pub menu_open: Option<bool>,
    /// New combined condition
    pub combined_condition: Option<CombinedConditionConfig>,
}

/// The schema being edited: cards plus the links between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name
    pub name: String,
    /// Cards in insertion order
    pub nodes: Vec<SchemaNode>,
    /// Links between cards
    #[serde(default)]
    pub links: Vec<CardLink>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new("New Schema")
    }
}

impl Schema {
    /// Creates an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Serialize the schema to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a schema from a JSON string and check its invariants.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Checks that ids are unique, links join two distinct existing cards and
    /// no pair of cards is linked twice.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id) {
                return Err(SchemaError::DuplicateNode(node.id));
            }
        }

        let mut link_ids = HashSet::new();
        let mut pairs = HashSet::new();
        for link in &self.links {
            if !link_ids.insert(link.id) {
                return Err(SchemaError::DuplicateLinkId(link.id));
            }
            let (source, target) = (link.source_node_id, link.target_node_id);
            for end in [source, target] {
                if !node_ids.contains(&end) {
                    return Err(SchemaError::NodeNotFound(end));
                }
            }
            if source == target {
                return Err(SchemaError::SelfLink(source));
            }
            let pair = if source < target { (source, target) } else { (target, source) };
            if !pairs.insert(pair) {
                return Err(SchemaError::DuplicateLink(source, target));
            }
        }
        Ok(())
    }

    /// Looks up a card.
    pub fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> SchemaResult<&mut SchemaNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(SchemaError::NodeNotFound(id))
    }

    /// Looks up a link.
    pub fn link(&self, id: LinkId) -> Option<&CardLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// The link joining two cards, in either order.
    pub fn link_between(&self, a: NodeId, b: NodeId) -> Option<&CardLink> {
        self.links.iter().find(|l| l.joins(a, b))
    }

    /// Whether the card takes part in any link.
    pub fn is_linked(&self, id: NodeId) -> bool {
        self.links.iter().any(|l| l.involves(id))
    }

    /// Adds a card to the schema.
    ///
    /// # Returns
    ///
    /// The ID of the newly added card, or an error if a card with the same ID
    /// is already present.
    pub fn add_node(&mut self, node: SchemaNode) -> SchemaResult<NodeId> {
        let id = node.id;
        if self.node(id).is_some() {
            return Err(SchemaError::DuplicateNode(id));
        }
        self.nodes.push(node);
        Ok(id)
    }

    /// Moves a card to a new top-left position.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> SchemaResult<()> {
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Replaces a card's automation configuration.
    pub fn update_node_config(&mut self, id: NodeId, config: TestResultConfig) -> SchemaResult<()> {
        self.node_mut(id)?.test_config = Some(config);
        Ok(())
    }

    /// Links two cards.
    ///
    /// # Arguments
    ///
    /// * `source` - First card
    /// * `target` - Second card
    /// * `link_dot_position` - Where the link dot is drawn
    ///
    /// # Returns
    ///
    /// The ID of the new link, or an error when either card is missing, the cards
    /// are the same, they are already linked, or their declared units differ.
    pub fn add_link(
        &mut self,
        source: NodeId,
        target: NodeId,
        link_dot_position: Point,
    ) -> SchemaResult<LinkId> {
        let source_node = self.node(source).ok_or(SchemaError::NodeNotFound(source))?;
        let target_node = self.node(target).ok_or(SchemaError::NodeNotFound(target))?;
        if source == target {
            return Err(SchemaError::SelfLink(source));
        }
        if self.link_between(source, target).is_some() {
            return Err(SchemaError::DuplicateLink(source, target));
        }

        // Unit compatibility is only enforced between analyte result cards
        if source_node.analyte_type.is_some() && target_node.analyte_type.is_some() {
            if let (Some(source_unit), Some(target_unit)) = (source_node.unit(), target_node.unit()) {
                if source_unit != target_unit {
                    return Err(SchemaError::UnitMismatch {
                        source_unit: source_unit.to_string(),
                        target_unit: target_unit.to_string(),
                    });
                }
            }
        }

        let link = CardLink::new(source, target, link_dot_position);
        let id = link.id;
        self.links.push(link);
        Ok(id)
    }

    /// Removes a link.
    ///
    /// # Returns
    ///
    /// The removed link.
    pub fn remove_link(&mut self, id: LinkId) -> SchemaResult<CardLink> {
        let index = self
            .links
            .iter()
            .position(|l| l.id == id)
            .ok_or(SchemaError::LinkNotFound(id))?;
        Ok(self.links.remove(index))
    }

    /// Applies a partial update to a link.
    pub fn update_link(&mut self, id: LinkId, update: LinkUpdate) -> SchemaResult<()> {
        let link = self
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(SchemaError::LinkNotFound(id))?;
        if let Some(pos) = update.menu_node_position {
            link.menu_node_position = Some(pos);
        }
        if let Some(open) = update.menu_open {
            link.menu_open = Some(open);
        }
        if let Some(condition) = update.combined_condition {
            link.combined_condition = Some(condition);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_node(analyte: AnalyteType, unit: Option<&str>, x: f32) -> SchemaNode {
        let mut data = serde_json::Map::new();
        if let Some(unit) = unit {
            data.insert("unit".into(), json!(unit));
        }
        SchemaNode::new(
            format!("{}-result", analyte.display_name().to_lowercase()),
            format!("{} Result", analyte.display_name()),
            Some(analyte),
            Point::new(x, 0.0),
            data,
        )
    }

    fn text_node(x: f32) -> SchemaNode {
        SchemaNode::new("short-text", "Short Text", None, Point::new(x, 0.0), Default::default())
    }

    #[test]
    fn test_schema_default() {
        let schema = Schema::default();
        assert_eq!(schema.name, "New Schema");
        assert!(schema.nodes.is_empty());
        assert!(schema.links.is_empty());
    }

    #[test]
    fn test_node_creation() {
        let node = result_node(AnalyteType::Boron, Some("PPM"), 40.0);
        assert_eq!(node.position(), Point::new(40.0, 0.0));
        assert_eq!(node.unit(), Some("PPM"));
        assert!(node.test_config.is_none());
        assert!(!node.id.is_nil());
    }

    #[test]
    fn test_move_node() {
        let mut schema = Schema::default();
        let id = schema.add_node(text_node(0.0)).unwrap();
        schema.move_node(id, 120.0, 60.0).unwrap();
        assert_eq!(schema.node(id).unwrap().position(), Point::new(120.0, 60.0));

        let missing = Uuid::new_v4();
        assert_eq!(schema.move_node(missing, 0.0, 0.0), Err(SchemaError::NodeNotFound(missing)));
    }

    #[test]
    fn test_update_node_config_replaces_wholesale() {
        let mut schema = Schema::default();
        let id = schema.add_node(result_node(AnalyteType::Phosphate, Some("PPM"), 0.0)).unwrap();

        let mut config = TestResultConfig::default();
        config.enabled = true;
        config.threshold_value = Some(12.0);
        schema.update_node_config(id, config).unwrap();

        let replacement = TestResultConfig::default();
        schema.update_node_config(id, replacement.clone()).unwrap();
        assert_eq!(schema.node(id).unwrap().test_config, Some(replacement));
    }

    #[test]
    fn test_add_link_success() {
        let mut schema = Schema::default();
        let a = schema.add_node(result_node(AnalyteType::Phosphate, Some("PPM"), 0.0)).unwrap();
        let b = schema.add_node(result_node(AnalyteType::Boron, Some("PPM"), 280.0)).unwrap();

        let link_id = schema.add_link(a, b, Point::new(264.0, 196.0)).unwrap();
        let link = schema.link(link_id).unwrap();
        assert!(link.joins(b, a));
        assert_eq!(link.link_dot_position, Point::new(264.0, 196.0));
        assert!(schema.is_linked(a));
        assert!(schema.is_linked(b));
    }

    #[test]
    fn test_add_link_rejects_duplicate_in_either_order() {
        let mut schema = Schema::default();
        let a = schema.add_node(text_node(0.0)).unwrap();
        let b = schema.add_node(text_node(280.0)).unwrap();
        schema.add_link(a, b, Point::default()).unwrap();

        assert_eq!(
            schema.add_link(b, a, Point::default()),
            Err(SchemaError::DuplicateLink(b, a))
        );
        assert_eq!(schema.links.len(), 1);
    }

    #[test]
    fn test_add_link_rejects_self_and_missing() {
        let mut schema = Schema::default();
        let a = schema.add_node(text_node(0.0)).unwrap();
        let missing = Uuid::new_v4();

        assert_eq!(schema.add_link(a, a, Point::default()), Err(SchemaError::SelfLink(a)));
        assert_eq!(
            schema.add_link(a, missing, Point::default()),
            Err(SchemaError::NodeNotFound(missing))
        );
        assert!(schema.links.is_empty());
    }

    #[test]
    fn test_add_link_unit_mismatch() {
        let mut schema = Schema::default();
        let a = schema.add_node(result_node(AnalyteType::Phosphate, Some("PPM"), 0.0)).unwrap();
        let b = schema.add_node(result_node(AnalyteType::Ph, Some("pH"), 280.0)).unwrap();

        let result = schema.add_link(a, b, Point::default());
        assert!(matches!(result, Err(SchemaError::UnitMismatch { .. })));
        assert!(schema.links.is_empty());
    }

    #[test]
    fn test_add_link_units_only_checked_when_both_declared() {
        let mut schema = Schema::default();
        let a = schema.add_node(result_node(AnalyteType::Phosphate, Some("PPM"), 0.0)).unwrap();
        let b = schema.add_node(result_node(AnalyteType::Boron, None, 280.0)).unwrap();
        assert!(schema.add_link(a, b, Point::default()).is_ok());

        // Non-analyte cards never take part in the unit check
        let mut text = text_node(560.0);
        text.data.insert("unit".into(), json!("kg"));
        let c = schema.add_node(text).unwrap();
        assert!(schema.add_link(a, c, Point::default()).is_ok());
    }

    #[test]
    fn test_remove_link() {
        let mut schema = Schema::default();
        let a = schema.add_node(text_node(0.0)).unwrap();
        let b = schema.add_node(text_node(280.0)).unwrap();
        let link_id = schema.add_link(a, b, Point::default()).unwrap();

        let removed = schema.remove_link(link_id).unwrap();
        assert_eq!(removed.id, link_id);
        assert!(schema.links.is_empty());
        assert_eq!(schema.remove_link(link_id), Err(SchemaError::LinkNotFound(link_id)));
    }

    #[test]
    fn test_update_link_is_partial() {
        let mut schema = Schema::default();
        let a = schema.add_node(text_node(0.0)).unwrap();
        let b = schema.add_node(text_node(280.0)).unwrap();
        let link_id = schema.add_link(a, b, Point::new(10.0, 10.0)).unwrap();

        schema
            .update_link(
                link_id,
                LinkUpdate {
                    menu_node_position: Some(Point::new(10.0, 70.0)),
                    menu_open: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        schema
            .update_link(
                link_id,
                LinkUpdate {
                    menu_open: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let link = schema.link(link_id).unwrap();
        assert_eq!(link.menu_node_position, Some(Point::new(10.0, 70.0)));
        assert!(!link.is_menu_open());
        assert!(link.combined_condition.is_none());
    }

    #[test]
    fn test_json_field_names() {
        let mut schema = Schema::default();
        let a = schema.add_node(result_node(AnalyteType::Phosphate, Some("PPM"), 0.0)).unwrap();
        let b = schema.add_node(result_node(AnalyteType::Boron, Some("PPM"), 280.0)).unwrap();
        schema.add_link(a, b, Point::new(1.0, 2.0)).unwrap();
        let mut config = TestResultConfig::default();
        config.compare_time_range = Some(CompareTimeRange::Days30);
        config.follow_up_frequency = FollowUpFrequency::OnNewResult;
        schema.update_node_config(a, config).unwrap();

        let value: serde_json::Value = serde_json::from_str(&schema.to_json().unwrap()).unwrap();
        assert_eq!(value["name"], "New Schema");
        assert_eq!(value["nodes"][0]["type"], "phosphate-result");
        assert_eq!(value["nodes"][0]["analyteType"], "phosphate");
        assert_eq!(value["nodes"][0]["testConfig"]["compareTimeRange"], "30d");
        assert_eq!(value["nodes"][0]["testConfig"]["followUpFrequency"], "on-new-result");
        assert_eq!(value["links"][0]["linkDotPosition"]["y"], 2.0);
        assert!(value["links"][0].get("menuOpen").is_none());
    }

    #[test]
    fn test_schema_roundtrip() {
        let mut original = Schema::new("Field 12");
        let a = original.add_node(result_node(AnalyteType::Potassium, Some("PPM"), 0.0)).unwrap();
        let b = original.add_node(text_node(280.0)).unwrap();
        original.add_link(a, b, Point::new(264.0, 196.0)).unwrap();

        let restored = Schema::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_links_default_when_missing() {
        let schema = Schema::from_json(r#"{"name":"Empty","nodes":[]}"#).unwrap();
        assert!(schema.links.is_empty());
    }

    #[test]
    fn test_add_node_rejects_duplicate_id() {
        let mut schema = Schema::default();
        let node = text_node(0.0);
        let id = schema.add_node(node.clone()).unwrap();
        assert_eq!(schema.add_node(node), Err(SchemaError::DuplicateNode(id)));
        assert_eq!(schema.nodes.len(), 1);
    }

    /// Two cards and a link between them, as JSON, after `edit` has run.
    fn schema_json(edit: impl FnOnce(&mut Schema)) -> String {
        let mut schema = Schema::default();
        let a = schema.add_node(text_node(0.0)).unwrap();
        let b = schema.add_node(text_node(280.0)).unwrap();
        schema.add_link(a, b, Point::default()).unwrap();
        edit(&mut schema);
        schema.to_json().unwrap()
    }

    #[test]
    fn test_from_json_rejects_dangling_link() {
        let json = schema_json(|schema| schema.nodes.clear());
        assert!(matches!(Schema::from_json(&json), Err(SchemaError::NodeNotFound(_))));
    }

    #[test]
    fn test_from_json_rejects_self_link() {
        let json = schema_json(|schema| {
            schema.links[0].target_node_id = schema.links[0].source_node_id;
        });
        assert!(matches!(Schema::from_json(&json), Err(SchemaError::SelfLink(_))));
    }

    #[test]
    fn test_from_json_rejects_duplicate_node_id() {
        let json = schema_json(|schema| {
            let copy = schema.nodes[0].clone();
            schema.nodes.push(copy);
        });
        assert!(matches!(Schema::from_json(&json), Err(SchemaError::DuplicateNode(_))));
    }

    #[test]
    fn test_from_json_rejects_duplicate_link_id() {
        let json = schema_json(|schema| {
            let c = text_node(560.0);
            let c_id = c.id;
            schema.nodes.push(c);
            let mut copy = schema.links[0].clone();
            copy.target_node_id = c_id;
            schema.links.push(copy);
        });
        assert!(matches!(Schema::from_json(&json), Err(SchemaError::DuplicateLinkId(_))));
    }

    #[test]
    fn test_from_json_rejects_second_link_on_same_pair() {
        let json = schema_json(|schema| {
            let first = &schema.links[0];
            let reversed = CardLink::new(first.target_node_id, first.source_node_id, Point::default());
            schema.links.push(reversed);
        });
        assert!(matches!(Schema::from_json(&json), Err(SchemaError::DuplicateLink(_, _))));
    }

    #[test]
    fn test_from_json_reports_malformed_text() {
        assert!(matches!(Schema::from_json("{\"name\":"), Err(SchemaError::Json(_))));
    }
}
