//! Form logic behind the rule panels.
//!
//! Each panel edits a draft and mirrors it into the card or link configuration.
//! The panels render whatever these types report, so the summary sentences and
//! save validation live here where they can be tested without a window.

use crate::constants::{DEFAULT_CUSTOM_DAYS, DEFAULT_THRESHOLD, MAX_CUSTOM_DAYS, THRESHOLD_MAX};
use crate::types::{
    ActionRecord, ActionType, AmountUnit, CombinedConditionConfig, CombinedLogic,
    CombinedThreshold, ConditionRule, Direction, FollowUpFrequency, Material, NodeId,
    NotificationChannel, SchemaNode, Severity, TestResultConfig, ThresholdDirection,
    ThresholdUnit,
};
use chrono::NaiveDate;

/// Clamps a custom cadence to the accepted range of days.
pub fn clamp_custom_days(days: u32) -> u32 {
    days.clamp(1, MAX_CUSTOM_DAYS)
}

/// Joins channel ids for a summary, or a dash when there are none.
fn routes(channels: &[NotificationChannel]) -> String {
    if channels.is_empty() {
        return "—".to_string();
    }
    channels.iter().map(|c| c.id()).collect::<Vec<_>>().join(", ")
}

fn toggle(channels: &mut Vec<NotificationChannel>, channel: NotificationChannel) {
    if let Some(i) = channels.iter().position(|c| *c == channel) {
        channels.remove(i);
    } else {
        channels.push(channel);
    }
}

fn needs_recipients(channels: &[NotificationChannel]) -> bool {
    channels.iter().any(|c| c.needs_recipients())
}

/// Resets the basic condition fields of a card, keeping everything else.
///
/// Used when "Set condition" is picked from a link menu.
pub fn seed_condition(config: &mut TestResultConfig) {
    config.enabled = true;
    config.schedule_follow_up = true;
    config.follow_up_frequency = FollowUpFrequency::Weekly;
    config.threshold_alert = false;
    config.threshold_direction = ThresholdDirection::Above;
    config.notifications = false;
}

impl ConditionRule {
    /// The rule stored on a card, or one derived from its flat fields.
    pub fn from_config(config: &TestResultConfig) -> Self {
        if let Some(rule) = &config.condition_rule {
            return rule.clone();
        }
        let direction = match config.threshold_direction {
            ThresholdDirection::Below => Direction::Below,
            ThresholdDirection::Above | ThresholdDirection::Both => Direction::Above,
        };
        Self {
            threshold: Some(config.threshold_value.unwrap_or(DEFAULT_THRESHOLD)),
            threshold_direction: Some(direction),
            frequency: config.follow_up_frequency,
            custom_days: Some(config.custom_days.unwrap_or(DEFAULT_CUSTOM_DAYS)),
            notification_channels: Some(
                config
                    .notification_channels
                    .clone()
                    .unwrap_or_else(|| vec![NotificationChannel::App]),
            ),
            recipients: Some(String::new()),
        }
    }

    /// Mirrors the rule into a card configuration.
    ///
    /// Saving a rule always turns on follow-ups and threshold alerts, and turns
    /// notifications on exactly when at least one channel is selected.
    pub fn apply_to(&self, config: &mut TestResultConfig) {
        config.threshold_value = self.threshold;
        config.threshold_direction = self.direction().into();
        config.follow_up_frequency = self.frequency;
        config.custom_days = self.custom_days;
        config.notification_channels = Some(self.channels().to_vec());
        config.notifications = !self.channels().is_empty();
        config.schedule_follow_up = true;
        config.threshold_alert = true;
        config.condition_rule = Some(self.clone());
    }

    /// Direction, defaulting to above.
    pub fn direction(&self) -> Direction {
        self.threshold_direction.unwrap_or(Direction::Above)
    }

    /// Selected channels.
    pub fn channels(&self) -> &[NotificationChannel] {
        self.notification_channels.as_deref().unwrap_or(&[])
    }

    /// Days of a custom cadence.
    pub fn custom_days_or_default(&self) -> u32 {
        self.custom_days.unwrap_or(DEFAULT_CUSTOM_DAYS)
    }

    /// Recipients text.
    pub fn recipients_text(&self) -> &str {
        self.recipients.as_deref().unwrap_or("")
    }

    /// Adds or removes a channel.
    pub fn toggle_channel(&mut self, channel: NotificationChannel) {
        toggle(self.notification_channels.get_or_insert_with(Vec::new), channel);
    }

    /// Changes the cadence. Custom days are only kept for a custom cadence.
    pub fn set_frequency(&mut self, frequency: FollowUpFrequency) {
        self.custom_days = match frequency {
            FollowUpFrequency::Custom => Some(self.custom_days_or_default()),
            _ => None,
        };
        self.frequency = frequency;
    }

    /// Sets the custom cadence length.
    pub fn set_custom_days(&mut self, days: u32) {
        self.custom_days = Some(clamp_custom_days(days));
    }

    /// Whether the rule is complete enough to save.
    pub fn can_save(&self) -> bool {
        let has_threshold = matches!(self.threshold, Some(v) if v != 0.0 && !v.is_nan());
        let recipients_ok =
            !needs_recipients(self.channels()) || !self.recipients_text().trim().is_empty();
        has_threshold && !self.channels().is_empty() && recipients_ok
    }

    /// Helper line under the threshold input.
    pub fn helper_text(&self, analyte: &str, unit: &str) -> String {
        format!(
            "Trigger when {} is {} {:.1} {}.",
            analyte.to_lowercase(),
            self.direction().label(),
            self.threshold.unwrap_or(DEFAULT_THRESHOLD),
            unit
        )
    }

    /// One-line summary of the rule.
    pub fn summary(&self, analyte: &str, unit: &str) -> String {
        format!(
            "If {} is {} {:.1} {} → check {} → notify {}",
            analyte.to_lowercase(),
            self.direction().label(),
            self.threshold.unwrap_or(DEFAULT_THRESHOLD),
            unit,
            self.frequency.cadence(self.custom_days_or_default()),
            routes(self.channels())
        )
    }
}

/// Working copy of a combined condition while its panel is open.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedDraft {
    /// AND/OR evaluation
    pub logic: CombinedLogic,
    /// One threshold per linked card
    pub thresholds: Vec<CombinedThreshold>,
    /// Check cadence
    pub frequency: FollowUpFrequency,
    /// Days of a custom cadence
    pub custom_days: u32,
    /// Selected channels
    pub channels: Vec<NotificationChannel>,
    /// Recipients text
    pub recipients: String,
    /// Alert severity
    pub severity: Severity,
}

impl CombinedDraft {
    /// Seeds a draft from a saved config, or from the two linked cards.
    ///
    /// # Arguments
    ///
    /// * `existing` - The link's saved combined condition, if any
    /// * `source` - First linked card
    /// * `target` - Second linked card
    pub fn seed(
        existing: Option<&CombinedConditionConfig>,
        source: &SchemaNode,
        target: &SchemaNode,
    ) -> Self {
        if let Some(config) = existing {
            return Self {
                logic: config.logic,
                thresholds: config.thresholds.clone(),
                frequency: config.frequency,
                custom_days: config.custom_days.unwrap_or(DEFAULT_CUSTOM_DAYS),
                channels: config.notification_channels.clone(),
                recipients: config.recipients.clone().unwrap_or_default(),
                severity: config.severity,
            };
        }

        let threshold_for = |node: &SchemaNode| CombinedThreshold {
            node_id: node.id,
            analyte_label: node.label.clone(),
            direction: Direction::Above,
            value: node.value().map(f64::round).unwrap_or(DEFAULT_THRESHOLD),
            unit: ThresholdUnit::Ppm,
        };
        Self {
            logic: CombinedLogic::Any,
            thresholds: vec![threshold_for(source), threshold_for(target)],
            frequency: FollowUpFrequency::OnNewResult,
            custom_days: DEFAULT_CUSTOM_DAYS,
            channels: vec![NotificationChannel::App],
            recipients: String::new(),
            severity: Severity::Warning,
        }
    }

    /// Sets a threshold value, clamped to the slider range.
    pub fn set_value(&mut self, node_id: NodeId, value: f64) {
        if let Some(t) = self.thresholds.iter_mut().find(|t| t.node_id == node_id) {
            t.value = if value.is_nan() { value } else { value.clamp(0.0, THRESHOLD_MAX) };
        }
    }

    /// Sets a threshold direction.
    pub fn set_direction(&mut self, node_id: NodeId, direction: Direction) {
        if let Some(t) = self.thresholds.iter_mut().find(|t| t.node_id == node_id) {
            t.direction = direction;
        }
    }

    /// Adds or removes a channel.
    pub fn toggle_channel(&mut self, channel: NotificationChannel) {
        toggle(&mut self.channels, channel);
    }

    /// Whether the draft can be saved.
    pub fn can_save(&self) -> bool {
        !self.channels.is_empty() && !self.thresholds.iter().any(|t| t.value.is_nan())
    }

    /// Explanation of the selected logic.
    pub fn logic_hint(&self) -> &'static str {
        match self.logic {
            CombinedLogic::Any => "Trigger if any linked nutrient crosses its threshold.",
            CombinedLogic::All => "Trigger only when all linked nutrients cross their thresholds.",
        }
    }

    /// One-line summary of the combined rule.
    pub fn summary(&self) -> String {
        let comparisons: Vec<String> = self
            .thresholds
            .iter()
            .map(|t| format!("{} {} {} {}", t.analyte_label, t.direction.symbol(), t.value, t.unit.label()))
            .collect();
        let lhs = match self.logic {
            CombinedLogic::Any => format!("Trigger if {}", comparisons.join(" or ")),
            CombinedLogic::All => format!("Trigger when {}", comparisons.join(" and ")),
        };
        format!(
            "{} → check {} → notify {}",
            lhs,
            self.frequency.cadence(self.custom_days),
            routes(&self.channels)
        )
    }

    /// The config stored on the link when the draft is saved.
    pub fn to_config(&self) -> CombinedConditionConfig {
        CombinedConditionConfig {
            logic: self.logic,
            thresholds: self.thresholds.clone(),
            frequency: self.frequency,
            custom_days: (self.frequency == FollowUpFrequency::Custom)
                .then_some(clamp_custom_days(self.custom_days)),
            notification_channels: self.channels.clone(),
            recipients: needs_recipients(&self.channels).then(|| self.recipients.clone()),
            severity: self.severity,
        }
    }
}

/// Parses the ISO date stored on an action record.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn trimmed(text: &Option<String>) -> Option<&str> {
    text.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ActionRecord {
    /// A new record for a boron fertilizer application today.
    pub fn with_defaults(today: NaiveDate) -> Self {
        Self {
            action_type: Some(ActionType::BoronFertilizerApplied),
            material: Some(Material::Solubor),
            amount_unit: Some(AmountUnit::Ml),
            date_applied: Some(today.format("%Y-%m-%d").to_string()),
            notes: Some(String::new()),
            ..Default::default()
        }
    }

    /// Action type, defaulting to a boron fertilizer application.
    pub fn action(&self) -> ActionType {
        self.action_type.unwrap_or(ActionType::BoronFertilizerApplied)
    }

    /// Material, defaulting to Solubor.
    pub fn material_or_default(&self) -> Material {
        self.material.unwrap_or(Material::Solubor)
    }

    /// Changes the action type. The description only survives for `other`.
    pub fn set_action_type(&mut self, action: ActionType) {
        if action != ActionType::Other {
            self.action_description = None;
        }
        self.action_type = Some(action);
    }

    /// Changes the material. The description only survives for `custom`.
    pub fn set_material(&mut self, material: Material) {
        if material != Material::Custom {
            self.material_description = None;
        }
        self.material = Some(material);
    }

    fn material_phrase(&self) -> String {
        match self.material_or_default() {
            Material::Custom => trimmed(&self.material_description)
                .unwrap_or("custom material")
                .to_string(),
            other => other.label().to_string(),
        }
    }

    fn amount_fragment(&self) -> String {
        let Some(amount) = self.amount.filter(|a| !a.is_nan()) else {
            return String::new();
        };
        let unit = match self.amount_unit {
            Some(AmountUnit::Percent) => " % solution",
            Some(unit) => unit.label(),
            None => "",
        };
        format!(" ({amount}{unit})")
    }

    fn date_phrase(&self, today: NaiveDate) -> String {
        match self.date_applied.as_deref() {
            None | Some("") => ".".to_string(),
            Some(text) => match parse_iso_date(text) {
                Some(date) if date == today => " today.".to_string(),
                Some(date) => format!(" on {}.", date.format("%b %-d")),
                None => format!(" on {text}."),
            },
        }
    }

    /// One-line summary of the recorded action.
    pub fn summary(&self, today: NaiveDate) -> String {
        let material = self.material_phrase();
        let core = match self.action() {
            ActionType::IrrigationAdjustment => format!("Adjusted irrigation for {material}"),
            ActionType::SoilAmendment => format!("Amended soil with {material}"),
            ActionType::FoliarSpray => format!("Applied foliar spray using {material}"),
            ActionType::Other => {
                let label = trimmed(&self.action_description).unwrap_or("custom action");
                format!("Recorded action: {label} • {material}")
            }
            ActionType::BoronFertilizerApplied => format!("Applied {material}"),
        };
        format!("{}{}{}", core, self.amount_fragment(), self.date_phrase(today))
    }

    /// Whether the record can be saved.
    pub fn can_save(&self) -> bool {
        let described_action =
            self.action() != ActionType::Other || trimmed(&self.action_description).is_some();
        let described_material =
            self.material_or_default() != Material::Custom || trimmed(&self.material_description).is_some();
        let dated = self.date_applied.as_deref().is_some_and(|d| !d.is_empty());
        described_action && described_material && dated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalyteType, Point};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn result(label: &str, value: Option<f64>) -> SchemaNode {
        let mut data = serde_json::Map::new();
        if let Some(v) = value {
            data.insert("value".into(), json!(v));
        }
        SchemaNode::new("x-result", label, Some(AnalyteType::Boron), Point::default(), data)
    }

    #[test]
    fn test_condition_defaults_from_empty_config() {
        let rule = ConditionRule::from_config(&TestResultConfig::default());
        assert_eq!(rule.threshold, Some(36.0));
        assert_eq!(rule.direction(), Direction::Above);
        assert_eq!(rule.custom_days, Some(7));
        assert_eq!(rule.channels(), &[NotificationChannel::App]);
        assert!(rule.can_save());
    }

    #[test]
    fn test_condition_apply_mirrors_fields() {
        let mut config = TestResultConfig::default();
        let mut rule = ConditionRule::from_config(&config);
        rule.threshold = Some(42.5);
        rule.threshold_direction = Some(Direction::Below);
        rule.toggle_channel(NotificationChannel::App);
        rule.apply_to(&mut config);

        assert_eq!(config.threshold_value, Some(42.5));
        assert_eq!(config.threshold_direction, ThresholdDirection::Below);
        assert!(!config.notifications);
        assert!(config.schedule_follow_up);
        assert!(config.threshold_alert);
        assert_eq!(config.condition_rule.as_ref(), Some(&rule));

        // The stored rule wins on the next read
        assert_eq!(ConditionRule::from_config(&config), rule);
    }

    #[test]
    fn test_condition_save_validation() {
        let mut rule = ConditionRule::from_config(&TestResultConfig::default());
        rule.threshold = None;
        assert!(!rule.can_save());
        rule.threshold = Some(0.0);
        assert!(!rule.can_save());

        rule.threshold = Some(20.0);
        rule.toggle_channel(NotificationChannel::Email);
        assert!(!rule.can_save());
        rule.recipients = Some("agronomist@supply.com".into());
        assert!(rule.can_save());

        rule.notification_channels = Some(vec![]);
        assert!(!rule.can_save());
    }

    #[test]
    fn test_condition_summary() {
        let mut rule = ConditionRule::from_config(&TestResultConfig::default());
        rule.set_frequency(FollowUpFrequency::Custom);
        rule.set_custom_days(0);
        rule.toggle_channel(NotificationChannel::Sms);
        assert_eq!(
            rule.summary("Phosphate", "PPM"),
            "If phosphate is Above 36.0 PPM → check Every 1 days → notify app, sms"
        );

        rule.set_frequency(FollowUpFrequency::Biweekly);
        assert_eq!(rule.custom_days, None);
        assert!(rule.summary("Boron", "PPM").contains("check Every 2 weeks"));
    }

    #[test]
    fn test_seed_condition_keeps_other_fields() {
        let mut config = TestResultConfig::default();
        config.threshold_alert = true;
        config.compare_trend_enabled = Some(true);
        seed_condition(&mut config);
        assert!(config.enabled);
        assert!(config.schedule_follow_up);
        assert!(!config.threshold_alert);
        assert_eq!(config.compare_trend_enabled, Some(true));
    }

    #[test]
    fn test_combined_seed_from_nodes() {
        let a = result("Boron Result", Some(1.2));
        let b = result("Potassium Result", None);
        let draft = CombinedDraft::seed(None, &a, &b);

        assert_eq!(draft.logic, CombinedLogic::Any);
        assert_eq!(draft.thresholds[0].value, 1.0);
        assert_eq!(draft.thresholds[1].value, 36.0);
        assert_eq!(draft.severity, Severity::Warning);
        assert_eq!(
            draft.summary(),
            "Trigger if Boron Result > 1 PPM or Potassium Result > 36 PPM → check On new result → notify app"
        );
    }

    #[test]
    fn test_combined_editing_and_save() {
        let a = result("A", None);
        let b = result("B", None);
        let mut draft = CombinedDraft::seed(None, &a, &b);
        draft.logic = CombinedLogic::All;
        draft.set_value(a.id, 250.0);
        draft.set_direction(b.id, Direction::Below);
        draft.toggle_channel(NotificationChannel::App);

        assert_eq!(draft.thresholds[0].value, 100.0);
        assert!(!draft.can_save());
        assert_eq!(
            draft.summary(),
            "Trigger when A > 100 PPM and B < 36 PPM → check On new result → notify —"
        );

        draft.toggle_channel(NotificationChannel::Email);
        draft.recipients = "ops@farm.co".into();
        let config = draft.to_config();
        assert_eq!(config.custom_days, None);
        assert_eq!(config.recipients.as_deref(), Some("ops@farm.co"));

        let reseeded = CombinedDraft::seed(Some(&config), &a, &b);
        assert_eq!(reseeded.thresholds, draft.thresholds);
        assert_eq!(reseeded.logic, CombinedLogic::All);
    }

    #[test]
    fn test_combined_drops_recipients_without_email_or_sms() {
        let a = result("A", None);
        let b = result("B", None);
        let mut draft = CombinedDraft::seed(None, &a, &b);
        draft.recipients = "left over".into();
        draft.frequency = FollowUpFrequency::Custom;
        draft.custom_days = 14;
        let config = draft.to_config();
        assert_eq!(config.recipients, None);
        assert_eq!(config.custom_days, Some(14));
    }

    #[test]
    fn test_record_defaults_and_summary() {
        let record = ActionRecord::with_defaults(today());
        assert_eq!(record.date_applied.as_deref(), Some("2024-06-12"));
        assert_eq!(record.summary(today()), "Applied Solubor (Boron Chelate) today.");
        assert!(record.can_save());
    }

    #[test]
    fn test_record_summary_variants() {
        let mut record = ActionRecord::with_defaults(today());
        record.amount = Some(250.0);
        record.date_applied = Some("2024-03-05".into());
        assert_eq!(
            record.summary(today()),
            "Applied Solubor (Boron Chelate) (250ml) on Mar 5."
        );

        record.set_action_type(ActionType::FoliarSpray);
        record.amount_unit = Some(AmountUnit::Percent);
        record.amount = Some(2.5);
        assert_eq!(
            record.summary(today()),
            "Applied foliar spray using Solubor (Boron Chelate) (2.5 % solution) on Mar 5."
        );

        record.set_action_type(ActionType::Other);
        record.set_material(Material::Custom);
        record.amount = None;
        record.date_applied = None;
        assert_eq!(record.summary(today()), "Recorded action: custom action • custom material.");
    }

    #[test]
    fn test_record_save_validation() {
        let mut record = ActionRecord::with_defaults(today());
        record.set_action_type(ActionType::Other);
        assert!(!record.can_save());
        record.action_description = Some("Mulched rows".into());
        assert!(record.can_save());

        record.set_material(Material::Custom);
        record.material_description = Some("   ".into());
        assert!(!record.can_save());
        record.material_description = Some("Kelp extract".into());
        assert!(record.can_save());

        record.date_applied = Some(String::new());
        assert!(!record.can_save());
    }

    #[test]
    fn test_descriptions_cleared_on_type_change() {
        let mut record = ActionRecord::with_defaults(today());
        record.set_action_type(ActionType::Other);
        record.action_description = Some("Something".into());
        record.set_action_type(ActionType::SoilAmendment);
        assert_eq!(record.action_description, None);
        assert_eq!(record.summary(today()), "Amended soil with Solubor (Boron Chelate) today.");
    }
}
