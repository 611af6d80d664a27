//! Static catalog of the card kinds offered by the palette.
//!
//! Besides the kind list this holds the analyte colour table, the display
//! presets used to fill in result cards, and the data seeded into new cards.

use crate::types::{AnalyteType, NodeCategory, SchemaNode};
use serde_json::{json, Map, Value};

/// Line colour used when a card has no analyte.
pub const DEFAULT_LINE_HEX: &str = "#3B82F6";
/// Card border colour used when a card has no analyte.
pub const DEFAULT_BORDER_HEX: &str = "#3a3a3a";
/// Neutral border of the analyte summary panels.
pub const SUMMARY_BORDER_HEX: &str = "#282828";

/// A card kind that can be added from the palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeKind {
    /// Kind id stored as the card's `type`
    pub id: &'static str,
    /// Default label
    pub label: &'static str,
    /// Palette category
    pub category: NodeCategory,
    /// Short glyph shown on the card
    pub icon: &'static str,
    /// Data type caption
    pub data_type: &'static str,
    /// Analyte, for result cards
    pub analyte: Option<AnalyteType>,
}

const fn kind(
    id: &'static str,
    label: &'static str,
    category: NodeCategory,
    icon: &'static str,
    data_type: &'static str,
    analyte: Option<AnalyteType>,
) -> NodeKind {
    NodeKind {
        id,
        label,
        category,
        icon,
        data_type,
        analyte,
    }
}

/// Every card kind in catalog order.
pub const NODE_KINDS: [NodeKind; 13] = [
    kind("crop-type", "Crop Type", NodeCategory::Relational, "", "New Crop", None),
    kind("record", "Record", NodeCategory::Relational, "", "New Record", None),
    kind("nitrate-result", "Nitrate Result", NodeCategory::Normal, "🧪", "NUMBER", Some(AnalyteType::Nitrate)),
    kind("phosphate-result", "Phosphate Result", NodeCategory::Normal, "🧪", "NUMBER", Some(AnalyteType::Phosphate)),
    kind("boron-result", "Boron Result", NodeCategory::Normal, "🧪", "NUMBER", Some(AnalyteType::Boron)),
    kind("potassium-result", "Potassium Result", NodeCategory::Normal, "🧪", "NUMBER", Some(AnalyteType::Potassium)),
    kind("ph-result", "pH Result", NodeCategory::Normal, "🧪", "NUMBER", Some(AnalyteType::Ph)),
    kind("short-text", "Short Text", NodeCategory::Normal, "📝", "STRING", None),
    kind("long-text", "Long Text", NodeCategory::Normal, "📄", "STRING", None),
    kind("number", "Number", NodeCategory::Normal, "#", "INTEGER", None),
    kind("toggle", "Toggle", NodeCategory::Normal, "⚡", "BOOLEAN", None),
    kind("followup-reminder", "Follow-up Reminder", NodeCategory::Automation, "⏰", "AUTOMATION", None),
    kind("webhook-action", "Webhook Action", NodeCategory::Automation, "🔗", "AUTOMATION", None),
];

/// Palette categories in display order.
pub const CATEGORIES: [NodeCategory; 3] = [
    NodeCategory::Relational,
    NodeCategory::Normal,
    NodeCategory::Automation,
];

impl NodeCategory {
    /// Palette section heading.
    pub fn label(self) -> &'static str {
        match self {
            NodeCategory::Relational => "Relational Fields",
            NodeCategory::Normal => "Recent Results",
            NodeCategory::Automation => "Automation Fields",
        }
    }
}

impl AnalyteType {
    /// Accent colour of the analyte as a hex string.
    pub fn accent_hex(self) -> &'static str {
        match self {
            AnalyteType::Nitrate => "#A78BFA",
            AnalyteType::Phosphate => "#3B82F6",
            AnalyteType::Boron => "#FB923C",
            AnalyteType::Potassium => "#F472B6",
            AnalyteType::Ph => "#84CC16",
        }
    }

    /// Unit lab results for this analyte are reported in.
    pub fn unit(self) -> &'static str {
        match self {
            AnalyteType::Ph => "pH",
            _ => "PPM",
        }
    }

    /// Decimal places used when displaying a value.
    pub fn decimals(self) -> usize {
        match self {
            AnalyteType::Boron => 2,
            _ => 1,
        }
    }
}

/// Looks up a kind by id.
pub fn find_kind(id: &str) -> Option<&'static NodeKind> {
    NODE_KINDS.iter().find(|k| k.id == id)
}

/// Data type caption for a kind, "UNKNOWN" when the kind is not in the catalog.
pub fn data_type_label(kind_id: &str) -> &'static str {
    find_kind(kind_id).map(|k| k.data_type).unwrap_or("UNKNOWN")
}

/// Glyph for a kind, empty when unknown.
pub fn icon(kind_id: &str) -> &'static str {
    find_kind(kind_id).map(|k| k.icon).unwrap_or("")
}

/// Fixed demo result shown for an analyte until real data arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalytePreset {
    /// Test or plot name
    pub test_name: &'static str,
    /// Relative age of the result
    pub timestamp: &'static str,
    /// Status badge text
    pub status: &'static str,
    /// Whether the status badge carries a warning glyph
    pub warns: bool,
    /// Latest value
    pub value: f64,
    /// Fill of the progress bar in [0, 1]
    pub progress: f64,
    /// Progress bar colour override
    pub progress_hex: Option<&'static str>,
    /// Border colour override for the value panel
    pub border_hex: Option<&'static str>,
}

/// Preset merged into result cards on the canvas. Only some analytes have one.
pub fn card_preset(analyte: AnalyteType) -> Option<AnalytePreset> {
    match analyte {
        AnalyteType::Phosphate => Some(AnalytePreset {
            test_name: "Test P4",
            timestamp: "1h ago",
            status: "Elevated",
            warns: true,
            value: 36.7,
            progress: 0.92,
            progress_hex: None,
            border_hex: None,
        }),
        AnalyteType::Boron => Some(AnalytePreset {
            test_name: "Block P4 (North Plot)",
            timestamp: "8h ago",
            status: "Optimal",
            warns: false,
            value: 1.20,
            progress: 1.0,
            progress_hex: Some("#ea4124"),
            border_hex: Some(SUMMARY_BORDER_HEX),
        }),
        AnalyteType::Potassium => Some(AnalytePreset {
            test_name: "P3 (South Plot)",
            timestamp: "2d ago",
            status: "High",
            warns: true,
            value: 215.7,
            progress: 1.0,
            progress_hex: Some("#ff9cc7"),
            border_hex: Some(SUMMARY_BORDER_HEX),
        }),
        AnalyteType::Nitrate | AnalyteType::Ph => None,
    }
}

/// Preview shown on palette tiles. Every analyte has one.
pub fn palette_preview(analyte: AnalyteType) -> AnalytePreset {
    match analyte {
        AnalyteType::Nitrate => AnalytePreset {
            test_name: "Test N3",
            timestamp: "1h ago",
            status: "Elevated",
            warns: true,
            value: 24.3,
            progress: 1.0,
            progress_hex: None,
            border_hex: None,
        },
        AnalyteType::Ph => AnalytePreset {
            test_name: "Test H1",
            timestamp: "1h ago",
            status: "Optimal",
            warns: true,
            value: 6.8,
            progress: 1.0,
            progress_hex: None,
            border_hex: None,
        },
        other => card_preset(other)
            .map(|p| AnalytePreset { progress: 1.0, ..p })
            .unwrap_or(AnalytePreset {
                test_name: "Test",
                timestamp: "1h ago",
                status: "Elevated",
                warns: true,
                value: 0.0,
                progress: 0.92,
                progress_hex: None,
                border_hex: None,
            }),
    }
}

/// Hours represented by a relative timestamp; unknown stamps sort last.
fn timestamp_hours(stamp: &str) -> u32 {
    match stamp {
        "1h ago" => 1,
        "2h ago" => 2,
        "8h ago" => 8,
        "1d ago" => 24,
        "2d ago" => 48,
        "3d ago" => 72,
        _ => 999,
    }
}

fn recency(kind: &NodeKind) -> u32 {
    match kind.analyte {
        Some(analyte) => {
            let stamp = card_preset(analyte).map(|p| p.timestamp).unwrap_or("1h ago");
            timestamp_hours(stamp)
        }
        None => 999,
    }
}

/// Kinds belonging to a category in palette order.
///
/// "Recent Results" is ordered by how recent each analyte's preset result is.
/// The sort is stable, so kinds without a result keep catalog order at the end.
pub fn kinds_in_category(category: NodeCategory) -> Vec<&'static NodeKind> {
    let mut kinds: Vec<&'static NodeKind> =
        NODE_KINDS.iter().filter(|k| k.category == category).collect();
    if category == NodeCategory::Normal {
        kinds.sort_by_key(|k| recency(k));
    }
    kinds
}

/// Data seeded into a newly added card.
///
/// Only the phosphate result is pre-filled; everything else starts empty.
pub fn initial_data(kind: &NodeKind) -> Map<String, Value> {
    match kind.analyte {
        Some(AnalyteType::Phosphate) => {
            let mut data = Map::new();
            data.insert("testName".into(), json!("Test P4"));
            data.insert("timestamp".into(), json!("1h ago"));
            data.insert("analyteLabel".into(), json!("Phosphate"));
            data.insert("status".into(), json!("Elevated"));
            data.insert("value".into(), json!(36.7));
            data.insert("unit".into(), json!("PPM"));
            data.insert("progress".into(), json!(0.92));
            data.insert("accentColor".into(), json!("#3C7DE5"));
            data
        }
        _ => Map::new(),
    }
}

/// Line colour used for a card's connectors.
pub fn line_hex(node: &SchemaNode) -> &'static str {
    node.analyte_type
        .map(AnalyteType::accent_hex)
        .unwrap_or(DEFAULT_LINE_HEX)
}

/// Display model of a result card after merging defaults, preset and card data.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyteSummary {
    /// Analyte shown on the card
    pub analyte: AnalyteType,
    /// Test or plot name
    pub test_name: String,
    /// Relative age of the result
    pub timestamp: String,
    /// Analyte caption
    pub analyte_label: String,
    /// Status badge text
    pub status: String,
    /// Whether the status badge shows a warning glyph
    pub warns: bool,
    /// Latest value, when numeric
    pub value: Option<f64>,
    /// Unit caption
    pub unit: String,
    /// Progress bar fill in [0, 1]
    pub progress: f64,
    /// Accent colour
    pub accent_hex: String,
    /// Progress bar colour
    pub progress_hex: String,
    /// Value panel border colour
    pub border_hex: String,
}

impl AnalyteSummary {
    /// Value formatted with the analyte's precision, or an em placeholder.
    pub fn value_text(&self) -> String {
        match self.value {
            Some(v) => format!("{:.*}", self.analyte.decimals(), v),
            None => "—".to_string(),
        }
    }
}

/// Builds the display summary of a result card.
///
/// Card data overrides the analyte preset, which overrides the label and accent
/// defaults. Returns `None` for cards without an analyte.
pub fn analyte_summary(node: &SchemaNode) -> Option<AnalyteSummary> {
    let analyte = node.analyte_type?;
    let preset = card_preset(analyte);

    let text = |key: &str, fallback: &str| -> String {
        node.data_str(key).unwrap_or(fallback).to_string()
    };

    let accent_hex = text("accentColor", analyte.accent_hex());
    let progress_hex = node
        .data_str("progressColor")
        .map(str::to_string)
        .or_else(|| preset.and_then(|p| p.progress_hex).map(str::to_string))
        .unwrap_or_else(|| accent_hex.clone());
    let border_hex = node
        .data_str("borderColor")
        .map(str::to_string)
        .or_else(|| preset.and_then(|p| p.border_hex).map(str::to_string))
        .unwrap_or_else(|| SUMMARY_BORDER_HEX.to_string());

    let progress = node
        .data_number("progress")
        .or(preset.map(|p| p.progress))
        .unwrap_or(0.92)
        .clamp(0.0, 1.0);

    Some(AnalyteSummary {
        analyte,
        test_name: text("testName", preset.map(|p| p.test_name).unwrap_or("")),
        timestamp: text("timestamp", preset.map(|p| p.timestamp).unwrap_or("")),
        analyte_label: text(
            "analyteLabel",
            if preset.is_some() { analyte.display_name() } else { node.label.as_str() },
        ),
        status: text("status", preset.map(|p| p.status).unwrap_or("")),
        warns: preset.map(|p| p.warns).unwrap_or(false),
        value: node.value().or(preset.map(|p| p.value)),
        unit: text("unit", if preset.is_some() { analyte.unit() } else { "" }),
        progress,
        accent_hex,
        progress_hex,
        border_hex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn node_of(kind_id: &str) -> SchemaNode {
        let kind = find_kind(kind_id).unwrap();
        SchemaNode::new(kind.id, kind.label, kind.analyte, Point::default(), initial_data(kind))
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(NODE_KINDS.len(), 13);
        assert_eq!(data_type_label("number"), "INTEGER");
        assert_eq!(data_type_label("mystery"), "UNKNOWN");
        assert_eq!(icon("webhook-action"), "🔗");
        assert_eq!(icon("mystery"), "");
    }

    #[test]
    fn test_recent_results_sorted_by_recency() {
        let ids: Vec<&str> = kinds_in_category(NodeCategory::Normal)
            .iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "nitrate-result",
                "phosphate-result",
                "ph-result",
                "boron-result",
                "potassium-result",
                "short-text",
                "long-text",
                "number",
                "toggle",
            ]
        );
    }

    #[test]
    fn test_other_categories_keep_catalog_order() {
        let ids: Vec<&str> = kinds_in_category(NodeCategory::Automation)
            .iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(ids, vec!["followup-reminder", "webhook-action"]);
    }

    #[test]
    fn test_initial_data_only_for_phosphate() {
        let phosphate = node_of("phosphate-result");
        assert_eq!(phosphate.value(), Some(36.7));
        assert_eq!(phosphate.unit(), Some("PPM"));
        assert_eq!(phosphate.data_str("accentColor"), Some("#3C7DE5"));

        assert!(node_of("boron-result").data.is_empty());
        assert!(node_of("toggle").data.is_empty());
    }

    #[test]
    fn test_summary_uses_preset() {
        let summary = analyte_summary(&node_of("boron-result")).unwrap();
        assert_eq!(summary.test_name, "Block P4 (North Plot)");
        assert_eq!(summary.value_text(), "1.20");
        assert_eq!(summary.progress_hex, "#ea4124");
        assert_eq!(summary.accent_hex, "#FB923C");
    }

    #[test]
    fn test_summary_node_data_wins() {
        let mut node = node_of("potassium-result");
        node.data.insert("value".into(), json!(180.04));
        node.data.insert("progress".into(), json!(3.0));
        let summary = analyte_summary(&node).unwrap();
        assert_eq!(summary.value_text(), "180.0");
        assert_eq!(summary.progress, 1.0);
        assert_eq!(summary.status, "High");
    }

    #[test]
    fn test_summary_without_preset() {
        let summary = analyte_summary(&node_of("nitrate-result")).unwrap();
        assert_eq!(summary.analyte_label, "Nitrate Result");
        assert_eq!(summary.value, None);
        assert_eq!(summary.value_text(), "—");
        assert_eq!(summary.progress, 0.92);

        assert!(analyte_summary(&node_of("short-text")).is_none());
    }

    #[test]
    fn test_line_colour() {
        assert_eq!(line_hex(&node_of("ph-result")), "#84CC16");
        assert_eq!(line_hex(&node_of("record")), DEFAULT_LINE_HEX);
    }
}
