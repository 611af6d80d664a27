//! Form widgets of the stage panels and link overlays.
//!
//! Each form edits a draft in place and reports what the user asked for through
//! a [`FormOutcome`]; the caller decides where the draft is stored.

use super::rendering::{dashed_line, hex_color, MUTED, OUTLINE};
use crate::constants::{DEFAULT_THRESHOLD, MAX_CUSTOM_DAYS, THRESHOLD_MAX};
use crate::rules::{clamp_custom_days, CombinedDraft};
use crate::trend::{self, Sparkline, TargetBand, TrendStats, SPARKLINE_HEIGHT, SPARKLINE_WIDTH};
use crate::types::*;
use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText};
use eframe::epaint::StrokeKind;

/// What the user did with a form this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FormOutcome {
    /// The draft was edited
    pub changed: bool,
    /// The save button was pressed
    pub save: bool,
    /// The form asked to be closed
    pub close: bool,
}

fn section(ui: &mut egui::Ui, title: &str) {
    ui.add_space(4.0);
    ui.label(RichText::new(title).monospace().size(10.0).color(MUTED));
}

fn summary_strip(ui: &mut egui::Ui, text: String) {
    egui::Frame::new()
        .fill(Color32::from_gray(0x20))
        .stroke(egui::Stroke::new(1.0, OUTLINE))
        .corner_radius(3.0)
        .inner_margin(egui::Margin::same(6))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(text).size(11.0));
        });
}

fn choice<T: PartialEq + Copy>(ui: &mut egui::Ui, value: &mut T, option: T, label: &str) -> bool {
    let clicked = ui
        .add(egui::Button::new(label).selected(*value == option))
        .clicked();
    if clicked && *value != option {
        *value = option;
        return true;
    }
    false
}

fn direction_buttons(ui: &mut egui::Ui, direction: &mut Direction) -> bool {
    ui.horizontal(|ui| {
        let above = choice(ui, direction, Direction::Above, Direction::Above.label());
        let below = choice(ui, direction, Direction::Below, Direction::Below.label());
        above || below
    })
    .inner
}

/// Cadence combo box, with a day count when the cadence is custom.
fn frequency_picker(
    ui: &mut egui::Ui,
    id_salt: egui::Id,
    frequency: &mut FollowUpFrequency,
    custom_days: &mut u32,
) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt(id_salt)
            .selected_text(frequency.label())
            .show_ui(ui, |ui| {
                for option in FollowUpFrequency::ALL {
                    changed |= ui.selectable_value(frequency, option, option.label()).changed();
                }
            });
        if *frequency == FollowUpFrequency::Custom {
            changed |= ui
                .add(
                    egui::DragValue::new(custom_days)
                        .range(1..=MAX_CUSTOM_DAYS)
                        .suffix(" days"),
                )
                .changed();
            *custom_days = clamp_custom_days(*custom_days);
        }
    });
    changed
}

/// Toggle buttons for each channel. Returns the channel that was clicked.
fn channel_toggles(ui: &mut egui::Ui, selected: &[NotificationChannel]) -> Option<NotificationChannel> {
    let mut toggled = None;
    ui.horizontal(|ui| {
        for channel in NotificationChannel::ALL {
            let on = selected.contains(&channel);
            if ui.add(egui::Button::new(channel.label()).selected(on)).clicked() {
                toggled = Some(channel);
            }
        }
    });
    toggled
}

fn recipients_field(ui: &mut egui::Ui, recipients: &mut String) -> bool {
    let changed = ui
        .add(
            egui::TextEdit::singleline(recipients)
                .hint_text("name@farm.co, agronomist@supply.com")
                .desired_width(f32::INFINITY),
        )
        .changed();
    ui.label(RichText::new("Add teammates or your agronomist").size(10.0).color(MUTED));
    changed
}

/// Threshold condition form shown by the condition stage and link overlay.
///
/// # Arguments
///
/// * `ui` - The egui UI context
/// * `rule` - Draft being edited
/// * `analyte` - Analyte name used in helper sentences
/// * `unit` - Unit shown next to the threshold
/// * `id_salt` - Salt keeping combo boxes of different cards apart
pub fn condition_form(
    ui: &mut egui::Ui,
    rule: &mut ConditionRule,
    analyte: &str,
    unit: &str,
    id_salt: egui::Id,
) -> FormOutcome {
    let mut outcome = FormOutcome::default();

    section(ui, "TRIGGER");
    let mut direction = rule.direction();
    if direction_buttons(ui, &mut direction) {
        rule.threshold_direction = Some(direction);
        outcome.changed = true;
    }

    let mut threshold = rule.threshold.unwrap_or(DEFAULT_THRESHOLD);
    ui.horizontal(|ui| {
        outcome.changed |= ui
            .add(
                egui::DragValue::new(&mut threshold)
                    .range(0.0..=THRESHOLD_MAX)
                    .speed(0.1)
                    .fixed_decimals(1),
            )
            .changed();
        ui.label(RichText::new(unit).monospace().size(10.0));
    });
    outcome.changed |= ui
        .add(
            egui::Slider::new(&mut threshold, 0.0..=THRESHOLD_MAX)
                .step_by(0.1)
                .show_value(false),
        )
        .changed();
    rule.threshold = Some(threshold);
    ui.label(RichText::new(rule.helper_text(analyte, unit)).size(10.0).color(MUTED));

    section(ui, "CHECK");
    let mut frequency = rule.frequency;
    let mut days = rule.custom_days_or_default();
    if frequency_picker(ui, id_salt.with("frequency"), &mut frequency, &mut days) {
        rule.set_frequency(frequency);
        if frequency == FollowUpFrequency::Custom {
            rule.set_custom_days(days);
        }
        outcome.changed = true;
    }

    section(ui, "NOTIFY");
    if let Some(channel) = channel_toggles(ui, rule.channels()) {
        rule.toggle_channel(channel);
        outcome.changed = true;
    }
    let mut recipients = rule.recipients_text().to_string();
    if recipients_field(ui, &mut recipients) {
        rule.recipients = Some(recipients);
        outcome.changed = true;
    }

    ui.add_space(4.0);
    summary_strip(ui, rule.summary(analyte, unit));
    outcome.save = ui
        .add_enabled(rule.can_save(), egui::Button::new("Save Condition"))
        .clicked();
    outcome
}

/// Trend comparison shown by the compare stage.
///
/// # Arguments
///
/// * `ui` - The egui UI context
/// * `config` - Card configuration holding the selected range
/// * `current` - The card's current value
/// * `accent` - Line colour
/// * `id_salt` - Salt for the range combo box
pub fn compare_panel(
    ui: &mut egui::Ui,
    config: &mut TestResultConfig,
    current: Option<f64>,
    accent: Color32,
    id_salt: egui::Id,
) -> FormOutcome {
    let mut outcome = FormOutcome::default();

    let mut range = config.compare_time_range.unwrap_or(trend::DEFAULT_RANGE);
    egui::ComboBox::from_id_salt(id_salt.with("range"))
        .selected_text(range.label())
        .show_ui(ui, |ui| {
            for option in CompareTimeRange::ALL {
                outcome.changed |= ui.selectable_value(&mut range, option, option.label()).changed();
            }
        });
    if outcome.changed {
        config.compare_time_range = Some(range);
    }

    let series = trend::display_series(range, current);
    draw_sparkline(ui, &series, accent);

    if let Some(stats) = TrendStats::compute(&series) {
        ui.columns(3, |columns| {
            for (column, (label, value)) in columns
                .iter_mut()
                .zip([("Median", stats.median), ("High", stats.high), ("Low", stats.low)])
            {
                column.label(RichText::new(label).size(10.0).color(MUTED));
                column.label(RichText::new(format!("{value:.0} PPM")).monospace());
            }
        });

        let value = current.or(series.last().copied()).unwrap_or(stats.median);
        draw_target_band(ui, &series, value, accent);
        ui.label(RichText::new(trend::summary(value, &stats)).size(11.0));
    }

    outcome.close = ui.button("Close").clicked();
    outcome
}

fn draw_sparkline(ui: &mut egui::Ui, series: &[f64], accent: Color32) {
    let (rect, _) = ui.allocate_exact_size(
        egui::vec2(SPARKLINE_WIDTH, SPARKLINE_HEIGHT),
        egui::Sense::hover(),
    );
    let sparkline = Sparkline::compute(series);
    let painter = ui.painter_at(rect.expand(4.0));
    let offset = rect.min.to_vec2();

    dashed_line(
        &painter,
        [
            egui::pos2(rect.min.x, rect.min.y + sparkline.reference_y),
            egui::pos2(rect.max.x, rect.min.y + sparkline.reference_y),
        ],
        egui::Stroke::new(1.0, MUTED.gamma_multiply(0.5)),
    );
    let points: Vec<egui::Pos2> = sparkline.points.iter().map(|p| *p + offset).collect();
    if let Some(last) = points.last().copied() {
        painter.add(egui::Shape::line(points, egui::Stroke::new(1.5, accent)));
        painter.circle_filled(last, 3.0, accent);
    }
}

fn draw_target_band(ui: &mut egui::Ui, series: &[f64], current: f64, accent: Color32) {
    let band = TargetBand::compute(series, current);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 8.0), egui::Sense::hover());
    let painter = ui.painter();
    let x_at = |pct: f64| rect.min.x + rect.width() * (pct / 100.0) as f32;

    painter.rect_filled(rect, 2.0, Color32::from_gray(0x16));
    let target = egui::Rect::from_x_y_ranges(x_at(band.start)..=x_at(band.start + band.width), rect.y_range());
    painter.rect_filled(target, 2.0, hex_color("#22c55e").gamma_multiply(0.5));
    painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.0, OUTLINE), StrokeKind::Inside);
    let marker = x_at(band.marker);
    painter.line_segment(
        [egui::pos2(marker, rect.min.y - 2.0), egui::pos2(marker, rect.max.y + 2.0)],
        egui::Stroke::new(2.0, accent),
    );

    ui.horizontal(|ui| {
        ui.label(RichText::new(format!("{} ppm", trend::TARGET_MIN)).size(10.0).color(MUTED));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(format!("{} ppm", trend::TARGET_MAX)).size(10.0).color(MUTED));
        });
    });
}

fn optional_text(ui: &mut egui::Ui, value: &mut Option<String>, hint: &str, multiline: bool) -> bool {
    let mut text = value.clone().unwrap_or_default();
    let edit = if multiline {
        egui::TextEdit::multiline(&mut text).desired_rows(3)
    } else {
        egui::TextEdit::singleline(&mut text)
    };
    let changed = ui
        .add(edit.hint_text(hint).desired_width(f32::INFINITY))
        .changed();
    if changed {
        *value = Some(text);
    }
    changed
}

/// Field action form shown by the record stage.
///
/// # Arguments
///
/// * `ui` - The egui UI context
/// * `record` - Draft being edited
/// * `today` - Date used for the summary sentence
/// * `id_salt` - Salt for the combo boxes
pub fn record_form(
    ui: &mut egui::Ui,
    record: &mut ActionRecord,
    today: NaiveDate,
    id_salt: egui::Id,
) -> FormOutcome {
    let mut outcome = FormOutcome::default();

    section(ui, "ACTION");
    let mut action = record.action();
    egui::ComboBox::from_id_salt(id_salt.with("action"))
        .selected_text(action.label())
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for option in ActionType::ALL {
                ui.selectable_value(&mut action, option, option.label());
            }
        });
    if action != record.action() {
        record.set_action_type(action);
        outcome.changed = true;
    }
    if action == ActionType::Other {
        outcome.changed |= optional_text(ui, &mut record.action_description, "Describe the action", false);
    }

    section(ui, "MATERIAL");
    let mut material = record.material_or_default();
    ui.horizontal_wrapped(|ui| {
        for option in Material::ALL {
            choice(ui, &mut material, option, option.label());
        }
    });
    if material != record.material_or_default() {
        record.set_material(material);
        outcome.changed = true;
    }
    if material == Material::Custom {
        outcome.changed |= optional_text(ui, &mut record.material_description, "Material name", false);
    }

    section(ui, "AMOUNT");
    ui.horizontal(|ui| {
        let mut amount = record.amount.unwrap_or(0.0);
        if ui
            .add(egui::DragValue::new(&mut amount).range(0.0..=f64::MAX).speed(0.1))
            .changed()
        {
            record.amount = Some(amount);
            outcome.changed = true;
        }
        let mut unit = record.amount_unit.unwrap_or(AmountUnit::Ml);
        egui::ComboBox::from_id_salt(id_salt.with("unit"))
            .selected_text(unit.label())
            .show_ui(ui, |ui| {
                for option in AmountUnit::ALL {
                    ui.selectable_value(&mut unit, option, option.label());
                }
            });
        if record.amount_unit != Some(unit) {
            record.amount_unit = Some(unit);
            outcome.changed = true;
        }
    });

    section(ui, "DATE APPLIED");
    outcome.changed |= optional_text(ui, &mut record.date_applied, "YYYY-MM-DD", false);

    section(ui, "NOTES");
    outcome.changed |= optional_text(
        ui,
        &mut record.notes,
        "Add context (weather, leaf condition, soil moisture)…",
        true,
    );

    ui.add_space(4.0);
    summary_strip(ui, record.summary(today));
    outcome.save = ui
        .add_enabled(record.can_save(), egui::Button::new("Save Action"))
        .clicked();
    outcome
}

/// Notification switch shown by the notify stage.
pub fn notify_panel(ui: &mut egui::Ui, config: &mut TestResultConfig) -> FormOutcome {
    let outcome = FormOutcome {
        changed: ui
            .checkbox(&mut config.notifications, "Enable Notifications")
            .changed(),
        ..Default::default()
    };
    if config.notifications {
        ui.label(
            RichText::new(
                "Notifications will be sent when threshold conditions are met or follow-up tests are scheduled.",
            )
            .size(11.0)
            .color(MUTED),
        );
    }
    outcome
}

enum ThresholdEdit {
    Value(NodeId, f64),
    Direction(NodeId, Direction),
}

/// Combined condition form shown by the link overlay.
pub fn combined_form(ui: &mut egui::Ui, draft: &mut CombinedDraft, id_salt: egui::Id) -> FormOutcome {
    let mut outcome = FormOutcome::default();

    ui.label(RichText::new("Combined condition").strong());
    section(ui, "LOGIC");
    ui.horizontal(|ui| {
        outcome.changed |= choice(ui, &mut draft.logic, CombinedLogic::Any, "ANY");
        outcome.changed |= choice(ui, &mut draft.logic, CombinedLogic::All, "ALL");
    });
    ui.label(RichText::new(draft.logic_hint()).size(10.0).color(MUTED));

    let mut edits = Vec::new();
    for threshold in &draft.thresholds {
        section(ui, &threshold.analyte_label.to_uppercase());
        let mut direction = threshold.direction;
        if direction_buttons(ui, &mut direction) {
            edits.push(ThresholdEdit::Direction(threshold.node_id, direction));
        }
        let mut value = threshold.value;
        ui.horizontal(|ui| {
            ui.add(
                egui::DragValue::new(&mut value)
                    .range(0.0..=THRESHOLD_MAX)
                    .speed(0.1),
            );
            ui.label(RichText::new(threshold.unit.label()).monospace().size(10.0));
        });
        ui.add(egui::Slider::new(&mut value, 0.0..=THRESHOLD_MAX).show_value(false));
        if value != threshold.value {
            edits.push(ThresholdEdit::Value(threshold.node_id, value));
        }
        ui.label(
            RichText::new(format!(
                "Trigger when {} is {} {} {}.",
                threshold.analyte_label,
                direction.label(),
                value,
                threshold.unit.label()
            ))
            .size(10.0)
            .color(MUTED),
        );
    }
    outcome.changed |= !edits.is_empty();
    for edit in edits {
        match edit {
            ThresholdEdit::Value(node_id, value) => draft.set_value(node_id, value),
            ThresholdEdit::Direction(node_id, direction) => draft.set_direction(node_id, direction),
        }
    }

    section(ui, "CHECK");
    outcome.changed |= frequency_picker(
        ui,
        id_salt.with("frequency"),
        &mut draft.frequency,
        &mut draft.custom_days,
    );

    section(ui, "NOTIFY");
    if let Some(channel) = channel_toggles(ui, &draft.channels) {
        draft.toggle_channel(channel);
        outcome.changed = true;
    }
    outcome.changed |= recipients_field(ui, &mut draft.recipients);

    section(ui, "SEVERITY");
    ui.horizontal(|ui| {
        for severity in Severity::ALL {
            outcome.changed |= choice(ui, &mut draft.severity, severity, severity.label());
        }
    });

    ui.add_space(4.0);
    summary_strip(ui, draft.summary());
    ui.horizontal(|ui| {
        outcome.close = ui.button("Cancel").clicked();
        outcome.save = ui
            .add_enabled(draft.can_save(), egui::Button::new("Save Combined Condition"))
            .clicked();
    });
    outcome
}
