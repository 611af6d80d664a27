use super::links::{LinkAction, COMBINED_SAVED};
use super::state::LinkOverlay;
use super::*;
use crate::catalog;
use crate::flow::FlowStage;
use crate::geometry::ProximityPair;
use crate::types::*;
use eframe::egui;
use serde_json::json;

fn raw_input(events: Vec<egui::Event>) -> egui::RawInput {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1200.0, 800.0),
    ));
    raw.events = events;
    raw
}

/// Runs one headless frame that draws the canvas with the given input events.
fn run_canvas_frame(ctx: &egui::Context, app: &mut SchemaBuilderApp, events: Vec<egui::Event>) {
    let _ = ctx.run(raw_input(events), |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default().show(ctx, |ui| {
            app.draw_canvas(ui);
        });
    });
}

fn press(pos: egui::Pos2) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed: true,
        modifiers: egui::Modifiers::NONE,
    }
}

fn release(pos: egui::Pos2) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed: false,
        modifiers: egui::Modifiers::NONE,
    }
}

/// Hover, press and release at a screen position over three frames.
fn click_at(ctx: &egui::Context, app: &mut SchemaBuilderApp, pos: egui::Pos2) {
    run_canvas_frame(ctx, app, vec![egui::Event::PointerMoved(pos)]);
    run_canvas_frame(ctx, app, vec![press(pos)]);
    run_canvas_frame(ctx, app, vec![release(pos)]);
}

fn add_card(app: &mut SchemaBuilderApp, kind_id: &str, x: f32, y: f32) -> NodeId {
    let kind = catalog::find_kind(kind_id).expect("kind in catalog");
    app.add_node_at(kind, Point::new(x, y)).expect("fresh card id")
}

/// Two phosphate cards side by side, linked, with the link id.
fn linked_pair(app: &mut SchemaBuilderApp) -> (NodeId, NodeId, LinkId) {
    let a = add_card(app, "phosphate-result", 100.0, 100.0);
    let b = add_card(app, "phosphate-result", 368.0, 100.0);
    let link = app
        .schema
        .add_link(a, b, Point::new(358.0, 296.0))
        .expect("link is valid");
    (a, b, link)
}

#[test]
fn dragging_card_follows_pointer_and_snaps_on_release() {
    let mut app = SchemaBuilderApp::default();
    let id = add_card(&mut app, "short-text", 200.0, 140.0);
    let ctx = egui::Context::default();

    run_canvas_frame(&ctx, &mut app, vec![]);
    let start = app.world_to_screen(egui::pos2(300.0, 200.0));
    let end = start + egui::vec2(33.0, 17.0);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(start)]);
    run_canvas_frame(&ctx, &mut app, vec![press(start)]);
    assert_eq!(app.interaction.dragging_node, Some(id));

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(end)]);
    let node = app.schema.node(id).unwrap();
    assert_eq!((node.x, node.y), (200.0, 140.0), "store is untouched mid-drag");
    assert_eq!(app.live_position(node), egui::pos2(233.0, 157.0));

    run_canvas_frame(&ctx, &mut app, vec![release(end)]);
    let node = app.schema.node(id).unwrap();
    assert_eq!((node.x, node.y), (240.0, 160.0));
    assert!(app.interaction.dragging_node.is_none());
}

#[test]
fn clicking_card_selects_it() {
    let mut app = SchemaBuilderApp::default();
    let first = add_card(&mut app, "short-text", 100.0, 100.0);
    let second = add_card(&mut app, "number", 600.0, 100.0);
    let ctx = egui::Context::default();

    run_canvas_frame(&ctx, &mut app, vec![]);
    assert!(app.interaction.selected_node.is_none());

    let on_second = app.world_to_screen(egui::pos2(700.0, 180.0));
    click_at(&ctx, &mut app, on_second);
    assert_eq!(app.interaction.selected_node, Some(second));

    let on_first = app.world_to_screen(egui::pos2(200.0, 180.0));
    click_at(&ctx, &mut app, on_first);
    assert_eq!(app.interaction.selected_node, Some(first));

    let node = app.schema.node(first).unwrap();
    assert_eq!((node.x, node.y), (100.0, 100.0), "a click does not move the card");
}

#[test]
fn dropping_without_snap_keeps_exact_position() {
    let mut app = SchemaBuilderApp::default();
    app.settings.snap_on_release = false;
    let id = add_card(&mut app, "number", 200.0, 140.0);
    let ctx = egui::Context::default();

    run_canvas_frame(&ctx, &mut app, vec![]);
    let start = app.world_to_screen(egui::pos2(250.0, 180.0));
    let end = start + egui::vec2(13.0, 7.0);
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(start)]);
    run_canvas_frame(&ctx, &mut app, vec![press(start)]);
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(end)]);
    run_canvas_frame(&ctx, &mut app, vec![release(end)]);

    let node = app.schema.node(id).unwrap();
    assert_eq!((node.x, node.y), (213.0, 147.0));
}

#[test]
fn dragging_empty_canvas_pans() {
    let mut app = SchemaBuilderApp::default();
    let ctx = egui::Context::default();

    let start = egui::pos2(600.0, 500.0);
    let end = egui::pos2(650.0, 530.0);
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(start)]);
    run_canvas_frame(&ctx, &mut app, vec![press(start)]);
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(end)]);
    run_canvas_frame(&ctx, &mut app, vec![release(end)]);

    assert_eq!(app.canvas.offset, egui::vec2(50.0, 30.0));
    assert!(!app.interaction.is_panning);
}

#[test]
fn clicking_proximity_dot_links_cards() {
    let mut app = SchemaBuilderApp::default();
    let left = add_card(&mut app, "short-text", 100.0, 100.0);
    let right = add_card(&mut app, "number", 368.0, 100.0);
    let ctx = egui::Context::default();

    run_canvas_frame(&ctx, &mut app, vec![]);
    let pairs = app.current_proximity_pairs(false);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].midpoint, egui::pos2(358.0, 296.0));

    let dot = app.world_to_screen(pairs[0].midpoint);
    click_at(&ctx, &mut app, dot);

    assert_eq!(app.schema.links.len(), 1);
    let link = &app.schema.links[0];
    assert_eq!((link.source_node_id, link.target_node_id), (left, right));
    assert!(app.current_proximity_pairs(false).is_empty());
}

#[test]
fn suppressed_previews_offer_no_pairs() {
    let mut app = SchemaBuilderApp::default();
    add_card(&mut app, "short-text", 100.0, 100.0);
    add_card(&mut app, "number", 368.0, 100.0);
    assert!(app.current_proximity_pairs(true).is_empty());
    assert_eq!(app.current_proximity_pairs(false).len(), 1);
}

#[test]
fn unit_mismatch_is_reported_as_toast() {
    let mut app = SchemaBuilderApp::default();
    let phosphate = add_card(&mut app, "phosphate-result", 100.0, 100.0);
    let mut data = serde_json::Map::new();
    data.insert("unit".into(), json!("pH"));
    let ph = app.schema.add_node(SchemaNode::new(
        "ph-result",
        "pH Result",
        Some(AnalyteType::Ph),
        Point::new(368.0, 100.0),
        data,
    ))
    .unwrap();

    let pair = ProximityPair {
        source: phosphate,
        target: ph,
        midpoint: egui::pos2(358.0, 296.0),
        gap: 20.0,
    };
    app.create_link(&pair, 1.0);

    assert!(app.schema.links.is_empty());
    assert_eq!(app.toasts.len(), 1);
    assert!(app.toasts[0].message.contains("different units (PPM vs pH)"));
}

#[test]
fn clicking_plus_node_toggles_stage_menu() {
    let mut app = SchemaBuilderApp::default();
    let id = add_card(&mut app, "phosphate-result", 100.0, 100.0);
    let ctx = egui::Context::default();

    run_canvas_frame(&ctx, &mut app, vec![]);
    let node = app.schema.node(id).unwrap();
    let (state, layout) = app.flow_layout(node).expect("result cards have a flow");
    let plus = layout.plus_nodes(&state, false);
    assert_eq!(plus.len(), 1);
    let centre = app.world_to_screen(plus[0].position);

    click_at(&ctx, &mut app, centre);
    assert_eq!(app.flows[&id].active_menu(), Some(FlowStage::Condition));
}

#[test]
fn field_cards_have_no_flow() {
    let mut app = SchemaBuilderApp::default();
    let id = add_card(&mut app, "toggle", 100.0, 100.0);
    let node = app.schema.node(id).unwrap();
    assert!(app.flow_layout(node).is_none());
}

#[test]
fn opening_and_closing_stages_update_card_config() {
    let mut app = SchemaBuilderApp::default();
    let id = add_card(&mut app, "boron-result", 100.0, 100.0);

    app.open_stage(id, FlowStage::Compare);
    let config = app.schema.node(id).unwrap().test_config.clone().unwrap();
    assert!(config.enabled);
    assert_eq!(config.compare_trend_enabled, Some(true));
    assert!(config.compare_time_range.is_some());
    assert!(app.flows[&id].is_open(FlowStage::Compare));

    app.close_stage(id, FlowStage::Compare);
    let config = app.schema.node(id).unwrap().test_config.clone().unwrap();
    assert_eq!(config.compare_trend_enabled, Some(false));
    assert!(!app.flows[&id].is_open(FlowStage::Compare));
}

#[test]
fn open_stage_panels_render_and_measure() {
    let mut app = SchemaBuilderApp::default();
    let id = add_card(&mut app, "phosphate-result", 100.0, 100.0);
    for stage in FlowStage::SEQUENCE {
        app.open_stage(id, stage);
    }
    let ctx = egui::Context::default();
    run_canvas_frame(&ctx, &mut app, vec![]);
    run_canvas_frame(&ctx, &mut app, vec![]);

    let state = &app.flows[&id];
    assert_eq!(state.open_stages().count(), 4);
    for stage in FlowStage::SEQUENCE {
        assert!(state.height(stage) > 0.0);
    }
}

#[test]
fn link_dot_toggles_menu_under_dot() {
    let mut app = SchemaBuilderApp::default();
    let (_, _, link) = linked_pair(&mut app);

    app.toggle_link_menu(link);
    let l = app.schema.link(link).unwrap();
    assert!(l.is_menu_open());
    assert_eq!(l.menu_node_position, Some(Point::new(358.0, 356.0)));

    app.toggle_link_menu(link);
    assert!(!app.schema.link(link).unwrap().is_menu_open());
}

#[test]
fn set_condition_from_link_menu_seeds_source_config() {
    let mut app = SchemaBuilderApp::default();
    let (source, target, link) = linked_pair(&mut app);
    app.toggle_link_menu(link);

    app.choose_link_action(link, LinkAction::SetCondition);

    let config = app.schema.node(source).unwrap().test_config.clone().unwrap();
    assert!(config.enabled);
    assert!(config.schedule_follow_up);
    assert!(app.schema.node(target).unwrap().test_config.is_none());
    assert!(!app.schema.link(link).unwrap().is_menu_open());
    assert_eq!(app.overlay, Some(LinkOverlay::Condition { link, node: source }));
}

#[test]
fn combined_condition_saves_on_link_and_toasts() {
    let mut app = SchemaBuilderApp::default();
    let (source, target, link) = linked_pair(&mut app);
    app.toggle_link_menu(link);

    app.choose_link_action(link, LinkAction::CombinedCondition);
    let Some(LinkOverlay::Combined { draft, .. }) = app.overlay.clone() else {
        panic!("combined overlay should be open");
    };
    assert_eq!(draft.thresholds.len(), 2);
    assert_eq!(draft.thresholds[0].node_id, source);
    assert_eq!(draft.thresholds[1].node_id, target);

    app.save_combined(link, &draft, 10.0);

    let saved = app.schema.link(link).unwrap().combined_condition.clone();
    assert_eq!(saved, Some(draft.to_config()));
    assert!(app.overlay.is_none());
    assert_eq!(app.toasts.len(), 1);
    assert_eq!(app.toasts[0].message, COMBINED_SAVED);
    assert_eq!(app.toasts[0].expires_at, 14.0);
}

#[test]
fn link_menu_stage_entries_open_source_stage() {
    let mut app = SchemaBuilderApp::default();
    let (source, target, link) = linked_pair(&mut app);

    app.choose_link_action(link, LinkAction::OpenStage(FlowStage::Record));

    assert!(app.flows[&source].is_open(FlowStage::Record));
    assert!(!app.flows.contains_key(&target));
    let config = app.schema.node(source).unwrap().test_config.clone().unwrap();
    assert_eq!(config.record_action_enabled, Some(true));
}

#[test]
fn removing_link_closes_its_overlay() {
    let mut app = SchemaBuilderApp::default();
    let (_, _, link) = linked_pair(&mut app);
    app.choose_link_action(link, LinkAction::CombinedCondition);
    assert!(app.overlay.is_some());

    app.remove_link(link);
    assert!(app.schema.links.is_empty());
    assert!(app.overlay.is_none());
}

#[test]
fn link_overlay_renders_over_canvas() {
    let mut app = SchemaBuilderApp::default();
    let (_, _, link) = linked_pair(&mut app);
    app.toggle_link_menu(link);
    let ctx = egui::Context::default();
    run_canvas_frame(&ctx, &mut app, vec![]);
    assert!(app.schema.link(link).unwrap().is_menu_open());

    app.choose_link_action(link, LinkAction::CombinedCondition);
    run_canvas_frame(&ctx, &mut app, vec![]);
    assert!(matches!(app.overlay, Some(LinkOverlay::Combined { .. })));
}

#[test]
fn escape_closes_menus_and_overlay() {
    let mut app = SchemaBuilderApp::default();
    let (source, _, link) = linked_pair(&mut app);
    app.flow_mut(source).toggle_menu(FlowStage::Condition);
    app.toggle_link_menu(link);
    app.choose_link_action(link, LinkAction::CombinedCondition);
    app.toggle_link_menu(link);

    let ctx = egui::Context::default();
    let _ = ctx.run(
        raw_input(vec![egui::Event::Key {
            key: egui::Key::Escape,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }]),
        |ctx| app.handle_escape_key(ctx),
    );

    assert_eq!(app.flows[&source].active_menu(), None);
    assert!(!app.schema.link(link).unwrap().is_menu_open());
    assert!(app.overlay.is_none());
}

#[test]
fn palette_adds_cards_with_seeded_data() {
    let mut app = SchemaBuilderApp::default();
    let id = add_card(&mut app, "phosphate-result", 120.0, 80.0);
    let node = app.schema.node(id).unwrap();
    assert_eq!(node.analyte_type, Some(AnalyteType::Phosphate));
    assert_eq!(node.value(), Some(36.7));
    assert_eq!(node.unit(), Some("PPM"));

    let kind = catalog::find_kind("crop-type").unwrap();
    let id = app.add_node_from_kind(kind).unwrap();
    let node = app.schema.node(id).unwrap();
    assert!(node.data.is_empty());
    assert!((200.0..400.0).contains(&node.x));
    assert!((200.0..400.0).contains(&node.y));
}

#[test]
fn toasts_expire() {
    let mut app = SchemaBuilderApp::default();
    app.push_toast("first", 0.0);
    app.push_toast("second", 2.0);

    app.expire_toasts(4.5);
    assert_eq!(app.toasts.len(), 1);
    assert_eq!(app.toasts[0].message, "second");

    app.expire_toasts(6.0);
    assert!(app.toasts.is_empty());
}

#[test]
fn visualizer_bars_repeat_every_six() {
    let bars = rendering::visualizer_bars();
    assert!((bars[0] - 0.45).abs() < 1e-6);
    assert!((bars[5] - 0.45).abs() < 1e-5);
    assert!(bars[2] > 0.65 && bars[2] < 0.70);
    assert_eq!(bars[1], bars[7]);
}

#[test]
fn settings_serialize_with_defaults() {
    let settings = EditorSettings::default();
    assert!(settings.dark_mode);
    assert_eq!(settings.palette_width, 280.0);

    let text = serde_json::to_string(&settings).unwrap();
    let back: EditorSettings = serde_json::from_str(&text).unwrap();
    assert_eq!(back, settings);
}

#[test]
fn json_preview_lists_cards_and_links() {
    let mut app = SchemaBuilderApp::default();
    linked_pair(&mut app);
    let json = app.schema.to_json().unwrap();
    let spans = highlighters::tokenize_json(&json);
    assert!(spans
        .iter()
        .any(|(t, r)| *t == highlighters::JsonToken::Key && &json[r.clone()] == "\"linkDotPosition\""));
}
