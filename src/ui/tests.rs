use super::*;
use crate::geometry::ElementRect;
use crate::types::{CanvasElement, ElementPayload};
use eframe::egui;

/// Builds an app with a deterministic view transform: screen coordinates
/// equal canvas coordinates (no pan, no zoom, centering suppressed).
fn test_app() -> EditorApp {
    let mut app = EditorApp::default();
    app.canvas.offset = egui::Vec2::ZERO;
    app.canvas.zoom_factor = 1.0;
    app.canvas.centered = true;
    app
}

/// Run a single frame with the provided input events, drawing the canvas
/// into a central panel.
fn run_canvas_frame(ctx: &egui::Context, app: &mut EditorApp, events: Vec<egui::Event>) {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1200.0, 800.0),
    ));
    raw.events = events;

    let _ = ctx.run(raw, |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default().show(ctx, |ui| {
            app.draw_canvas(ui);
        });
    });
}

fn press_event(pos: egui::Pos2) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed: true,
        modifiers: egui::Modifiers::NONE,
    }
}

fn release_event(pos: egui::Pos2) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed: false,
        modifiers: egui::Modifiers::NONE,
    }
}

#[test]
fn undo_operation_removes_last_created_element() {
    let mut app = test_app();

    let created_id = app.create_text_element();
    assert!(app.template.element(&created_id).is_some());
    assert_eq!(app.interaction.selection, Selection::Element(created_id));

    app.perform_undo();

    assert!(app.template.element(&created_id).is_none());
    assert_eq!(app.interaction.selection, Selection::None);
}

#[test]
fn clicking_canvas_selects_element() {
    let mut app = test_app();

    let id = app
        .template
        .add_element(CanvasElement::new_text(200.0, 150.0, "title".into()));

    let ctx = egui::Context::default();
    let body_center = egui::pos2(250.0, 175.0);

    // First frame: move cursor over the element to establish hover
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(body_center)]);

    // Second frame: press the primary button starts a drag and selects it
    run_canvas_frame(
        &ctx,
        &mut app,
        vec![
            egui::Event::PointerMoved(body_center),
            press_event(body_center),
        ],
    );

    assert_eq!(app.interaction.selection, Selection::Element(id));
    assert!(!app.interaction.controller.is_idle());
}

#[test]
fn pressing_empty_canvas_clears_selection() {
    let mut app = test_app();
    let id = app
        .template
        .add_element(CanvasElement::new_text(200.0, 150.0, "title".into()));
    app.interaction.selection = Selection::Element(id);

    let ctx = egui::Context::default();
    let empty_spot = egui::pos2(700.0, 500.0);
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(empty_spot)]);
    run_canvas_frame(
        &ctx,
        &mut app,
        vec![egui::Event::PointerMoved(empty_spot), press_event(empty_spot)],
    );

    assert_eq!(app.interaction.selection, Selection::None);
}

#[test]
fn dragging_element_moves_it_and_records_undo() {
    let mut app = test_app();
    let id = app
        .template
        .add_element(CanvasElement::new_text(200.0, 150.0, "title".into()));

    let ctx = egui::Context::default();
    let start = egui::pos2(250.0, 175.0);
    let end = egui::pos2(280.0, 195.0);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(start)]);
    run_canvas_frame(
        &ctx,
        &mut app,
        vec![egui::Event::PointerMoved(start), press_event(start)],
    );
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(end)]);
    run_canvas_frame(&ctx, &mut app, vec![release_event(end)]);

    let element = app.template.element(&id).unwrap();
    assert_eq!((element.x, element.y), (230.0, 170.0));
    assert!(app.interaction.controller.is_idle());
    assert!(app.file.has_unsaved_changes);

    // The whole drag is one undo entry restoring the starting position
    assert!(app.undo_history.can_undo());
    app.perform_undo();
    let element = app.template.element(&id).unwrap();
    assert_eq!((element.x, element.y), (200.0, 150.0));
}

#[test]
fn dragging_element_clamps_to_canvas_bounds() {
    let mut app = test_app();
    let id = app
        .template
        .add_element(CanvasElement::new_text(600.0, 400.0, "title".into()));

    let ctx = egui::Context::default();
    let start = egui::pos2(650.0, 425.0);
    let way_outside = egui::pos2(1190.0, 790.0);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(start)]);
    run_canvas_frame(
        &ctx,
        &mut app,
        vec![egui::Event::PointerMoved(start), press_event(start)],
    );
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(way_outside)]);
    run_canvas_frame(&ctx, &mut app, vec![release_event(way_outside)]);

    // Default text box is 100x50 on an 800x600 canvas
    let element = app.template.element(&id).unwrap();
    assert_eq!((element.x, element.y), (700.0, 550.0));
}

#[test]
fn resize_handle_gesture_commits_new_size() {
    let mut app = test_app();
    let id = app
        .template
        .add_element(CanvasElement::new_text(200.0, 150.0, "title".into()));
    app.interaction.selection = Selection::Element(id);

    let ctx = egui::Context::default();
    // South-east handle of the 100x50 default box
    let handle_pos = egui::pos2(300.0, 200.0);
    let target = egui::pos2(330.0, 220.0);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(handle_pos)]);
    run_canvas_frame(
        &ctx,
        &mut app,
        vec![egui::Event::PointerMoved(handle_pos), press_event(handle_pos)],
    );
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(target)]);
    run_canvas_frame(&ctx, &mut app, vec![release_event(target)]);

    let element = app.template.element(&id).unwrap();
    assert_eq!(element.payload.resolved_size(), (130.0, 70.0));
    assert_eq!((element.x, element.y), (200.0, 150.0));
}

#[test]
fn resize_past_canvas_corner_clamps_to_edge() {
    let mut app = test_app();
    let mut element = CanvasElement::new_text(680.0, 530.0, "corner".into());
    element.payload.set_size(100.0, 50.0);
    let id = app.template.add_element(element);
    app.interaction.selection = Selection::Element(id);

    let ctx = egui::Context::default();
    let handle_pos = egui::pos2(780.0, 580.0);
    let target = egui::pos2(1100.0, 790.0);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(handle_pos)]);
    run_canvas_frame(
        &ctx,
        &mut app,
        vec![egui::Event::PointerMoved(handle_pos), press_event(handle_pos)],
    );
    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(target)]);
    run_canvas_frame(&ctx, &mut app, vec![release_event(target)]);

    // Far-edge clamp reduces the dimension, never the position
    let element = app.template.element(&id).unwrap();
    assert_eq!((element.x, element.y), (680.0, 530.0));
    assert_eq!(element.payload.resolved_size(), (120.0, 70.0));
}

#[tokio::test]
async fn background_press_selects_and_drags_background() {
    let mut app = test_app();
    app.template.config.background_image = "https://example.com/bg.png".to_string();
    app.template.config.background_geometry = Some(crate::types::BackgroundGeometry {
        x: 100.0,
        y: 100.0,
        width: 300.0,
        height: 200.0,
        object_fit: crate::types::ObjectFit::Cover,
    });

    let ctx = egui::Context::default();
    let body = egui::pos2(250.0, 200.0);
    let moved = egui::pos2(270.0, 230.0);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(body)]);
    run_canvas_frame(
        &ctx,
        &mut app,
        vec![egui::Event::PointerMoved(body), press_event(body)],
    );
    assert_eq!(app.interaction.selection, Selection::Background);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(moved)]);
    run_canvas_frame(&ctx, &mut app, vec![release_event(moved)]);

    let geometry = app.template.config.resolved_background_geometry();
    assert_eq!((geometry.x, geometry.y), (120.0, 130.0));
    assert_eq!((geometry.width, geometry.height), (300.0, 200.0));
}

#[test]
fn zoom_step_keeps_anchor_fixed_and_clamps_range() {
    let mut app = test_app();
    let anchor = egui::pos2(100.0, 100.0);

    let anchored = app.canvas.to_canvas(anchor);
    app.canvas.zoom_step(0.025, anchor);
    assert!((app.canvas.zoom_factor - 1.025).abs() < 1e-6);
    // The canvas point under the cursor stays put on screen
    let after = app.canvas.to_screen(anchored);
    assert!((after - anchor).length() < 1e-3);

    // At the top of the range a further step is a no-op
    app.canvas.zoom_factor = 5.0;
    let offset = app.canvas.offset;
    app.canvas.zoom_step(0.025, anchor);
    assert_eq!(app.canvas.zoom_factor, 5.0);
    assert_eq!(app.canvas.offset, offset);
}

#[test]
fn pan_shifts_view_without_touching_template_geometry() {
    let mut app = test_app();
    let id = app
        .template
        .add_element(CanvasElement::new_text(200.0, 150.0, "title".into()));

    app.canvas.pan_by(egui::vec2(40.0, -25.0));

    assert_eq!(app.canvas.offset, egui::vec2(40.0, -25.0));
    // Pure view state: element coordinates are untouched
    let element = app.template.element(&id).unwrap();
    assert_eq!((element.x, element.y), (200.0, 150.0));
    // The transforms round-trip under the new offset
    let screen = app.canvas.to_screen(egui::pos2(200.0, 150.0));
    assert_eq!(app.canvas.to_canvas(screen), egui::pos2(200.0, 150.0));
}

#[test]
fn loading_a_template_resets_the_image_cache() {
    let mut app = test_app();
    app.template.config.background_image = "https://example.com/bg.png".to_string();
    app.images.seed_failed("https://example.com/bg.png", "offline");
    assert!(app.images.get("https://example.com/bg.png").is_some());

    let mut incoming = crate::types::Template::new();
    incoming.name = "Fresh".into();
    app.install_template(incoming);

    // A stale entry for the old background would block a re-fetch
    assert!(app.images.get("https://example.com/bg.png").is_none());
}

#[test]
fn delete_removes_selected_element_and_undo_restores_it() {
    let mut app = test_app();
    let id = app
        .template
        .add_element(CanvasElement::new_text(50.0, 50.0, "gone".into()));
    app.interaction.selection = Selection::Element(id);

    app.delete_selected_element();
    assert!(app.template.element(&id).is_none());
    assert_eq!(app.interaction.selection, Selection::None);

    app.perform_undo();
    assert!(app.template.element(&id).is_some());
}

#[test]
fn element_rect_uses_intrinsic_fallback_for_hit_testing() {
    let element = CanvasElement::new_text(10.0, 10.0, "v".into());
    let rect = ElementRect::of_element(&element);
    assert_eq!((rect.width, rect.height), (100.0, 50.0));
}

#[test]
fn new_template_resets_editing_state() {
    let mut app = test_app();
    let id = app.create_text_element();
    app.template.name = "Something".into();
    app.store.remote_id = Some("tpl-1".into());
    app.file.has_unsaved_changes = true;
    app.interaction.selection = Selection::Element(id);

    app.new_template();

    assert!(app.template.elements.is_empty());
    assert!(app.template.name.is_empty());
    assert_eq!(app.interaction.selection, Selection::None);
    assert_eq!(app.store.remote_id, None);
    assert!(!app.file.has_unsaved_changes);
    assert!(!app.undo_history.can_undo());
}

#[test]
fn install_template_replaces_state_wholesale() {
    let mut app = test_app();
    app.create_text_element();
    app.file.has_unsaved_changes = true;

    let mut incoming = crate::types::Template::new();
    incoming.name = "Loaded".into();
    incoming.add_element(CanvasElement::new_image(10.0, 10.0, "logo".into()));
    incoming.add_element(CanvasElement::new_text(40.0, 40.0, "title".into()));

    app.install_template(incoming);

    assert_eq!(app.template.name, "Loaded");
    assert_eq!(app.template.elements.len(), 2);
    assert_eq!(app.interaction.selection, Selection::None);
    assert!(!app.file.has_unsaved_changes);
    assert!(!app.undo_history.can_undo());
}

#[test]
fn property_edit_through_element_payload_matches() {
    // The payload sum type is matched exhaustively wherever payload-specific
    // logic runs; a text payload never takes the image path.
    let mut app = test_app();
    let id = app.create_text_element();
    let element = app.template.element(&id).unwrap();
    match &element.payload {
        ElementPayload::Text(text) => assert!(text.content.is_empty()),
        ElementPayload::Image(_) => panic!("expected a text payload"),
    }
}
