//! Canvas interaction and navigation functionality.
//!
//! This module composes the editable canvas surface: view panning and
//! zooming, hit testing of elements, background and resize handles, and the
//! wiring between pointer events and the gesture state machine. All geometry
//! mutation goes through the interaction controller and the geometry
//! module; this file only decides what was hit and commits the updates the
//! controller emits.

use super::state::{CanvasViewState, EditorApp, Selection};
use super::undo::UndoAction;
use crate::constants;
use crate::geometry::{CanvasSize, ElementRect, ResizeHandle};
use crate::interaction::{DragTarget, Gesture, GeometryUpdate};
use crate::types::BackgroundGeometry;
use eframe::egui;

/// How much one scroll notch changes the zoom factor.
const ZOOM_STEP: f32 = 0.025;

impl CanvasViewState {
    /// Maps a screen position into canvas coordinates under the current pan
    /// and zoom.
    pub fn to_canvas(&self, screen: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            (screen.x - self.offset.x) / self.zoom_factor,
            (screen.y - self.offset.y) / self.zoom_factor,
        )
    }

    /// Maps a canvas position onto the screen.
    pub fn to_screen(&self, canvas: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            canvas.x * self.zoom_factor + self.offset.x,
            canvas.y * self.zoom_factor + self.offset.y,
        )
    }

    /// Shifts the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: egui::Vec2) {
        self.offset += delta;
    }

    /// Applies one zoom step within the allowed range, keeping the canvas
    /// point under `anchor` fixed on screen.
    pub fn zoom_step(&mut self, step: f32, anchor: egui::Pos2) {
        let anchored = self.to_canvas(anchor);
        let target =
            (self.zoom_factor + step).clamp(constants::MIN_ZOOM, constants::MAX_ZOOM);
        if target == self.zoom_factor {
            return;
        }
        self.zoom_factor = target;
        // Re-anchor so the point under the cursor does not drift
        self.offset += anchor - self.to_screen(anchored);
    }
}

impl EditorApp {
    /// Converts screen coordinates to canvas coordinates.
    pub fn screen_to_canvas(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        self.canvas.to_canvas(screen_pos)
    }

    /// Converts canvas coordinates to screen coordinates.
    pub fn canvas_to_screen(&self, canvas_pos: egui::Pos2) -> egui::Pos2 {
        self.canvas.to_screen(canvas_pos)
    }

    /// Maps a rect in canvas units to its on-screen rect.
    pub fn canvas_rect_to_screen(&self, rect: ElementRect) -> egui::Rect {
        egui::Rect::from_min_max(
            self.canvas_to_screen(egui::pos2(rect.x, rect.y)),
            self.canvas_to_screen(egui::pos2(rect.right(), rect.bottom())),
        )
    }

    /// Draws the canvas area and processes all pointer interaction for it.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        // Center the template canvas in the viewport on first frame
        if !self.canvas.centered {
            let template_size = egui::vec2(
                self.template.config.width * self.canvas.zoom_factor,
                self.template.config.height * self.canvas.zoom_factor,
            );
            self.canvas.offset = (response.rect.center() - template_size / 2.0).to_vec2();
            self.canvas.centered = true;
        }

        // Handle canvas panning with middle mouse button or Cmd/Ctrl+drag
        self.handle_canvas_panning(ui, &response);

        // Handle scroll wheel zooming
        self.handle_canvas_zoom(ui, &response);

        // Drag/resize/select interactions
        self.handle_pointer_interaction(ui, &response);

        // Paint the composed template plus selection chrome
        self.paint_canvas(ui.ctx(), &painter, response.rect);
    }

    /// Pans the view while the middle button, or the primary button with
    /// Cmd/Ctrl, is held. The modifier maps to Cmd on macOS and Ctrl
    /// elsewhere.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let pan_held = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        });

        match (pan_held, response.interact_pointer_pos()) {
            (true, Some(pos)) => {
                // First frame of a pan only records the anchor position
                if let Some(last) = self.interaction.last_pan_pos.replace(pos) {
                    self.canvas.pan_by(pos - last);
                }
                self.interaction.is_panning = true;
            }
            _ => {
                self.interaction.is_panning = false;
                self.interaction.last_pan_pos = None;
            }
        }
    }

    /// Zooms the view around the cursor on scroll. Ignored when the cursor
    /// is outside the canvas area.
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll == 0.0 {
            return;
        }

        let anchor = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos());
        let Some(anchor) = anchor else {
            return;
        };
        if !response.rect.contains(anchor) {
            return;
        }

        self.canvas.zoom_step(ZOOM_STEP.copysign(scroll), anchor);
    }

    /// Routes pointer events into the gesture state machine and commits the
    /// geometry updates it emits.
    ///
    /// Press on a handle starts a resize, press on a body starts a drag (and
    /// selects the target), press on empty canvas clears the selection.
    /// Release, or losing track of the pointer, ends the gesture with the
    /// last committed geometry.
    pub fn handle_pointer_interaction(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let primary_down = ui.input(|i| i.pointer.primary_down());

        if primary_down && !self.interaction.is_panning {
            let Some(screen_pos) = response.interact_pointer_pos() else {
                return;
            };
            let canvas_pos = self.screen_to_canvas(screen_pos);
            let pointer = (canvas_pos.x, canvas_pos.y);

            if self.interaction.controller.is_idle() {
                if ui.input(|i| i.pointer.primary_pressed()) {
                    self.begin_gesture_at(screen_pos, pointer);
                }
            } else {
                let current_size = self.active_target_size();
                let canvas_size = CanvasSize::from(&self.template.config);
                if let Some(update) =
                    self.interaction
                        .controller
                        .pointer_moved(pointer, current_size, canvas_size)
                {
                    self.commit_geometry_update(update);
                }
            }
        } else if !self.interaction.controller.is_idle() {
            // Pointer released, or tracking lost (left the window): the
            // gesture ends with whatever was last committed.
            self.finish_gesture();
        }
    }

    /// Starts the appropriate gesture for a pointer press.
    fn begin_gesture_at(&mut self, screen_pos: egui::Pos2, pointer: (f32, f32)) {
        // Resize handles of the selected target take priority over bodies
        if let Some((target, handle, rect)) = self.handle_at(screen_pos) {
            self.interaction
                .controller
                .begin_resize(target, handle, pointer, rect);
            self.interaction.gesture_start_rect = Some(rect);
            self.interaction.gesture_changed = false;
            return;
        }

        // Topmost element under the pointer
        if let Some(id) = self.find_element_at(pointer) {
            // Selecting is a side effect of starting the drag
            self.interaction.selection = Selection::Element(id);
            if let Some(element) = self.template.element(&id) {
                let rect = ElementRect::of_element(element);
                self.interaction.controller.begin_drag(
                    DragTarget::Element(id),
                    pointer,
                    (rect.x, rect.y),
                );
                self.interaction.gesture_start_rect = Some(rect);
                self.interaction.gesture_changed = false;
            }
            return;
        }

        // The background body, when an image is set
        if !self.template.config.background_image.is_empty() {
            let rect = ElementRect::of_background(&self.template.config);
            if rect.contains(pointer.0, pointer.1) {
                self.interaction.selection = Selection::Background;
                self.interaction.controller.begin_drag(
                    DragTarget::Background,
                    pointer,
                    (rect.x, rect.y),
                );
                self.interaction.gesture_start_rect = Some(rect);
                self.interaction.gesture_changed = false;
                return;
            }
        }

        // Empty canvas clears the selection
        self.interaction.selection = Selection::None;
    }

    /// The selected target and its current box, when something is selected.
    pub fn selected_target_rect(&self) -> Option<(DragTarget, ElementRect)> {
        match self.interaction.selection {
            Selection::None => None,
            Selection::Background => {
                if self.template.config.background_image.is_empty() {
                    None
                } else {
                    Some((
                        DragTarget::Background,
                        ElementRect::of_background(&self.template.config),
                    ))
                }
            }
            Selection::Element(id) => {
                let element = self.template.element(&id)?;
                Some((DragTarget::Element(id), ElementRect::of_element(element)))
            }
        }
    }

    /// Finds the resize handle of the selected target under a screen
    /// position, if any.
    fn handle_at(
        &self,
        screen_pos: egui::Pos2,
    ) -> Option<(DragTarget, ResizeHandle, ElementRect)> {
        let (target, rect) = self.selected_target_rect()?;
        let screen_rect = self.canvas_rect_to_screen(rect);

        for handle in ResizeHandle::ALL {
            let (ux, uy) = handle.unit_position();
            let center = egui::pos2(
                screen_rect.min.x + screen_rect.width() * ux,
                screen_rect.min.y + screen_rect.height() * uy,
            );
            if center.distance(screen_pos) <= constants::HANDLE_HIT_RADIUS {
                return Some((target, handle, rect));
            }
        }
        None
    }

    /// Finds the topmost element at the given canvas position, if any.
    pub fn find_element_at(&self, pointer: (f32, f32)) -> Option<crate::types::ElementId> {
        // Elements are stored back to front, so scan from the end
        self.template
            .elements
            .iter()
            .rev()
            .find(|element| ElementRect::of_element(element).contains(pointer.0, pointer.1))
            .map(|element| element.id)
    }

    /// The current rendered dimensions of the active gesture's target, used
    /// as the clamping box size while dragging.
    fn active_target_size(&self) -> (f32, f32) {
        match self.interaction.controller.active_target() {
            Some(DragTarget::Element(id)) => self
                .template
                .element(&id)
                .map(|element| element.payload.resolved_size())
                .unwrap_or((constants::DEFAULT_TEXT_WIDTH, constants::DEFAULT_TEXT_HEIGHT)),
            Some(DragTarget::Background) => {
                let geometry = self.template.config.resolved_background_geometry();
                (geometry.width, geometry.height)
            }
            None => (0.0, 0.0),
        }
    }

    /// Writes a controller-emitted geometry update into the template.
    ///
    /// Position and size are only written when they changed, and every
    /// commit happens synchronously within the event that produced it.
    pub fn commit_geometry_update(&mut self, update: GeometryUpdate) {
        match update.target {
            DragTarget::Element(id) => {
                if let Some(element) = self.template.element_mut(&id) {
                    if update.position_changed {
                        element.x = update.rect.x;
                        element.y = update.rect.y;
                    }
                    if update.size_changed {
                        element.payload.set_size(update.rect.width, update.rect.height);
                    }
                }
            }
            DragTarget::Background => {
                let fit = self
                    .template
                    .config
                    .resolved_background_geometry()
                    .object_fit;
                self.template.config.background_geometry = Some(BackgroundGeometry {
                    x: update.rect.x,
                    y: update.rect.y,
                    width: update.rect.width,
                    height: update.rect.height,
                    object_fit: fit,
                });
            }
        }

        if update.position_changed || update.size_changed {
            self.interaction.gesture_changed = true;
            self.file.has_unsaved_changes = true;
        }
    }

    /// Ends the active gesture and records undo for the net change.
    fn finish_gesture(&mut self) {
        let was_resize = matches!(
            self.interaction.controller.gesture(),
            Gesture::Resizing { .. }
        );
        let target = self.interaction.controller.pointer_released();
        let start_rect = self.interaction.gesture_start_rect.take();
        let changed = std::mem::take(&mut self.interaction.gesture_changed);

        let (Some(target), Some(start_rect)) = (target, start_rect) else {
            return;
        };
        if !changed {
            return;
        }

        match target {
            DragTarget::Element(id) => {
                let Some(element) = self.template.element(&id) else {
                    return;
                };
                let end_rect = ElementRect::of_element(element);
                if end_rect == start_rect {
                    return;
                }
                if was_resize {
                    self.undo_history.push_action(UndoAction::ElementResized {
                        element_id: id,
                        old_rect: start_rect,
                        new_rect: end_rect,
                    });
                } else {
                    self.undo_history.push_action(UndoAction::ElementMoved {
                        element_id: id,
                        old_position: (start_rect.x, start_rect.y),
                        new_position: (end_rect.x, end_rect.y),
                    });
                }
            }
            DragTarget::Background => {
                let new_config = self.template.config.clone();
                let mut old_config = new_config.clone();
                old_config.background_geometry = Some(BackgroundGeometry {
                    x: start_rect.x,
                    y: start_rect.y,
                    width: start_rect.width,
                    height: start_rect.height,
                    object_fit: new_config.resolved_background_geometry().object_fit,
                });
                if old_config != new_config {
                    self.undo_history.push_action(UndoAction::ConfigChanged {
                        old_config,
                        new_config,
                    });
                }
            }
        }
    }
}
