//! User interface components and rendering logic for the template editor.
//!
//! This module contains all the UI-related code including the main
//! application struct, canvas composition, property panels, dialogs, and
//! user interaction handling.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main EditorApp
//! - `canvas` - Canvas view navigation, hit testing and gesture wiring
//! - `rendering` - Painting the render tree and selection chrome
//! - `images` - Image fetching and texture caching
//! - `export` - SVG and PNG export
//! - `file_ops` - Local file save/load and storage service operations
//! - `undo` - Undo/redo history

mod canvas;
mod export;
mod file_ops;
mod images;
mod rendering;
mod state;
#[cfg(test)]
mod tests;
mod undo;

pub use state::{EditorApp, Selection};
pub use undo::{UndoAction, UndoHistory, UndoableTemplate};

use crate::constants;
use crate::geometry::{self, CanvasSize, ElementRect};
use crate::types::*;
use eframe::egui;
use state::{PendingConfirmAction, UploadTarget};

impl eframe::App for EditorApp {
    /// Persist entire app state between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string("app_state", json);
            }
            Err(err) => {
                eprintln!("Failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply theme visuals
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        // Drain async results: file dialogs, storage operations, image fetches
        self.handle_pending_operations(ctx);
        self.handle_store_results(ctx);
        self.images.poll(ctx);

        // Keyboard shortcuts
        self.handle_undo_redo_keys(ctx);
        self.handle_delete_key(ctx);
        self.handle_file_shortcuts(ctx);

        // Intercept native window close requests (titlebar X)
        #[cfg(not(target_arch = "wasm32"))]
        {
            if ctx.input(|i| i.viewport().close_requested()) {
                if self.file.has_unsaved_changes && !self.file.allow_close_on_next_request {
                    ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                    if !self.file.show_unsaved_dialog {
                        self.file.show_unsaved_dialog = true;
                        self.file.pending_confirm_action = Some(PendingConfirmAction::Quit);
                    }
                } else {
                    self.file.allow_close_on_next_request = false;
                }
            }
        }

        // Top toolbar occupies full width
        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        // Status line along the bottom
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        // Right-side properties panel
        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let clamped_width = self
            .properties_panel_width
            .clamp(220.0, (viewport_width * 0.9).max(220.0));
        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .default_width(clamped_width)
            .show(ctx, |ui| {
                let current_width = ui.available_width();
                let max_allowed = (viewport_width * 0.9).max(220.0);
                self.properties_panel_width = current_width.clamp(220.0, max_allowed);
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_properties_panel(ui);
                });
            });

        // Central canvas area
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        // Auxiliary windows
        self.draw_preview_window(ctx);
        self.draw_store_browser(ctx);
        self.draw_embed_dialog(ctx);
        self.draw_unsaved_dialog(ctx);
    }
}

impl EditorApp {
    /// Handle undo/redo keyboard shortcuts (Cmd/Ctrl+Z, Cmd/Ctrl+Shift+Z,
    /// Cmd/Ctrl+Y).
    fn handle_undo_redo_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let (undo_pressed, redo_pressed) = ctx.input(|i| {
            let command = i.modifiers.command || i.modifiers.ctrl;
            let undo = command && !i.modifiers.shift && i.key_pressed(egui::Key::Z);
            let redo = command
                && ((i.modifiers.shift && i.key_pressed(egui::Key::Z))
                    || i.key_pressed(egui::Key::Y));
            (undo, redo)
        });

        if undo_pressed {
            self.perform_undo();
        } else if redo_pressed {
            self.perform_redo();
        }
    }

    /// Undoes the most recent action.
    pub fn perform_undo(&mut self) {
        if let Some(action) = self.undo_history.pop_undo() {
            if let Some(inverse) = self.template.apply_undo(&action) {
                self.undo_history.push_redo(inverse);
                self.after_history_change();
            }
        }
    }

    /// Redoes the most recently undone action.
    pub fn perform_redo(&mut self) {
        if let Some(action) = self.undo_history.pop_redo() {
            if let Some(inverse) = self.template.apply_redo(&action) {
                // The inverse of a redo goes back on the undo stack without
                // clearing the remaining redo entries
                self.undo_history.push_action_preserving_redo(inverse);
                self.after_history_change();
            }
        }
    }

    fn after_history_change(&mut self) {
        self.file.has_unsaved_changes = true;
        // Drop a selection that points at an element the undo removed
        if let Some(id) = self.interaction.selection.element() {
            if self.template.element(&id).is_none() {
                self.interaction.selection = Selection::None;
            }
        }
    }

    /// Handle Delete/Backspace for removing the selected element.
    fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed = ctx.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if pressed {
            self.delete_selected_element();
        }
    }

    /// Handle file-related keyboard shortcuts (New/Open/Save).
    fn handle_file_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (new_pressed, open_pressed, save_pressed) = ctx.input(|i| {
            let command = i.modifiers.command || i.modifiers.ctrl;
            (
                command && i.key_pressed(egui::Key::N),
                command && i.key_pressed(egui::Key::O),
                command && i.key_pressed(egui::Key::S),
            )
        });

        if new_pressed {
            self.request_new_template();
        }
        if open_pressed {
            self.request_open_file();
        }
        if save_pressed {
            self.save_template_file();
        }
    }

    /// Starts "new template", asking for confirmation when there are unsaved
    /// changes.
    fn request_new_template(&mut self) {
        if self.file.has_unsaved_changes {
            self.file.show_unsaved_dialog = true;
            self.file.pending_confirm_action = Some(PendingConfirmAction::New);
        } else {
            self.new_template();
        }
    }

    /// Starts "open file", asking for confirmation when there are unsaved
    /// changes.
    fn request_open_file(&mut self) {
        if self.file.has_unsaved_changes {
            self.file.show_unsaved_dialog = true;
            self.file.pending_confirm_action = Some(PendingConfirmAction::Open);
        } else {
            self.load_template_file();
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        ui.horizontal_wrapped(|ui| {
            if ui.button("New").clicked() {
                self.request_new_template();
            }
            if ui.button("Open").clicked() {
                self.request_open_file();
            }
            if ui.button("Save").clicked() {
                self.save_template_file();
            }
            if ui.button("Save As").clicked() {
                self.save_as_template();
            }

            ui.separator();

            if ui.button("+ Text").clicked() {
                self.create_text_element();
            }
            if ui.button("+ Image").clicked() {
                self.create_image_element();
            }
            let has_element = self.interaction.selection.element().is_some();
            if ui
                .add_enabled(has_element, egui::Button::new("Delete"))
                .clicked()
            {
                self.delete_selected_element();
            }

            ui.separator();

            if ui
                .add_enabled(self.undo_history.can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.perform_undo();
            }
            if ui
                .add_enabled(self.undo_history.can_redo(), egui::Button::new("Redo"))
                .clicked()
            {
                self.perform_redo();
            }

            ui.separator();

            ui.toggle_value(&mut self.show_preview, "Preview");
            if ui.button("Export SVG").clicked() {
                self.export_svg(&ctx);
            }
            #[cfg(not(target_arch = "wasm32"))]
            if ui.button("Export PNG").clicked() {
                self.export_png(&ctx);
            }

            ui.separator();

            let server_label = if self.store.remote_id.is_some() {
                "Update on Server"
            } else {
                "Save to Server"
            };
            if ui
                .add_enabled(!self.store.busy, egui::Button::new(server_label))
                .clicked()
            {
                self.store_save(&ctx);
            }
            if ui.button("Templates…").clicked() {
                self.store.show_browser = true;
                self.store_refresh_list(&ctx);
            }
            if ui
                .add_enabled(
                    self.store.remote_id.is_some(),
                    egui::Button::new("Embed…"),
                )
                .clicked()
            {
                self.store.show_embed_dialog = true;
            }

            ui.separator();

            let theme_label = if self.dark_mode { "Light" } else { "Dark" };
            if ui.button(theme_label).clicked() {
                self.dark_mode = !self.dark_mode;
            }
        });
    }

    fn draw_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.store.busy {
                ui.spinner();
            }
            if let Some(status) = &self.store.status {
                ui.label(status.clone());
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{:.0}%", self.canvas.zoom_factor * 100.0));
                if self.file.has_unsaved_changes {
                    ui.label("● unsaved");
                }
            });
        });
    }

    fn draw_properties_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Template");
        ui.horizontal(|ui| {
            ui.label("Name:");
            if ui.text_edit_singleline(&mut self.template.name).changed() {
                self.file.has_unsaved_changes = true;
                self.store.validation_error = None;
            }
        });
        if let Some(error) = &self.store.validation_error {
            ui.colored_label(egui::Color32::from_rgb(255, 80, 80), error.clone());
        }
        ui.horizontal(|ui| {
            ui.label("Category:");
            let mut category = self.template.category_id.clone().unwrap_or_default();
            if ui.text_edit_singleline(&mut category).changed() {
                self.template.category_id =
                    (!category.is_empty()).then_some(category);
                self.file.has_unsaved_changes = true;
            }
        });

        ui.separator();
        self.draw_canvas_properties(ui);

        ui.separator();
        self.draw_background_properties(ui);

        ui.separator();
        ui.heading("Preview variables");
        ui.label("query string, e.g. title=Sale&logo=https://…");
        ui.text_edit_singleline(&mut self.preview_query);

        ui.separator();
        self.draw_element_list(ui);

        if let Some(id) = self.interaction.selection.element() {
            ui.separator();
            self.draw_element_properties(ui, id);
        }
    }

    fn draw_canvas_properties(&mut self, ui: &mut egui::Ui) {
        ui.heading("Canvas");
        let old_config = self.template.config.clone();
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Size:");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut self.template.config.width)
                        .range(1.0..=10000.0)
                        .suffix(" w"),
                )
                .changed();
            changed |= ui
                .add(
                    egui::DragValue::new(&mut self.template.config.height)
                        .range(1.0..=10000.0)
                        .suffix(" h"),
                )
                .changed();
        });

        if changed {
            // Shrinking the canvas must re-contain everything on it
            geometry::recontain_template(&mut self.template);
            self.undo_history
                .push_config_change(old_config, self.template.config.clone());
            self.file.has_unsaved_changes = true;
        }
    }

    fn draw_background_properties(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        ui.heading("Background");
        let old_config = self.template.config.clone();
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Image URL:");
            changed |= ui
                .text_edit_singleline(&mut self.template.config.background_image)
                .changed();
        });
        ui.horizontal(|ui| {
            if ui.button("Upload…").clicked() {
                self.store_upload_image(UploadTarget::Background, &ctx);
            }
            let has_image = !self.template.config.background_image.is_empty();
            if ui.add_enabled(has_image, egui::Button::new("Clear")).clicked() {
                self.template.config.background_image.clear();
                self.template.config.background_geometry = None;
                if self.interaction.selection == Selection::Background {
                    self.interaction.selection = Selection::None;
                }
                changed = true;
            }
            if ui
                .add_enabled(has_image, egui::Button::new("Select"))
                .clicked()
            {
                self.interaction.selection = Selection::Background;
            }
        });

        if !self.template.config.background_image.is_empty() {
            let mut geometry_value = self.template.config.resolved_background_geometry();
            let mut geometry_changed = false;

            ui.horizontal(|ui| {
                ui.label("Fit:");
                for (fit, label) in [
                    (ObjectFit::Cover, "cover"),
                    (ObjectFit::Contain, "contain"),
                    (ObjectFit::Fill, "fill"),
                    (ObjectFit::None, "none"),
                ] {
                    if ui
                        .selectable_label(geometry_value.object_fit == fit, label)
                        .clicked()
                    {
                        geometry_value.object_fit = fit;
                        geometry_changed = true;
                    }
                }
            });
            ui.horizontal(|ui| {
                ui.label("Box:");
                geometry_changed |= ui
                    .add(egui::DragValue::new(&mut geometry_value.x).prefix("x "))
                    .changed();
                geometry_changed |= ui
                    .add(egui::DragValue::new(&mut geometry_value.y).prefix("y "))
                    .changed();
                geometry_changed |= ui
                    .add(
                        egui::DragValue::new(&mut geometry_value.width)
                            .range(constants::MIN_ELEMENT_SIZE..=10000.0)
                            .prefix("w "),
                    )
                    .changed();
                geometry_changed |= ui
                    .add(
                        egui::DragValue::new(&mut geometry_value.height)
                            .range(constants::MIN_ELEMENT_SIZE..=10000.0)
                            .prefix("h "),
                    )
                    .changed();
            });
            if ui.button("Reset box to full canvas").clicked() {
                self.template.config.background_geometry = None;
                changed = true;
            } else if geometry_changed {
                // Keep the background box inside the canvas after every edit
                let contained = geometry::clamp_background(
                    geometry_value,
                    CanvasSize::from(&self.template.config),
                );
                self.template.config.background_geometry = Some(contained);
                changed = true;
            }
        }

        if changed {
            self.undo_history
                .push_config_change(old_config, self.template.config.clone());
            self.file.has_unsaved_changes = true;
        }
    }

    fn draw_element_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Elements");
        let mut clicked: Option<ElementId> = None;
        for element in &self.template.elements {
            let kind = match &element.payload {
                ElementPayload::Text(_) => "text",
                ElementPayload::Image(_) => "image",
            };
            let selected = self.interaction.selection == Selection::Element(element.id);
            let label = format!("{} ({})", element.variable_name, kind);
            if ui.selectable_label(selected, label).clicked() {
                clicked = Some(element.id);
            }
        }
        if let Some(id) = clicked {
            self.interaction.selection = Selection::Element(id);
        }
        if self.template.elements.is_empty() {
            ui.label("No elements yet. Add text or an image from the toolbar.");
        }
    }

    /// Draws the property editor for the selected element.
    ///
    /// Edits are made on a copy and committed in one place so clamping,
    /// undo recording and the unsaved flag stay consistent with gestures.
    fn draw_element_properties(&mut self, ui: &mut egui::Ui, id: ElementId) {
        let ctx = ui.ctx().clone();
        let Some(original) = self.template.element(&id).cloned() else {
            return;
        };
        let mut edited = original.clone();
        let canvas = CanvasSize::from(&self.template.config);

        ui.heading("Element");
        ui.horizontal(|ui| {
            ui.label("Variable:");
            ui.text_edit_singleline(&mut edited.variable_name);
        });
        ui.horizontal(|ui| {
            ui.label("Position:");
            ui.add(
                egui::DragValue::new(&mut edited.x)
                    .range(0.0..=canvas.width)
                    .prefix("x "),
            );
            ui.add(
                egui::DragValue::new(&mut edited.y)
                    .range(0.0..=canvas.height)
                    .prefix("y "),
            );
        });

        match &mut edited.payload {
            ElementPayload::Text(text) => {
                ui.label("Content:");
                ui.text_edit_multiline(&mut text.content);
                ui.horizontal(|ui| {
                    ui.label("Font size:");
                    ui.add(egui::DragValue::new(&mut text.font_size).range(1.0..=500.0));
                    ui.label("Spacing:");
                    ui.add(egui::DragValue::new(&mut text.letter_spacing).range(-20.0..=100.0));
                });
                ui.horizontal(|ui| {
                    ui.label("Family:");
                    ui.text_edit_singleline(&mut text.font_family);
                });
                ui.horizontal(|ui| {
                    ui.label("Weight:");
                    for weight in ["normal", "bold"] {
                        if ui
                            .selectable_label(text.font_weight == weight, weight)
                            .clicked()
                        {
                            text.font_weight = weight.to_string();
                        }
                    }
                    ui.label("Color:");
                    ui.text_edit_singleline(&mut text.color);
                });
                ui.horizontal(|ui| {
                    ui.label("Align:");
                    for (align, label) in [
                        (TextAlign::Left, "left"),
                        (TextAlign::Center, "center"),
                        (TextAlign::Right, "right"),
                    ] {
                        if ui.selectable_label(text.text_align == align, label).clicked() {
                            text.text_align = align;
                        }
                    }
                });

                let mut has_box = text.width.is_some() && text.height.is_some();
                if ui.checkbox(&mut has_box, "Explicit box").changed() {
                    if has_box {
                        text.width = Some(constants::DEFAULT_TEXT_WIDTH);
                        text.height = Some(constants::DEFAULT_TEXT_HEIGHT);
                    } else {
                        text.width = None;
                        text.height = None;
                    }
                }
                if let (Some(width), Some(height)) = (&mut text.width, &mut text.height) {
                    ui.horizontal(|ui| {
                        ui.label("Box:");
                        ui.add(
                            egui::DragValue::new(width)
                                .range(constants::MIN_ELEMENT_SIZE..=canvas.width)
                                .prefix("w "),
                        );
                        ui.add(
                            egui::DragValue::new(height)
                                .range(constants::MIN_ELEMENT_SIZE..=canvas.height)
                                .prefix("h "),
                        );
                    });
                }

                let mut has_stroke = text.stroke_color.is_some();
                if ui.checkbox(&mut has_stroke, "Outline").changed() {
                    if has_stroke {
                        text.stroke_color = Some("#ffffff".to_string());
                        if text.stroke_width <= 0.0 {
                            text.stroke_width = 2.0;
                        }
                    } else {
                        text.stroke_color = None;
                        text.stroke_width = 0.0;
                    }
                }
                if let Some(stroke_color) = &mut text.stroke_color {
                    ui.horizontal(|ui| {
                        ui.label("Outline:");
                        ui.text_edit_singleline(stroke_color);
                        ui.add(
                            egui::DragValue::new(&mut text.stroke_width).range(0.0..=50.0),
                        );
                    });
                }
            }
            ElementPayload::Image(image) => {
                ui.horizontal(|ui| {
                    ui.label("Source URL:");
                    ui.text_edit_singleline(&mut image.src);
                });
                if ui.button("Upload…").clicked() {
                    self.store_upload_image(UploadTarget::ElementSrc(id), &ctx);
                }
                ui.horizontal(|ui| {
                    ui.label("Size:");
                    ui.add(
                        egui::DragValue::new(&mut image.width)
                            .range(constants::MIN_ELEMENT_SIZE..=canvas.width)
                            .prefix("w "),
                    );
                    ui.add(
                        egui::DragValue::new(&mut image.height)
                            .range(constants::MIN_ELEMENT_SIZE..=canvas.height)
                            .prefix("h "),
                    );
                });
                ui.horizontal(|ui| {
                    ui.label("Fit:");
                    for (fit, label) in [
                        (ObjectFit::Cover, "cover"),
                        (ObjectFit::Contain, "contain"),
                        (ObjectFit::Fill, "fill"),
                    ] {
                        if ui.selectable_label(image.object_fit == fit, label).clicked() {
                            image.object_fit = fit;
                        }
                    }
                });
            }
        }

        if edited != original {
            // Containment holds after every mutation, panel edits included
            let rect = geometry::clamp_position(ElementRect::of_element(&edited), canvas);
            edited.x = rect.x;
            edited.y = rect.y;
            if let Some(element) = self.template.element_mut(&id) {
                *element = edited.clone();
            }
            self.undo_history.push_property_change(id, original, edited);
            self.file.has_unsaved_changes = true;
        }
    }

    fn draw_preview_window(&mut self, ctx: &egui::Context) {
        if !self.show_preview {
            return;
        }
        let substitutions = self.active_substitutions();
        let tree = crate::render::render_template(
            &self.template.config,
            &self.template.elements,
            &substitutions,
            Some(360.0),
        );

        let mut open = self.show_preview;
        egui::Window::new("Preview")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{}×{} at {:.0}%",
                    tree.width.round(),
                    tree.height.round(),
                    tree.scale * 100.0
                ));
                let (response, painter) = ui.allocate_painter(
                    egui::vec2(tree.width.max(1.0), tree.height.max(1.0)),
                    egui::Sense::hover(),
                );
                let origin = response.rect.min;
                painter.rect_filled(response.rect, 0.0, egui::Color32::WHITE);
                let clipped = painter.with_clip_rect(response.rect);
                self.paint_tree(
                    &clipped,
                    &tree,
                    |pos: egui::Pos2| origin + pos.to_vec2(),
                    1.0,
                );
            });
        self.show_preview = open;
    }

    fn draw_store_browser(&mut self, ctx: &egui::Context) {
        if !self.store.show_browser {
            return;
        }
        let mut open = self.store.show_browser;
        let mut load_request: Option<String> = None;
        let mut delete_request: Option<String> = None;
        let mut refresh = false;

        egui::Window::new("Templates")
            .open(&mut open)
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Server:");
                    ui.text_edit_singleline(&mut self.store.base_url);
                    if ui.button("Refresh").clicked() {
                        refresh = true;
                    }
                    if self.store.busy {
                        ui.spinner();
                    }
                });
                ui.separator();

                if self.store.templates.is_empty() {
                    ui.label("No stored templates.");
                }
                for summary in &self.store.templates {
                    ui.horizontal(|ui| {
                        let label = match &summary.category_id {
                            Some(category) => format!("{} [{}]", summary.name, category),
                            None => summary.name.clone(),
                        };
                        ui.label(label);
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if ui.button("Delete").clicked() {
                                    delete_request = Some(summary.id.clone());
                                }
                                if ui.button("Load").clicked() {
                                    load_request = Some(summary.id.clone());
                                }
                            },
                        );
                    });
                }
            });

        self.store.show_browser = open;
        if refresh {
            self.store_refresh_list(ctx);
        }
        if let Some(id) = load_request {
            self.store_load(id, ctx);
        }
        if let Some(id) = delete_request {
            self.store_delete(id, ctx);
        }
    }

    fn draw_embed_dialog(&mut self, ctx: &egui::Context) {
        if !self.store.show_embed_dialog {
            return;
        }
        let Some(remote_id) = self.store.remote_id.clone() else {
            self.store.show_embed_dialog = false;
            return;
        };

        let substitutions = self.active_substitutions();
        let url = crate::vars::embed_url(&self.store.base_url, &remote_id, &substitutions);
        let tag = crate::vars::embed_tag(
            &self.store.base_url,
            &remote_id,
            &self.template.name,
            &substitutions,
        );

        let mut open = self.store.show_embed_dialog;
        egui::Window::new("Embed")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Image URL (current preview variables baked in):");
                let mut url_text = url.clone();
                ui.add(
                    egui::TextEdit::singleline(&mut url_text).desired_width(f32::INFINITY),
                );
                if ui.button("Copy URL").clicked() {
                    ui.ctx().copy_text(url.clone());
                }
                ui.separator();
                ui.label("HTML tag:");
                let mut tag_text = tag.clone();
                ui.add(
                    egui::TextEdit::multiline(&mut tag_text)
                        .desired_rows(2)
                        .desired_width(f32::INFINITY),
                );
                if ui.button("Copy tag").clicked() {
                    ui.ctx().copy_text(tag.clone());
                }
            });
        self.store.show_embed_dialog = open;
    }

    fn draw_unsaved_dialog(&mut self, ctx: &egui::Context) {
        if !self.file.show_unsaved_dialog {
            return;
        }
        let title = match self.file.pending_confirm_action {
            Some(PendingConfirmAction::Quit) => "Unsaved changes — Quit?",
            Some(PendingConfirmAction::New) => "Unsaved changes — Create New?",
            Some(PendingConfirmAction::Open) => "Unsaved changes — Open File?",
            None => "Unsaved changes",
        };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("You have unsaved changes. Are you sure you want to continue?");
                ui.horizontal(|ui| {
                    let confirm_label = match self.file.pending_confirm_action {
                        Some(PendingConfirmAction::Quit) => "Discard and Quit",
                        Some(PendingConfirmAction::New) => "Discard and Create New",
                        Some(PendingConfirmAction::Open) => "Discard and Open",
                        None => "Discard",
                    };
                    if ui.button(confirm_label).clicked() {
                        match self.file.pending_confirm_action {
                            Some(PendingConfirmAction::New) => {
                                self.new_template();
                            }
                            Some(PendingConfirmAction::Open) => {
                                self.load_template_file();
                            }
                            Some(PendingConfirmAction::Quit) => {
                                self.file.allow_close_on_next_request = true;
                                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                            }
                            None => {}
                        }
                        self.file.show_unsaved_dialog = false;
                        self.file.pending_confirm_action = None;
                    }
                    if ui.button("Cancel").clicked() {
                        self.file.show_unsaved_dialog = false;
                        self.file.pending_confirm_action = None;
                    }
                });
            });
    }
}
