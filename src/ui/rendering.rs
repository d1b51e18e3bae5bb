//! Canvas painting for the live editor view.
//!
//! Paints the tree produced by the render function (background, images,
//! text with the 8-offset outline effect) plus the selection border and
//! resize handles. The same tree drives the preview window and the exporter,
//! so nothing here re-derives layout: this file only maps tree coordinates
//! through the view transform and puts pixels on screen.

use super::images::CachedImage;
use super::state::EditorApp;
use crate::constants;
use crate::geometry::{ElementRect, ResizeHandle};
use crate::interaction::DragTarget;
use crate::render::{self, RenderContent, RenderNode, RenderTree, TextNode};
use crate::types::{ObjectFit, TextAlign};
use eframe::egui;
use eframe::epaint::StrokeKind;

fn color32(rgba: [u8; 4]) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

impl EditorApp {
    /// Paints the composed template and selection chrome into the canvas
    /// viewport.
    pub fn paint_canvas(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        viewport: egui::Rect,
    ) {
        let substitutions = self.active_substitutions();
        let tree = render::render_template(
            &self.template.config,
            &self.template.elements,
            &substitutions,
            None,
        );

        // Kick off fetches for every image the tree references
        for node in &tree.nodes {
            if let RenderContent::Background { src, .. } | RenderContent::Image { src, .. } =
                &node.content
            {
                self.images.ensure(src, ctx);
            }
        }

        // Canvas backdrop and border
        let canvas_screen =
            self.canvas_rect_to_screen(ElementRect::new(0.0, 0.0, tree.width, tree.height));
        painter.rect_filled(canvas_screen, 0.0, egui::Color32::WHITE);
        painter.rect_stroke(
            canvas_screen,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
            StrokeKind::Outside,
        );

        // Content is clipped to the canvas so cover-cropped images and
        // overflowing text stay inside the template bounds
        let content_painter = painter.with_clip_rect(canvas_screen.intersect(viewport));
        let zoom = self.canvas.zoom_factor;
        self.paint_tree(
            &content_painter,
            &tree,
            |pos: egui::Pos2| self.canvas_to_screen(pos),
            zoom,
        );

        // Selection chrome is drawn unclipped so handles at the canvas edge
        // stay grabbable
        self.paint_selection_overlay(painter);
    }

    /// Paints a render tree through an arbitrary point transform.
    ///
    /// Used by the live canvas (view transform) and the preview window
    /// (plain translation).
    pub fn paint_tree(
        &self,
        painter: &egui::Painter,
        tree: &RenderTree,
        to_screen: impl Fn(egui::Pos2) -> egui::Pos2 + Copy,
        zoom: f32,
    ) {
        for node in &tree.nodes {
            self.paint_node(painter, node, to_screen, zoom);
        }
    }

    fn paint_node(
        &self,
        painter: &egui::Painter,
        node: &RenderNode,
        to_screen: impl Fn(egui::Pos2) -> egui::Pos2 + Copy,
        zoom: f32,
    ) {
        match &node.content {
            RenderContent::Background { src, object_fit }
            | RenderContent::Image { src, object_fit } => {
                self.paint_image_box(painter, node.rect, src, *object_fit, to_screen, zoom);
            }
            RenderContent::Text(text) => {
                self.paint_text_node(painter, node.rect, text, to_screen, zoom);
            }
        }
    }

    fn rect_to_screen(
        rect: ElementRect,
        to_screen: impl Fn(egui::Pos2) -> egui::Pos2,
    ) -> egui::Rect {
        egui::Rect::from_min_max(
            to_screen(egui::pos2(rect.x, rect.y)),
            to_screen(egui::pos2(rect.right(), rect.bottom())),
        )
    }

    fn paint_image_box(
        &self,
        painter: &egui::Painter,
        rect: ElementRect,
        src: &str,
        object_fit: ObjectFit,
        to_screen: impl Fn(egui::Pos2) -> egui::Pos2 + Copy,
        zoom: f32,
    ) {
        let screen_rect = Self::rect_to_screen(rect, to_screen);

        match self.images.get(src) {
            Some(CachedImage::Ready(image)) => {
                let (crop, dest) = render::object_fit_rects(
                    object_fit,
                    image.width as f32,
                    image.height as f32,
                    rect,
                );
                let uv = egui::Rect::from_min_max(
                    egui::pos2(
                        crop.x / image.width as f32,
                        crop.y / image.height as f32,
                    ),
                    egui::pos2(
                        crop.right() / image.width as f32,
                        crop.bottom() / image.height as f32,
                    ),
                );
                // Clip to the node box: object-fit none may draw a smaller
                // dest rect, cover fills the box exactly
                let clipped = painter.with_clip_rect(painter.clip_rect().intersect(screen_rect));
                clipped.image(
                    image.texture.id(),
                    Self::rect_to_screen(dest, to_screen),
                    uv,
                    egui::Color32::WHITE,
                );
            }
            Some(CachedImage::Failed(_)) => {
                painter.rect_filled(
                    screen_rect,
                    0.0,
                    egui::Color32::from_rgba_unmultiplied(200, 120, 120, 80),
                );
                painter.text(
                    screen_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "image unavailable",
                    egui::FontId::proportional((11.0 * zoom).clamp(8.0, 24.0)),
                    egui::Color32::DARK_GRAY,
                );
            }
            _ => {
                // Loading (or first frame before the fetch was registered)
                painter.rect_filled(
                    screen_rect,
                    0.0,
                    egui::Color32::from_rgba_unmultiplied(128, 128, 128, 40),
                );
                painter.rect_stroke(
                    screen_rect,
                    0.0,
                    egui::Stroke::new(1.0, egui::Color32::GRAY),
                    StrokeKind::Inside,
                );
            }
        }
    }

    fn paint_text_node(
        &self,
        painter: &egui::Painter,
        rect: ElementRect,
        text: &TextNode,
        to_screen: impl Fn(egui::Pos2) -> egui::Pos2 + Copy,
        zoom: f32,
    ) {
        let screen_rect = Self::rect_to_screen(rect, to_screen);
        let font_id = egui::FontId::proportional(text.font_size * zoom);
        let fill = color32(render::parse_color(&text.color));
        let spacing = text.letter_spacing * zoom;

        let stroke = text
            .stroke
            .as_ref()
            .map(|s| (color32(render::parse_color(&s.color)), s.width * zoom));

        if text.boxed {
            // Wrap within the box, vertically centered, aligned per line
            let max_width = screen_rect.width();
            let lines = render::wrap_text(&text.content, max_width, |candidate| {
                self.measure_line(painter, candidate, &font_id, spacing)
            });

            let line_height = painter.fonts_mut(|f| f.row_height(&font_id));
            let total_height = line_height * lines.len() as f32;
            let mut y = screen_rect.center().y - total_height / 2.0;

            for line in &lines {
                let line_width = self.measure_line(painter, line, &font_id, spacing);
                let x = match text.text_align {
                    TextAlign::Left => screen_rect.min.x,
                    TextAlign::Center => screen_rect.center().x - line_width / 2.0,
                    TextAlign::Right => screen_rect.max.x - line_width,
                };
                self.draw_text_line(
                    painter,
                    egui::pos2(x, y),
                    line,
                    &font_id,
                    spacing,
                    fill,
                    stroke,
                );
                y += line_height;
            }
        } else {
            // Single unconstrained line, left edge at the element position
            self.draw_text_line(
                painter,
                screen_rect.min,
                &text.content,
                &font_id,
                spacing,
                fill,
                stroke,
            );
        }
    }

    /// Width of a line at the given font, including letter spacing.
    fn measure_line(
        &self,
        painter: &egui::Painter,
        line: &str,
        font_id: &egui::FontId,
        spacing: f32,
    ) -> f32 {
        let base = painter.fonts_mut(|f| {
            f.layout_no_wrap(line.to_string(), font_id.clone(), egui::Color32::BLACK)
                .size()
                .x
        });
        let gaps = line.chars().count().saturating_sub(1) as f32;
        base + spacing * gaps
    }

    /// Draws one line of text with the outline effect.
    ///
    /// The outline is the glyph silhouette repeated at the 8 canonical
    /// offsets in the stroke color, under the fill pass.
    #[allow(clippy::too_many_arguments)]
    fn draw_text_line(
        &self,
        painter: &egui::Painter,
        pos: egui::Pos2,
        line: &str,
        font_id: &egui::FontId,
        spacing: f32,
        fill: egui::Color32,
        stroke: Option<(egui::Color32, f32)>,
    ) {
        if let Some((stroke_color, stroke_width)) = stroke {
            for (dx, dy) in render::stroke_offsets(stroke_width) {
                self.draw_plain_line(
                    painter,
                    egui::pos2(pos.x + dx, pos.y + dy),
                    line,
                    font_id,
                    spacing,
                    stroke_color,
                );
            }
        }
        self.draw_plain_line(painter, pos, line, font_id, spacing, fill);
    }

    fn draw_plain_line(
        &self,
        painter: &egui::Painter,
        pos: egui::Pos2,
        line: &str,
        font_id: &egui::FontId,
        spacing: f32,
        color: egui::Color32,
    ) {
        if spacing == 0.0 {
            painter.text(pos, egui::Align2::LEFT_TOP, line, font_id.clone(), color);
            return;
        }

        // Letter spacing: advance glyph by glyph
        let mut x = pos.x;
        for ch in line.chars() {
            let glyph = ch.to_string();
            let width = painter.fonts_mut(|f| {
                f.layout_no_wrap(glyph.clone(), font_id.clone(), color).size().x
            });
            painter.text(
                egui::pos2(x, pos.y),
                egui::Align2::LEFT_TOP,
                glyph,
                font_id.clone(),
                color,
            );
            x += width + spacing;
        }
    }

    /// Draws the selection border and the 8 resize handles around the
    /// selected target.
    fn paint_selection_overlay(&self, painter: &egui::Painter) {
        let Some((target, rect)) = self.selected_target_rect() else {
            return;
        };
        let screen_rect = self.canvas_rect_to_screen(rect);

        let active = self.interaction.controller.active_target() == Some(target);
        let border_color = if active {
            egui::Color32::from_rgb(255, 165, 0)
        } else {
            egui::Color32::from_rgb(100, 150, 255)
        };
        painter.rect_stroke(
            screen_rect,
            0.0,
            egui::Stroke::new(2.0, border_color),
            StrokeKind::Outside,
        );

        // Handles are screen-sized squares so they stay grabbable at any zoom
        for handle in ResizeHandle::ALL {
            let (ux, uy) = handle.unit_position();
            let center = egui::pos2(
                screen_rect.min.x + screen_rect.width() * ux,
                screen_rect.min.y + screen_rect.height() * uy,
            );
            let handle_rect = egui::Rect::from_center_size(
                center,
                egui::vec2(
                    constants::HANDLE_RADIUS * 2.0,
                    constants::HANDLE_RADIUS * 2.0,
                ),
            );
            painter.rect_filled(handle_rect, 1.0, egui::Color32::WHITE);
            painter.rect_stroke(
                handle_rect,
                1.0,
                egui::Stroke::new(1.0, border_color),
                StrokeKind::Inside,
            );
        }
    }
}
