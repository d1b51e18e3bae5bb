//! Export utilities: render the current template to SVG and PNG.
//!
//! The exported document is built from the same render tree as the live
//! canvas and the preview, so the three outputs stay visually in lockstep.
//! Images are embedded as base64 data URIs once their bytes have arrived in
//! the cache.
//!
//! Notes:
//! - SVG export is supported on all targets (native + wasm).
//! - PNG export is supported on native targets only (wasm skipped).

use crate::render::{self, RenderContent, TextNode};
use crate::types::TextAlign;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use eframe::egui;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;

use super::state::EditorApp;

impl EditorApp {
    /// Export to SVG: open a save dialog (native) or trigger a download
    /// (wasm).
    pub fn export_svg(&mut self, ctx: &egui::Context) {
        let (svg, _w, _h) = self.build_export_svg(ctx);

        #[cfg(target_arch = "wasm32")]
        {
            if let Err(e) = Self::trigger_download("template.svg", &svg) {
                eprintln!("Failed to start SVG download: {}", e);
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let svg_copy = svg.clone();
            tokio::spawn(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("SVG", &["svg"])
                    .set_file_name("template.svg")
                    .save_file()
                    .await
                {
                    let path = handle.path();
                    if let Err(e) = std::fs::write(path, svg_copy.as_bytes()) {
                        eprintln!("Failed to save SVG: {}", e);
                    }
                }
            });
        }
    }

    /// Export to PNG (native builds only).
    pub fn export_png(&mut self, ctx: &egui::Context) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let (svg, width, height) = self.build_export_svg(ctx);

            use tiny_skia::Pixmap;

            // Parse SVG
            let mut opt = usvg::Options::default();
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            opt.fontdb = Arc::new(db);

            let tree = match usvg::Tree::from_data(svg.as_bytes(), &opt) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Failed to parse SVG for PNG export: {}", e);
                    return;
                }
            };

            // Scale handling
            let scale = self.png_export_scale.clamp(0.25, 8.0);
            let out_w = ((width as f32) * scale).round().max(1.0) as u32;
            let out_h = ((height as f32) * scale).round().max(1.0) as u32;

            let mut pixmap = match Pixmap::new(out_w, out_h) {
                Some(p) => p,
                None => {
                    eprintln!("Failed to create pixmap {}x{}", out_w, out_h);
                    return;
                }
            };

            let mut pmut = pixmap.as_mut();
            let transform = tiny_skia::Transform::from_scale(scale, scale);
            resvg::render(&tree, transform, &mut pmut);

            tokio::spawn(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("PNG", &["png"])
                    .set_file_name("template.png")
                    .save_file()
                    .await
                {
                    let path = handle.path();
                    if let Err(e) = pixmap.save_png(path) {
                        eprintln!("Failed to save PNG: {}", e);
                    }
                }
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = ctx;
        }
    }

    /// Builds the SVG document for the current template and substitutions.
    /// Returns (svg, width, height).
    fn build_export_svg(&self, ctx: &egui::Context) -> (String, u32, u32) {
        let substitutions = self.active_substitutions();
        let tree = render::render_template(
            &self.template.config,
            &self.template.elements,
            &substitutions,
            None,
        );

        let width = tree.width.ceil().max(1.0) as u32;
        let height = tree.height.ceil().max(1.0) as u32;

        let mut out = String::new();
        use std::fmt::Write as _;

        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
            width, height, width, height
        );

        // Page background
        let _ = writeln!(
            out,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#ffffff\" />",
            width, height
        );

        for (index, node) in tree.nodes.iter().enumerate() {
            match &node.content {
                RenderContent::Background { src, object_fit }
                | RenderContent::Image { src, object_fit } => {
                    self.write_svg_image(&mut out, index, node.rect, src, *object_fit);
                }
                RenderContent::Text(text) => {
                    self.write_svg_text(&mut out, ctx, node.rect, text);
                }
            }
        }

        let _ = writeln!(out, "</svg>");

        (out, width, height)
    }

    /// Emits one image box, clipped to its rect, with the object-fit mapping
    /// baked into the image transform.
    fn write_svg_image(
        &self,
        out: &mut String,
        index: usize,
        rect: crate::geometry::ElementRect,
        src: &str,
        object_fit: crate::types::ObjectFit,
    ) {
        use std::fmt::Write as _;

        let Some(image) = self.images.ready(src) else {
            // Bytes not fetched yet: placeholder box so layout still matches
            let _ = writeln!(
                out,
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#cccccc\" />",
                rect.x, rect.y, rect.width, rect.height
            );
            return;
        };

        let (crop, dest) = render::object_fit_rects(
            object_fit,
            image.width as f32,
            image.height as f32,
            rect,
        );
        if crop.width <= 0.0 || crop.height <= 0.0 {
            return;
        }

        // Draw the full image scaled so the crop region lands exactly on the
        // dest rect, clipped to the node box
        let scale_x = dest.width / crop.width;
        let scale_y = dest.height / crop.height;
        let image_x = dest.x - crop.x * scale_x;
        let image_y = dest.y - crop.y * scale_y;
        let image_w = image.width as f32 * scale_x;
        let image_h = image.height as f32 * scale_y;

        let mime = image::guess_format(image.bytes.as_slice())
            .map(|format| format.to_mime_type())
            .unwrap_or("image/png");
        let encoded = BASE64.encode(image.bytes.as_slice());

        let _ = writeln!(
            out,
            "<clipPath id=\"clip{index}\"><rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" /></clipPath>",
            rect.x, rect.y, rect.width, rect.height
        );
        let _ = writeln!(
            out,
            "<image x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" preserveAspectRatio=\"none\" clip-path=\"url(#clip{index})\" xlink:href=\"data:{mime};base64,{encoded}\" />",
            image_x, image_y, image_w, image_h
        );
    }

    /// Emits one text box: wrapped lines positioned exactly as the live
    /// painter positions them, outline copies first, fill on top.
    fn write_svg_text(
        &self,
        out: &mut String,
        ctx: &egui::Context,
        rect: crate::geometry::ElementRect,
        text: &TextNode,
    ) {
        let font_id = egui::FontId::proportional(text.font_size);
        let measure = |line: &str| {
            let base = ctx.fonts_mut(|f| {
                f.layout_no_wrap(line.to_string(), font_id.clone(), egui::Color32::BLACK)
                    .size()
                    .x
            });
            base + text.letter_spacing * line.chars().count().saturating_sub(1) as f32
        };
        let line_height = ctx.fonts_mut(|f| f.row_height(&font_id));

        // Line layout mirrors the live painter: wrap in the box and center
        // vertically, or a single line hanging from the rect's top-left.
        let (lines, mut line_center_y) = if text.boxed {
            let lines = render::wrap_text(&text.content, rect.width, &measure);
            let total = line_height * lines.len() as f32;
            let first = rect.y + rect.height / 2.0 - total / 2.0 + line_height / 2.0;
            (lines, first)
        } else {
            (vec![text.content.clone()], rect.y + line_height / 2.0)
        };

        for line in &lines {
            let line_width = measure(line);
            let x = if text.boxed {
                match text.text_align {
                    TextAlign::Left => rect.x,
                    TextAlign::Center => rect.x + (rect.width - line_width) / 2.0,
                    TextAlign::Right => rect.right() - line_width,
                }
            } else {
                rect.x
            };

            if let Some(stroke) = &text.stroke {
                for (dx, dy) in render::stroke_offsets(stroke.width) {
                    self.write_svg_text_line(
                        out,
                        x + dx,
                        line_center_y + dy,
                        line,
                        text,
                        &stroke.color,
                    );
                }
            }
            self.write_svg_text_line(out, x, line_center_y, line, text, &text.color);

            line_center_y += line_height;
        }
    }

    fn write_svg_text_line(
        &self,
        out: &mut String,
        x: f32,
        center_y: f32,
        line: &str,
        text: &TextNode,
        color: &str,
    ) {
        use std::fmt::Write as _;

        let rgba = render::parse_color(color);
        let mut attrs = format!(
            "x=\"{:.1}\" y=\"{:.1}\" font-size=\"{:.1}\" font-family=\"{}\" fill=\"#{:02x}{:02x}{:02x}\" dominant-baseline=\"central\"",
            x,
            center_y,
            text.font_size,
            escape_xml(&text.font_family),
            rgba[0],
            rgba[1],
            rgba[2]
        );
        if rgba[3] != 255 {
            attrs.push_str(&format!(" fill-opacity=\"{:.3}\"", rgba[3] as f32 / 255.0));
        }
        if text.font_weight != "normal" && !text.font_weight.is_empty() {
            attrs.push_str(&format!(
                " font-weight=\"{}\"",
                escape_xml(&text.font_weight)
            ));
        }
        if text.letter_spacing != 0.0 {
            attrs.push_str(&format!(" letter-spacing=\"{:.1}\"", text.letter_spacing));
        }

        let _ = writeln!(out, "<text {}>{}</text>", attrs, escape_xml(line));
    }
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}
