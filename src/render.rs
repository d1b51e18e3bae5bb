//! The deterministic render function.
//!
//! [`render_template`] maps `(config, elements, substitutions, max_width)` to
//! a tree of positioned boxes with style attributes. It is pure: no IO, no
//! mutation of inputs, and identical inputs always yield an identical tree.
//! The live canvas painter, the preview, and the SVG/PNG exporter all consume
//! this one function, which is what keeps their output in lockstep with the
//! server-side renderer.
//!
//! Font measurement is deliberately kept out: text wrapping is driven by a
//! caller-supplied measure function so the tree itself stays independent of
//! any font backend.

use crate::constants;
use crate::geometry::ElementRect;
use crate::types::{CanvasConfig, CanvasElement, ElementPayload, ObjectFit, TextAlign};
use std::collections::HashMap;

/// Styling carried by a text node, with all lengths pre-scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    /// The resolved display string (after variable substitution).
    pub content: String,
    /// Font size in output units.
    pub font_size: f32,
    /// Font family name.
    pub font_family: String,
    /// CSS-style font weight.
    pub font_weight: String,
    /// Fill color as a CSS hex string.
    pub color: String,
    /// Horizontal alignment within the box.
    pub text_align: TextAlign,
    /// Additional spacing between glyphs in output units.
    pub letter_spacing: f32,
    /// Whether the text wraps inside its rect (explicit box) or runs as a
    /// single unconstrained line from the rect's top-left corner.
    pub boxed: bool,
    /// Outline effect, when the payload carries one.
    pub stroke: Option<TextStroke>,
}

/// An outline drawn as 8 offset copies of the glyph silhouette.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStroke {
    /// Outline color as a CSS hex string.
    pub color: String,
    /// Offset distance in output units.
    pub width: f32,
}

/// What a render node draws inside its rect.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderContent {
    /// The canvas background image.
    Background {
        /// Image URL.
        src: String,
        /// How the image maps onto the rect.
        object_fit: ObjectFit,
    },
    /// An image element.
    Image {
        /// Resolved image URL (after variable substitution).
        src: String,
        /// How the image maps onto the rect.
        object_fit: ObjectFit,
    },
    /// A text element.
    Text(TextNode),
}

/// One positioned box in the output tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// Position and size in output units (already scaled).
    pub rect: ElementRect,
    /// What to draw.
    pub content: RenderContent,
}

/// The composed visual description of a template.
///
/// Nodes are ordered back to front: the background node (when present)
/// first, then elements in their z-order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    /// The uniform scale factor applied to the whole composition.
    pub scale: f32,
    /// Output width (`config.width * scale`).
    pub width: f32,
    /// Output height (`config.height * scale`).
    pub height: f32,
    /// Positioned boxes, back to front.
    pub nodes: Vec<RenderNode>,
}

/// The uniform scale applied to the composed output.
///
/// `min(1, max_width / max(canvas_w, canvas_h))` when a maximum is given,
/// else 1. Scaling never enlarges.
pub fn scale_factor(config: &CanvasConfig, max_width: Option<f32>) -> f32 {
    match max_width {
        Some(limit) => (limit / config.width.max(config.height)).min(1.0),
        None => 1.0,
    }
}

/// Resolves the string an element displays.
///
/// Precedence: the substitution for the element's variable when present and
/// non-empty, else the payload's own default (`content` for text, `src` for
/// image), else a placeholder sentinel (`"{variableName}"` for text, a
/// generic placeholder URL for images). An empty substitution value counts
/// as "no override". Elements sharing a variable name all resolve the same
/// substitution.
pub fn display_value(element: &CanvasElement, substitutions: &HashMap<String, String>) -> String {
    let substituted = substitutions
        .get(&element.variable_name)
        .filter(|value| !value.is_empty());
    if let Some(value) = substituted {
        return value.clone();
    }

    match &element.payload {
        ElementPayload::Text(text) => {
            if text.content.is_empty() {
                format!("{{{}}}", element.variable_name)
            } else {
                text.content.clone()
            }
        }
        ElementPayload::Image(image) => {
            if image.src.is_empty() {
                constants::PLACEHOLDER_IMAGE_URL.to_string()
            } else {
                image.src.clone()
            }
        }
    }
}

fn scaled_rect(rect: ElementRect, scale: f32) -> ElementRect {
    ElementRect::new(
        rect.x * scale,
        rect.y * scale,
        rect.width * scale,
        rect.height * scale,
    )
}

/// Builds the visual description of a template.
///
/// # Arguments
///
/// * `config` - Canvas dimensions and background
/// * `elements` - Elements in z-order
/// * `substitutions` - Variable values keyed by `variable_name`
/// * `max_width` - Optional output size limit; the whole composition is
///   scaled uniformly to fit
///
/// # Returns
///
/// A [`RenderTree`] with every rect and font metric pre-scaled. Calling this
/// twice with identical inputs yields an identical tree.
pub fn render_template(
    config: &CanvasConfig,
    elements: &[CanvasElement],
    substitutions: &HashMap<String, String>,
    max_width: Option<f32>,
) -> RenderTree {
    let scale = scale_factor(config, max_width);
    let mut nodes = Vec::with_capacity(elements.len() + 1);

    if !config.background_image.is_empty() {
        let geometry = config.resolved_background_geometry();
        nodes.push(RenderNode {
            rect: scaled_rect(
                ElementRect::new(geometry.x, geometry.y, geometry.width, geometry.height),
                scale,
            ),
            content: RenderContent::Background {
                src: config.background_image.clone(),
                object_fit: geometry.object_fit,
            },
        });
    }

    for element in elements {
        let rect = scaled_rect(ElementRect::of_element(element), scale);
        let value = display_value(element, substitutions);

        let content = match &element.payload {
            ElementPayload::Text(text) => RenderContent::Text(TextNode {
                content: value,
                font_size: text.font_size * scale,
                font_family: text.font_family.clone(),
                font_weight: text.font_weight.clone(),
                color: text.color.clone(),
                text_align: text.text_align,
                letter_spacing: text.letter_spacing * scale,
                boxed: text.width.is_some() && text.height.is_some(),
                stroke: text
                    .stroke_color
                    .as_ref()
                    .filter(|_| text.stroke_width > 0.0)
                    .map(|color| TextStroke {
                        color: color.clone(),
                        width: text.stroke_width * scale,
                    }),
            }),
            ElementPayload::Image(image) => RenderContent::Image {
                src: value,
                object_fit: image.object_fit,
            },
        };

        nodes.push(RenderNode { rect, content });
    }

    RenderTree {
        scale,
        width: config.width * scale,
        height: config.height * scale,
        nodes,
    }
}

/// Maps image content onto a destination box per the object-fit policy.
///
/// # Arguments
///
/// * `fit` - The sizing policy
/// * `src_width`, `src_height` - Natural image dimensions in source pixels
/// * `dst` - Destination box in output units
///
/// # Returns
///
/// `(source_crop, dest_rect)`: the region of the source image to sample (in
/// source pixels) and the box to draw it into. Standard semantics: `fill`
/// stretches, `contain` letterboxes centered, `cover` center-crops, `none`
/// draws at natural size centered and clipped.
pub fn object_fit_rects(
    fit: ObjectFit,
    src_width: f32,
    src_height: f32,
    dst: ElementRect,
) -> (ElementRect, ElementRect) {
    let full_src = ElementRect::new(0.0, 0.0, src_width, src_height);
    if src_width <= 0.0 || src_height <= 0.0 || dst.width <= 0.0 || dst.height <= 0.0 {
        return (full_src, dst);
    }

    match fit {
        ObjectFit::Fill => (full_src, dst),
        ObjectFit::Contain => {
            let scale = (dst.width / src_width).min(dst.height / src_height);
            let draw_w = src_width * scale;
            let draw_h = src_height * scale;
            let dest = ElementRect::new(
                dst.x + (dst.width - draw_w) / 2.0,
                dst.y + (dst.height - draw_h) / 2.0,
                draw_w,
                draw_h,
            );
            (full_src, dest)
        }
        ObjectFit::Cover => {
            let scale = (dst.width / src_width).max(dst.height / src_height);
            let visible_w = dst.width / scale;
            let visible_h = dst.height / scale;
            let crop = ElementRect::new(
                (src_width - visible_w) / 2.0,
                (src_height - visible_h) / 2.0,
                visible_w,
                visible_h,
            );
            (crop, dst)
        }
        ObjectFit::None => {
            let (src_x, dst_x, w) = if src_width <= dst.width {
                (0.0, dst.x + (dst.width - src_width) / 2.0, src_width)
            } else {
                ((src_width - dst.width) / 2.0, dst.x, dst.width)
            };
            let (src_y, dst_y, h) = if src_height <= dst.height {
                (0.0, dst.y + (dst.height - src_height) / 2.0, src_height)
            } else {
                ((src_height - dst.height) / 2.0, dst.y, dst.height)
            };
            (
                ElementRect::new(src_x, src_y, w, h),
                ElementRect::new(dst_x, dst_y, w, h),
            )
        }
    }
}

/// Wraps text at word boundaries to fit within `max_width`.
///
/// `measure` returns the rendered width of a candidate line. A single word
/// wider than the limit is placed on its own line anyway. Returns at least
/// one line.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in words {
        let test_line = if current_line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current_line, word)
        };

        if measure(&test_line) <= max_width {
            current_line = test_line;
        } else if !current_line.is_empty() {
            lines.push(current_line);
            current_line = word.to_string();
        } else {
            // Single word too long, add it anyway
            lines.push(word.to_string());
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(text.to_string());
    }

    lines
}

/// The 8 canonical outline offsets at the given stroke width.
///
/// The outline effect draws the glyph silhouette once per offset in the
/// stroke color before the fill pass. Painter and exporter both use exactly
/// these offsets so live view and raster output match.
pub fn stroke_offsets(width: f32) -> [(f32, f32); 8] {
    [
        (-width, -width),
        (0.0, -width),
        (width, -width),
        (-width, 0.0),
        (width, 0.0),
        (-width, width),
        (0.0, width),
        (width, width),
    ]
}

/// Parses a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`) into RGBA bytes.
///
/// Anything unparseable falls back to opaque black, matching how the
/// original renderer treats junk color strings.
pub fn parse_color(css: &str) -> [u8; 4] {
    let hex = css.trim().strip_prefix('#').unwrap_or(css.trim());
    let nibble = |c: u8| -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    };
    let bytes = hex.as_bytes();

    let parsed = match bytes.len() {
        3 => {
            let mut out = [0u8; 4];
            out[3] = 255;
            for (i, &b) in bytes.iter().enumerate() {
                let n = match nibble(b) {
                    Some(n) => n,
                    None => return [0, 0, 0, 255],
                };
                out[i] = n << 4 | n;
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [0, 0, 0, 255u8];
            for i in 0..bytes.len() / 2 {
                let high = nibble(bytes[i * 2]);
                let low = nibble(bytes[i * 2 + 1]);
                match (high, low) {
                    (Some(h), Some(l)) => out[i] = h << 4 | l,
                    _ => return [0, 0, 0, 255],
                }
            }
            Some(out)
        }
        _ => None,
    };

    parsed.unwrap_or([0, 0, 0, 255])
}
