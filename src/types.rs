//! Core data types and structures for the template editor.
//!
//! This module defines all the fundamental data structures used throughout the
//! application: the canvas configuration, positioned elements with their text
//! or image payloads, and the template container that ties them together.
//!
//! All shapes serialize to the camelCase JSON exchanged with the template
//! storage service, with payloads discriminated by a `type` field.

use crate::constants;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for canvas elements.
pub type ElementId = Uuid;

/// Image-sizing policy governing how source content maps onto a target box
/// of a different aspect ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFit {
    /// Scale to fill the box, cropping overflow while preserving aspect ratio.
    #[default]
    Cover,
    /// Scale to fit entirely inside the box, preserving aspect ratio.
    Contain,
    /// Stretch to the box dimensions exactly.
    Fill,
    /// Draw at natural size, centered, clipped to the box.
    None,
}

/// Horizontal text alignment within an element's box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Align lines to the left edge.
    #[default]
    Left,
    /// Center lines horizontally.
    Center,
    /// Align lines to the right edge.
    Right,
}

/// Placement and fit of the background image within the canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundGeometry {
    /// Left edge of the background box in canvas units.
    pub x: f32,
    /// Top edge of the background box in canvas units.
    pub y: f32,
    /// Width of the background box.
    pub width: f32,
    /// Height of the background box.
    pub height: f32,
    /// How the background image content maps onto the box.
    pub object_fit: ObjectFit,
}

/// Canvas dimensions and background configuration for a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    /// Canvas width in world units. Always positive.
    pub width: f32,
    /// Canvas height in world units. Always positive.
    pub height: f32,
    /// URL of the background image, or empty for none.
    pub background_image: String,
    /// Explicit background placement. When `None`, the background covers the
    /// whole canvas (see [`CanvasConfig::resolved_background_geometry`]).
    pub background_geometry: Option<BackgroundGeometry>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: constants::DEFAULT_CANVAS_WIDTH,
            height: constants::DEFAULT_CANVAS_HEIGHT,
            background_image: String::new(),
            background_geometry: None,
        }
    }
}

impl CanvasConfig {
    /// Returns the effective background geometry.
    ///
    /// When no explicit geometry is set the background defaults to the full
    /// canvas at `(0, 0)` with `cover` fit. This is the single place that
    /// default is resolved; callers must not re-derive it.
    pub fn resolved_background_geometry(&self) -> BackgroundGeometry {
        self.background_geometry.unwrap_or(BackgroundGeometry {
            x: 0.0,
            y: 0.0,
            width: self.width,
            height: self.height,
            object_fit: ObjectFit::Cover,
        })
    }
}

/// Text content and styling for a text element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TextPayload {
    /// Default text shown when the bound variable has no substitution.
    pub content: String,
    /// Font size in canvas units. Always positive.
    pub font_size: f32,
    /// Font family name.
    pub font_family: String,
    /// CSS-style font weight ("normal", "bold", "700", ...).
    pub font_weight: String,
    /// Text fill color as a CSS hex string.
    pub color: String,
    /// Horizontal alignment within the box (only meaningful with a box).
    pub text_align: TextAlign,
    /// Additional spacing between glyphs in canvas units.
    pub letter_spacing: f32,
    /// Explicit box width. When absent together with `height`, the element
    /// is intrinsically sized to its content on a single line.
    pub width: Option<f32>,
    /// Explicit box height.
    pub height: Option<f32>,
    /// Outline color; no outline is drawn when absent.
    pub stroke_color: Option<String>,
    /// Outline thickness in canvas units. Never negative.
    pub stroke_width: f32,
}

impl Default for TextPayload {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: constants::DEFAULT_FONT_SIZE,
            font_family: "sans-serif".to_string(),
            font_weight: "normal".to_string(),
            color: "#000000".to_string(),
            text_align: TextAlign::Left,
            letter_spacing: 0.0,
            width: None,
            height: None,
            stroke_color: None,
            stroke_width: 0.0,
        }
    }
}

/// Image source and sizing for an image element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePayload {
    /// Default image URL shown when the bound variable has no substitution.
    pub src: String,
    /// Box width in canvas units. Always positive.
    pub width: f32,
    /// Box height in canvas units. Always positive.
    pub height: f32,
    /// How image content maps onto the box.
    pub object_fit: ObjectFit,
}

impl Default for ImagePayload {
    fn default() -> Self {
        Self {
            src: String::new(),
            width: constants::DEFAULT_IMAGE_WIDTH,
            height: constants::DEFAULT_IMAGE_HEIGHT,
            object_fit: ObjectFit::Cover,
        }
    }
}

/// The payload of a canvas element, discriminated by a `type` tag in JSON.
///
/// Every place that needs payload-specific layout or resize logic matches
/// this exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementPayload {
    /// A block of styled, variable-bound text.
    Text(TextPayload),
    /// A variable-bound image.
    Image(ImagePayload),
}

impl ElementPayload {
    /// Returns the payload's explicit size, if it has one.
    ///
    /// Image payloads always carry a size; text payloads only when both
    /// `width` and `height` are set.
    pub fn explicit_size(&self) -> Option<(f32, f32)> {
        match self {
            ElementPayload::Text(text) => match (text.width, text.height) {
                (Some(w), Some(h)) => Some((w, h)),
                _ => None,
            },
            ElementPayload::Image(image) => Some((image.width, image.height)),
        }
    }

    /// Returns the size used for bounds math, falling back to the intrinsic
    /// defaults for text elements without an explicit box.
    pub fn resolved_size(&self) -> (f32, f32) {
        match self {
            ElementPayload::Text(text) => (
                text.width.unwrap_or(constants::DEFAULT_TEXT_WIDTH),
                text.height.unwrap_or(constants::DEFAULT_TEXT_HEIGHT),
            ),
            ElementPayload::Image(image) => (image.width, image.height),
        }
    }

    /// Writes a new size into the payload, creating an explicit box for text.
    pub fn set_size(&mut self, width: f32, height: f32) {
        match self {
            ElementPayload::Text(text) => {
                text.width = Some(width);
                text.height = Some(height);
            }
            ElementPayload::Image(image) => {
                image.width = width;
                image.height = height;
            }
        }
    }
}

/// A positioned text or image object on the canvas, bound to a variable name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanvasElement {
    /// Unique identifier for this element.
    pub id: ElementId,
    /// Left edge in canvas units.
    pub x: f32,
    /// Top edge in canvas units.
    pub y: f32,
    /// Substitution key joining this element to an external value map.
    /// Uniqueness is not enforced; all elements sharing a name receive the
    /// same substitution.
    #[serde(rename = "variableName")]
    pub variable_name: String,
    /// The element's text or image payload.
    #[serde(rename = "data")]
    pub payload: ElementPayload,
}

impl CanvasElement {
    /// Creates a new text element at the given position.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Top-left position in canvas units
    /// * `variable_name` - Substitution key for the element
    ///
    /// # Returns
    ///
    /// A new element with a unique id and default text payload values.
    pub fn new_text(x: f32, y: f32, variable_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            variable_name,
            payload: ElementPayload::Text(TextPayload::default()),
        }
    }

    /// Creates a new image element at the given position.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Top-left position in canvas units
    /// * `variable_name` - Substitution key for the element
    ///
    /// # Returns
    ///
    /// A new element with a unique id and default image payload values.
    pub fn new_image(x: f32, y: f32, variable_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            variable_name,
            payload: ElementPayload::Image(ImagePayload::default()),
        }
    }
}

/// The serializable pair of canvas configuration and elements, plus the
/// metadata persisted by the external storage service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    /// User-visible template name.
    pub name: String,
    /// Canvas dimensions and background.
    pub config: CanvasConfig,
    /// All elements, in z-order (back to front).
    pub elements: Vec<CanvasElement>,
    /// Category this template belongs to, if any.
    pub category_id: Option<String>,
}

impl Template {
    /// Creates a new empty template with a default canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the template to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a template from a JSON string.
    ///
    /// Parsing is all-or-nothing: a malformed payload yields an error and no
    /// partially constructed template.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds an element to the template.
    ///
    /// # Returns
    ///
    /// The id of the newly added element.
    pub fn add_element(&mut self, element: CanvasElement) -> ElementId {
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Removes an element by id.
    ///
    /// # Returns
    ///
    /// The removed element, or `None` if no element had that id.
    pub fn remove_element(&mut self, id: &ElementId) -> Option<CanvasElement> {
        let index = self.elements.iter().position(|e| e.id == *id)?;
        Some(self.elements.remove(index))
    }

    /// Looks up an element by id.
    pub fn element(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == *id)
    }

    /// Looks up an element by id for mutation.
    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| e.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canvas_config_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.height, 600.0);
        assert!(config.background_image.is_empty());
        assert!(config.background_geometry.is_none());
    }

    #[test]
    fn test_background_geometry_defaults_to_full_canvas_cover() {
        let config = CanvasConfig {
            width: 1000.0,
            height: 800.0,
            ..Default::default()
        };

        let geometry = config.resolved_background_geometry();

        assert_eq!(
            geometry,
            BackgroundGeometry {
                x: 0.0,
                y: 0.0,
                width: 1000.0,
                height: 800.0,
                object_fit: ObjectFit::Cover,
            }
        );
    }

    #[test]
    fn test_explicit_background_geometry_is_preserved() {
        let config = CanvasConfig {
            background_geometry: Some(BackgroundGeometry {
                x: 10.0,
                y: 20.0,
                width: 300.0,
                height: 200.0,
                object_fit: ObjectFit::Contain,
            }),
            ..Default::default()
        };

        let geometry = config.resolved_background_geometry();
        assert_eq!(geometry.x, 10.0);
        assert_eq!(geometry.object_fit, ObjectFit::Contain);
    }

    #[test]
    fn test_text_element_creation() {
        let element = CanvasElement::new_text(100.0, 200.0, "title".to_string());

        assert_eq!(element.x, 100.0);
        assert_eq!(element.y, 200.0);
        assert_eq!(element.variable_name, "title");
        assert!(!element.id.is_nil());
        assert!(matches!(element.payload, ElementPayload::Text(_)));
    }

    #[test]
    fn test_text_payload_resolved_size_falls_back_to_defaults() {
        let payload = ElementPayload::Text(TextPayload::default());
        assert_eq!(payload.explicit_size(), None);
        assert_eq!(payload.resolved_size(), (100.0, 50.0));
    }

    #[test]
    fn test_text_payload_with_box_uses_explicit_size() {
        let payload = ElementPayload::Text(TextPayload {
            width: Some(240.0),
            height: Some(80.0),
            ..Default::default()
        });
        assert_eq!(payload.explicit_size(), Some((240.0, 80.0)));
        assert_eq!(payload.resolved_size(), (240.0, 80.0));
    }

    #[test]
    fn test_image_payload_always_has_explicit_size() {
        let payload = ElementPayload::Image(ImagePayload {
            width: 320.0,
            height: 180.0,
            ..Default::default()
        });
        assert_eq!(payload.explicit_size(), Some((320.0, 180.0)));
    }

    #[test]
    fn test_set_size_creates_text_box() {
        let mut payload = ElementPayload::Text(TextPayload::default());
        payload.set_size(200.0, 60.0);
        assert_eq!(payload.explicit_size(), Some((200.0, 60.0)));
    }

    #[test]
    fn test_payload_serializes_with_type_tag() {
        let element = CanvasElement::new_text(0.0, 0.0, "v".to_string());
        let json = serde_json::to_value(&element).unwrap();

        assert_eq!(json["data"]["type"], "text");
        assert_eq!(json["variableName"], "v");
    }

    #[test]
    fn test_image_payload_round_trip() {
        let original = CanvasElement {
            payload: ElementPayload::Image(ImagePayload {
                src: "https://example.com/a.png".to_string(),
                width: 64.0,
                height: 48.0,
                object_fit: ObjectFit::Contain,
            }),
            ..CanvasElement::new_image(5.0, 6.0, "logo".to_string())
        };

        let json = serde_json::to_string(&original).unwrap();
        let restored: CanvasElement = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_payload_deserializes_from_camel_case_json() {
        let json = r##"{
            "id": "6f9a2f41-74fc-4a27-bd4a-74f5b6a3d6a1",
            "x": 10,
            "y": 20,
            "variableName": "headline",
            "data": {
                "type": "text",
                "content": "Hello",
                "fontSize": 32,
                "textAlign": "center",
                "strokeColor": "#ffffff",
                "strokeWidth": 2
            }
        }"##;

        let element: CanvasElement = serde_json::from_str(json).unwrap();
        match &element.payload {
            ElementPayload::Text(text) => {
                assert_eq!(text.content, "Hello");
                assert_eq!(text.font_size, 32.0);
                assert_eq!(text.text_align, TextAlign::Center);
                assert_eq!(text.stroke_color.as_deref(), Some("#ffffff"));
                assert_eq!(text.stroke_width, 2.0);
                // Unspecified fields take the canonical defaults
                assert_eq!(text.letter_spacing, 0.0);
                assert_eq!(text.font_weight, "normal");
            }
            ElementPayload::Image(_) => panic!("expected text payload"),
        }
    }

    #[test]
    fn test_template_add_and_remove_element() {
        let mut template = Template::new();
        let element = CanvasElement::new_text(0.0, 0.0, "a".to_string());
        let id = template.add_element(element);

        assert_eq!(template.elements.len(), 1);
        assert!(template.element(&id).is_some());

        let removed = template.remove_element(&id);
        assert!(removed.is_some());
        assert!(template.elements.is_empty());
    }

    #[test]
    fn test_template_remove_nonexistent_element() {
        let mut template = Template::new();
        assert!(template.remove_element(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_template_round_trip_serialization() {
        let mut original = Template::new();
        original.name = "Launch banner".to_string();
        original.config.background_image = "https://example.com/bg.jpg".to_string();
        let text_id = original.add_element(CanvasElement::new_text(50.0, 60.0, "title".into()));
        let image_id = original.add_element(CanvasElement::new_image(200.0, 100.0, "logo".into()));

        let json = original.to_json().unwrap();
        let restored = Template::from_json(&json).unwrap();

        assert_eq!(restored.elements.len(), 2);
        assert_eq!(restored.name, "Launch banner");
        assert!(restored.element(&text_id).is_some());
        assert!(restored.element(&image_id).is_some());
        assert_eq!(restored, original);
    }

    #[test]
    fn test_malformed_template_fails_to_parse() {
        let json = r#"{"name": "x", "elements": [{"id": "not-a-uuid"}]}"#;
        assert!(Template::from_json(json).is_err());
    }
}
