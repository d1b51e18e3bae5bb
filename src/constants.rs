//! Shared application-wide constants.
//! Centralizes tweakable values used across geometry, rendering and interactions.

// Canvas defaults
/// Default canvas width in world units for a new template.
pub const DEFAULT_CANVAS_WIDTH: f32 = 800.0;
/// Default canvas height in world units for a new template.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;

// Element sizing
/// Minimum width/height an element may be resized to (world units).
pub const MIN_ELEMENT_SIZE: f32 = 20.0;
/// Fallback width used for text elements without an explicit box.
pub const DEFAULT_TEXT_WIDTH: f32 = 100.0;
/// Fallback height used for text elements without an explicit box.
pub const DEFAULT_TEXT_HEIGHT: f32 = 50.0;
/// Default width for newly created image elements.
pub const DEFAULT_IMAGE_WIDTH: f32 = 150.0;
/// Default height for newly created image elements.
pub const DEFAULT_IMAGE_HEIGHT: f32 = 150.0;
/// Default font size for newly created text elements.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

// Placeholders
/// Image drawn for an image element whose variable has no value and whose
/// payload has no src.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/150x150";

// Resize handles
/// Radius of the square resize handles drawn on the selected target (screen pixels).
pub const HANDLE_RADIUS: f32 = 4.0;
/// Hit-test slop around a handle center (screen pixels).
pub const HANDLE_HIT_RADIUS: f32 = 7.0;

// Canvas view
/// Minimum view zoom factor.
pub const MIN_ZOOM: f32 = 0.25;
/// Maximum view zoom factor.
pub const MAX_ZOOM: f32 = 5.0;

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;
