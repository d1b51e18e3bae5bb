//! # Placard
//!
//! A visual editor for composing image templates: a canvas holding a
//! background image and positioned text/image elements, each bound to a
//! named variable substituted at render time.
//!
//! ## Features
//! - Direct-manipulation canvas: drag and resize elements and the background
//!   against the canvas bounds with eight-direction handles
//! - A deterministic render function shared by the live canvas, the scaled
//!   preview and SVG/PNG export
//! - Variable substitution from the page query string, with an embed URL
//!   that reproduces the same output server-side
//! - Template storage service integration (save/load/update/delete/list)
//!   and image uploads
//! - Undo/redo, local template files, canvas view panning and zooming

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod constants;
mod geometry;
mod interaction;
mod render;
mod storage;
mod types;
mod ui;
mod vars;

// Re-export public types and functions
pub use constants::*;
pub use geometry::*;
pub use interaction::*;
pub use render::*;
pub use storage::*;
pub use types::*;
pub use vars::{embed_tag, embed_url, page_substitutions, parse_query};

#[cfg(not(target_arch = "wasm32"))]
use ui::EditorApp;

/// Runs the template editor application with default settings.
///
/// This function initializes the egui application window, restores any
/// persisted editor state, and starts the main event loop. Background work
/// (file dialogs, storage calls, image fetches) runs on a tokio runtime
/// entered for the lifetime of the app.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an
/// `eframe::Error` if initialization fails.
///
/// # Example
///
/// ```no_run
/// use placard::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to start async runtime");
    let _guard = runtime.enter();

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Placard",
        options,
        Box::new(|cc| {
            let app = cc
                .storage
                .and_then(|storage| storage.get_string("app_state"))
                .and_then(|json| EditorApp::from_json(&json).ok())
                .unwrap_or_default();
            Ok(Box::new(app))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_default() {
        let template = Template::default();
        assert!(template.elements.is_empty());
        assert!(template.name.is_empty());
        assert_eq!(template.config.width, DEFAULT_CANVAS_WIDTH);
    }

    #[test]
    fn test_public_render_surface() {
        let tree = render_template(
            &CanvasConfig::default(),
            &[],
            &std::collections::HashMap::new(),
            None,
        );
        assert_eq!(tree.scale, 1.0);
        assert!(tree.nodes.is_empty());
    }
}
