//! Application state management structures.
//!
//! This module contains all the state structures that track the application's
//! current UI state, including the canvas view, in-flight gestures, file
//! operations, remote storage operations, and the main `EditorApp`.

use super::images::ImageCache;
use super::undo::UndoHistory;
use crate::constants;
use crate::geometry::ElementRect;
use crate::interaction::InteractionController;
use crate::storage::{TemplateRecord, TemplateSummary};
use crate::types::*;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

/// What is currently selected on the canvas: nothing, the background, or
/// exactly one element. Selection is exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    None,
    /// The canvas background is selected.
    Background,
    /// A single element is selected.
    Element(ElementId),
}

impl Selection {
    /// The selected element id, if an element is selected.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Selection::Element(id) => Some(*id),
            _ => None,
        }
    }
}

/// State related to canvas view navigation.
///
/// Pan and zoom are pure view state: they transform how the template is
/// displayed and never touch template geometry.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasViewState {
    /// Current canvas pan offset for navigation (in screen space)
    #[serde(skip)]
    pub offset: egui::Vec2,
    /// Current zoom level (1.0 = normal, 2.0 = 2x zoom, 0.5 = 50% zoom)
    pub zoom_factor: f32,
    /// Whether the initial centering of the canvas has been applied
    #[serde(skip)]
    pub centered: bool,
}

impl Default for CanvasViewState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
            centered: false,
        }
    }
}

/// State related to user interactions with the canvas.
#[derive(Default)]
pub struct InteractionState {
    /// Current selection (background, one element, or nothing)
    pub selection: Selection,
    /// The drag/resize gesture state machine
    pub controller: InteractionController,
    /// Geometry of the gesture target captured at gesture start, for undo
    pub gesture_start_rect: Option<ElementRect>,
    /// Whether any geometry was committed during the active gesture
    pub gesture_changed: bool,
    /// Whether the user is currently panning the canvas view
    pub is_panning: bool,
    /// Last mouse position during panning operation
    pub last_pan_pos: Option<egui::Pos2>,
}

/// State related to local file operations and persistence.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct FileState {
    /// Current file path for save/load operations
    #[serde(skip)]
    pub current_path: Option<String>,
    /// Flag indicating if the template has unsaved changes
    #[serde(skip)]
    pub has_unsaved_changes: bool,
    /// Pending file operations for WASM compatibility
    #[serde(skip)]
    pub pending_save_operation: Option<PendingSaveOperation>,
    #[serde(skip)]
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Channel for receiving file operation results from async contexts
    #[serde(skip)]
    pub file_operation_sender: Option<Sender<FileOperationResult>>,
    #[serde(skip)]
    pub file_operation_receiver: Option<Receiver<FileOperationResult>>,
    /// Whether to show an unsaved-changes confirmation dialog
    #[serde(skip)]
    pub show_unsaved_dialog: bool,
    /// The action the user attempted that requires confirmation
    #[serde(skip)]
    pub pending_confirm_action: Option<PendingConfirmAction>,
    /// One-shot flag to allow the next close request to proceed after user
    /// confirmation (native only)
    #[serde(skip)]
    pub allow_close_on_next_request: bool,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            has_unsaved_changes: false,
            pending_save_operation: None,
            pending_load_operation: None,
            file_operation_sender: Some(sender),
            file_operation_receiver: Some(receiver),
            show_unsaved_dialog: false,
            pending_confirm_action: None,
            allow_close_on_next_request: false,
        }
    }
}

/// Represents a pending save operation type.
#[derive(Debug)]
pub enum PendingSaveOperation {
    /// Save with a new file path (show file picker)
    SaveAs,
    /// Save to the existing file path
    Save,
}

/// Represents a pending load operation type.
#[derive(Debug)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker)
    Load,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(String),
    /// Load operation completed successfully with path and content
    LoadCompleted(String, String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// Pending confirmation actions that may require user approval due to
/// unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmAction {
    /// User is attempting to create a new template
    New,
    /// User is attempting to open a file
    Open,
    /// User is attempting to quit the application
    Quit,
}

/// Where an uploaded image URL should be applied once the service confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// Set the canvas background image
    Background,
    /// Set the `src` of this image element
    ElementSrc(ElementId),
}

/// Messages sent from async storage operations back to the main app.
#[derive(Debug)]
pub enum StoreOperationResult {
    /// A new template was stored under this id
    Saved(String),
    /// The stored template with this id was replaced
    Updated(String),
    /// A stored template arrived for editing
    Loaded(Box<TemplateRecord>),
    /// The stored template with this id is gone; safe to drop locally
    Deleted(String),
    /// The template listing refreshed
    Listed(Vec<TemplateSummary>),
    /// An image upload finished; apply the URL to the target
    Uploaded(UploadTarget, String),
    /// Operation failed with a user-facing message
    Failed(String),
}

/// State for the remote template storage service.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    /// Service origin, remembered across sessions
    pub base_url: String,
    /// Id of the currently loaded stored template, if it came from (or was
    /// saved to) the service
    #[serde(skip)]
    pub remote_id: Option<String>,
    /// Cached template listing
    #[serde(skip)]
    pub templates: Vec<TemplateSummary>,
    /// Whether a storage operation is in flight
    #[serde(skip)]
    pub busy: bool,
    /// Last status or error message for the status line
    #[serde(skip)]
    pub status: Option<String>,
    /// Inline validation message shown next to the name field
    #[serde(skip)]
    pub validation_error: Option<String>,
    /// Whether the template browser window is open
    #[serde(skip)]
    pub show_browser: bool,
    /// Whether the embed dialog is open
    #[serde(skip)]
    pub show_embed_dialog: bool,
    /// Channel for receiving storage operation results
    #[serde(skip)]
    pub sender: Option<Sender<StoreOperationResult>>,
    #[serde(skip)]
    pub receiver: Option<Receiver<StoreOperationResult>>,
}

impl Default for StoreState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            base_url: "http://localhost:8080".to_string(),
            remote_id: None,
            templates: Vec::new(),
            busy: false,
            status: None,
            validation_error: None,
            show_browser: false,
            show_embed_dialog: false,
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }
}

/// The main application structure containing UI state and the template
/// being edited.
///
/// This struct implements the `eframe::App` trait and is the sole owner of
/// the element list and canvas configuration; every mutation (gestures,
/// property edits, loads) is committed here.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct EditorApp {
    /// The template being edited
    pub template: Template,
    /// Preview substitutions in query-string form, editable in the panel
    pub preview_query: String,
    /// Substitutions captured from the hosting page at startup
    #[serde(skip)]
    pub page_substitutions: HashMap<String, String>,
    /// Counter for generating unique default variable names
    pub element_counter: u32,
    /// Canvas view navigation state
    pub canvas: CanvasViewState,
    /// User interaction state
    #[serde(skip)]
    pub interaction: InteractionState,
    /// Local file operations state
    pub file: FileState,
    /// Remote storage state
    pub store: StoreState,
    /// Image fetch and texture cache
    #[serde(skip)]
    pub images: ImageCache,
    /// Undo/redo history for tracking and reversing actions
    pub undo_history: UndoHistory,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Remembered width of the properties panel across sessions
    pub properties_panel_width: f32,
    /// Whether the scaled preview window is open
    pub show_preview: bool,
    /// Scale multiplier for PNG export
    pub png_export_scale: f32,
}

impl Default for EditorApp {
    fn default() -> Self {
        Self {
            template: Template::new(),
            preview_query: String::new(),
            page_substitutions: crate::vars::page_substitutions(),
            element_counter: 0,
            canvas: CanvasViewState::default(),
            interaction: InteractionState::default(),
            file: FileState::default(),
            store: StoreState::default(),
            images: ImageCache::default(),
            undo_history: UndoHistory::new(),
            dark_mode: true,
            properties_panel_width: 300.0,
            show_preview: false,
            png_export_scale: 1.0,
        }
    }
}

impl EditorApp {
    /// Serializes the application state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes application state from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The substitutions currently in effect for the live canvas and
    /// preview: the editable preview query merged over the page's own
    /// query parameters.
    pub fn active_substitutions(&self) -> HashMap<String, String> {
        let mut substitutions = self.page_substitutions.clone();
        substitutions.extend(crate::vars::parse_query(&self.preview_query));
        substitutions
    }

    /// Generates the next default variable name (`var1`, `var2`, ...).
    pub fn next_variable_name(&mut self) -> String {
        self.element_counter += 1;
        format!("var{}", self.element_counter)
    }

    /// Creates a new text element near the canvas center and selects it.
    pub fn create_text_element(&mut self) -> ElementId {
        let name = self.next_variable_name();
        let (x, y) = self.spawn_position(constants::DEFAULT_TEXT_WIDTH, constants::DEFAULT_TEXT_HEIGHT);
        let id = self.template.add_element(CanvasElement::new_text(x, y, name));
        self.finish_creation(id)
    }

    /// Creates a new image element near the canvas center and selects it.
    pub fn create_image_element(&mut self) -> ElementId {
        let name = self.next_variable_name();
        let (x, y) = self.spawn_position(
            constants::DEFAULT_IMAGE_WIDTH,
            constants::DEFAULT_IMAGE_HEIGHT,
        );
        let id = self
            .template
            .add_element(CanvasElement::new_image(x, y, name));
        self.finish_creation(id)
    }

    fn spawn_position(&self, width: f32, height: f32) -> (f32, f32) {
        let rect = crate::geometry::clamp_position(
            ElementRect::new(
                (self.template.config.width - width) / 2.0,
                (self.template.config.height - height) / 2.0,
                width,
                height,
            ),
            (&self.template.config).into(),
        );
        (rect.x, rect.y)
    }

    fn finish_creation(&mut self, id: ElementId) -> ElementId {
        self.interaction.selection = Selection::Element(id);
        self.undo_history
            .push_action(super::undo::UndoAction::ElementCreated { element_id: id });
        self.file.has_unsaved_changes = true;
        id
    }

    /// Deletes the selected element, recording undo.
    pub fn delete_selected_element(&mut self) {
        let Some(id) = self.interaction.selection.element() else {
            return;
        };
        let Some(index) = self.template.elements.iter().position(|e| e.id == id) else {
            return;
        };
        let element = self.template.elements.remove(index);
        self.undo_history
            .push_action(super::undo::UndoAction::ElementDeleted { element, index });
        self.interaction.selection = Selection::None;
        self.file.has_unsaved_changes = true;
    }

    /// Resets to an empty template, clearing selection, history and the
    /// remote binding.
    pub fn new_template(&mut self) {
        self.template = Template::new();
        self.file.current_path = None;
        self.file.has_unsaved_changes = false;
        self.interaction.selection = Selection::None;
        self.interaction.controller = InteractionController::new();
        self.element_counter = 0;
        self.store.remote_id = None;
        self.undo_history.clear();
        self.images.clear();
        self.canvas.offset = egui::Vec2::ZERO;
        self.canvas.zoom_factor = 1.0;
        self.canvas.centered = false;
    }

    /// Replaces the whole editing state with a loaded template.
    pub fn install_template(&mut self, template: Template) {
        self.template = template;
        self.interaction.selection = Selection::None;
        self.interaction.controller = InteractionController::new();
        self.undo_history.clear();
        self.images.clear();
        self.element_counter = self.template.elements.len() as u32;
        self.file.has_unsaved_changes = false;
    }
}
