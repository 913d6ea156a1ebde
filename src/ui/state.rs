//! Application state management structures.
//!
//! This module contains the state structures that track the editor's current
//! UI state, including canvas navigation, the active gesture, file operations,
//! and the main [`FloorplanApp`] struct.

use crate::document::Project;
use crate::guides::GuideLine;
use crate::manipulate::Manipulation;
use crate::transform::Viewport;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// The tool currently armed on the canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Tool {
    /// Select, move, resize, and rotate existing objects.
    #[default]
    Select,
    /// Click to place a furniture item.
    PlaceFurniture,
    /// Click to place a rectangle drawing element.
    DrawRect,
    /// Click to place a circle drawing element.
    DrawCircle,
    /// Click twice to place a line (first click = start, second = end).
    DrawLine,
    /// Click to place a text label.
    DrawText,
}

/// State related to canvas navigation and display.
///
/// Tracks the viewport (zoom, pan, display scale) and grid options.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasState {
    /// Zoom/pan/scale mapping between document mm and screen pixels.
    #[serde(skip)]
    pub viewport: Viewport,
    /// Whether the grid should be displayed on the canvas.
    pub show_grid: bool,
    /// Whether grid snapping is active.
    pub snap_enabled: bool,
    /// Grid cell size in document mm.
    pub grid_size_mm: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            show_grid: true,
            snap_enabled: true,
            grid_size_mm: crate::constants::DEFAULT_GRID_SIZE_MM,
        }
    }
}

/// State related to user interactions with objects and the canvas.
///
/// Tracks the active gesture, panning, pending line placement, and
/// name/calibration editing buffers. All of it is transient.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionState {
    /// The active manipulation gesture, if any.
    #[serde(skip)]
    pub gesture: Manipulation,
    /// Alignment guides produced by the current drag, redrawn each frame.
    #[serde(skip)]
    pub active_guides: Vec<GuideLine>,
    /// Whether the user is currently panning the canvas.
    #[serde(skip)]
    pub is_panning: bool,
    /// Last pointer position during a pan, in screen space.
    #[serde(skip)]
    pub last_pan_pos: Option<egui::Pos2>,
    /// First endpoint of a line being placed, in mm. Set by the first click
    /// of the line tool, consumed by the second.
    #[serde(skip)]
    pub pending_line_start: Option<egui::Pos2>,
    /// Entity whose name is being edited in the side panel.
    #[serde(skip)]
    pub editing_entity_name: Option<crate::types::EntityId>,
    /// Temporary storage for the name while editing.
    #[serde(skip)]
    pub temp_entity_name: String,
    /// Temporary calibration inputs: measured pixel length and real mm.
    #[serde(skip)]
    pub temp_calibration_px: String,
    #[serde(skip)]
    pub temp_calibration_mm: String,
    /// Temporary text content for the text tool.
    #[serde(skip)]
    pub temp_text_content: String,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            gesture: Manipulation::Idle,
            active_guides: Vec::new(),
            is_panning: false,
            last_pan_pos: None,
            pending_line_start: None,
            editing_entity_name: None,
            temp_entity_name: String::new(),
            temp_calibration_px: String::new(),
            temp_calibration_mm: String::new(),
            temp_text_content: String::new(),
        }
    }
}

/// State related to file operations and persistence.
///
/// Manages file paths, unsaved changes tracking, and async file operations.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct FileState {
    /// Current file path for save/load operations.
    #[serde(skip)]
    pub current_path: Option<String>,
    /// Flag indicating if the project has unsaved changes.
    #[serde(skip)]
    pub has_unsaved_changes: bool,
    /// Pending file operations for WASM compatibility.
    #[serde(skip)]
    pub pending_save_operation: Option<PendingSaveOperation>,
    #[serde(skip)]
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Channel for receiving file operation results from async contexts.
    #[serde(skip)]
    pub file_operation_sender: Option<Sender<FileOperationResult>>,
    #[serde(skip)]
    pub file_operation_receiver: Option<Receiver<FileOperationResult>>,
    /// Whether to show an unsaved-changes confirmation dialog.
    #[serde(skip)]
    pub show_unsaved_dialog: bool,
    /// The action the user attempted that requires confirmation.
    #[serde(skip)]
    pub pending_confirm_action: Option<PendingConfirmAction>,
    /// One-shot flag to allow the next close request to proceed after user
    /// confirmation (native only).
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
    /// Save with a new file path (show file picker).
    SaveAs,
    /// Save to the existing file path.
    Save,
}

/// Represents a pending load operation type.
#[derive(Debug)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker).
    Load,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path.
    SaveCompleted(String),
    /// Load operation completed successfully with path and content.
    LoadCompleted(String, String),
    /// Operation failed with an error message.
    OperationFailed(String),
}

/// Pending confirmation actions that may require user approval due to
/// unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmAction {
    /// User is attempting to create a new project.
    New,
    /// User is attempting to open a file.
    Open,
    /// User is attempting to quit the application.
    Quit,
}

/// The main application structure containing UI state and the project data.
///
/// This struct implements the `eframe::App` trait and handles all user
/// interface rendering and interaction logic.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct FloorplanApp {
    /// The project being edited.
    pub project: Project,
    /// The tool armed on the canvas.
    pub active_tool: Tool,
    /// Counter for generating unique default furniture names.
    pub furniture_counter: u32,
    /// Counter for generating unique default drawing-element names.
    pub drawing_counter: u32,
    /// Canvas navigation and display state.
    pub canvas: CanvasState,
    /// User interaction state.
    pub interaction: InteractionState,
    /// File operations state.
    pub file: FileState,
    /// Whether dark mode visuals are enabled.
    pub dark_mode: bool,
    /// Remembered width of the side panel across sessions.
    pub side_panel_width: f32,
}

impl Default for FloorplanApp {
    fn default() -> Self {
        Self {
            project: Project::default(),
            active_tool: Tool::Select,
            furniture_counter: 0,
            drawing_counter: 0,
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            file: FileState::default(),
            dark_mode: true,
            side_panel_width: 280.0,
        }
    }
}

impl FloorplanApp {
    /// Serializes the application state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes application state from JSON.
    ///
    /// Histories are transient and come back seeded with an unrelated
    /// default snapshot, so every page's history is reseeded from its
    /// loaded state; otherwise the first undo after a restart would walk
    /// back into an empty document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut app: Self = serde_json::from_str(json)?;
        for page in &mut app.project.pages {
            page.model.reset_history();
        }
        Ok(app)
    }

}
