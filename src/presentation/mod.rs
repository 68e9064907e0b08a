//! Presentation layer with headless display targets and event dispatch.

/// Result dispatch on the UI task.
pub mod dispatcher;
/// Scrolling photo grid.
pub mod grid;
/// Full-screen preview.
pub mod preview;
/// Target lookup.
pub mod screen;

pub use dispatcher::{SettleReport, UiDispatcher};
pub use grid::{BindReport, GridCell, PhotoGrid};
pub use preview::PreviewPane;
pub use screen::PhotoScreen;
