//! # Schema Builder
//!
//! A node-based editor for agricultural test-result schemas. Cards for lab
//! results and plain fields are placed on a pannable canvas; cards dropped side
//! by side can be linked, and each result card grows a cascade of panels for
//! setting a monitoring condition, comparing the trend, recording a field
//! action and enabling recommendations.
//!
//! ## Features
//! - Palette of card kinds grouped by category
//! - Card dragging with grid snapping on release
//! - Proximity linking with unit checks
//! - Per-card and per-link (combined) monitoring rules
//! - JSON preview of the whole schema

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod constants;
mod error;
pub mod flow;
pub mod geometry;
pub mod rules;
pub mod trend;
mod types;
mod ui;

// Re-export public types and functions
pub use error::*;
pub use types::*;
pub use ui::{EditorSettings, SchemaBuilderApp};

/// Runs the schema builder with default window settings.
///
/// Editor settings are restored from eframe storage when available.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use schema_builder::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Schema Builder")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    log::info!("Starting Schema Builder");
    eframe::run_native(
        "Schema Builder",
        options,
        Box::new(|cc| Ok(Box::new(SchemaBuilderApp::new(cc)))),
    )
}
