/// User interface
///
/// This module handles:
/// - The top-down spread of page images (spread.rs)
/// - The edge-on profile and pointer input (canvas.rs)
/// - Toolbar, contents and settings panels (panels.rs)

pub mod canvas;
pub mod panels;
pub mod spread;
