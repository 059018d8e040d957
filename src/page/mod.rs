/// Page rasterization
///
/// This module handles:
/// - A small software canvas with bitmap text (canvas.rs)
/// - The page layouts: covers, contents, entries (render.rs)
/// - Background photo loading (assets.rs)
/// - Caching rendered pages per quality tier (cache.rs)

pub mod assets;
pub mod cache;
pub mod canvas;
pub mod render;
