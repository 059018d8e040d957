/// State management module
///
/// This module handles all application state, including:
/// - Content records and the bundled dataset (data.rs, store.rs)
/// - Page index / spread arithmetic (pages.rs)
/// - Quality tiers (quality.rs)
/// - Reading position and panel flags (navigation.rs)
/// - The config file (config.rs)

pub mod config;
pub mod data;
pub mod navigation;
pub mod pages;
pub mod quality;
pub mod store;
