/// Page texture cache
///
/// Rasterizing a page is expensive (text layout, photo resampling), so each
/// (page, quality, mirrored) combination is rendered once and shared. The
/// cache is dropped wholesale when the quality tier changes or the photos
/// finish loading; the epoch counter lets holders of old textures notice.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use iced::widget::image::Handle;
use image::RgbaImage;

use super::render::Rasterize;
use crate::state::quality::Quality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub page: usize,
    pub quality: Quality,
    pub mirrored: bool,
}

/// A rasterized page plus its lazily created UI handle
#[derive(Debug)]
pub struct PageTexture {
    pub key: TextureKey,
    /// Cache epoch the texture was produced in
    pub epoch: u64,
    pub image: RgbaImage,
    handle: OnceLock<Handle>,
}

impl PageTexture {
    fn new(key: TextureKey, epoch: u64, image: RgbaImage) -> Self {
        Self {
            key,
            epoch,
            image,
            handle: OnceLock::new(),
        }
    }

    /// Image handle for iced widgets; built on first use
    pub fn handle(&self) -> Handle {
        self.handle
            .get_or_init(|| {
                Handle::from_rgba(
                    self.image.width(),
                    self.image.height(),
                    self.image.as_raw().clone(),
                )
            })
            .clone()
    }
}

#[derive(Debug)]
pub struct TextureCache {
    entries: HashMap<TextureKey, Arc<PageTexture>>,
    quality: Quality,
    epoch: u64,
}

impl TextureCache {
    pub fn new(quality: Quality) -> Self {
        Self {
            entries: HashMap::new(),
            quality,
            epoch: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Tier of the textures currently held
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Cached texture for the key, rasterizing it on a miss.
    /// Asking for a different tier than the cache holds flushes it first.
    pub fn get(
        &mut self,
        page: usize,
        quality: Quality,
        mirrored: bool,
        raster: &dyn Rasterize,
    ) -> Arc<PageTexture> {
        if quality != self.quality {
            self.invalidate_all();
            self.quality = quality;
        }

        let key = TextureKey {
            page,
            quality,
            mirrored,
        };
        let epoch = self.epoch;
        self.entries
            .entry(key)
            .or_insert_with(|| {
                log::debug!(
                    "🖌️  Rasterizing page {} ({}{})",
                    page,
                    quality.label(),
                    if mirrored { ", mirrored" } else { "" }
                );
                Arc::new(PageTexture::new(
                    key,
                    epoch,
                    raster.rasterize(page, quality, mirrored),
                ))
            })
            .clone()
    }

    /// Drop every texture and start a new epoch
    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("🗑️  Dropping {} cached page textures", self.entries.len());
        }
        self.entries.clear();
        self.epoch += 1;
    }
}
