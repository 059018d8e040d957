/// Entry photograph loader
///
/// Photos are decoded once, in the background, before the first page that
/// needs them is rasterized. Until then the entry pages draw a placeholder.
/// A photo that fails to load counts as finished; it just stays a placeholder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use tokio::task;
use walkdir::WalkDir;

use crate::error::{BookError, Result};

/// Longest edge kept in memory; the largest image panel is ~560px
const MAX_PHOTO_EDGE: u32 = 768;

/// Result of a preload pass
#[derive(Default)]
pub struct PhotoSet {
    photos: HashMap<String, RgbaImage>,
    failed: Vec<String>,
}

impl PhotoSet {
    pub fn insert(&mut self, file: impl Into<String>, photo: RgbaImage) {
        self.photos.insert(file.into(), photo);
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Filenames that could not be found or decoded
    pub fn failed(&self) -> &[String] {
        &self.failed
    }
}

impl std::fmt::Debug for PhotoSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoSet")
            .field("loaded", &self.photos.len())
            .field("failed", &self.failed)
            .finish()
    }
}

type ReadyCallback = Box<dyn FnOnce() + Send>;

/// Holds decoded photos and tells interested parties when loading is done
#[derive(Default)]
pub struct AssetLoader {
    photos: Arc<PhotoSet>,
    ready: bool,
    callbacks: Vec<ReadyCallback>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Decoded photo for a filename, if it loaded
    pub fn photo(&self, file: &str) -> Option<&RgbaImage> {
        self.photos.photos.get(file)
    }

    /// Run `callback` once loading completes; immediately if it already has
    pub fn on_ready(&mut self, callback: impl FnOnce() + Send + 'static) {
        if self.ready {
            callback();
        } else {
            self.callbacks.push(Box::new(callback));
        }
    }

    /// Store a finished preload and fire the pending callbacks.
    /// Returns false if loading had already completed.
    pub fn complete(&mut self, set: Arc<PhotoSet>) -> bool {
        if self.ready {
            log::warn!("⚠️  Photo set delivered twice; ignoring the second one");
            return false;
        }

        self.photos = set;
        self.ready = true;
        for callback in self.callbacks.drain(..) {
            callback();
        }
        true
    }
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("photos", &self.photos.len())
            .field("ready", &self.ready)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// Decode every referenced photo found under `dir`
///
/// Never fails as a whole: individual failures are logged and recorded in
/// the returned set.
pub async fn preload(dir: PathBuf, files: Vec<String>) -> Arc<PhotoSet> {
    // Decoding is CPU-bound; keep it off the runtime threads
    let joined = task::spawn_blocking(move || load_photos_blocking(&dir, &files))
        .await
        .map_err(|e| BookError::Join(e.to_string()));

    match joined {
        Ok(set) => Arc::new(set),
        Err(e) => {
            log::error!("❌ {}", e);
            Arc::new(PhotoSet::default())
        }
    }
}

/// Blocking implementation of the preload
pub fn load_photos_blocking(dir: &Path, files: &[String]) -> PhotoSet {
    log::info!("🔍 Scanning {} for {} photos", dir.display(), files.len());

    let index = index_dir(dir);
    let mut set = PhotoSet::default();

    for file in files {
        let loaded = index
            .get(file)
            .ok_or_else(|| BookError::PhotoMissing {
                file: file.clone(),
                dir: dir.to_path_buf(),
            })
            .and_then(|path| decode_photo(path));

        match loaded {
            Ok(photo) => {
                set.insert(file.clone(), photo);
            }
            Err(e) => {
                log::warn!("⚠️  {}", e);
                set.failed.push(file.clone());
            }
        }
    }

    log::info!(
        "📸 Loaded {}/{} photos ({} failed)",
        set.len(),
        files.len(),
        set.failed.len()
    );
    set
}

/// Map of filename -> path for every file below `dir`.
/// The first occurrence wins when a name appears in several subdirectories.
fn index_dir(dir: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        index.entry(name).or_insert_with(|| entry.path().to_path_buf());
    }

    index
}

/// Decode and downscale a single photo
fn decode_photo(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|source| BookError::PhotoDecode {
        path: path.to_path_buf(),
        source,
    })?;

    let img = if img.width() > MAX_PHOTO_EDGE || img.height() > MAX_PHOTO_EDGE {
        img.thumbnail(MAX_PHOTO_EDGE, MAX_PHOTO_EDGE)
    } else {
        img
    };

    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "book-of-animals-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_callbacks_fire_once_on_complete() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut loader = AssetLoader::new();

        let counter = fired.clone();
        loader.on_ready(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert!(loader.complete(Arc::default()));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(loader.is_ready());

        // Late subscribers run immediately
        let counter = fired.clone();
        loader.on_ready(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        assert!(!loader.complete(Arc::default()));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_load_finds_nested_and_reports_missing() {
        let dir = temp_dir("photos");
        let nested = dir.join("mammals");
        std::fs::create_dir_all(&nested).unwrap();

        RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]))
            .save(nested.join("fox.png"))
            .unwrap();
        std::fs::write(dir.join("broken.png"), b"not a png").unwrap();

        let files = vec![
            "fox.png".to_string(),
            "broken.png".to_string(),
            "absent.png".to_string(),
        ];
        let set = load_photos_blocking(&dir, &files);

        assert_eq!(set.len(), 1);
        assert_eq!(set.failed(), ["broken.png".to_string(), "absent.png".to_string()]);

        let mut loader = AssetLoader::new();
        loader.complete(Arc::new(set));
        assert_eq!(*loader.photo("fox.png").unwrap().get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert!(loader.photo("absent.png").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_large_photos_are_downscaled() {
        let dir = temp_dir("large");
        RgbaImage::from_pixel(1600, 800, Rgba([0, 0, 0, 255]))
            .save(dir.join("whale.png"))
            .unwrap();

        let set = load_photos_blocking(&dir, &["whale.png".to_string()]);
        let mut loader = AssetLoader::new();
        loader.complete(Arc::new(set));

        let photo = loader.photo("whale.png").unwrap();
        assert_eq!(photo.width(), MAX_PHOTO_EDGE);
        assert_eq!(photo.height(), MAX_PHOTO_EDGE / 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory_marks_all_failed() {
        let dir = std::env::temp_dir().join("book-of-animals-no-such-photo-dir");
        let set = load_photos_blocking(&dir, &["owl.jpg".to_string()]);
        assert!(set.is_empty());
        assert_eq!(set.failed().len(), 1);
    }
}
