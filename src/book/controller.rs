/// Book controller
///
/// Owns the content, navigation state, animator, page surface, texture cache
/// and photo loader. The UI feeds it intents and a frame clock; after each
/// frame it exposes a `RenderState` describing everything that should be
/// drawn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::animator::{Direction, StepOutcome, TurnAnimator};
use super::input::Intent;
use super::layout::{BookLayout, CoverPose};
use super::surface::PageSurface;
use crate::page::assets::{AssetLoader, PhotoSet};
use crate::page::cache::{PageTexture, TextureCache};
use crate::page::render::PageRenderer;
use crate::state::config::BookConfig;
use crate::state::navigation::NavigationState;
use crate::state::pages::{PageMap, CONTENTS_PAGE};
use crate::state::quality::Quality;
use crate::state::store::ContentStore;

/// Stacks thinner than this are not drawn
const MIN_STACK_HEIGHT: f32 = 0.001;

/// A page lying flat on one side of the spine
#[derive(Debug, Clone)]
pub struct StaticPage {
    pub page: usize,
    pub elevation: f32,
    pub texture: Arc<PageTexture>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackState {
    pub height: f32,
    pub visible: bool,
}

/// The sheet currently in the air
#[derive(Debug, Clone)]
pub struct SheetState {
    pub progress: f32,
    pub clearance: f32,
    /// None past the last page
    pub front: Option<Arc<PageTexture>>,
    /// Already mirrored
    pub back: Option<Arc<PageTexture>>,
    /// Back page as it reads once the sheet lands on the left
    pub back_upright: Option<Arc<PageTexture>>,
}

/// Everything the view needs for one frame
#[derive(Debug, Clone)]
pub struct RenderState {
    pub spread: usize,
    pub animating: bool,
    pub cover: CoverPose,
    pub cover_open: bool,
    pub cover_texture: Arc<PageTexture>,
    /// Contents page, mirrored, on the inside of the front cover
    pub inside_cover: Arc<PageTexture>,
    /// Contents page as it reads once the cover lies open
    pub contents: Arc<PageTexture>,
    pub progress: Option<f32>,
    pub left: Option<StaticPage>,
    pub right: Option<StaticPage>,
    pub left_stack: StackState,
    pub right_stack: StackState,
    pub sheet: Option<SheetState>,
}

pub struct Book {
    store: ContentStore,
    map: PageMap,
    nav: NavigationState,
    animator: TurnAnimator,
    surface: PageSurface,
    cache: TextureCache,
    assets: AssetLoader,
    paper_grain: bool,
    /// Set by the asset loader's ready callback, consumed on the next frame
    photos_arrived: Arc<AtomicBool>,
    frame: RenderState,
}

impl Book {
    pub fn new(store: ContentStore, config: &BookConfig) -> Self {
        let map = PageMap::new(store.len());
        let layout = BookLayout::new(map.leaves());
        let quality = config.quality;

        let mut assets = AssetLoader::new();
        let photos_arrived = Arc::new(AtomicBool::new(false));
        let flag = photos_arrived.clone();
        assets.on_ready(move || flag.store(true, Ordering::SeqCst));

        let mut cache = TextureCache::new(quality);
        let nav = NavigationState::new(map.leaves(), quality);
        let animator = TurnAnimator::new(layout);

        let frame = {
            let renderer = PageRenderer::new(&store, &assets, config.paper_grain);
            build_frame(&map, &nav, &animator, &mut cache, &renderer)
        };

        log::info!(
            "📚 Book ready: {} entries, {} pages, {} leaves ({})",
            store.len(),
            map.page_count(),
            map.leaves(),
            quality.label()
        );

        Self {
            store,
            map,
            nav,
            animator,
            surface: PageSurface::new(quality.segments()),
            cache,
            assets,
            paper_grain: config.paper_grain,
            photos_arrived,
            frame,
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn map(&self) -> &PageMap {
        &self.map
    }

    pub fn nav(&self) -> &NavigationState {
        &self.nav
    }

    pub fn animator(&self) -> &TurnAnimator {
        &self.animator
    }

    pub fn surface(&self) -> &PageSurface {
        &self.surface
    }

    /// True when nothing moves until the next intent
    pub fn is_at_rest(&self) -> bool {
        self.animator.is_at_rest(self.nav.spread())
    }

    /// Render state produced by the last `step`
    pub fn frame(&self) -> &RenderState {
        &self.frame
    }

    pub fn photos_ready(&self) -> bool {
        self.assets.is_ready()
    }

    /// Apply a user intent. Returns false when it was rejected.
    pub fn handle(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Turn(direction) => self.turn(direction),
            Intent::BeginDrag {
                direction,
                x,
                range,
            } => self
                .animator
                .begin_drag(direction, x, range, &mut self.nav)
                .is_some(),
            Intent::DragTo(x) => {
                self.animator.drag_to(x);
                true
            }
            Intent::Release => {
                self.animator.release();
                true
            }
            Intent::JumpTo(spread) => self.jump_to(spread),
        }
    }

    pub fn turn(&mut self, direction: Direction) -> bool {
        self.animator.begin(direction, &mut self.nav).is_some()
    }

    /// Jump straight to a spread; closes the contents panel on success
    pub fn jump_to(&mut self, spread: usize) -> bool {
        if self.nav.is_animating() {
            return false;
        }
        self.nav.set_spread(spread as i64);
        self.nav.set_contents_open(false);
        log::debug!("📖 Jumped to spread {}", self.nav.spread());
        self.refresh();
        true
    }

    pub fn toggle_contents(&mut self) {
        self.nav.toggle_contents();
    }

    pub fn toggle_settings(&mut self) {
        self.nav.toggle_settings();
    }

    /// Switch tiers: textures are re-rasterized, the sheet re-meshed
    pub fn set_quality(&mut self, quality: Quality) {
        if quality == self.nav.quality() {
            return;
        }
        log::info!("🎚️  Quality -> {}", quality.label());

        self.nav.set_quality(quality);
        self.cache.invalidate_all();
        self.surface.rebuild(quality.segments());
        self.refresh();
    }

    /// Hand over the finished photo preload
    pub fn photos_loaded(&mut self, photos: Arc<PhotoSet>) {
        if self.assets.complete(photos) {
            self.refresh();
        }
    }

    /// Advance animation by `dt` seconds and rebuild the render state
    pub fn step(&mut self, dt: f32) {
        if let StepOutcome::Committed { completed: true } = self.animator.step(dt, &mut self.nav) {
            log::debug!("📖 Now at spread {}", self.nav.spread());
        }

        match self.animator.turn() {
            Some(turn) if turn.sheet.is_some() => {
                self.surface.deform(turn.progress, turn.clearance)
            }
            _ => self.surface.hide(),
        }

        self.refresh();
    }

    /// Rebuild the render state without advancing time
    fn refresh(&mut self) {
        if self.photos_arrived.swap(false, Ordering::SeqCst) {
            log::debug!("📸 Photos arrived, re-rasterizing pages");
            self.cache.invalidate_all();
        }
        self.rebuild_frame();
    }

    fn rebuild_frame(&mut self) {
        let renderer = PageRenderer::new(&self.store, &self.assets, self.paper_grain);
        self.frame = build_frame(
            &self.map,
            &self.nav,
            &self.animator,
            &mut self.cache,
            &renderer,
        );
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("nav", &self.nav)
            .field("turning", &self.animator.is_turning())
            .field("cached_textures", &self.cache.len())
            .finish_non_exhaustive()
    }
}

fn build_frame(
    map: &PageMap,
    nav: &NavigationState,
    animator: &TurnAnimator,
    cache: &mut TextureCache,
    renderer: &PageRenderer,
) -> RenderState {
    let quality = nav.quality();
    let spread = nav.spread();
    let layout = animator.layout();

    let cover_texture = cache.get(0, quality, false, renderer);
    let inside_cover = cache.get(CONTENTS_PAGE, quality, true, renderer);
    let contents = cache.get(CONTENTS_PAGE, quality, false, renderer);

    // Indices past the last page have no texture
    let mut texture = |page: usize, mirrored: bool| {
        map.page(page)
            .map(|page| cache.get(page, quality, mirrored, renderer))
    };

    let slots = animator.static_slots(spread);
    let (left_elevation, right_elevation) = layout.static_elevations(spread);
    let left = slots.left.and_then(|page| {
        texture(page, false).map(|texture| StaticPage {
            page,
            elevation: left_elevation,
            texture,
        })
    });
    let right = slots.right.and_then(|page| {
        texture(page, false).map(|texture| StaticPage {
            page,
            elevation: right_elevation,
            texture,
        })
    });

    let sheet = animator.turn().and_then(|turn| {
        let faces = turn.sheet?;
        Some(SheetState {
            progress: turn.progress,
            clearance: turn.clearance,
            front: texture(faces.front, false),
            back: texture(faces.back, true),
            back_upright: texture(faces.back, false),
        })
    });

    let cover_open = animator.cover_open();
    let (left_height, right_height) = layout.stack_heights(spread);
    let stack = |height: f32| StackState {
        height,
        visible: cover_open && height > MIN_STACK_HEIGHT,
    };

    RenderState {
        spread,
        animating: nav.is_animating(),
        cover: layout.cover_pose(animator.cover_angle()),
        cover_open,
        cover_texture,
        inside_cover,
        contents,
        progress: animator.turn().map(|turn| turn.progress),
        left,
        right,
        left_stack: stack(left_height),
        right_stack: stack(right_height),
        sheet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::navigation::Panel;
    use crate::state::store::fixtures::store_with;

    const FRAME: f32 = 1.0 / 60.0;

    fn book(entries: usize, quality: Quality) -> Book {
        let config = BookConfig {
            quality,
            paper_grain: false,
            ..BookConfig::default()
        };
        Book::new(store_with(entries), &config)
    }

    fn settle(book: &mut Book) {
        for _ in 0..1200 {
            book.step(FRAME);
        }
    }

    #[test]
    fn test_closed_book_shows_only_cover() {
        let book = book(4, Quality::Low);
        let frame = book.frame();

        assert_eq!(frame.spread, 0);
        assert!(!frame.cover_open);
        assert!(frame.left.is_none() && frame.right.is_none());
        assert!(!frame.left_stack.visible && !frame.right_stack.visible);
        assert_eq!(frame.cover_texture.key.page, 0);
        assert_eq!(frame.inside_cover.key.page, CONTENTS_PAGE);
        assert!(frame.inside_cover.key.mirrored);
    }

    #[test]
    fn test_full_turn_through_controller() {
        let mut book = book(6, Quality::Low);
        assert!(book.handle(Intent::Turn(Direction::Forward)));
        assert!(book.frame().sheet.is_none(), "no step yet");

        book.step(FRAME);
        assert!(book.frame().animating);
        // Cover turn: the cover moves, no sheet
        assert!(book.frame().sheet.is_none());
        assert!(!book.surface().is_visible());

        settle(&mut book);
        assert!(book.is_at_rest());
        let frame = book.frame();
        assert_eq!(frame.spread, 1);
        assert!(!frame.animating);
        assert!(frame.cover_open);
        // Left would be the contents page: it stays on the cover
        assert!(frame.left.is_none());
        assert_eq!(frame.right.as_ref().map(|p| p.page), Some(2));

        assert!(book.handle(Intent::Turn(Direction::Forward)));
        book.step(FRAME);
        let sheet = book.frame().sheet.clone().unwrap();
        assert_eq!(sheet.front.unwrap().key.page, 2);
        let back = sheet.back.unwrap();
        assert_eq!(back.key.page, 3);
        assert!(back.key.mirrored);
        assert!(!sheet.back_upright.unwrap().key.mirrored);
        assert!(book.surface().is_visible());

        settle(&mut book);
        assert_eq!(book.nav().spread(), 2);
        assert!(!book.surface().is_visible());
    }

    #[test]
    fn test_jump_rejected_while_animating() {
        let mut book = book(6, Quality::Low);
        book.toggle_contents();
        assert_eq!(book.nav().panel(), Some(Panel::Contents));

        book.handle(Intent::Turn(Direction::Forward));
        assert!(!book.handle(Intent::JumpTo(3)));
        assert_eq!(book.nav().panel(), Some(Panel::Contents));

        settle(&mut book);
        assert!(book.handle(Intent::JumpTo(3)));
        assert_eq!(book.nav().spread(), 3);
        assert_eq!(book.nav().panel(), None);

        assert!(book.jump_to(99));
        assert_eq!(book.nav().spread(), book.map().leaves());
    }

    #[test]
    fn test_quality_change_rebuilds_textures_and_mesh() {
        let mut book = book(4, Quality::Low);
        book.jump_to(2);
        settle(&mut book);
        assert_eq!(book.frame().right.as_ref().unwrap().texture.image.dimensions(), (512, 720));

        book.set_quality(Quality::High);
        assert_eq!(book.surface().segments(), 26);
        assert_eq!(
            book.frame().right.as_ref().unwrap().texture.image.dimensions(),
            Quality::High.resolution()
        );
        assert_eq!(book.frame().cover_texture.key.quality, Quality::High);
    }

    #[test]
    fn test_photos_trigger_rerasterization() {
        let mut book = book(2, Quality::Low);
        book.jump_to(1);
        settle(&mut book);
        let before = book.frame().right.clone().unwrap().texture;

        let mut photos = PhotoSet::default();
        photos.insert("animal1.jpg", image::RgbaImage::new(8, 8));
        book.photos_loaded(Arc::new(photos));

        assert!(book.photos_ready());
        let after = book.frame().right.clone().unwrap().texture;
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.epoch > before.epoch);
    }

    #[test]
    fn test_stacks_follow_spread() {
        let mut book = book(27, Quality::Low);
        let leaves = book.map().leaves();
        book.jump_to(leaves);
        settle(&mut book);

        let frame = book.frame();
        assert!(frame.left_stack.visible);
        assert!(!frame.right_stack.visible);
        assert_eq!(frame.right.as_ref().map(|p| p.page), None);
        assert_eq!(frame.left.as_ref().map(|p| p.page), Some(leaves * 2 - 1));
    }
}
