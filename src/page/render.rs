/// Page rasterizer
///
/// Turns a page index into an RGBA image for a given quality tier. The layout
/// is chosen from the page index: front cover, table of contents, one page
/// per entry, back cover. Nothing here is cached; see `cache.rs`.

use embedded_graphics::text::Baseline;
use image::RgbaImage;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::assets::AssetLoader;
use super::canvas::{Align, Face, PageCanvas, TextStyle};
use crate::color::{badge_color, palette, with_alpha};
use crate::state::data::Entity;
use crate::state::pages::{PageKind, PageMap};
use crate::state::quality::Quality;
use crate::state::store::ContentStore;

/// Number of grain speckles laid under each page
const GRAIN_SPECKLES: usize = 160;

/// Corner radius of the image panel and badge, in pixels
const PANEL_RADIUS: f32 = 8.0;
const BADGE_RADIUS: f32 = 6.0;

/// Marker in front of the fun fact
const FACT_MARKER: char = '»';

/// Anything that can produce a page texture
pub trait Rasterize {
    fn rasterize(&self, page: usize, quality: Quality, mirrored: bool) -> RgbaImage;
}

/// Draws pages from the content store, using photos that have finished loading
pub struct PageRenderer<'a> {
    store: &'a ContentStore,
    assets: &'a AssetLoader,
    map: PageMap,
    paper_grain: bool,
}

impl<'a> PageRenderer<'a> {
    pub fn new(store: &'a ContentStore, assets: &'a AssetLoader, paper_grain: bool) -> Self {
        Self {
            store,
            assets,
            map: PageMap::new(store.len()),
            paper_grain,
        }
    }

    fn draw_entry(&self, canvas: &mut PageCanvas, entity: &Entity, number: usize) -> usize {
        let photo = entity.image.as_deref().and_then(|f| self.assets.photo(f));
        draw_entry(canvas, entity, number, photo)
    }
}

impl Rasterize for PageRenderer<'_> {
    fn rasterize(&self, page: usize, quality: Quality, mirrored: bool) -> RgbaImage {
        let (w, h) = quality.resolution();
        let mut canvas = PageCanvas::new(w, h, palette::PAPER);

        // Grain goes down before the flip so its orientation never matters
        if self.paper_grain && quality.has_grain() {
            add_paper_grain(&mut canvas, page as u64);
        }

        canvas.set_mirrored(mirrored);

        match self.map.kind(page) {
            PageKind::Cover => draw_cover(&mut canvas, self.store.len()),
            PageKind::Contents => draw_contents(&mut canvas, self.store),
            PageKind::Entry(i) => {
                if let Some(entity) = self.store.get(i) {
                    let sections = self.draw_entry(&mut canvas, entity, i + 1);
                    log::trace!("page {}: {} sections drawn", page, sections);
                }
            }
            PageKind::BackCover => draw_back_cover(&mut canvas),
            PageKind::Blank => {}
        }

        canvas.into_image()
    }
}

/// Faint randomized speckles, seeded per page so a page keeps its grain
fn add_paper_grain(canvas: &mut PageCanvas, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (w, h) = (canvas.width(), canvas.height());

    for _ in 0..GRAIN_SPECKLES {
        let r = 180 + rng.gen_range(0..40);
        let g = 170 + rng.gen_range(0..40);
        let b = 150 + rng.gen_range(0..40);
        let color = with_alpha(image::Rgba([r, g, b, 255]), 0.04);

        let x = rng.gen::<f32>() * w;
        let y = rng.gen::<f32>() * h;
        let size = rng.gen::<f32>() * (w * 0.06) + 4.0;
        let stretch = 0.5 + rng.gen::<f32>();
        canvas.fill_rect(x, y, size, size * stretch, color);
    }
}

const LEATHER_STOPS: [(f32, image::Rgba<u8>); 3] = [
    (0.0, palette::LEATHER_DARK),
    (0.5, palette::LEATHER),
    (1.0, palette::LEATHER_DARK),
];

fn draw_cover(canvas: &mut PageCanvas, entries: usize) {
    let (w, h) = (canvas.width(), canvas.height());
    canvas.fill_vertical_gradient(&LEATHER_STOPS);

    // Double frame
    let bm = w * 0.06;
    canvas.stroke_rect(bm, bm, w - bm * 2.0, h - bm * 2.0, w * 0.005, palette::GOLD);
    canvas.stroke_rect(bm * 1.4, bm * 1.4, w - bm * 2.8, h - bm * 2.8, w * 0.005, palette::GOLD);

    let center = |canvas: &mut PageCanvas, text: &str, y: f32, style: TextStyle| {
        canvas.text(text, w / 2.0, y, &style, Align::Center, Baseline::Middle);
    };

    center(canvas, "BOOK OF", h * 0.35, TextStyle::new(Face::Bold, w * 0.09, palette::GOLD_PALE));
    center(canvas, "ANIMALS", h * 0.48, TextStyle::new(Face::Bold, w * 0.12, palette::GOLD_LIGHT));

    canvas.hline(w * 0.25, w * 0.75, h * 0.56, w * 0.003, palette::GOLD);

    let subtitle = TextStyle::new(Face::Italic, w * 0.035, palette::GOLD);
    center(canvas, "An Interactive Encyclopedia", h * 0.63, subtitle);
    center(
        canvas,
        &format!("{} species from small to giant", entries),
        h * 0.68,
        subtitle,
    );

    draw_paw_print(canvas, w / 2.0, h * 0.78, w * 0.05, palette::GOLD);
}

/// Pad plus four toes, centered on (cx, cy)
fn draw_paw_print(canvas: &mut PageCanvas, cx: f32, cy: f32, size: f32, color: image::Rgba<u8>) {
    canvas.fill_ellipse(cx, cy + size * 0.2, size * 0.32, size * 0.26, color);
    for (dx, dy) in [(-0.36, -0.18), (-0.13, -0.38), (0.13, -0.38), (0.36, -0.18)] {
        canvas.fill_ellipse(cx + dx * size, cy + dy * size, size * 0.12, size * 0.15, color);
    }
}

fn draw_contents(canvas: &mut PageCanvas, store: &ContentStore) {
    let w = canvas.width();
    let m = w * 0.07;

    let title = TextStyle::new(Face::Bold, w * 0.08, palette::INK_TITLE);
    canvas.text(
        "TABLE OF CONTENTS",
        w / 2.0,
        m + w * 0.075,
        &title,
        Align::Center,
        Baseline::Alphabetic,
    );
    canvas.hline(m, w - m, m + w * 0.105, 2.0, palette::RULE);

    // Two columns, the first one takes the odd entry
    let start_y = m + w * 0.145;
    let line_h = w * 0.05;
    let col2_x = w / 2.0 + m * 0.3;
    let font_size = w * 0.038;
    let rows = store.len().div_ceil(2).max(1);

    let entry_style = TextStyle::new(Face::Regular, font_size, palette::INK_BODY);
    let number_style = TextStyle::new(Face::Regular, font_size, palette::INK_META);

    for (i, entity) in store.iter().enumerate() {
        let first_column = i < rows;
        let row = if first_column { i } else { i - rows };
        let x = if first_column { m } else { col2_x };
        let y = start_y + row as f32 * line_h;

        let label = format!("{:>2}. {}", i + 1, entity.name_en);
        canvas.text(&label, x, y, &entry_style, Align::Left, Baseline::Alphabetic);

        // Dotted leader to the number
        let text_w = canvas.measure(&label, &entry_style);
        let end_x = if first_column { col2_x - m * 0.6 } else { w - m };
        let mut dx = x + text_w + 6.0;
        while dx < end_x - font_size * 1.5 {
            canvas.fill_rect(dx, y - 3.0, 2.0, 2.0, palette::INK_FAINT);
            dx += 7.0;
        }

        canvas.text(
            &(i + 1).to_string(),
            end_x,
            y,
            &number_style,
            Align::Right,
            Baseline::Alphabetic,
        );
    }
}

/// Geometry of an entry page, derived from the canvas width
#[derive(Debug, Clone, Copy)]
struct EntryLayout {
    margin: f32,
    img_x: f32,
    img_y: f32,
    img_size: f32,
    /// Text above this y wraps beside the image
    img_bottom: f32,
    narrow_w: f32,
    full_w: f32,
}

impl EntryLayout {
    fn new(w: f32) -> Self {
        let margin = w * 0.06;
        let content_w = w - margin * 2.0;
        let gap = w * 0.02;
        let img_size = content_w * 0.42;
        let img_x = w - margin - img_size;
        let img_y = margin;
        Self {
            margin,
            img_x,
            img_y,
            img_size,
            img_bottom: img_y + img_size + gap,
            narrow_w: img_x - margin - gap,
            full_w: content_w,
        }
    }
}

/// Largest title size (down to a floor) that fits beside the image
fn fit_title_size(canvas: &PageCanvas, title: &str, max_w: f32) -> f32 {
    let w = canvas.width();
    let mut size = w * 0.09;
    let floor = w * 0.04;
    while size > floor
        && canvas.measure(title, &TextStyle::new(Face::Bold, size, palette::INK_TITLE)) > max_w
    {
        size -= w * 0.004;
    }
    size
}

/// Draws an entry page and returns how many text sections fit
fn draw_entry(
    canvas: &mut PageCanvas,
    entity: &Entity,
    number: usize,
    photo: Option<&RgbaImage>,
) -> usize {
    let (w, h) = (canvas.width(), canvas.height());
    let layout = EntryLayout::new(w);
    let m = layout.margin;

    draw_image_panel(canvas, &layout, entity, photo);

    // Title, shrunk until it clears the image
    let mut y = m;
    let title = entity.name_en.to_uppercase();
    let title_size = fit_title_size(canvas, &title, layout.narrow_w);
    let title_style = TextStyle::new(Face::Bold, title_size, palette::INK_TITLE);
    canvas.text(&title, m, y + title_size * 0.88, &title_style, Align::Left, Baseline::Alphabetic);
    y += title_size * 1.2;

    // Size badge
    let (badge_w, badge_h) = (w * 0.18, w * 0.05);
    canvas.fill_round_rect(m, y, badge_w, badge_h, BADGE_RADIUS, badge_color(entity.size));
    let badge_style = TextStyle::new(Face::Bold, w * 0.032, palette::WHITE);
    canvas.text(
        entity.size.label(),
        m + 10.0,
        y + badge_h * 0.72,
        &badge_style,
        Align::Left,
        Baseline::Alphabetic,
    );
    y += badge_h + w * 0.015;

    // Weight / length
    let meta = TextStyle::new(Face::Regular, w * 0.036, palette::INK_META);
    let weight = format!("Weight: {}", entity.weight);
    canvas.text(&weight, m, y + w * 0.033, &meta, Align::Left, Baseline::Alphabetic);
    y += w * 0.05;
    let length = format!("Length: {}", entity.length);
    canvas.text(&length, m, y + w * 0.033, &meta, Align::Left, Baseline::Alphabetic);
    y += w * 0.065;

    // Sections, wrapping around the image while beside it
    let body_size = w * 0.038;
    let heading = TextStyle::new(Face::Bold, w * 0.034, palette::INK_HEADING);
    let body = TextStyle::new(Face::Regular, body_size, palette::INK_BODY);
    let line_h = body_size * 1.45;
    let fact = format!("{} {}", FACT_MARKER, entity.fun_fact);

    let sections: [(&str, &str); 5] = [
        ("ORIGIN", &entity.origin),
        ("DESCRIPTION", &entity.description),
        ("DIET", &entity.diet),
        ("FUN FACT", &fact),
        ("STATUS", &entity.status),
    ];

    let mut drawn = 0;
    for (name, text) in sections {
        // Overflow guard: the rest of the page is silently dropped
        if y > h - m * 2.5 {
            break;
        }
        canvas.text(name, m, y, &heading, Align::Left, Baseline::Alphabetic);
        y += heading.size * 1.3;

        y = draw_wrapped_around_image(canvas, text, m, y, &layout, line_h, &body);
        y += body_size * 0.6;
        drawn += 1;
    }

    // Page number
    let folio = TextStyle::new(Face::Regular, w * 0.035, palette::INK_FAINT);
    canvas.text(
        &number.to_string(),
        w / 2.0,
        h - m * 0.6,
        &folio,
        Align::Center,
        Baseline::Alphabetic,
    );

    drawn
}

fn draw_image_panel(
    canvas: &mut PageCanvas,
    layout: &EntryLayout,
    entity: &Entity,
    photo: Option<&RgbaImage>,
) {
    let w = canvas.width();
    let (x, y, size) = (layout.img_x, layout.img_y, layout.img_size);

    match photo {
        Some(photo) => {
            canvas.draw_photo(photo, x, y, size, size, PANEL_RADIUS);
            canvas.stroke_round_rect(x, y, size, size, PANEL_RADIUS, 2.0, palette::FRAME);
        }
        None => {
            canvas.fill_round_rect(x, y, size, size, PANEL_RADIUS, palette::PLACEHOLDER_FILL);
            canvas.stroke_round_rect(x, y, size, size, PANEL_RADIUS, 2.0, palette::PLACEHOLDER_EDGE);

            let name = TextStyle::new(Face::Bold, w * 0.04, palette::PLACEHOLDER_TEXT);
            let hint = TextStyle::new(Face::Regular, w * 0.028, palette::PLACEHOLDER_EDGE);
            let cx = x + size / 2.0;
            canvas.text(&entity.name_en, cx, y + size * 0.45, &name, Align::Center, Baseline::Middle);
            canvas.text("[image]", cx, y + size * 0.65, &hint, Align::Center, Baseline::Middle);
        }
    }
}

/// Word-wraps `text`; lines wrap to the narrow width while the cursor is
/// above the image bottom and to the full width after. Returns the new y.
fn draw_wrapped_around_image(
    canvas: &mut PageCanvas,
    text: &str,
    x: f32,
    mut y: f32,
    layout: &EntryLayout,
    line_h: f32,
    style: &TextStyle,
) -> f32 {
    let mut line = String::new();
    for word in text.split(' ') {
        let max_w = if y < layout.img_bottom {
            layout.narrow_w
        } else {
            layout.full_w
        };
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };

        if !line.is_empty() && canvas.measure(&candidate, style) > max_w {
            canvas.text(&line, x, y, style, Align::Left, Baseline::Alphabetic);
            y += line_h;
            line = word.to_string();
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        canvas.text(&line, x, y, style, Align::Left, Baseline::Alphabetic);
        y += line_h;
    }
    y
}

fn draw_back_cover(canvas: &mut PageCanvas) {
    let (w, h) = (canvas.width(), canvas.height());
    canvas.fill_vertical_gradient(&LEATHER_STOPS);

    let bm = w * 0.06;
    canvas.stroke_rect(bm, bm, w - bm * 2.0, h - bm * 2.0, w * 0.005, palette::GOLD);

    let caption = TextStyle::new(Face::Italic, w * 0.045, palette::GOLD);
    canvas.text("The End", w / 2.0, h * 0.45, &caption, Align::Center, Baseline::Middle);

    let edition = TextStyle::new(Face::Regular, w * 0.025, palette::GOLD_MUTED);
    canvas.text(
        "Book of Animals - Interactive 3D Edition",
        w / 2.0,
        h * 0.55,
        &edition,
        Align::Center,
        Baseline::Middle,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::assets::PhotoSet;
    use crate::state::store::fixtures::store_with;
    use image::{imageops, Rgba};

    #[test]
    fn test_dimensions_follow_quality() {
        let store = store_with(2);
        let assets = AssetLoader::new();
        let renderer = PageRenderer::new(&store, &assets, true);

        for quality in Quality::ALL {
            let img = renderer.rasterize(0, quality, false);
            assert_eq!(img.dimensions(), quality.resolution());
        }
    }

    #[test]
    fn test_mirrored_is_horizontal_reflection() {
        let store = ContentStore::builtin().unwrap();
        let assets = AssetLoader::new();
        let renderer = PageRenderer::new(&store, &assets, true);

        // Low tier has no grain, so the reflection is exact
        for page in [0, 1, 7, 29] {
            let plain = renderer.rasterize(page, Quality::Low, false);
            let mirrored = renderer.rasterize(page, Quality::Low, true);
            assert!(
                imageops::flip_horizontal(&plain) == mirrored,
                "page {} is not a reflection",
                page
            );
        }
    }

    #[test]
    fn test_grain_is_drawn_before_flip() {
        let store = store_with(1);
        let assets = AssetLoader::new();
        let renderer = PageRenderer::new(&store, &assets, true);
        let blank = PageMap::new(1).page_count() + 3;

        let plain = renderer.rasterize(blank, Quality::Med, false);
        let mirrored = renderer.rasterize(blank, Quality::Med, true);
        assert!(plain == mirrored);
        assert!(plain.pixels().any(|p| *p != palette::PAPER));
    }

    #[test]
    fn test_grain_disabled_by_config() {
        let store = store_with(1);
        let assets = AssetLoader::new();
        let renderer = PageRenderer::new(&store, &assets, false);
        let blank = PageMap::new(1).page_count() + 3;

        let img = renderer.rasterize(blank, Quality::High, false);
        assert!(img.pixels().all(|p| *p == palette::PAPER));
    }

    #[test]
    fn test_placeholder_until_photo_loaded() {
        let store = store_with(1);
        let mut assets = AssetLoader::new();
        let layout = EntryLayout::new(512.0);
        let photo_px = (
            (layout.img_x + 6.0) as u32,
            (layout.img_y + layout.img_size * 0.3) as u32,
        );

        let before = PageRenderer::new(&store, &assets, false).rasterize(2, Quality::Low, false);
        assert_eq!(*before.get_pixel(photo_px.0, photo_px.1), palette::PLACEHOLDER_FILL);

        let mut photos = PhotoSet::default();
        photos.insert("animal1.jpg", RgbaImage::from_pixel(64, 48, Rgba([200, 10, 10, 255])));
        assets.complete(std::sync::Arc::new(photos));

        let after = PageRenderer::new(&store, &assets, false).rasterize(2, Quality::Low, false);
        assert_eq!(*after.get_pixel(photo_px.0, photo_px.1), Rgba([200, 10, 10, 255]));
    }

    #[test]
    fn test_long_title_shrinks_to_fit() {
        let canvas = PageCanvas::new(512, 720, palette::PAPER);
        let layout = EntryLayout::new(512.0);

        let size = fit_title_size(&canvas, "MOUNTAIN GOAT", layout.narrow_w);
        assert!(size < 512.0 * 0.09);
        let style = TextStyle::new(Face::Bold, size, palette::INK_TITLE);
        assert!(canvas.measure("MOUNTAIN GOAT", &style) <= layout.narrow_w);

        assert_eq!(fit_title_size(&canvas, "OWL", layout.narrow_w), 512.0 * 0.09);
    }

    #[test]
    fn test_overflowing_sections_are_dropped() {
        let mut entity = store_with(1).get(0).unwrap().clone();
        entity.description = "word ".repeat(600);

        let mut canvas = PageCanvas::new(512, 720, palette::PAPER);
        let drawn = draw_entry(&mut canvas, &entity, 1, None);
        assert!(drawn < 5, "expected truncation, drew {}", drawn);

        let mut canvas = PageCanvas::new(512, 720, palette::PAPER);
        let short = store_with(1).get(0).unwrap().clone();
        assert_eq!(draw_entry(&mut canvas, &short, 1, None), 5);
    }
}
