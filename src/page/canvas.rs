/// Software drawing surface for page textures
///
/// A thin layer over `image::RgbaImage` with the handful of primitives the
/// page layouts need: rectangles, rounded rectangles, ellipses, gradients,
/// photos and bitmap-font text. All coordinates are logical (f32) and a pixel
/// is covered when its center falls inside the shape.
///
/// When `mirrored` is set every write lands at `width - 1 - x`, which is the
/// same as drawing under a horizontal flip transform.

use std::ops::Range;

use embedded_graphics::{
    geometry::Dimensions,
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_7X13_ITALIC, FONT_9X18_BOLD},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle as EgRectangle,
    text::{Baseline, Text},
};
use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

use crate::color::{blend, gradient};

/// Font face; each maps to one bitmap font scaled to the requested size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
    Italic,
}

impl Face {
    fn font(&self) -> &'static MonoFont<'static> {
        match self {
            Face::Regular => &FONT_10X20,
            Face::Bold => &FONT_9X18_BOLD,
            Face::Italic => &FONT_7X13_ITALIC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: Face,
    /// Line height in pixels, like a CSS font size
    pub size: f32,
    pub color: Rgba<u8>,
}

impl TextStyle {
    pub fn new(face: Face, size: f32, color: Rgba<u8>) -> Self {
        Self { face, size, color }
    }

    fn scale(&self) -> f32 {
        self.size / self.face.font().character_size.height as f32
    }

    fn advance(&self) -> f32 {
        let font = self.face.font();
        (font.character_size.width + font.character_spacing) as f32 * self.scale()
    }
}

/// Horizontal anchor of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Replace characters the Latin-1 bitmap fonts cannot draw
pub fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2026}' => '.',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

pub struct PageCanvas {
    image: RgbaImage,
    mirrored: bool,
}

impl PageCanvas {
    /// Create a canvas filled with an opaque background color
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, background),
            mirrored: false,
        }
    }

    pub fn width(&self) -> f32 {
        self.image.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.image.height() as f32
    }

    /// Flip every subsequent write horizontally
    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        let x = if self.mirrored { w - 1 - x } else { x };
        blend(self.image.get_pixel_mut(x as u32, y as u32), color);
    }

    /// Pixel indices whose centers lie in `[start, end)`
    fn span(start: f32, end: f32) -> Range<i64> {
        (start - 0.5).ceil() as i64..(end - 0.5).ceil() as i64
    }

    fn clipped_span(start: f32, end: f32, limit: f32) -> Range<i64> {
        let r = Self::span(start.max(0.0), end.min(limit));
        r.start..r.end.max(r.start)
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let xs = Self::clipped_span(x, x + w, self.width());
        for py in Self::clipped_span(y, y + h, self.height()) {
            for px in xs.clone() {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Fill the whole canvas with a top-to-bottom gradient
    pub fn fill_vertical_gradient(&mut self, stops: &[(f32, Rgba<u8>)]) {
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        for py in 0..h {
            let color = gradient(stops, (py as f32 + 0.5) / h as f32);
            for px in 0..w {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Outline a rectangle with a line centered on its edges
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line: f32, color: Rgba<u8>) {
        let half = line / 2.0;
        self.fill_rect(x - half, y - half, w + line, line, color);
        self.fill_rect(x - half, y + h - half, w + line, line, color);
        self.fill_rect(x - half, y + half, line, h - line, color);
        self.fill_rect(x + w - half, y + half, line, h - line, color);
    }

    /// Horizontal rule from `x0` to `x1` centered on `y`
    pub fn hline(&mut self, x0: f32, x1: f32, y: f32, line: f32, color: Rgba<u8>) {
        self.fill_rect(x0, y - line / 2.0, x1 - x0, line, color);
    }

    fn inside_round_rect(px: f32, py: f32, x: f32, y: f32, w: f32, h: f32, r: f32) -> bool {
        if w <= 0.0 || h <= 0.0 || px < x || py < y || px >= x + w || py >= y + h {
            return false;
        }
        let r = r.clamp(0.0, w.min(h) / 2.0);
        let cx = px.clamp(x + r, x + w - r);
        let cy = py.clamp(y + r, y + h - r);
        let (dx, dy) = (px - cx, py - cy);
        dx * dx + dy * dy <= r * r
    }

    pub fn fill_round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32, color: Rgba<u8>) {
        let xs = Self::clipped_span(x, x + w, self.width());
        for py in Self::clipped_span(y, y + h, self.height()) {
            for px in xs.clone() {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                if Self::inside_round_rect(cx, cy, x, y, w, h, r) {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    pub fn stroke_round_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        r: f32,
        line: f32,
        color: Rgba<u8>,
    ) {
        let half = line / 2.0;
        let (ox, oy, ow, oh, or) = (x - half, y - half, w + line, h + line, r + half);
        let (ix, iy, iw, ih, ir) = (x + half, y + half, w - line, h - line, (r - half).max(0.0));

        let xs = Self::clipped_span(ox, ox + ow, self.width());
        for py in Self::clipped_span(oy, oy + oh, self.height()) {
            for px in xs.clone() {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                if Self::inside_round_rect(cx, cy, ox, oy, ow, oh, or)
                    && !Self::inside_round_rect(cx, cy, ix, iy, iw, ih, ir)
                {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba<u8>) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let xs = Self::clipped_span(cx - rx, cx + rx, self.width());
        for py in Self::clipped_span(cy - ry, cy + ry, self.height()) {
            for px in xs.clone() {
                let dx = (px as f32 + 0.5 - cx) / rx;
                let dy = (py as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Draw a photo cover-fitted into a rounded rectangle
    pub fn draw_photo(&mut self, photo: &RgbaImage, x: f32, y: f32, w: f32, h: f32, r: f32) {
        let (sw, sh) = (photo.width() as f32, photo.height() as f32);
        if sw < 1.0 || sh < 1.0 || w < 1.0 || h < 1.0 {
            return;
        }

        // Crop the source to the destination aspect ratio, centered
        let (src_ar, dst_ar) = (sw / sh, w / h);
        let (cw, ch) = if src_ar > dst_ar {
            (sh * dst_ar, sh)
        } else {
            (sw, sw / dst_ar)
        };
        let (cx, cy) = ((sw - cw) / 2.0, (sh - ch) / 2.0);
        let cropped = imageops::crop_imm(
            photo,
            cx as u32,
            cy as u32,
            (cw as u32).max(1),
            (ch as u32).max(1),
        )
        .to_image();

        let xs = Self::span(x, x + w);
        let ys = Self::span(y, y + h);
        let (dw, dh) = ((xs.end - xs.start).max(1), (ys.end - ys.start).max(1));
        let scaled = imageops::resize(&cropped, dw as u32, dh as u32, FilterType::Triangle);

        for py in ys.clone() {
            for px in xs.clone() {
                let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
                if !Self::inside_round_rect(fx, fy, x, y, w, h, r) {
                    continue;
                }
                let sx = (px - xs.start).clamp(0, dw - 1) as u32;
                let sy = (py - ys.start).clamp(0, dh - 1) as u32;
                let color = *scaled.get_pixel(sx, sy);
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Width of a text run in pixels
    pub fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        text.chars().count() as f32 * style.advance()
    }

    /// Draw a single line of text anchored at (x, y)
    pub fn text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        style: &TextStyle,
        align: Align,
        baseline: Baseline,
    ) {
        let text = printable(text);
        if text.is_empty() || style.size <= 0.0 {
            return;
        }

        let width = self.measure(&text, style);
        let origin_x = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };

        let mono = MonoTextStyle::new(style.face.font(), BinaryColor::On);
        let mut target = GlyphTarget {
            canvas: self,
            origin_x,
            origin_y: y,
            scale: style.scale(),
            color: style.color,
        };
        let _ = Text::with_baseline(&text, Point::zero(), mono, baseline).draw(&mut target);
    }
}

/// Draw target that scales font pixels into canvas rectangles
struct GlyphTarget<'c> {
    canvas: &'c mut PageCanvas,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
    color: Rgba<u8>,
}

impl Dimensions for GlyphTarget<'_> {
    fn bounding_box(&self) -> EgRectangle {
        EgRectangle::new(Point::new(-32_768, -32_768), Size::new(65_536, 65_536))
    }
}

impl DrawTarget for GlyphTarget<'_> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let s = self.scale;
        for Pixel(point, color) in pixels {
            if !color.is_on() {
                continue;
            }
            let x = self.origin_x + point.x as f32 * s;
            let y = self.origin_y + point.y as f32 * s;
            self.canvas.fill_rect(x, y, s, s, self.color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::palette;

    fn ink_pixels(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| **p != palette::PAPER).count()
    }

    #[test]
    fn test_fill_rect_covers_pixel_centers() {
        let mut canvas = PageCanvas::new(10, 10, palette::PAPER);
        canvas.fill_rect(2.0, 3.0, 4.0, 2.0, palette::INK_BODY);
        let img = canvas.into_image();

        assert_eq!(ink_pixels(&img), 8);
        assert_eq!(*img.get_pixel(2, 3), palette::INK_BODY);
        assert_eq!(*img.get_pixel(5, 4), palette::INK_BODY);
        assert_eq!(*img.get_pixel(6, 4), palette::PAPER);
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut canvas = PageCanvas::new(4, 4, palette::PAPER);
        canvas.fill_rect(-10.0, -10.0, 100.0, 100.0, palette::INK_BODY);
        assert_eq!(ink_pixels(&canvas.into_image()), 16);
    }

    #[test]
    fn test_mirrored_writes_flip_horizontally() {
        let mut canvas = PageCanvas::new(10, 4, palette::PAPER);
        canvas.set_mirrored(true);
        canvas.fill_rect(0.0, 0.0, 2.0, 4.0, palette::INK_BODY);
        let img = canvas.into_image();

        assert_eq!(*img.get_pixel(9, 0), palette::INK_BODY);
        assert_eq!(*img.get_pixel(8, 3), palette::INK_BODY);
        assert_eq!(*img.get_pixel(0, 0), palette::PAPER);
    }

    #[test]
    fn test_text_measure_scales_with_size() {
        let canvas = PageCanvas::new(10, 10, palette::PAPER);
        let small = TextStyle::new(Face::Regular, 20.0, palette::INK_BODY);
        let large = TextStyle::new(Face::Regular, 40.0, palette::INK_BODY);

        assert_eq!(canvas.measure("ABCD", &small), 40.0);
        assert_eq!(canvas.measure("ABCD", &large), 80.0);
    }

    #[test]
    fn test_text_draws_ink_inside_its_box() {
        let mut canvas = PageCanvas::new(200, 60, palette::PAPER);
        let style = TextStyle::new(Face::Bold, 36.0, palette::INK_TITLE);
        canvas.text("Fox", 10.0, 10.0, &style, Align::Left, Baseline::Top);
        let img = canvas.into_image();

        assert!(ink_pixels(&img) > 50);
        // Nothing to the left of the anchor
        for y in 0..60 {
            for x in 0..10 {
                assert_eq!(*img.get_pixel(x, y), palette::PAPER);
            }
        }
    }

    #[test]
    fn test_printable_replaces_dashes() {
        assert_eq!(printable("3–8 kg — wild"), "3-8 kg - wild");
        assert_eq!(printable("Лиса"), "????");
        assert_eq!(printable("» fact"), "» fact");
    }

    #[test]
    fn test_round_rect_corners_are_cut() {
        let mut canvas = PageCanvas::new(20, 20, palette::PAPER);
        canvas.fill_round_rect(0.0, 0.0, 20.0, 20.0, 8.0, palette::INK_BODY);
        let img = canvas.into_image();

        assert_eq!(*img.get_pixel(0, 0), palette::PAPER);
        assert_eq!(*img.get_pixel(10, 10), palette::INK_BODY);
        assert_eq!(*img.get_pixel(10, 0), palette::INK_BODY);
    }

    #[test]
    fn test_photo_is_cover_fitted() {
        // Left half red, right half blue, wide source into a square slot
        let photo = RgbaImage::from_fn(40, 10, |x, _| {
            if x < 20 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let mut canvas = PageCanvas::new(10, 10, palette::PAPER);
        canvas.draw_photo(&photo, 0.0, 0.0, 10.0, 10.0, 0.0);
        let img = canvas.into_image();

        // Center crop keeps the seam in the middle
        assert!(img.get_pixel(1, 5)[0] > 200);
        assert!(img.get_pixel(8, 5)[2] > 200);
        assert_eq!(ink_pixels(&img), 100);
    }
}
