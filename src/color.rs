/// Color utilities for page rasterization
///
/// This module handles:
/// - Parsing `#rrggbb` literals at compile time
/// - Linear interpolation for gradients
/// - Source-over alpha blending onto RGBA pixels
/// - The fixed palette used by every page layout

use image::Rgba;

use crate::state::data::SizeCategory;

/// Parse a `#rrggbb` literal into an opaque color
///
/// Panics at compile time (in const context) on malformed input.
pub const fn hex(code: &str) -> Rgba<u8> {
    let b = code.as_bytes();
    assert!(b.len() == 7 && b[0] == b'#', "expected #rrggbb");
    Rgba([
        nibble(b[1]) * 16 + nibble(b[2]),
        nibble(b[3]) * 16 + nibble(b[4]),
        nibble(b[5]) * 16 + nibble(b[6]),
        255,
    ])
}

const fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit"),
    }
}

/// Same color with a different opacity (0.0 - 1.0)
pub fn with_alpha(color: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let Rgba([r, g, b, _]) = color;
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Linear interpolation between two colors, `t` in 0.0 - 1.0
pub fn lerp(a: Rgba<u8>, b: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Rgba([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), mix(a[3], b[3])])
}

/// Sample a multi-stop gradient; stops must be sorted by offset
pub fn gradient(stops: &[(f32, Rgba<u8>)], t: f32) -> Rgba<u8> {
    let Some(&(first_offset, first)) = stops.first() else {
        return Rgba([0, 0, 0, 0]);
    };
    if t <= first_offset {
        return first;
    }
    for pair in stops.windows(2) {
        let (o0, c0) = pair[0];
        let (o1, c1) = pair[1];
        if t <= o1 {
            let span = (o1 - o0).max(f32::EPSILON);
            return lerp(c0, c1, (t - o0) / span);
        }
    }
    stops[stops.len() - 1].1
}

/// Source-over blend of `src` onto `dst`
pub fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let a = src[3] as u32;
    if a == 0 {
        return;
    }
    if a == 255 {
        *dst = src;
        return;
    }
    let inv = 255 - a;
    for c in 0..3 {
        dst[c] = ((src[c] as u32 * a + dst[c] as u32 * inv + 127) / 255) as u8;
    }
    dst[3] = (a + (dst[3] as u32 * inv + 127) / 255).min(255) as u8;
}

/// Fixed palette shared by all page layouts
pub mod palette {
    use super::hex;
    use image::Rgba;

    pub const PAPER: Rgba<u8> = hex("#F5F0E8");

    // Covers
    pub const LEATHER_DARK: Rgba<u8> = hex("#3a1f0d");
    pub const LEATHER: Rgba<u8> = hex("#5c3317");
    pub const GOLD: Rgba<u8> = hex("#c9a44a");
    pub const GOLD_PALE: Rgba<u8> = hex("#e8d5a3");
    pub const GOLD_LIGHT: Rgba<u8> = hex("#f0e0b0");
    pub const GOLD_MUTED: Rgba<u8> = hex("#a08860");

    // Ink
    pub const INK_TITLE: Rgba<u8> = hex("#2c1810");
    pub const INK_BODY: Rgba<u8> = hex("#3a2a1a");
    pub const INK_META: Rgba<u8> = hex("#5c4033");
    pub const INK_HEADING: Rgba<u8> = hex("#8b6b50");
    pub const INK_FAINT: Rgba<u8> = hex("#a09080");
    pub const RULE: Rgba<u8> = hex("#c0a882");
    pub const WHITE: Rgba<u8> = hex("#ffffff");

    // Image panel
    pub const FRAME: Rgba<u8> = hex("#8b7b6b");
    pub const PLACEHOLDER_FILL: Rgba<u8> = hex("#e8e0d4");
    pub const PLACEHOLDER_EDGE: Rgba<u8> = hex("#c0b0a0");
    pub const PLACEHOLDER_TEXT: Rgba<u8> = hex("#b0a090");
}

/// Badge color keyed to the size category
pub fn badge_color(size: SizeCategory) -> Rgba<u8> {
    match size {
        SizeCategory::Small => hex("#4a8c5c"),
        SizeCategory::Medium => hex("#3a7cbd"),
        SizeCategory::Large => hex("#c67b30"),
        SizeCategory::Giant => hex("#b03a3a"),
    }
}
