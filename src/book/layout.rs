/// Physical book dimensions
///
/// World units: the spine runs along z at x = 0, pages lie in the xz plane,
/// +y points up out of the open book. Right-hand pages span x in
/// [0, PAGE_W], left-hand pages mirror them.

use std::f32::consts::PI;

pub const PAGE_W: f32 = 2.5;
pub const PAGE_H: f32 = 3.5;
/// Thickness of a cover board
pub const COVER_T: f32 = 0.015;
/// Thickness of one leaf
pub const PAGE_T: f32 = 0.003;

/// Gap left between the closed cover and the page block
const COVER_GAP: f32 = 0.003;
/// Static pages float this far above their stack
const STATIC_LIFT: f32 = 0.005;
/// Turning sheet clears the taller stack by this much
const SHEET_CLEARANCE: f32 = 0.015;

/// Placement of the front cover
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverPose {
    /// Rotation about the spine, 0 = closed, PI = fully open
    pub rotation: f32,
    /// Height of the cover's hinge line
    pub lift: f32,
}

/// Stack heights and elevations for a book with `leaves` leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLayout {
    leaves: usize,
}

impl BookLayout {
    pub fn new(leaves: usize) -> Self {
        Self { leaves }
    }

    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Height of the closed cover: resting on the full page block
    pub fn closed_cover_y(&self) -> f32 {
        COVER_T + self.leaves as f32 * PAGE_T + COVER_T / 2.0 + COVER_GAP
    }

    /// (left, right) page stack heights at a spread
    pub fn stack_heights(&self, spread: usize) -> (f32, f32) {
        let spread = spread.min(self.leaves);
        (
            spread as f32 * PAGE_T,
            (self.leaves - spread) as f32 * PAGE_T,
        )
    }

    /// (left, right) elevation of the static pages at a spread
    pub fn static_elevations(&self, spread: usize) -> (f32, f32) {
        let (left, right) = self.stack_heights(spread);
        (COVER_T + left + STATIC_LIFT, COVER_T + right + STATIC_LIFT)
    }

    /// Height the turning sheet is lifted to so it clears both stacks
    pub fn clearance(&self, spread: usize) -> f32 {
        let (left, right) = self.stack_heights(spread);
        COVER_T + left.max(right) + SHEET_CLEARANCE
    }

    /// Cover placement for an opening angle; the hinge drops from the top of
    /// the block to the table as the cover opens
    pub fn cover_pose(&self, angle: f32) -> CoverPose {
        let angle = angle.clamp(0.0, PI);
        let t = angle / PI;
        CoverPose {
            rotation: angle,
            lift: COVER_T / 2.0 + (1.0 - t) * (self.closed_cover_y() - COVER_T / 2.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_stack_heights_sum_to_block() {
        let layout = BookLayout::new(15);
        for spread in 0..=15 {
            let (l, r) = layout.stack_heights(spread);
            assert!(close(l + r, 15.0 * PAGE_T));
        }
        assert_eq!(layout.stack_heights(0).0, 0.0);
        assert_eq!(layout.stack_heights(15).1, 0.0);
    }

    #[test]
    fn test_clearance_uses_taller_stack() {
        let layout = BookLayout::new(15);
        assert!(close(layout.clearance(0), COVER_T + 15.0 * PAGE_T + 0.015));
        assert!(close(layout.clearance(5), COVER_T + 10.0 * PAGE_T + 0.015));
        assert!(close(layout.clearance(12), COVER_T + 12.0 * PAGE_T + 0.015));
    }

    #[test]
    fn test_cover_pose_endpoints() {
        let layout = BookLayout::new(15);

        let closed = layout.cover_pose(0.0);
        assert_eq!(closed.rotation, 0.0);
        assert!(close(closed.lift, layout.closed_cover_y()));
        assert!(close(layout.closed_cover_y(), 0.015 + 0.045 + 0.0075 + 0.003));

        let open = layout.cover_pose(PI);
        assert!(close(open.lift, COVER_T / 2.0));
    }

    #[test]
    fn test_static_elevation() {
        let layout = BookLayout::new(15);
        let (left, right) = layout.static_elevations(4);
        assert!(close(left, COVER_T + 4.0 * PAGE_T + 0.005));
        assert!(close(right, COVER_T + 11.0 * PAGE_T + 0.005));
    }
}
