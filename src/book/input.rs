/// Input adapter
///
/// Translates raw keyboard, wheel and pointer input into typed intents for
/// the book controller. Wheel turns are throttled here; everything else is
/// validated by the animator.

use std::time::{Duration, Instant};

use iced::keyboard::{key::Named, Key};

use super::animator::Direction;

/// Minimum pointer travel for a full drag turn, in logical pixels
const MIN_DRAG_RANGE: f32 = 180.0;
/// Share of the viewport width that maps to a full drag turn
const DRAG_RANGE_SHARE: f32 = 0.3;

/// Something the user asked the book to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Turn(Direction),
    BeginDrag {
        direction: Direction,
        x: f32,
        range: f32,
    },
    DragTo(f32),
    Release,
    JumpTo(usize),
}

#[derive(Debug, Clone)]
pub struct InputAdapter {
    wheel_throttle: Duration,
    last_wheel: Option<Instant>,
    dragging: bool,
}

impl InputAdapter {
    pub fn new(wheel_throttle: Duration) -> Self {
        Self {
            wheel_throttle,
            last_wheel: None,
            dragging: false,
        }
    }

    /// ArrowRight / Space turn forward, ArrowLeft turns back
    pub fn key(&self, key: &Key) -> Option<Intent> {
        match key.as_ref() {
            Key::Named(Named::ArrowRight | Named::Space) => Some(Intent::Turn(Direction::Forward)),
            Key::Character(" ") => Some(Intent::Turn(Direction::Forward)),
            Key::Named(Named::ArrowLeft) => Some(Intent::Turn(Direction::Backward)),
            _ => None,
        }
    }

    /// One turn per throttle window, along the dominant scroll axis
    pub fn wheel(&mut self, dx: f32, dy: f32, now: Instant) -> Option<Intent> {
        if let Some(last) = self.last_wheel {
            if now.saturating_duration_since(last) < self.wheel_throttle {
                return None;
            }
        }
        self.last_wheel = Some(now);

        let delta = if dy.abs() > dx.abs() { dy } else { dx };
        let direction = if delta > 0.0 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        Some(Intent::Turn(direction))
    }

    /// Pointer pressed at `x` in a viewport `width` wide: the right half
    /// drags forward, the left half backward. Moves and the release are
    /// only forwarded once the controller has accepted the drag.
    pub fn pointer_down(&mut self, x: f32, width: f32) -> Intent {
        self.dragging = false;

        let nx = if width > 0.0 { x / width } else { 0.0 };
        let direction = if nx > 0.5 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        Intent::BeginDrag {
            direction,
            x,
            range: (width * DRAG_RANGE_SHARE).max(MIN_DRAG_RANGE),
        }
    }

    /// The controller started the drag from the last `pointer_down`
    pub fn drag_accepted(&mut self) {
        self.dragging = true;
    }

    pub fn pointer_moved(&self, x: f32) -> Option<Intent> {
        self.dragging.then_some(Intent::DragTo(x))
    }

    pub fn pointer_up(&mut self) -> Option<Intent> {
        std::mem::take(&mut self.dragging).then_some(Intent::Release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> InputAdapter {
        InputAdapter::new(Duration::from_millis(400))
    }

    #[test]
    fn test_key_mapping() {
        let input = adapter();
        assert_eq!(
            input.key(&Key::Named(Named::ArrowRight)),
            Some(Intent::Turn(Direction::Forward))
        );
        assert_eq!(
            input.key(&Key::Named(Named::Space)),
            Some(Intent::Turn(Direction::Forward))
        );
        assert_eq!(
            input.key(&Key::Named(Named::ArrowLeft)),
            Some(Intent::Turn(Direction::Backward))
        );
        assert_eq!(input.key(&Key::Named(Named::ArrowUp)), None);
        assert_eq!(input.key(&Key::Character("a".into())), None);
    }

    #[test]
    fn test_wheel_throttle_and_axis() {
        let mut input = adapter();
        let t0 = Instant::now();

        assert_eq!(input.wheel(0.0, 3.0, t0), Some(Intent::Turn(Direction::Forward)));
        assert_eq!(input.wheel(0.0, 3.0, t0 + Duration::from_millis(100)), None);
        assert_eq!(input.wheel(0.0, 3.0, t0 + Duration::from_millis(399)), None);

        // Horizontal dominates here
        assert_eq!(
            input.wheel(-5.0, 1.0, t0 + Duration::from_millis(400)),
            Some(Intent::Turn(Direction::Backward))
        );
    }

    #[test]
    fn test_pointer_halves_and_range() {
        let mut input = adapter();

        match input.pointer_down(900.0, 1000.0) {
            Intent::BeginDrag { direction, x, range } => {
                assert_eq!(direction, Direction::Forward);
                assert_eq!(x, 900.0);
                assert_eq!(range, 300.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        input.drag_accepted();
        assert_eq!(input.pointer_moved(850.0), Some(Intent::DragTo(850.0)));
        assert_eq!(input.pointer_up(), Some(Intent::Release));
        assert_eq!(input.pointer_up(), None);
        assert_eq!(input.pointer_moved(10.0), None);

        // Narrow viewport falls back to the minimum range
        match input.pointer_down(100.0, 400.0) {
            Intent::BeginDrag { direction, range, .. } => {
                assert_eq!(direction, Direction::Backward);
                assert_eq!(range, MIN_DRAG_RANGE);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejected_drag_sends_nothing() {
        let mut input = adapter();

        // Press while a turn is running: the controller refuses the drag
        input.pointer_down(900.0, 1000.0);
        assert_eq!(input.pointer_moved(700.0), None);
        assert_eq!(input.pointer_up(), None);

        // A later accepted drag still works, and a new press resets it
        input.pointer_down(900.0, 1000.0);
        input.drag_accepted();
        input.pointer_down(100.0, 1000.0);
        assert_eq!(input.pointer_moved(150.0), None);
    }
}
