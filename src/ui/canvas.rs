use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::book::controller::RenderState;
use crate::book::layout::{COVER_T, PAGE_W};
use crate::ui::panels::TOOLBAR_HEIGHT;
use crate::Message;

/// Height of the side-view strip at the bottom of the canvas
pub const PROFILE_HEIGHT: f32 = 140.0;

/// Thin things (boards, stacks, clearances) are drawn this many times thicker
const THICKNESS_SCALE: f32 = 6.0;

const PAPER: Color = Color { r: 0.96, g: 0.94, b: 0.91, a: 1.0 };
const PAPER_EDGE: Color = Color { r: 0.78, g: 0.72, b: 0.63, a: 1.0 };
const LEATHER: Color = Color { r: 0.36, g: 0.2, b: 0.09, a: 1.0 };
const GOLD: Color = Color { r: 0.79, g: 0.64, b: 0.29, a: 1.0 };
const TABLE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 0.15 };

/// Book seen edge-on, plus the pointer surface for drags and the wheel
///
/// The canvas covers the whole reading area; only the bottom strip is drawn.
pub struct BookProfile<'a> {
    pub frame: &'a RenderState,
    /// (x, y) of the turning sheet's near edge, spine first
    pub sheet: Vec<(f32, f32)>,
    /// Hinge height of the sheet
    pub clearance: f32,
    /// False while a panel covers the book
    pub accepts_drags: bool,
}

impl Program<Message> for BookProfile<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // World units -> pixels, spine at the strip's center, table near its bottom
        let scale = (bounds.width / (PAGE_W * 2.4)).min((PROFILE_HEIGHT - 50.0) / PAGE_W);
        let origin = Point::new(bounds.width / 2.0, bounds.height - 24.0);
        let project =
            |x: f32, y: f32| Point::new(origin.x + x * scale, origin.y - y * scale * THICKNESS_SCALE);

        frame.stroke(
            &Path::line(
                Point::new(origin.x - PAGE_W * 1.1 * scale, origin.y),
                Point::new(origin.x + PAGE_W * 1.1 * scale, origin.y),
            ),
            Stroke::default().with_color(TABLE).with_width(1.0),
        );

        // Back board under both stacks
        let board_top = project(-PAGE_W, COVER_T);
        frame.fill_rectangle(
            board_top,
            Size::new(PAGE_W * 2.0 * scale, COVER_T * scale * THICKNESS_SCALE),
            LEATHER,
        );

        for (stack, sign) in [(&self.frame.left_stack, -1.0), (&self.frame.right_stack, 1.0)] {
            if !stack.visible {
                continue;
            }
            let x0 = if sign < 0.0 { -PAGE_W } else { 0.0 };
            let top_left = project(x0, COVER_T + stack.height);
            frame.fill_rectangle(
                top_left,
                Size::new(PAGE_W * scale, stack.height * scale * THICKNESS_SCALE),
                PAPER_EDGE,
            );
        }

        // Front cover swinging about the spine
        let cover = self.frame.cover;
        let hinge = project(0.0, cover.lift);
        let tip = Point::new(
            hinge.x + cover.rotation.cos() * PAGE_W * scale,
            hinge.y - cover.rotation.sin() * PAGE_W * scale,
        );
        frame.stroke(
            &Path::line(hinge, tip),
            Stroke::default().with_color(LEATHER).with_width(4.0),
        );
        frame.stroke(
            &Path::line(hinge, tip),
            Stroke::default().with_color(GOLD).with_width(1.0),
        );

        // Turning sheet
        if self.sheet.len() > 1 {
            let lift = self.clearance * (THICKNESS_SCALE - 1.0);
            let project_sheet =
                |x: f32, y: f32| Point::new(origin.x + x * scale, origin.y - (y + lift) * scale);
            let path = Path::new(|b| {
                let (x, y) = self.sheet[0];
                b.move_to(project_sheet(x, y));
                for &(x, y) in &self.sheet[1..] {
                    b.line_to(project_sheet(x, y));
                }
            });
            frame.stroke(&path, Stroke::default().with_color(PAPER).with_width(2.0));
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    // Scrolling down is positive here, as in a browser
                    let (dx, dy) = match delta {
                        mouse::ScrollDelta::Lines { x, y } => (-x, -y),
                        mouse::ScrollDelta::Pixels { x, y } => (-x, -y),
                    };
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Wheel { dx, dy }),
                    );
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                // Presses on the toolbar or behind an open panel are not drags
                if let Some(pos) = cursor
                    .position_in(bounds)
                    .filter(|pos| self.accepts_drags && pos.y >= TOOLBAR_HEIGHT)
                {
                    state.is_dragging = true;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PointerDown {
                            x: pos.x,
                            width: bounds.width,
                        }),
                    );
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    return (canvas::event::Status::Captured, Some(Message::PointerUp));
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PointerMoved(position.x - bounds.x)),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use crate::state::config::BookConfig;
    use crate::state::store::fixtures::store_with;

    fn press(profile: &BookProfile, at: Point) -> Option<Message> {
        let mut state = DragState::default();
        let bounds = Rectangle::new(Point::ORIGIN, Size::new(1000.0, 800.0));
        let (_, message) = profile.update(
            &mut state,
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)),
            bounds,
            Cursor::Available(at),
        );
        message
    }

    #[test]
    fn test_press_starts_drag_over_the_book() {
        let book = Book::new(store_with(4), &BookConfig::default());
        let profile = BookProfile {
            frame: book.frame(),
            sheet: Vec::new(),
            clearance: 0.0,
            accepts_drags: true,
        };

        let message = press(&profile, Point::new(800.0, 400.0));
        assert!(matches!(
            message,
            Some(Message::PointerDown { x, width }) if x == 800.0 && width == 1000.0
        ));
        assert!(press(&profile, Point::new(800.0, TOOLBAR_HEIGHT / 2.0)).is_none());
    }

    #[test]
    fn test_no_drag_behind_open_panel() {
        let book = Book::new(store_with(4), &BookConfig::default());
        let profile = BookProfile {
            frame: book.frame(),
            sheet: Vec::new(),
            clearance: 0.0,
            accepts_drags: false,
        };

        assert!(press(&profile, Point::new(800.0, 400.0)).is_none());
    }
}
