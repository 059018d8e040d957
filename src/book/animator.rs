/// Page turn state machine
///
/// This module handles:
/// - Validating turn requests against the current spread
/// - Choosing which pages sit in the static slots and on the turning sheet
/// - Driving turn progress with a spring, or directly from a pointer drag
/// - Committing the new spread once the sheet lands
/// - The front cover's own spring, which follows the spread
///
/// Completion is two-phase: the first settled frame commits the spread, the
/// next one returns to Idle and clears the animating flag.

use std::f32::consts::PI;

use super::layout::BookLayout;
use super::spring::Spring;
use crate::state::navigation::NavigationState;
use crate::state::pages::CONTENTS_PAGE;

const TURN_STIFFNESS: f32 = 12.0;
const COVER_STIFFNESS: f32 = 10.0;

/// Turn settles when closer than this to its target...
const SETTLE_DISTANCE: f32 = 0.002;
/// ...and slower than this
const SETTLE_VELOCITY: f32 = 0.01;
/// Cover spring rest threshold, for both angle and velocity
const COVER_REST: f32 = 0.001;

/// Cover counts as open beyond this angle (radians)
pub const COVER_OPEN_ANGLE: f32 = 0.25;
/// While closing the cover, static pages vanish below this progress
const COVER_CLOSING_BLANK: f32 = 0.25;

/// Released drags complete past these progress marks
const FORWARD_SNAP: f32 = 0.25;
const BACKWARD_SNAP: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Progress at which a turn in this direction starts
    fn start(self) -> f32 {
        match self {
            Direction::Forward => 0.0,
            Direction::Backward => 1.0,
        }
    }

    /// Progress at which a turn in this direction has completed
    fn end(self) -> f32 {
        1.0 - self.start()
    }
}

/// Page indices shown flat on either side of the spine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slots {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Slots {
    pub const EMPTY: Slots = Slots {
        left: None,
        right: None,
    };

    /// The contents page lives inside the cover, never in a slot
    fn without_contents(self) -> Self {
        Self {
            left: self.left.filter(|&page| page != CONTENTS_PAGE),
            right: self.right,
        }
    }
}

/// Pages on the two sides of the turning sheet; the back is drawn mirrored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetFaces {
    pub front: usize,
    pub back: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub start_x: f32,
    /// Pointer travel that maps to a full turn
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub direction: Direction,
    pub from: usize,
    pub to: usize,
    /// Opening from, or closing to, spread 0: the cover moves, not a sheet
    pub cover_turn: bool,
    pub progress: f32,
    pub velocity: f32,
    pub target: f32,
    pub drag: Option<Drag>,
    pub slots: Slots,
    /// None for cover turns
    pub sheet: Option<SheetFaces>,
    /// Height of the sheet's hinge above the table
    pub clearance: f32,
    committed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    Idle,
    Turning(Turn),
}

/// What a call to `step` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Idle,
    Moving,
    /// First settled frame; `completed` is false for an abandoned turn
    Committed { completed: bool },
    /// Second settled frame; the animator is Idle again
    Finished,
}

/// Static slots and sheet faces for a turn from `from` to `to`
pub fn turn_slots(
    direction: Direction,
    from: usize,
    to: usize,
    leaves: usize,
    cover_turn: bool,
) -> (Slots, Option<SheetFaces>) {
    let right_of = |spread: usize| (spread < leaves).then_some(spread * 2);
    let left_of = |spread: usize| (spread > 0).then(|| spread * 2 - 1);

    let (slots, sheet) = match (direction, cover_turn) {
        (Direction::Forward, true) => (
            Slots {
                left: None,
                right: right_of(to),
            },
            None,
        ),
        (Direction::Backward, true) => (
            Slots {
                left: None,
                right: right_of(from),
            },
            None,
        ),
        (Direction::Forward, false) => (
            Slots {
                left: left_of(from),
                right: right_of(to),
            },
            Some(SheetFaces {
                front: from * 2,
                back: from * 2 + 1,
            }),
        ),
        (Direction::Backward, false) => (
            Slots {
                left: left_of(to),
                right: right_of(from),
            },
            Some(SheetFaces {
                front: (from - 1) * 2,
                back: (from - 1) * 2 + 1,
            }),
        ),
    };

    (slots.without_contents(), sheet)
}

/// Static slots of a book lying open at `spread`
pub fn idle_slots(spread: usize, leaves: usize) -> Slots {
    Slots {
        left: (spread > 0).then(|| spread * 2 - 1),
        right: (spread > 0 && spread < leaves).then_some(spread * 2),
    }
    .without_contents()
}

#[derive(Debug, Clone)]
pub struct TurnAnimator {
    state: TurnState,
    layout: BookLayout,
    turn_spring: Spring,
    cover_spring: Spring,
    cover_angle: f32,
    cover_velocity: f32,
}

impl TurnAnimator {
    pub fn new(layout: BookLayout) -> Self {
        Self {
            state: TurnState::Idle,
            layout,
            turn_spring: Spring::critical(TURN_STIFFNESS),
            cover_spring: Spring::critical(COVER_STIFFNESS),
            cover_angle: 0.0,
            cover_velocity: 0.0,
        }
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn turn(&self) -> Option<&Turn> {
        match &self.state {
            TurnState::Turning(turn) => Some(turn),
            TurnState::Idle => None,
        }
    }

    pub fn is_turning(&self) -> bool {
        self.turn().is_some()
    }

    pub fn layout(&self) -> &BookLayout {
        &self.layout
    }

    /// Cover opening angle, 0 = closed, PI = flat open
    pub fn cover_angle(&self) -> f32 {
        self.cover_angle
    }

    pub fn cover_open(&self) -> bool {
        self.cover_angle > COVER_OPEN_ANGLE
    }

    /// Start a spring-driven turn. Returns None, changing nothing, if a turn
    /// is already running or the book is closed on that side.
    pub fn begin(&mut self, direction: Direction, nav: &mut NavigationState) -> Option<&Turn> {
        if self.is_turning() {
            return None;
        }

        let from = nav.spread();
        let leaves = self.layout.leaves();
        let to = match direction {
            Direction::Forward if from < leaves => from + 1,
            Direction::Backward if from > 0 => from - 1,
            _ => return None,
        };

        let cover_turn = match direction {
            Direction::Forward => from == 0,
            Direction::Backward => to == 0,
        };
        let (slots, sheet) = turn_slots(direction, from, to, leaves, cover_turn);

        log::debug!(
            "📖 Turn {:?} {} -> {}{}",
            direction,
            from,
            to,
            if cover_turn { " (cover)" } else { "" }
        );

        self.state = TurnState::Turning(Turn {
            direction,
            from,
            to,
            cover_turn,
            progress: direction.start(),
            velocity: 0.0,
            target: direction.end(),
            drag: None,
            slots,
            sheet,
            clearance: self.layout.clearance(from),
            committed: false,
        });
        nav.set_animating(true);

        self.turn()
    }

    /// Start a turn whose progress follows the pointer until `release`
    pub fn begin_drag(
        &mut self,
        direction: Direction,
        start_x: f32,
        range: f32,
        nav: &mut NavigationState,
    ) -> Option<&Turn> {
        self.begin(direction, nav)?;
        if let TurnState::Turning(turn) = &mut self.state {
            turn.drag = Some(Drag {
                start_x,
                range: range.max(1.0),
            });
        }
        self.turn()
    }

    /// Pointer moved during a drag
    pub fn drag_to(&mut self, x: f32) {
        let TurnState::Turning(turn) = &mut self.state else {
            return;
        };
        let Some(drag) = turn.drag else {
            return;
        };

        let delta = (drag.start_x - x) / drag.range;
        turn.progress = match turn.direction {
            Direction::Forward => delta,
            Direction::Backward => 1.0 + delta,
        }
        .clamp(0.0, 1.0);
    }

    /// Pointer released: snap the target and let the spring take over
    pub fn release(&mut self) {
        let TurnState::Turning(turn) = &mut self.state else {
            return;
        };
        if turn.drag.take().is_none() {
            return;
        }

        let p = turn.progress;
        turn.target = match turn.direction {
            Direction::Forward if p > FORWARD_SNAP => 1.0,
            Direction::Forward => 0.0,
            Direction::Backward if p < BACKWARD_SNAP => 0.0,
            Direction::Backward => 1.0,
        };
        log::trace!("Released at {:.3}, target {}", p, turn.target);
    }

    /// Advance one frame of `dt` seconds
    pub fn step(&mut self, dt: f32, nav: &mut NavigationState) -> StepOutcome {
        let spring = self.turn_spring;

        let outcome = match &mut self.state {
            TurnState::Idle => StepOutcome::Idle,
            TurnState::Turning(turn) if turn.drag.is_some() => StepOutcome::Moving,
            TurnState::Turning(turn) => {
                // Settling is judged on the distance before this frame's step
                let dx = turn.progress - turn.target;
                spring.step(&mut turn.progress, &mut turn.velocity, turn.target, dt);
                turn.progress = turn.progress.clamp(0.0, 1.0);

                if dx.abs() < SETTLE_DISTANCE && turn.velocity.abs() < SETTLE_VELOCITY {
                    turn.progress = turn.target;
                    turn.velocity = 0.0;

                    if turn.committed {
                        StepOutcome::Finished
                    } else {
                        turn.committed = true;
                        let completed = turn.target == turn.direction.end();
                        if completed {
                            match turn.direction {
                                Direction::Forward => nav.next(),
                                Direction::Backward => nav.prev(),
                            }
                        }
                        StepOutcome::Committed { completed }
                    }
                } else {
                    StepOutcome::Moving
                }
            }
        };

        if outcome == StepOutcome::Finished {
            self.state = TurnState::Idle;
            nav.set_animating(false);
            log::debug!("📖 Turn finished at spread {}", nav.spread());
        }

        self.step_cover(dt, nav.spread());
        outcome
    }

    fn step_cover(&mut self, dt: f32, spread: usize) {
        if let TurnState::Turning(turn) = &self.state {
            if turn.cover_turn {
                self.cover_angle = turn.progress * PI;
                self.cover_velocity = 0.0;
                return;
            }
        }

        let target = if spread > 0 { PI } else { 0.0 };
        let dx = self.cover_angle - target;
        if dx.abs() > COVER_REST || self.cover_velocity.abs() > COVER_REST {
            self.cover_spring
                .step(&mut self.cover_angle, &mut self.cover_velocity, target, dt);
            self.cover_angle = self.cover_angle.clamp(0.0, PI);
        } else {
            self.cover_angle = target;
            self.cover_velocity = 0.0;
        }
    }

    /// No turn running and the cover resting where `spread` wants it
    pub fn is_at_rest(&self, spread: usize) -> bool {
        let target = if spread > 0 { PI } else { 0.0 };
        !self.is_turning() && self.cover_angle == target && self.cover_velocity == 0.0
    }

    /// Pages to draw flat on either side this frame
    pub fn static_slots(&self, spread: usize) -> Slots {
        if !self.cover_open() {
            return Slots::EMPTY;
        }

        match &self.state {
            TurnState::Turning(turn)
                if turn.cover_turn
                    && turn.direction == Direction::Backward
                    && turn.progress < COVER_CLOSING_BLANK =>
            {
                Slots::EMPTY
            }
            TurnState::Turning(turn) => turn.slots,
            TurnState::Idle => idle_slots(spread, self.layout.leaves()),
        }
    }

    /// Turning sheet and its progress, if one is in the air
    pub fn sheet(&self) -> Option<(SheetFaces, f32)> {
        let turn = self.turn()?;
        turn.sheet.map(|faces| (faces, turn.progress))
    }
}
