/// Reading position and UI flags
///
/// This is the single source of truth the controller, the input handlers and
/// the panels read from. Every mutation goes through a setter so the clamping
/// and panel exclusivity rules always hold.

use super::quality::Quality;

/// Side panels of the viewer; at most one is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Contents,
    Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    /// Current spread, always in 0..=leaves
    spread: usize,
    /// Last valid spread (closed at the back)
    leaves: usize,
    /// True while a page turn is in progress
    animating: bool,
    quality: Quality,
    panel: Option<Panel>,
}

impl NavigationState {
    pub fn new(leaves: usize, quality: Quality) -> Self {
        Self {
            spread: 0,
            leaves,
            animating: false,
            quality,
            panel: None,
        }
    }

    pub fn spread(&self) -> usize {
        self.spread
    }

    pub fn leaves(&self) -> usize {
        self.leaves
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn panel(&self) -> Option<Panel> {
        self.panel
    }

    /// Move to a spread, clamped to 0..=leaves
    pub fn set_spread(&mut self, spread: i64) {
        self.spread = spread.clamp(0, self.leaves as i64) as usize;
    }

    pub fn next(&mut self) {
        self.spread = (self.spread + 1).min(self.leaves);
    }

    pub fn prev(&mut self) {
        self.spread = self.spread.saturating_sub(1);
    }

    pub fn set_animating(&mut self, animating: bool) {
        self.animating = animating;
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    /// Opening or closing the contents panel always closes settings
    pub fn set_contents_open(&mut self, open: bool) {
        self.panel = open.then_some(Panel::Contents);
    }

    /// Opening or closing the settings panel always closes contents
    pub fn set_settings_open(&mut self, open: bool) {
        self.panel = open.then_some(Panel::Settings);
    }

    pub fn toggle_contents(&mut self) {
        self.set_contents_open(self.panel != Some(Panel::Contents));
    }

    pub fn toggle_settings(&mut self) {
        self.set_settings_open(self.panel != Some(Panel::Settings));
    }

    /// Whether the "previous" arrow should be enabled
    pub fn can_prev(&self) -> bool {
        self.spread > 0 && !self.animating
    }

    /// Whether the "next" arrow should be enabled
    pub fn can_next(&self) -> bool {
        self.spread < self.leaves && !self.animating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_spread_round_trips_in_range() {
        let mut nav = NavigationState::new(15, Quality::Med);
        for s in 0..=15 {
            nav.set_spread(s);
            assert_eq!(nav.spread(), s as usize);
        }
    }

    #[test]
    fn test_set_spread_clamps_outside_range() {
        let mut nav = NavigationState::new(15, Quality::Med);
        nav.set_spread(-3);
        assert_eq!(nav.spread(), 0);
        nav.set_spread(99);
        assert_eq!(nav.spread(), 15);
    }

    #[test]
    fn test_stepping_past_edges_is_noop() {
        let mut nav = NavigationState::new(2, Quality::Med);
        nav.prev();
        assert_eq!(nav.spread(), 0);
        nav.next();
        nav.next();
        nav.next();
        assert_eq!(nav.spread(), 2);
    }

    #[test]
    fn test_panels_are_mutually_exclusive() {
        let mut nav = NavigationState::new(15, Quality::Med);
        nav.set_contents_open(true);
        assert_eq!(nav.panel(), Some(Panel::Contents));

        nav.set_settings_open(true);
        assert_eq!(nav.panel(), Some(Panel::Settings));

        nav.toggle_contents();
        assert_eq!(nav.panel(), Some(Panel::Contents));

        nav.toggle_contents();
        assert_eq!(nav.panel(), None);

        // Closing settings also closes contents
        nav.set_contents_open(true);
        nav.set_settings_open(false);
        assert_eq!(nav.panel(), None);
    }

    #[test]
    fn test_arrows_disabled_while_animating() {
        let mut nav = NavigationState::new(15, Quality::Med);
        assert!(!nav.can_prev());
        assert!(nav.can_next());

        nav.set_spread(3);
        nav.set_animating(true);
        assert!(!nav.can_prev());
        assert!(!nav.can_next());

        nav.set_animating(false);
        nav.set_spread(15);
        assert!(nav.can_prev());
        assert!(!nav.can_next());
    }
}
