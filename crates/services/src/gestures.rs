//! Touch affordance for the palette sidebar.
//!
//! On touch-capable layouts a horizontal drag past a minimum distance opens
//! or closes the sidebar; it deliberately never navigates between questions,
//! so a stray swipe cannot lose the user's place. Pointer layouts use the
//! plain `Sidebar::toggle` control instead.

/// Minimum horizontal travel, in logical pixels, before a drag counts.
pub const MIN_DRAG_DISTANCE: f32 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    Open,
    Close,
}

/// Accumulates one touch interaction and classifies it on release.
#[derive(Debug, Default)]
pub struct SwipeTracker {
    start_x: Option<f32>,
}

impl SwipeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_start(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    /// Classify the completed drag. Short drags and releases without a
    /// matching start yield nothing.
    pub fn touch_end(&mut self, x: f32) -> Option<SidebarAction> {
        let start = self.start_x.take()?;
        let delta = x - start;
        if delta.abs() < MIN_DRAG_DISTANCE {
            return None;
        }
        if delta < 0.0 {
            Some(SidebarAction::Open)
        } else {
            Some(SidebarAction::Close)
        }
    }
}

/// The palette sidebar's open/closed state.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sidebar {
    open: bool,
}

impl Sidebar {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Static toggle for pointer-capable layouts.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn apply(&mut self, action: SidebarAction) {
        self.open = matches!(action, SidebarAction::Open);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_drag_is_ignored() {
        let mut tracker = SwipeTracker::new();
        tracker.touch_start(100.0);
        assert_eq!(tracker.touch_end(100.0 - MIN_DRAG_DISTANCE / 2.0), None);
    }

    #[test]
    fn leftward_drag_opens_rightward_closes() {
        let mut tracker = SwipeTracker::new();
        tracker.touch_start(300.0);
        assert_eq!(tracker.touch_end(200.0), Some(SidebarAction::Open));

        tracker.touch_start(200.0);
        assert_eq!(tracker.touch_end(300.0), Some(SidebarAction::Close));
    }

    #[test]
    fn release_without_start_is_ignored() {
        let mut tracker = SwipeTracker::new();
        assert_eq!(tracker.touch_end(500.0), None);
    }

    #[test]
    fn sidebar_applies_actions_and_toggles() {
        let mut sidebar = Sidebar::default();
        assert!(!sidebar.is_open());

        sidebar.apply(SidebarAction::Open);
        assert!(sidebar.is_open());
        sidebar.apply(SidebarAction::Open);
        assert!(sidebar.is_open());

        sidebar.toggle();
        assert!(!sidebar.is_open());
    }
}
