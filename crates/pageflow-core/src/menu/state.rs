//! Menu state machine
//!
//! Pure transition table. Side effects live in the controller.

/// Open/closed state of the navigation menu
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

/// Inputs that may move the menu between states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuTrigger {
    /// Explicit `open()`
    Open,
    /// Explicit `close()`
    Close,
    /// Click on the toggle control
    Toggle,
    /// Click outside both the menu and its toggle
    OutsideClick,
    /// Escape key
    Escape,
    /// Click on a link inside the menu
    LinkClick {
        /// Viewport at or below the mobile breakpoint
        mobile: bool,
    },
    /// Resize quiet period elapsed
    ResizeSettled {
        /// Viewport above the mobile breakpoint
        desktop: bool,
    },
}

impl MenuState {
    pub fn is_open(&self) -> bool {
        matches!(self, MenuState::Open)
    }

    /// Next state for `trigger`, or `None` when the trigger is not valid
    /// from this state (no transition, no side effects).
    pub fn transition(self, trigger: MenuTrigger) -> Option<MenuState> {
        use MenuState::{Closed, Open};

        match (self, trigger) {
            (Closed, MenuTrigger::Open | MenuTrigger::Toggle) => Some(Open),
            (Open, MenuTrigger::Close | MenuTrigger::Toggle) => Some(Closed),
            (Open, MenuTrigger::OutsideClick | MenuTrigger::Escape) => Some(Closed),
            (Open, MenuTrigger::LinkClick { mobile: true }) => Some(Closed),
            (Open, MenuTrigger::ResizeSettled { desktop: true }) => Some(Closed),
            _ => None,
        }
    }
}
