//! Navigation menu module
//!
//! Provides the open/closed state machine and the controller applying its
//! side effects (markers, scroll lock, item entrance, focus trap).

mod controller;
mod state;

pub use controller::MenuController;
pub use state::{MenuState, MenuTrigger};
