//! Interaction State Controller for Pageflow
//!
//! This crate provides the client-side interaction layer of a marketing
//! site, independent of any browser:
//! - Navigation menu state machine (markers, scroll lock, focus trap)
//! - Reveal engine (load stagger and scroll-triggered, fire-once)
//! - Crossfade slider on a fixed interval
//! - Lazy image loading
//! - Smooth in-page anchor navigation
//! - Header shadow, touch feedback and image sizing on load
//!
//! ## Architecture
//!
//! The crate is organized into focused modules:
//!
//! - [`host`]: `Document` / `Environment` traits and the in-memory host
//! - [`menu`]: Menu state machine and controller
//! - [`focus`]: Focus trap
//! - [`reveal`]: Reveal engine
//! - [`slider`]: Crossfade slider
//! - [`lazy`]: Lazy image loader
//! - [`anchor`]: Smooth anchor navigator
//! - [`timing`]: Stagger and debounce policies
//! - [`controller`]: Event routing across all components
//!
//! ## Example
//!
//! ```rust
//! use pageflow_core::{Key, MemoryHost, PageController, PageEvent};
//!
//! let mut host = MemoryHost::new();
//! let toggle = host.append_with(0, "button", &[("class", "menu-toggle")]);
//! host.append_with(0, "ul", &[("id", "primary-menu")]);
//!
//! let mut controller = PageController::default();
//! controller.attach(&mut host);
//! controller.handle(&mut host, PageEvent::Click { target: toggle });
//! assert!(controller.is_menu_open());
//!
//! controller.handle(&mut host, PageEvent::KeyDown { key: Key::Escape, shift: false });
//! assert!(!controller.is_menu_open());
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Rust Core**: All state management is pure Rust, testable without a browser
//! 2. **Time Abstraction**: Timers go through the host, so tests run on a virtual clock
//! 3. **Markers, not pixels**: The controller toggles classes and attributes; styling is external
//! 4. **Silent degradation**: Missing elements or capabilities disable a component, never fail the page

pub mod anchor;
pub mod config;
pub mod controller;
pub mod error;
pub mod focus;
pub mod header;
pub mod host;
pub mod lazy;
pub mod menu;
pub mod reveal;
pub mod sizing;
pub mod slider;
pub mod timing;
pub mod touch;
pub mod types;

// Re-export core types for convenience
pub use anchor::AnchorNavigator;
pub use config::PageflowConfig;
pub use controller::{Disposition, PageController, PageEvent};
pub use error::{PageflowError, PageflowResult};
pub use focus::FocusTrapContext;
pub use host::{Document, Environment, Host, MemoryHost, NodeSnapshot};
pub use lazy::LazyImageLoader;
pub use menu::{MenuController, MenuState, MenuTrigger};
pub use reveal::RevealEngine;
pub use slider::{CrossfadeSlider, SliderState};
pub use timing::{Debouncer, StaggerPolicy};
pub use types::{Key, NodeId, ObserverOptions, TimerHandle, TimerTask, Watcher};
