//! Geometry and hover state machine for frosttip.
//!
//! Everything in this crate is pure and host-agnostic: the binder consumes
//! pointer and timer inputs and hands back commands for the host to execute,
//! and placement is a plain function over rectangles. The iced layer lives in
//! the `frosttip` binary, which feeds real measurements and timers in here.

pub mod binder;
pub mod geometry;
pub mod placement;

pub use binder::{Command, HoverBinder, Phase, TimerToken, delay_from_millis};
pub use geometry::{Position, Rect, Scroll};
pub use placement::place_below;
