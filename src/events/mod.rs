//! Event handling for feedtui.
//!
//! Terminal events arrive through crossterm's async event stream in the
//! render loop; this module turns them into [`Action`](crate::state::Action)s
//! according to the configured key bindings.

mod handler;
mod input;

pub use handler::EventHandler;
pub use input::{InputEvent, Key, Modifiers};
