//! Keyboard surface for stemdeck
//!
//! A static binding table maps keys to mixer actions; the dispatcher
//! interprets it against a `MixerSession`. The seek prompt is the one
//! text-entry control, and while it is open the dispatcher is silent.

mod bindings;
mod commands;
mod dispatcher;
mod prompt;

pub use bindings::{bindings, legend, lookup, Key, KeyBinding, SHIFTED_DIGITS};
pub use commands::{Action, Direction};
pub use dispatcher::{Dispatch, Dispatcher};
pub use prompt::{PromptError, PromptInput, SeekPrompt};
