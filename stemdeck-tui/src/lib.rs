//! Terminal UI for stemdeck - widgets, themes, and view state
//!
//! Provides the CRT-style mixer view: a transport readout, one strip per
//! stem, and a key legend drawn from the binding table.

mod app;
mod theme;
pub mod widgets;

pub use app::{App, MessageType};
pub use theme::{Theme, CRT_AMBER, CRT_GREEN, CYBERPUNK};
pub use widgets::{
    clock_readout, ChannelStripWidget, LegendWidget, StatusBarWidget, TransportWidget,
};
