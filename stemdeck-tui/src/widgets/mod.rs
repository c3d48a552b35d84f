//! UI widgets for the mixer view

mod bar;
mod channel_strip;
mod legend;
mod status_bar;
mod transport;

pub use channel_strip::ChannelStripWidget;
pub use legend::LegendWidget;
pub use status_bar::StatusBarWidget;
pub use transport::{clock_readout, TransportWidget};
