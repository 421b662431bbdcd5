//! Live positional pings read from a Telegram chat.
//!
//! Messages carrying a Waze deep link (`https://www.waze.com/ul?ll=<lat>,<long>`)
//! become [`Ping`]s. [`PingPoller`] long-polls the Bot API and feeds a shared
//! [`PingLayer`], which decides between individual markers and a heatmap.

pub mod client;
pub mod error;
pub mod layer;
pub mod parse;
pub mod poller;

pub use client::{TelegramClient, Update};
pub use error::PingError;
pub use layer::{DisplayMode, PingLayer, PingView, MARKER_LIMIT};
pub use parse::{parse_ping, Ping};
pub use poller::PingPoller;
