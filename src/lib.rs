//! src/lib.rs
//!
//! Control console for a remote data-collection device. The library keeps the
//! local UI's intent consistent with the device's authoritative state over a
//! reconnecting WebSocket link.

pub mod api;
pub mod app;
pub mod codec;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod transport;

pub use app::App;
pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
