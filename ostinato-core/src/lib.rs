//! # ostinato-core
//!
//! The non-real-time side of ostinato: TOML configuration, the session-state
//! codec for the two generative amounts, and [`EngineHandle`], which builds an
//! engine from config and splits it into a main-thread handle and an
//! audio-thread runner.

pub mod config;
pub mod handle;
pub mod persist;

pub use config::{Config, ConfigError};
pub use handle::{EngineHandle, EngineRunner};
pub use persist::{read_amounts, write_amounts, PersistError};
