//! Configuration loading for the Hue Remote API debugger.
//!
//! Uses figment to layer built-in defaults, an optional YAML file, the
//! legacy environment variable names and `HUEDEBUG_`-prefixed overrides.
//! The result is read once at startup and never mutated afterwards.

pub mod schema;

pub use schema::{Config, LogConfig, RouteConfig, StateConfig, StateMode};
