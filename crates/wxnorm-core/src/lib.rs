//! Core data types, units, and derived quantities for station telemetry
//!
//! Everything in this crate is a pure value transform: no I/O, no shared
//! state. Canonical units are Celsius, hPa, m/s and mm.

pub mod derive;
pub mod payload;
pub mod pipeline;
pub mod request;
pub mod types;
pub mod units;

pub use derive::*;
pub use payload::*;
pub use pipeline::*;
pub use request::*;
pub use types::*;
pub use units::*;
