//! # Telemetry-Worker
//!
//! Message-driven worker that runs the telemetry DSP components in an
//! isolated context and correlates every reply with its request.
//!
//! ## Message Flow
//!
//! ```text
//! host ──{type, data, id}──▶ request queue (bounded, FIFO)
//!                                  │
//!                                  ▼
//!                           ┌────────────┐
//!                           │ Dispatcher │  decimate | analyze | filter
//!                           └────────────┘
//!                                  │
//! host ◀──{type, result|error, id}─┘   (preceded once by {type: "ready"})
//! ```
//!
//! Each request is computed to completion before the next is taken. No
//! state survives a request; streaming filters travel with the request as
//! a caller-owned [`telemetry_dsp::FilterHandle`].

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod message;
pub mod worker;

pub use self::config::*;
pub use dispatch::*;
pub use message::*;
pub use worker::*;
