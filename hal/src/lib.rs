//! # Hardware Abstraction Layer (HAL)
//!
//! This crate defines the two collaborators the kernel needs from the
//! platform it runs on.
//!
//! ## Philosophy
//!
//! **The kernel never reads a clock or wakes a host loop on its own.**
//!
//! Everything platform-specific sits behind a trait so the event loop can
//! run on bare metal, inside a GUI loop, next to an I/O completion port,
//! or under `cargo test` with simulated time.
//!
//! ## Collaborators
//!
//! 1. [`TimerDevice`]: monotonic tick source plus tick/microsecond conversion
//! 2. [`WakeHook`]: "work became ready" notification for a foreign host loop
//!
//! A type implementing both is a [`Platform`].

pub mod timer;
pub mod wake;

pub use timer::TimerDevice;
pub use wake::{Platform, WakeHook};
