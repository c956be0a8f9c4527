//! Domain entities for FileDrop.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code has no imports from network
//! libraries, file systems, or UI frameworks, and can be tested on any
//! platform without setup.
//!
//! For FileDrop the domain is small: the rule that decides how long the
//! transport waits before reconnecting after its connection closes.  Time is
//! passed in by the caller (`now`) so the rule is fully deterministic.

/// Reconnect backoff: close history and delay policy.
///
/// See [`backoff::CloseHistory`] for the main type.
pub mod backoff;
