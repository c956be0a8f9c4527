//! Typed publish/subscribe used as the only channel between components.
//!
//! Each component owns one [`EventRegistry`] for its own closed set of
//! events.  Producers publish; consumers (status display, logging, other
//! components) subscribe by event *kind*, a fieldless tag enum that names the
//! variant without its payload.
//!
//! ```text
//! EncodingWorker ──publish(FileEncoded)──> EventRegistry<EncoderEvent>
//!                                              │ (registration order)
//!                                              ├──> transport.send(frame)
//!                                              └──> status board
//! ```

pub mod registry;

pub use registry::EventRegistry;

use std::fmt::Debug;
use std::hash::Hash;

/// An event that can be published through an [`EventRegistry`].
///
/// Implementors are usually enums whose variants carry the payload; `Kind`
/// is the matching payload-free tag used as the subscription key.
pub trait Event: Send + Sync + 'static {
    /// Closed enumeration of the kinds this event type can take.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// The subscription key for this particular event value.
    fn kind(&self) -> Self::Kind;
}
