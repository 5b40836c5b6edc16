//! Single-resolution promise cells with joint (wait-for-all) composition.
//!
//! A [`Promise`] settles exactly once, from [`State::Incomplete`] to either
//! [`State::Success`] or [`State::Failure`], and synchronously runs the
//! matching arm of every registered listener pair at the moment it settles.
//! Listener and dependency storage is fixed-capacity and the crate never
//! heap-allocates, so promises can live on the stack of a bare main loop.
//!
//! Joining turns one promise into a completion signal for others: the parent
//! resolves, with an empty payload, once every promise joined to it has
//! settled on either arm. See [`Promise::add_joint`].
//!
//! Everything here is single-threaded by construction. `Promise` is built on
//! [`std::cell::Cell`] and is therefore `!Sync`; resolver and listeners
//! always share one call stack, and there is no queueing or deferral.
//!
//! # Examples
//!
//! ```
//! use promise_cell::Promise;
//!
//! let upload = Promise::new();
//! upload
//!     .add_listener(
//!         |_p, payload| println!("uploaded {} bytes", payload.map_or(0, <[u8]>::len)),
//!         |_p, _payload| println!("upload failed"),
//!     )
//!     .unwrap();
//! upload.resolve(Some(b"chunk"));
//! assert!(upload.is_done());
//! ```

use thiserror::Error;

mod joint;
mod promise;
mod slots;

pub use promise::{Callback, Promise, State};

/// Listener pairs one promise can hold per arm.
pub const MAX_LISTENERS: usize = 5;

/// Promises one joint parent can track.
pub const MAX_DEPENDENCIES: usize = 5;

/// Capacity errors reported by registration calls.
///
/// Settlement itself never errors; only attaching listeners or joining
/// dependencies can run out of slots.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A listener arm already holds [`MAX_LISTENERS`] callbacks.
    #[error("no free listener slot (capacity {MAX_LISTENERS} per arm)")]
    ListenersFull,
    /// The parent already tracks [`MAX_DEPENDENCIES`] joined promises.
    #[error("no free dependency slot (capacity {MAX_DEPENDENCIES})")]
    DependenciesFull,
}
