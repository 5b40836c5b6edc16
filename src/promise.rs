//! The resolution core: a container that settles exactly once and
//! synchronously notifies its listeners.

use std::any::Any;
use std::cell::Cell;
use std::fmt;

use tracing::{debug, trace};

use crate::slots::SlotArray;
use crate::{Error, MAX_DEPENDENCIES, MAX_LISTENERS};

/// Resolution state. Monotonic: once a promise leaves
/// [`State::Incomplete`] it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Incomplete,
    Success,
    Failure,
}

/// Listener signature: the settled promise and its payload.
///
/// Plain function pointers keep listener storage `Copy` and free of
/// allocation; non-capturing closures coerce. Any state a listener needs
/// beyond its arguments travels through [`Promise::set_closure`] or
/// [`Promise::set_scope_data`].
pub type Callback<'env> = fn(&Promise<'env>, Option<&'env [u8]>);

/// A single-resolution value container.
///
/// `'env` is the region every participating borrow must cover: payload
/// buffers, closure and scope values, and the other promises of a join
/// graph. The promise stores borrows verbatim and never copies, clones,
/// or frees what they point at.
///
/// All methods take `&self`; mutation goes through interior `Cell`s, so a
/// promise can be referenced from several places in a join graph and still
/// be settled through any of them.
pub struct Promise<'env> {
    pub(crate) state: Cell<State>,
    pub(crate) payload: Cell<Option<&'env [u8]>>,
    pub(crate) closure: Cell<Option<&'env dyn Any>>,
    pub(crate) scope_data: Cell<Option<&'env dyn Any>>,
    pub(crate) success_handlers: SlotArray<Callback<'env>, MAX_LISTENERS>,
    pub(crate) failure_handlers: SlotArray<Callback<'env>, MAX_LISTENERS>,
    pub(crate) parent: Cell<Option<&'env Promise<'env>>>,
    pub(crate) dependencies: SlotArray<&'env Promise<'env>, MAX_DEPENDENCIES>,
}

impl<'env> Promise<'env> {
    /// A fresh, incomplete promise with every slot empty.
    pub fn new() -> Self {
        Self {
            state: Cell::new(State::Incomplete),
            payload: Cell::new(None),
            closure: Cell::new(None),
            scope_data: Cell::new(None),
            success_handlers: SlotArray::new(),
            failure_handlers: SlotArray::new(),
            parent: Cell::new(None),
            dependencies: SlotArray::new(),
        }
    }

    /// Settle as [`State::Success`] and synchronously run every registered
    /// success listener, in registration order, before returning.
    ///
    /// The payload borrow is stored verbatim and handed to every listener,
    /// including late subscribers. Settling an already-settled promise is a
    /// no-op: no listener re-fires and the first payload sticks.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::Promise;
    ///
    /// let promise = Promise::new();
    /// promise
    ///     .add_listener(
    ///         |_p, payload| assert_eq!(payload, Some(&b"done"[..])),
    ///         |_p, _payload| unreachable!(),
    ///     )
    ///     .unwrap();
    /// promise.resolve(Some(b"done"));
    /// ```
    pub fn resolve(&self, payload: Option<&'env [u8]>) {
        self.settle(State::Success, payload);
    }

    /// Settle as [`State::Failure`] and synchronously run every registered
    /// failure listener, in registration order, before returning.
    ///
    /// Same contract as [`Promise::resolve`] otherwise.
    pub fn fail(&self, payload: Option<&'env [u8]>) {
        self.settle(State::Failure, payload);
    }

    fn settle(&self, outcome: State, payload: Option<&'env [u8]>) {
        if self.state.get() != State::Incomplete {
            trace!(state = ?self.state.get(), "redundant settlement ignored");
            return;
        }
        self.state.set(outcome);
        self.payload.set(payload);

        let handlers = if outcome == State::Success {
            &self.success_handlers
        } else {
            &self.failure_handlers
        };
        debug!(
            outcome = ?outcome,
            payload_len = payload.map_or(0, <[u8]>::len),
            listeners = handlers.len(),
            "promise settled"
        );
        // Listeners may settle other promises from here; settling this one
        // again lands in the guard above.
        for callback in handlers.iter() {
            callback(self, payload);
        }
        // One-shot delivery: a listener pair fires at most once, ever.
        self.success_handlers.clear();
        self.failure_handlers.clear();
    }

    /// Register a success/failure listener pair. Exactly one of the two
    /// arms will eventually run, exactly once.
    ///
    /// On an incomplete promise each callback is appended to the first free
    /// slot of its arm; [`Error::ListenersFull`] reports exhausted storage
    /// and registers nothing. On a settled promise the matching arm runs
    /// immediately, in-line, with the originally stored payload, and no
    /// slot is consumed.
    pub fn add_listener(
        &self,
        on_success: Callback<'env>,
        on_failure: Callback<'env>,
    ) -> Result<(), Error> {
        match self.state.get() {
            State::Incomplete => {
                // The arms fill in lockstep, so a full failure arm would
                // already have failed the success insert.
                self.success_handlers
                    .insert(on_success)
                    .map_err(|_| Error::ListenersFull)?;
                self.failure_handlers
                    .insert(on_failure)
                    .map_err(|_| Error::ListenersFull)?;
                trace!(listeners = self.success_handlers.len(), "listener pair registered");
                Ok(())
            }
            State::Success => {
                trace!("late subscription, replaying success");
                on_success(self, self.payload.get());
                Ok(())
            }
            State::Failure => {
                trace!("late subscription, replaying failure");
                on_failure(self, self.payload.get());
                Ok(())
            }
        }
    }

    /// Attach opaque context for listeners to pick up via
    /// [`Promise::closure`]. The promise never reads, clones, or frees it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::cell::Cell;
    /// use promise_cell::Promise;
    ///
    /// let hits = Cell::new(0u32);
    /// let promise = Promise::new();
    /// promise.set_closure(&hits);
    /// promise
    ///     .add_listener(
    ///         |p, _payload| {
    ///             let hits = p.closure().unwrap().downcast_ref::<Cell<u32>>().unwrap();
    ///             hits.set(hits.get() + 1);
    ///         },
    ///         |_p, _payload| {},
    ///     )
    ///     .unwrap();
    /// promise.resolve(None);
    /// assert_eq!(hits.get(), 1);
    /// ```
    pub fn set_closure(&self, data: &'env dyn Any) {
        self.closure.set(Some(data));
    }

    /// The attached closure context, if any.
    pub fn closure(&self) -> Option<&'env dyn Any> {
        self.closure.get()
    }

    /// Attach call-site metadata, e.g. to tell apart which of several
    /// sites produced this promise. Same contract as
    /// [`Promise::set_closure`], kept separate so the two do not collide.
    pub fn set_scope_data(&self, data: &'env dyn Any) {
        self.scope_data.set(Some(data));
    }

    /// The attached scope metadata, if any.
    pub fn scope_data(&self) -> Option<&'env dyn Any> {
        self.scope_data.get()
    }

    /// `true` once the promise has settled on either arm.
    pub fn is_done(&self) -> bool {
        self.state.get() != State::Incomplete
    }

    pub fn state(&self) -> State {
        self.state.get()
    }

    /// The payload stored at settlement. `None` until then, and `None`
    /// forever for promises settled without data (joint parents always
    /// are).
    pub fn payload(&self) -> Option<&'env [u8]> {
        self.payload.get()
    }
}

impl Default for Promise<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Promise<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state.get())
            .field("payload_len", &self.payload.get().map(<[u8]>::len))
            .field("listeners", &self.success_handlers.len())
            .field("dependencies", &self.dependencies.len())
            .finish()
    }
}
