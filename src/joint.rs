//! Joint (wait-for-all) composition: a parent promise that resolves once
//! every promise joined to it has settled.

use tracing::{debug, trace};

use crate::promise::Promise;
use crate::Error;

impl<'env> Promise<'env> {
    /// Join `child` to this promise as a dependency. The returned index is
    /// the child's slot in the dependency set.
    ///
    /// Once every joined promise has settled on either arm, this promise
    /// resolves with an empty payload. A failed dependency counts as
    /// settled like any other: the join waits for all, it never fails
    /// fast. Payloads are not aggregated; read each dependency's
    /// [`Promise::payload`] from this promise's success listener instead.
    ///
    /// The propagation hook occupies one listener pair on `child`, from the
    /// same slot storage `add_listener` uses. A child that is already
    /// settled is observed through the replay path, so a join whose last
    /// outstanding dependency is already done resolves this promise before
    /// `add_joint` returns. On a capacity error nothing is attached on
    /// either side.
    ///
    /// # Panics
    ///
    /// If `child` already belongs to a join set. A promise can be a
    /// dependency of at most one parent over its lifetime.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::Promise;
    ///
    /// let first = Promise::new();
    /// let second = Promise::new();
    /// let both = Promise::new();
    /// assert_eq!(both.add_joint(&first).unwrap(), 0);
    /// assert_eq!(both.add_joint(&second).unwrap(), 1);
    ///
    /// first.resolve(Some(b"one"));
    /// assert!(!both.is_done());
    /// second.fail(None);
    /// assert!(both.is_done());
    /// ```
    pub fn add_joint(&'env self, child: &'env Promise<'env>) -> Result<usize, Error> {
        assert!(
            child.parent.get().is_none(),
            "promise already belongs to a join set"
        );
        // Validate the settled-child shortcut before touching anything: a
        // settled child replays instead of occupying a listener slot.
        if !child.is_done() && child.success_handlers.is_full() {
            return Err(Error::ListenersFull);
        }
        let index = self
            .dependencies
            .insert(child)
            .map_err(|_| Error::DependenciesFull)?;
        child.parent.set(Some(self));
        trace!(index, child_done = child.is_done(), "promise joined");
        child.add_listener(joint_on_success, joint_on_failure)?;
        Ok(index)
    }

    /// The joint parent this promise reports to, if any.
    pub fn parent(&self) -> Option<&'env Promise<'env>> {
        self.parent.get()
    }

    /// Joined dependencies, front-to-back. Walk these from a parent's
    /// success listener to collect the individual results.
    pub fn dependencies(&self) -> impl Iterator<Item = &'env Promise<'env>> + '_ {
        self.dependencies.iter()
    }
}

fn joint_on_success<'env>(child: &Promise<'env>, _payload: Option<&'env [u8]>) {
    propagate(child);
}

fn joint_on_failure<'env>(child: &Promise<'env>, _payload: Option<&'env [u8]>) {
    propagate(child);
}

/// One dependency settled: resolve the parent once its whole set is done.
fn propagate(child: &Promise<'_>) {
    let Some(parent) = child.parent.get() else {
        return;
    };
    let outstanding = parent.dependencies.iter().filter(|dep| !dep.is_done()).count();
    if outstanding == 0 {
        debug!("joint set complete, resolving parent");
        parent.resolve(None);
    } else {
        trace!(outstanding, "joint set still settling");
    }
}
