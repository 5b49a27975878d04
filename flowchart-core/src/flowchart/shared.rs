//! Shared Flowchart
//!
//! A [`Flowchart`] behind a reader-writer lock, for front ends that hand the
//! same chart to several threads. Mutations take the write lock for their
//! whole run, so one mutation is in flight at a time; queries share the read
//! lock with each other.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Flowchart;

/// A cloneable, thread-safe handle to one flowchart.
pub struct SharedFlowchart<P = crate::NodeContent> {
    inner: Arc<RwLock<Flowchart<P>>>,
}

impl<P> SharedFlowchart<P> {
    /// Wrap a flowchart for shared access.
    pub fn new(chart: Flowchart<P>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chart)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Flowchart<P>> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Flowchart<P>> {
        self.inner.write()
    }

    /// Run `f` with exclusive access to the chart.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Flowchart<P>) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Run `f` with shared access to the chart.
    pub fn query<R>(&self, f: impl FnOnce(&Flowchart<P>) -> R) -> R {
        f(&self.inner.read())
    }
}

impl<P> Clone for SharedFlowchart<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> From<Flowchart<P>> for SharedFlowchart<P> {
    fn from(chart: Flowchart<P>) -> Self {
        Self::new(chart)
    }
}
