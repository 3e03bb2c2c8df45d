//! Scheduling primitives the core runs on.
//!
//! The core never creates an executor on its own: an [`Executor`] wraps
//! whatever single-threaded [`LocalSpawn`] implementation the application (or
//! a test) provides, so transitions can be stepped deterministically.

use std::{fmt, rc::Rc};

use derive_more::From;
use futures::{
    future::{self, AbortHandle},
    task::{LocalSpawn, LocalSpawnExt as _},
    Future, FutureExt as _,
};

/// Handle to the single-threaded scheduler all the background tasks of the
/// core are spawned onto.
#[derive(Clone)]
pub struct Executor(Rc<dyn LocalSpawn>);

impl Executor {
    /// Wraps the provided [`LocalSpawn`] implementation.
    #[inline]
    pub fn new<S: LocalSpawn + 'static>(spawner: S) -> Self {
        Self(Rc::new(spawner))
    }

    /// Spawns the provided [`Future`] returning a [`TaskHandle`] which aborts
    /// it on [`Drop`].
    ///
    /// Failure to spawn is only logged, since it happens only when the
    /// underlying executor is already shut down.
    pub fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + 'static,
    {
        let (fut, handle) = future::abortable(task);
        if let Err(e) = self.0.spawn_local(fut.map(drop)) {
            log::warn!("Failed to spawn task: {}", e);
        }
        TaskHandle(handle)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Executor").finish()
    }
}

/// Task spawned by an [`Executor`], aborted on [`Drop`].
#[derive(Debug, From)]
pub struct TaskHandle(AbortHandle);

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}
