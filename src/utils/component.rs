//! Implementation of the [`Component`].

use std::rc::Rc;

use futures::{Future, Stream, StreamExt as _};

use crate::{
    platform::{Executor, TaskHandle},
    utils::ErrorReport,
};

/// Base for the reactive parts of the core.
///
/// Spawns all the watchers of its state on creation, and stops them on
/// [`Drop`].
pub struct Component<S, C> {
    state: Rc<S>,
    ctx: Rc<C>,
    _spawned_watchers: Vec<TaskHandle>,
}

impl<S: ComponentState<C> + 'static, C: 'static> Component<S, C> {
    /// Returns new [`Component`] with a provided data, spawning all the
    /// watchers of its state onto the provided [`Executor`].
    pub fn new(state: Rc<S>, ctx: Rc<C>, executor: Executor) -> Self {
        let mut spawner = WatchersSpawner {
            state: Rc::clone(&state),
            ctx: Rc::clone(&ctx),
            executor,
            spawned_watchers: Vec::new(),
        };
        state.spawn_watchers(&mut spawner);

        Self {
            state,
            ctx,
            _spawned_watchers: spawner.spawned_watchers,
        }
    }
}

impl<S, C> Component<S, C> {
    /// Returns [`Rc`] to the context of this [`Component`].
    #[inline]
    pub fn ctx(&self) -> Rc<C> {
        Rc::clone(&self.ctx)
    }

    /// Returns reference to the state of this [`Component`].
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }
}

/// State and context types of a [`Component`].
pub trait ComponentTypes {
    /// Type of the [`Component`]'s state.
    type State;

    /// Type of the [`Component`]'s context.
    type Obj;
}

impl<S, C> ComponentTypes for Component<S, C> {
    type State = S;
    type Obj = C;
}

/// State of a [`Component`] knowing which watchers it needs.
///
/// Is implemented by the `#[watchers]` macro.
pub trait ComponentState<C>: Sized {
    /// Spawns all the watchers of this state with the provided
    /// [`WatchersSpawner`].
    fn spawn_watchers(&self, spawner: &mut WatchersSpawner<Self, C>);
}

/// Spawner of a [`Component`]'s watchers.
pub struct WatchersSpawner<S, C> {
    state: Rc<S>,
    ctx: Rc<C>,
    executor: Executor,
    spawned_watchers: Vec<TaskHandle>,
}

impl<S: 'static, C: 'static> WatchersSpawner<S, C> {
    /// Spawns watcher for the provided [`Stream`].
    ///
    /// If watcher returns error then this error will be converted to the
    /// [`ErrorReport`] and printed with a [`ErrorReport::print`].
    ///
    /// Spawned watcher is stopped once its [`Component`] is dropped.
    pub fn spawn<R, V, F, O, E>(&mut self, mut rx: R, handle: F)
    where
        F: Fn(Rc<C>, Rc<S>, V) -> O + 'static,
        R: Stream<Item = V> + Unpin + 'static,
        O: Future<Output = Result<(), E>> + 'static,
        E: Into<ErrorReport>,
    {
        let ctx = Rc::clone(&self.ctx);
        let state = Rc::clone(&self.state);
        let task = self.executor.spawn(async move {
            while let Some(value) = rx.next().await {
                if let Err(e) =
                    (handle)(Rc::clone(&ctx), Rc::clone(&state), value).await
                {
                    Into::<ErrorReport>::into(e).print();
                }
            }
        });
        self.spawned_watchers.push(task);
    }
}
