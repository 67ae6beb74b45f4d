// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Task submission backends.
//!
//! An [`AsyncProvider`] runs a task somewhere and hands back a [`Pending`]
//! handle. [`crate::cost::CostContext::submit`] wraps tasks so they carry the
//! submitter's activity before they reach the provider.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;

use crate::error::{CostError, TaskFailure};

/// Result of one submitted task.
pub type TaskResult<T> = Result<T, TaskFailure>;

/// Run a task to completion, turning errors and panics into [`TaskFailure`].
pub fn run_task<T, F>(task: F) -> TaskResult<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match std::panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TaskFailure::Failed(err)),
        Err(payload) => Err(TaskFailure::from_panic(payload)),
    }
}

/// Something that can run tasks, possibly on another thread.
pub trait AsyncProvider {
    fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static;
}

impl<P: AsyncProvider> AsyncProvider for &P {
    fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        (**self).submit(task)
    }
}

impl<P: AsyncProvider> AsyncProvider for Arc<P> {
    fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        (**self).submit(task)
    }
}

/// Handle to the eventual result of a submitted task.
///
/// Wait for it synchronously with [`Pending::wait`] or `.await` it.
#[derive(Debug)]
pub struct Pending<T> {
    state: PendingState<T>,
}

#[derive(Debug)]
enum PendingState<T> {
    Ready(Option<TaskResult<T>>),
    Waiting(oneshot::Receiver<TaskResult<T>>),
}

// The result is only ever moved out, never pinned in place.
impl<T> Unpin for Pending<T> {}

impl<T> Pending<T> {
    /// A handle that is already complete.
    pub fn ready(result: TaskResult<T>) -> Self {
        Self {
            state: PendingState::Ready(Some(result)),
        }
    }

    /// A handle completed later through the returned [`Completion`].
    pub fn channel() -> (Completion<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            Completion { tx },
            Self {
                state: PendingState::Waiting(rx),
            },
        )
    }

    /// Block the current thread until the task finishes.
    ///
    /// On a multi-thread tokio worker the wait moves off the runtime with
    /// `block_in_place`. A current-thread runtime cannot block at all, so an
    /// unfinished task resolves to [`TaskFailure::Rejected`] there; `.await`
    /// the handle instead.
    pub fn wait(self) -> TaskResult<T> {
        let rx = match self.state {
            PendingState::Ready(result) => return result.unwrap_or(Err(TaskFailure::Abandoned)),
            PendingState::Waiting(rx) => rx,
        };

        let received = match Handle::try_current() {
            Err(_) => rx.blocking_recv(),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(rx))
            }
            Ok(_) => {
                return Err(TaskFailure::Rejected(
                    "cannot block a current-thread runtime; await the handle".to_string(),
                ))
            }
        };
        received.unwrap_or(Err(TaskFailure::Abandoned))
    }
}

impl<T> Future for Pending<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            PendingState::Ready(result) => {
                Poll::Ready(result.take().unwrap_or(Err(TaskFailure::Abandoned)))
            }
            PendingState::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(TaskFailure::Abandoned))),
        }
    }
}

/// Completing side of [`Pending::channel`]. Dropping it without completing
/// resolves the handle to [`TaskFailure::Abandoned`].
#[derive(Debug)]
pub struct Completion<T> {
    tx: oneshot::Sender<TaskResult<T>>,
}

impl<T> Completion<T> {
    pub fn complete(self, result: TaskResult<T>) {
        // The receiver may have been dropped; nobody is waiting then.
        let _ = self.tx.send(result);
    }
}

/// Runs every task immediately on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectProvider;

impl AsyncProvider for DirectProvider {
    fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        Pending::ready(run_task(task))
    }
}

/// Runs every task on a freshly spawned, named OS thread.
#[derive(Debug)]
pub struct ThreadProvider {
    name_prefix: String,
    spawned: AtomicUsize,
}

impl ThreadProvider {
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            spawned: AtomicUsize::new(0),
        }
    }

    /// Number of threads spawned so far.
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Default for ThreadProvider {
    fn default() -> Self {
        Self::new("costscope-worker")
    }
}

impl AsyncProvider for ThreadProvider {
    fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let (completion, pending) = Pending::channel();

        let spawned = std::thread::Builder::new()
            .name(format!("{}-{}", self.name_prefix, n))
            .spawn(move || completion.complete(run_task(task)));

        match spawned {
            Ok(_) => pending,
            Err(err) => Pending::ready(Err(TaskFailure::Rejected(err.to_string()))),
        }
    }
}

/// Runs every task on a tokio runtime's blocking pool.
#[derive(Debug, Clone)]
pub struct TokioProvider {
    handle: Handle,
}

impl TokioProvider {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running in.
    pub fn current() -> Result<Self, CostError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| CostError::NoRuntime(e.to_string()))
    }
}

impl AsyncProvider for TokioProvider {
    fn submit<T, F>(&self, task: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let (completion, pending) = Pending::channel();
        // Detached: the result travels through the completion, not the JoinHandle.
        drop(
            self.handle
                .spawn_blocking(move || completion.complete(run_task(task))),
        );
        pending
    }
}
