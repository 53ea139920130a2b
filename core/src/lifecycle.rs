//! At-most-once index construction shared by every caller.
//!
//! `IndexManager::get` moves `Unbuilt -> Building` for the first caller, which
//! runs the loader without holding the lock. Everyone arriving while the build
//! is in flight parks on the condvar and wakes to the same `Ready` index or the
//! same `Failed` error. Both end states are terminal.

use crate::build::build_from_dumps;
use crate::config::EngineConfig;
use crate::dumps::{DumpPaths, LoadedDumps};
use crate::error::{EngineError, Result};
use crate::Index;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

type Loader = Box<dyn Fn() -> Result<Index> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Unbuilt,
    Building,
    Ready,
    Failed,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::Unbuilt => "unbuilt",
            IndexStatus::Building => "building",
            IndexStatus::Ready => "ready",
            IndexStatus::Failed => "failed",
        }
    }
}

enum State {
    Unbuilt,
    Building,
    Ready(Arc<Index>),
    Failed(EngineError),
}

pub struct IndexManager {
    state: Mutex<State>,
    settled: Condvar,
    loader: Loader,
}

impl IndexManager {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Index> + Send + Sync + 'static,
    {
        Self { state: Mutex::new(State::Unbuilt), settled: Condvar::new(), loader: Box::new(loader) }
    }

    /// Manager whose single build reads the dumps at `paths`.
    pub fn from_dumps(paths: DumpPaths, config: EngineConfig) -> Self {
        Self::new(move || {
            let dumps = LoadedDumps::load(&paths);
            build_from_dumps(&dumps, &config)
        })
    }

    pub fn status(&self) -> IndexStatus {
        match &*self.state.lock() {
            State::Unbuilt => IndexStatus::Unbuilt,
            State::Building => IndexStatus::Building,
            State::Ready(_) => IndexStatus::Ready,
            State::Failed(_) => IndexStatus::Failed,
        }
    }

    /// The shared index, building it first if nobody has yet. Blocks while
    /// another caller's build is in flight.
    pub fn get(&self) -> Result<Arc<Index>> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                State::Ready(index) => return Ok(Arc::clone(index)),
                State::Failed(err) => return Err(err.clone()),
                State::Unbuilt => break,
                State::Building => {}
            }
            self.settled.wait(&mut state);
        }
        *state = State::Building;
        drop(state);

        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.loader)()))
            .unwrap_or_else(|_| Err(EngineError::Unavailable("index build panicked".into())));

        let mut state = self.state.lock();
        let result = match outcome {
            Ok(index) => {
                let stats = index.stats();
                tracing::info!(
                    num_docs = stats.num_docs,
                    skipped = stats.skipped,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "search index ready"
                );
                let index = Arc::new(index);
                *state = State::Ready(Arc::clone(&index));
                Ok(index)
            }
            Err(err) => {
                tracing::error!(error = %err, "search index build failed");
                *state = State::Failed(err.clone());
                Err(err)
            }
        };
        drop(state);
        self.settled.notify_all();
        result
    }
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager").field("status", &self.status()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;

    #[test]
    fn status_follows_build() {
        let manager = IndexManager::new(|| Ok(build(Vec::new(), &EngineConfig::default())));
        assert_eq!(manager.status(), IndexStatus::Unbuilt);
        let index = manager.get().unwrap();
        assert!(index.is_empty());
        assert_eq!(manager.status(), IndexStatus::Ready);
        assert!(Arc::ptr_eq(&index, &manager.get().unwrap()));
    }

    #[test]
    fn panicking_loader_fails_instead_of_hanging() {
        let manager = IndexManager::new(|| panic!("corrupt dump"));
        assert!(matches!(manager.get(), Err(EngineError::Unavailable(_))));
        assert_eq!(manager.status(), IndexStatus::Failed);
        assert_eq!(IndexStatus::Failed.as_str(), "failed");
    }
}
