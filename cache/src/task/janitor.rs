use crate::error::BuildError;
use crate::shared::CacheShared;

use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Wakes the janitor early when the cache is destroyed.
#[derive(Debug, Default)]
struct StopSignal {
  stopped: Mutex<bool>,
  condvar: Condvar,
}

impl StopSignal {
  /// Sleeps for up to `timeout`. Returns `true` once a stop was requested.
  fn wait(&self, timeout: Duration) -> bool {
    let mut stopped = self.stopped.lock();
    if !*stopped {
      self.condvar.wait_for(&mut stopped, timeout);
    }
    *stopped
  }

  fn raise(&self) {
    *self.stopped.lock() = true;
    self.condvar.notify_all();
  }
}

/// The background thread that periodically sweeps expired entries.
///
/// It only holds a weak reference to the cache, so it never keeps a dropped
/// cache alive, and it exits on its own once the cache is gone.
#[derive(Debug)]
pub(crate) struct Janitor {
  handle: Option<JoinHandle<()>>,
  signal: Arc<StopSignal>,
}

impl Janitor {
  /// Spawns a new janitor thread sweeping every `tick_interval`.
  pub(crate) fn spawn<K, V>(
    shared: Weak<CacheShared<K, V>>,
    tick_interval: Duration,
    name: &str,
  ) -> Result<Self, BuildError>
  where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + Sync + 'static,
  {
    let signal = Arc::new(StopSignal::default());
    let thread_signal = signal.clone();
    let cache_name = name.to_string();

    let handle = thread::Builder::new()
      .name(format!("bidcheck-janitor-{}", name))
      .spawn(move || {
        while !thread_signal.wait(tick_interval) {
          let Some(shared) = shared.upgrade() else {
            break;
          };

          // A failed sweep is only a missed housekeeping round; expiry is
          // still enforced on every read.
          if panic::catch_unwind(AssertUnwindSafe(|| shared.cleanup())).is_err() {
            tracing::warn!(cache = %cache_name, "cache sweep panicked; will retry next tick");
          }
        }
        tracing::trace!(cache = %cache_name, "cache janitor stopped");
      })
      .map_err(|e| BuildError::SweeperSpawn(e.to_string()))?;

    Ok(Self {
      handle: Some(handle),
      signal,
    })
  }

  /// Signals the janitor thread to stop and waits for it to exit.
  pub(crate) fn stop(mut self) {
    self.signal.raise();
    if let Some(handle) = self.handle.take() {
      // The last cache handle can be released by the janitor itself while it
      // sweeps; joining from that thread would deadlock.
      if handle.thread().id() != thread::current().id() {
        let _ = handle.join();
      }
    }
  }
}
