//! A FIFO-fair async counting semaphore bounding in-flight batch work.
//!
//! A released permit is handed directly to the oldest waiter instead of being
//! put back in the pool, so a newly arriving task can never overtake a task
//! that is already queued.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use ahash::HashSet;
use parking_lot::Mutex;

#[derive(Debug)]
struct Waiter {
  id: u64,
  waker: Waker,
}

/// The internal state of the `ConcurrencyGate`, protected by a `Mutex`.
#[derive(Debug, Default)]
struct GateInternal {
  /// Permits nobody is waiting for.
  permits: usize,
  /// A fair (FIFO) queue of waiting tasks.
  waiters: VecDeque<Waiter>,
  /// Waiters that were handed a permit but have not observed it yet.
  granted: HashSet<u64>,
  next_id: u64,
}

impl GateInternal {
  fn release(&mut self, capacity: usize) {
    if let Some(waiter) = self.waiters.pop_front() {
      self.granted.insert(waiter.id);
      waiter.waker.wake();
    } else {
      self.permits = (self.permits + 1).min(capacity);
    }
  }
}

/// A clonable handle to the semaphore. Clones share the same permits.
pub struct ConcurrencyGate {
  capacity: usize,
  internal: Arc<Mutex<GateInternal>>,
}

impl fmt::Debug for ConcurrencyGate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let internal = self.internal.lock();
    f.debug_struct("ConcurrencyGate")
      .field("capacity", &self.capacity)
      .field("permits", &internal.permits)
      .field("waiters", &internal.waiters.len())
      .finish()
  }
}

impl Clone for ConcurrencyGate {
  fn clone(&self) -> Self {
    Self {
      capacity: self.capacity,
      internal: self.internal.clone(),
    }
  }
}

impl ConcurrencyGate {
  /// Creates a gate with `capacity` permits. A zero capacity is raised to one
  /// so the gate can always make progress.
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      capacity,
      internal: Arc::new(Mutex::new(GateInternal {
        permits: capacity,
        ..GateInternal::default()
      })),
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Permits currently free.
  pub fn available(&self) -> usize {
    self.internal.lock().permits
  }

  /// Tasks currently queued for a permit.
  pub fn waiting(&self) -> usize {
    self.internal.lock().waiters.len()
  }

  /// Takes a permit without waiting. Fails whenever someone is already
  /// queued, even if a permit is momentarily free.
  pub fn try_acquire(&self) -> Option<GatePermit> {
    let mut internal = self.internal.lock();
    if internal.waiters.is_empty() && internal.permits > 0 {
      internal.permits -= 1;
      Some(GatePermit { gate: self.clone() })
    } else {
      None
    }
  }

  /// Waits for a permit. Permits are granted in the order `acquire` futures
  /// were first polled.
  pub fn acquire(&self) -> AcquireFuture {
    AcquireFuture {
      gate: self.clone(),
      waiter_id: None,
    }
  }

  fn release(&self) {
    self.internal.lock().release(self.capacity);
  }
}

/// Returns its permit to the gate when dropped.
#[must_use = "the permit is released as soon as it is dropped"]
pub struct GatePermit {
  gate: ConcurrencyGate,
}

impl fmt::Debug for GatePermit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GatePermit").finish_non_exhaustive()
  }
}

impl Drop for GatePermit {
  fn drop(&mut self) {
    self.gate.release();
  }
}

/// A future that resolves to a [`GatePermit`].
#[must_use = "futures do nothing unless you .await or poll them"]
pub struct AcquireFuture {
  gate: ConcurrencyGate,
  waiter_id: Option<u64>,
}

impl Future for AcquireFuture {
  type Output = GatePermit;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    let mut internal = this.gate.internal.lock();

    match this.waiter_id {
      None => {
        if internal.waiters.is_empty() && internal.permits > 0 {
          internal.permits -= 1;
          drop(internal);
          return Poll::Ready(GatePermit { gate: this.gate.clone() });
        }
        let id = internal.next_id;
        internal.next_id += 1;
        internal.waiters.push_back(Waiter {
          id,
          waker: cx.waker().clone(),
        });
        this.waiter_id = Some(id);
        Poll::Pending
      }
      Some(id) => {
        if internal.granted.remove(&id) {
          this.waiter_id = None;
          drop(internal);
          return Poll::Ready(GatePermit { gate: this.gate.clone() });
        }
        // Spurious wake-up: keep our place and refresh the waker.
        if let Some(waiter) = internal.waiters.iter_mut().find(|w| w.id == id) {
          if !waiter.waker.will_wake(cx.waker()) {
            waiter.waker = cx.waker().clone();
          }
        }
        Poll::Pending
      }
    }
  }
}

impl Drop for AcquireFuture {
  fn drop(&mut self) {
    let Some(id) = self.waiter_id.take() else {
      return;
    };
    let mut internal = self.gate.internal.lock();
    if internal.granted.remove(&id) {
      // Granted but never observed: pass the permit on.
      internal.release(self.gate.capacity);
    } else {
      internal.waiters.retain(|w| w.id != id);
    }
  }
}
