// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flush Engine: a cancellable, thread-safe coalescer of mutations
//! into a background flush action (§4.5).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

type Action = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct DebouncerHealth {
    pub failure_count: u64,
    pub last_error: Option<String>,
}

/// A generation counter, bumped on every `Trigger`/`Cancel`, decides
/// whether a timer that has just elapsed is still the most recent one
/// armed. A stale timer (superseded by a later `Trigger`) is a no-op,
/// which is what gives repeated `Trigger()` calls within the quiet
/// window the effect of resetting it.
pub struct Debouncer {
    window: Duration,
    generation: Arc<AtomicU64>,
    action: Action,
    action_lock: Arc<tokio::sync::Mutex<()>>,
    failures: Arc<AtomicU64>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl Debouncer {
    pub fn new<F, Fut>(window: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Self {
            window,
            generation: Arc::new(AtomicU64::new(0)),
            action: Arc::new(move || Box::pin(action())),
            action_lock: Arc::new(tokio::sync::Mutex::new(())),
            failures: Arc::new(AtomicU64::new(0)),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Arm a one-shot timer for `window`. Concurrent `Trigger()` calls
    /// from any number of tasks collapse into exactly one action
    /// invocation when the window next elapses.
    pub fn trigger(&self) {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let action = Arc::clone(&self.action);
        let action_lock = Arc::clone(&self.action_lock);
        let failures = Arc::clone(&self.failures);
        let last_error = Arc::clone(&self.last_error);
        let window = self.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if generation.load(Ordering::SeqCst) != my_generation {
                return;
            }
            let _guard = action_lock.lock().await;
            if generation.load(Ordering::SeqCst) != my_generation {
                return;
            }
            if let Err(e) = (action)().await {
                failures.fetch_add(1, Ordering::SeqCst);
                warn!("flush action failed: {e}");
                *last_error.lock() = Some(e);
            }
        });
    }

    /// Disarm any pending timer. If the action is currently executing,
    /// returns immediately without waiting for it.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Disarm any pending timer and block until a currently-executing
    /// action finishes.
    pub async fn cancel_and_wait(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _guard = self.action_lock.lock().await;
    }

    pub fn health(&self) -> DebouncerHealth {
        DebouncerHealth { failure_count: self.failures.load(Ordering::SeqCst), last_error: self.last_error.lock().clone() }
    }
}
