// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! URI-routed fan-out of decoded events.
//!
//! Dispatch iterates a snapshot of the subscriber list, so callbacks may
//! subscribe or dispose (themselves included) without deadlocking. A
//! panicking callback is logged and skipped.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::stream::envelope::Envelope;

type Callback = dyn Fn(&Envelope) + Send + Sync;

enum Route {
    /// Case-insensitive exact URI.
    Exact(String),
    Pattern(Regex),
}

impl Route {
    fn matches(&self, uri: &str) -> bool {
        match self {
            Self::Exact(want) => want.eq_ignore_ascii_case(uri),
            Self::Pattern(re) => re.is_match(uri),
        }
    }
}

struct Subscriber {
    route: Route,
    callback: Box<Callback>,
}

#[derive(Default)]
pub struct SubscriptionHub {
    subscribers: Arc<Mutex<Vec<Arc<Subscriber>>>>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver envelopes whose URI equals `uri`, ignoring ASCII case.
    pub fn subscribe(
        &self,
        uri: impl Into<String>,
        callback: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(Route::Exact(uri.into()), Box::new(callback))
    }

    /// Deliver envelopes whose URI matches `pattern`.
    pub fn subscribe_pattern(
        &self,
        pattern: Regex,
        callback: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(Route::Pattern(pattern), Box::new(callback))
    }

    /// Deliver the `data` of matching envelopes decoded as `T`. Envelopes
    /// that fail to decode are skipped for this subscriber.
    pub fn subscribe_typed<T, F>(&self, uri: impl Into<String>, callback: F) -> Subscription
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let uri = uri.into();
        let label = uri.clone();
        self.register(
            Route::Exact(uri),
            Box::new(move |env: &Envelope| match T::deserialize(&env.data) {
                Ok(value) => callback(value),
                Err(e) => debug!(uri = %label, err = %e, "typed subscriber skipped"),
            }),
        )
    }

    /// Invoke every matching subscriber. Returns how many matched.
    pub fn dispatch(&self, env: &Envelope) -> usize {
        let snapshot: Vec<Arc<Subscriber>> = self.subscribers.lock().clone();
        let mut delivered = 0;
        for sub in snapshot.iter().filter(|s| s.route.matches(&env.uri)) {
            delivered += 1;
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (sub.callback)(env))) {
                warn!(uri = %env.uri, panic = %panic_message(payload.as_ref()), "subscriber panicked");
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    fn register(&self, route: Route, callback: Box<Callback>) -> Subscription {
        let sub = Arc::new(Subscriber { route, callback });
        self.subscribers.lock().push(Arc::clone(&sub));
        let list: Weak<Mutex<Vec<Arc<Subscriber>>>> = Arc::downgrade(&self.subscribers);
        Subscription::new(move || {
            if let Some(list) = list.upgrade() {
                list.lock().retain(|s| !Arc::ptr_eq(s, &sub));
            }
        })
    }
}

// -- Listener lists -----------------------------------------------------------

type Listener<A> = dyn Fn(&A) + Send + Sync;

/// Ordered callback list with disposable registrations, used for the
/// stream's raw, message, and reconnect hooks.
pub struct Listeners<A: ?Sized> {
    entries: Arc<Mutex<Vec<Arc<Listener<A>>>>>,
}

impl<A: ?Sized> Default for Listeners<A> {
    fn default() -> Self {
        Self { entries: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl<A: ?Sized + 'static> Listeners<A> {
    pub fn add(&self, listener: impl Fn(&A) + Send + Sync + 'static) -> Subscription {
        let entry: Arc<Listener<A>> = Arc::new(listener);
        self.entries.lock().push(Arc::clone(&entry));
        let list = Arc::downgrade(&self.entries);
        Subscription::new(move || {
            if let Some(list) = list.upgrade() {
                list.lock().retain(|l| !Arc::ptr_eq(l, &entry));
            }
        })
    }

    /// Call every listener with `arg`, isolating panics.
    pub fn emit(&self, arg: &A, what: &'static str) {
        let snapshot: Vec<Arc<Listener<A>>> = self.entries.lock().clone();
        for listener in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (*listener)(arg))) {
                warn!(listener = what, panic = %panic_message(payload.as_ref()), "listener panicked");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_owned();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "non-string panic payload".to_owned()
}

// -- Subscription -------------------------------------------------------------

/// Registration handle. [`Subscription::dispose`] removes it; dropping the
/// handle leaves the registration in place.
#[must_use = "dropping a Subscription does not unsubscribe; call dispose()"]
pub struct Subscription {
    disposer: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    pub(crate) fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self { disposer: Mutex::new(Some(Box::new(disposer))) }
    }

    /// A handle with nothing to dispose.
    pub fn empty() -> Self {
        Self { disposer: Mutex::new(None) }
    }

    /// Remove the registration. Further calls do nothing.
    pub fn dispose(&self) {
        let disposer = self.disposer.lock().take();
        if let Some(disposer) = disposer {
            disposer();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposer.lock().is_none()
    }

    /// Wrap in a guard that disposes when dropped.
    pub fn dispose_on_drop(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("disposed", &self.is_disposed()).finish()
    }
}

/// Disposes its subscription on drop.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    pub fn dispose(&self) {
        self.0.dispose();
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.dispose();
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
