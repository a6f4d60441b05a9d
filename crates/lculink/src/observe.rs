// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream adapters over typed subscriptions.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future;
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::hub::SubscriptionGuard;
use crate::stream::EventStream;

/// Values of one URI as a [`Stream`]. Dropping it unsubscribes.
pub struct Observation<T> {
    rx: UnboundedReceiverStream<T>,
    _subscription: SubscriptionGuard,
}

impl<T> Stream for Observation<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

/// Observe `uri` decoded as `T`, optionally starting from an HTTP snapshot.
pub fn observe<T>(stream: &EventStream, uri: &str, with_snapshot: bool) -> Observation<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = stream.subscribe_typed(
        uri,
        move |value: T| {
            let _ = tx.send(value);
        },
        with_snapshot,
    );
    Observation { rx: UnboundedReceiverStream::new(rx), _subscription: subscription.dispose_on_drop() }
}

/// Drop items equal to the one emitted just before them.
pub fn distinct_until_changed<S>(stream: S) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: PartialEq + Clone,
{
    let mut last: Option<S::Item> = None;
    stream.filter_map(move |item| {
        let changed = last.as_ref() != Some(&item);
        if changed {
            last = Some(item.clone());
        }
        future::ready(changed.then_some(item))
    })
}

#[cfg(test)]
#[path = "observe_tests.rs"]
mod tests;
