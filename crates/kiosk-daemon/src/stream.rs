//! SSE transport for the cart and order channels.
//!
//! Each connection owns an unbounded queue. Hub callbacks only enqueue, so
//! fan-out never waits on a slow client. When the client goes away Axum
//! drops the response stream, which drops the [`Subscription`] and removes
//! the callback from the hub. A send into a closed queue reports
//! [`DeliveryError::Closed`] and the hub drops that subscriber as well.
//!
//! Both streams also end when the daemon starts shutting down, so graceful
//! shutdown is not held open by connected displays.
//!
//! Frames carry only `data:` (no event names) with a JSON envelope; the
//! first frame also carries `retry:` so EventSource clients reconnect after
//! the configured delay.

use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use axum::response::sse::Event;
use futures_util::{
    future,
    stream::{self, BoxStream},
    Stream, StreamExt,
};
use kiosk_live::{CartEvent, DeliveryError, LiveHub, OrderEvent, Subscription};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::{IntervalStream, UnboundedReceiverStream};

use crate::error::ApiError;

/// Timing knobs shared by both streams.
#[derive(Debug, Clone, Copy)]
pub struct StreamTiming {
    pub heartbeat: Duration,
    pub retry: Duration,
}

/// A stream that keeps a hub subscription alive exactly as long as itself.
pub struct SubscribedStream<T> {
    inner: BoxStream<'static, T>,
    _subscription: Subscription,
}

impl<T> Stream for SubscribedStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// `{"type":"connected"}`, then every cart snapshot (the current one first),
/// interleaved with heartbeats.
pub fn cart_events(
    hub: &LiveHub,
    timing: StreamTiming,
    shutdown: watch::Receiver<bool>,
) -> SubscribedStream<CartEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = hub.subscribe_cart(move |cart| {
        tx.send(CartEvent::CartUpdate(cart.clone()))
            .map_err(|_| DeliveryError::Closed)
    });

    let events = stream::once(future::ready(CartEvent::Connected))
        .chain(UnboundedReceiverStream::new(rx));
    with_heartbeat(
        events,
        CartEvent::Heartbeat,
        timing.heartbeat,
        subscription,
        shutdown,
    )
}

/// `init` with every active order, then each order change, interleaved with
/// heartbeats.
///
/// The subscription is taken before the active orders are read, so a change
/// racing the read is delivered after `init` rather than lost.
pub async fn order_events(
    hub: &LiveHub,
    pool: &SqlitePool,
    timing: StreamTiming,
    shutdown: watch::Receiver<bool>,
) -> Result<SubscribedStream<OrderEvent>, ApiError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = hub.subscribe_orders(move |order| {
        tx.send(OrderEvent::OrderUpdate(order.clone()))
            .map_err(|_| DeliveryError::Closed)
    });

    let active = kiosk_db::list_active_orders(pool).await?;

    let events = stream::once(future::ready(OrderEvent::Init(active)))
        .chain(UnboundedReceiverStream::new(rx));
    Ok(with_heartbeat(
        events,
        OrderEvent::Heartbeat,
        timing.heartbeat,
        subscription,
        shutdown,
    ))
}

fn with_heartbeat<T, S>(
    events: S,
    beat: T,
    period: Duration,
    subscription: Subscription,
    shutdown: watch::Receiver<bool>,
) -> SubscribedStream<T>
where
    T: Clone + Send + 'static,
    S: Stream<Item = T> + Send + 'static,
{
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let beats = IntervalStream::new(ticks).map(move |_| beat.clone());

    SubscribedStream {
        inner: stream::select(events, beats)
            .take_until(stopped(shutdown))
            .boxed(),
        _subscription: subscription,
    }
}

/// Resolves once shutdown is signalled or the sender is gone.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Render envelopes as SSE frames; the first frame carries `retry`.
pub fn into_sse<T, S>(
    events: S,
    retry: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static
where
    T: Serialize,
    S: Stream<Item = T> + Send + 'static,
{
    events.enumerate().filter_map(move |(i, ev)| {
        let frame = serde_json::to_string(&ev).ok().map(|data| {
            let event = Event::default().data(data);
            let event = if i == 0 { event.retry(retry) } else { event };
            Ok::<Event, Infallible>(event)
        });
        future::ready(frame)
    })
}
