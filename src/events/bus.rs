//! Publish/subscribe channel keyed by event type.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::future::{self, BoxFuture, FutureExt};
use thiserror::Error;
use tokio::task::JoinHandle;

use super::diagnostics::{DeliveryOutcome, DeliveryStats};
use super::types::{Event, EventType};
use crate::registry::BoxError;

/// A subscriber's failure. Contained by the bus, never returned to publishers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(#[source] BoxError),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("payload does not match event {0}")]
    PayloadMismatch(EventType),
}

type Payload = Arc<dyn Any + Send + Sync>;

type ErasedHandler = Box<dyn Fn(Payload) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

struct Subscriber {
    name: String,
    handler: ErasedHandler,
}

type Subscriptions = HashMap<EventType, Vec<Arc<Subscriber>>>;

/// In-process event bus.
///
/// Shared as `Arc<EventBus>`; the composition root creates one and hands it to
/// every collaborator that publishes or subscribes.
pub struct EventBus {
    subscriptions: ArcSwap<Subscriptions>,
    diagnostics: Arc<DeliveryStats>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_diagnostics(Arc::new(DeliveryStats::new()))
    }

    /// Create a bus that reports delivery outcomes into `diagnostics`.
    pub fn with_diagnostics(diagnostics: Arc<DeliveryStats>) -> Self {
        Self {
            subscriptions: ArcSwap::from_pointee(HashMap::new()),
            diagnostics,
        }
    }

    /// Append `handler` to the subscribers of `E`.
    ///
    /// Subscriptions accumulate: subscribing the same handler twice delivers
    /// every event to it twice.
    pub fn subscribe<E, F, Fut>(&self, handler: F, subscriber: impl Into<String>)
    where
        E: Event,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let name = subscriber.into();
        let handler: ErasedHandler = Box::new(move |payload: Payload| {
            match (*payload).downcast_ref::<E>() {
                Some(event) => handler(event.clone())
                    .map(|result| result.map_err(HandlerError::Failed))
                    .boxed(),
                None => future::ready(Err(HandlerError::PayloadMismatch(E::TYPE))).boxed(),
            }
        });

        let entry = Arc::new(Subscriber {
            name: name.clone(),
            handler,
        });
        self.subscriptions.rcu(|current| {
            let mut next = Subscriptions::clone(current);
            next.entry(E::TYPE).or_default().push(Arc::clone(&entry));
            next
        });

        tracing::debug!(event = %E::TYPE, subscriber = %name, "Subscriber registered");
    }

    /// Invoke every current subscriber of the payload's type, in
    /// subscription order, over a snapshot of the subscriber list.
    ///
    /// Returns as soon as every handler has been invoked. Each handler then
    /// runs on its own task, so a slow or stuck subscriber holds up neither
    /// the publisher nor the subscribers after it.
    pub fn publish<E: Event>(&self, payload: E) -> Delivery {
        let snapshot = self.subscriptions.load_full();
        let Some(subscribers) = snapshot.get(&E::TYPE) else {
            tracing::debug!(event = %E::TYPE, "No subscribers for event");
            return Delivery::default();
        };

        let payload: Payload = Arc::new(payload);
        let handles = subscribers
            .iter()
            .map(|subscriber| {
                let invocation =
                    panic::catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(Arc::clone(&payload))));
                let subscriber = Arc::clone(subscriber);
                let diagnostics = Arc::clone(&self.diagnostics);

                tokio::spawn(async move {
                    let result = match invocation {
                        Ok(handling) => AssertUnwindSafe(handling)
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(&*panic)))),
                        Err(panic) => Err(HandlerError::Panicked(panic_message(&*panic))),
                    };
                    record(&diagnostics, E::TYPE, &subscriber.name, result);
                })
            })
            .collect();

        Delivery { handles }
    }

    pub fn subscriber_count(&self, event: EventType) -> usize {
        self.subscriptions
            .load()
            .get(&event)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn diagnostics(&self) -> &DeliveryStats {
        &self.diagnostics
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handlers started by one [`EventBus::publish`] call.
///
/// Dropping it leaves the handlers running.
#[derive(Debug, Default)]
pub struct Delivery {
    handles: Vec<JoinHandle<()>>,
}

impl Delivery {
    /// Number of handlers invoked.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait until every handler has finished, whatever its outcome.
    pub async fn settled(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "Event handler task did not complete");
            }
        }
    }
}

fn record(diagnostics: &DeliveryStats, event: EventType, subscriber: &str, result: Result<(), HandlerError>) {
    let error = match result {
        Ok(()) => {
            tracing::debug!(event = %event, subscriber = %subscriber, "Event delivered");
            None
        }
        Err(error) => {
            tracing::error!(
                event = %event,
                subscriber = %subscriber,
                error = %error,
                "Subscriber failed handling event"
            );
            Some(error.to_string())
        }
    };

    diagnostics.record(DeliveryOutcome {
        event,
        subscriber: subscriber.to_string(),
        error,
    });
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
