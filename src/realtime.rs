//! Push delivery of newly stored messages.
//!
//! [`Notifier`] wraps a bounded `tokio::sync::broadcast` channel. Each
//! [`Subscription`] owns one receiver and yields only messages where its user
//! is the sender or the receiver. A receiver that falls more than the channel
//! capacity behind yields [`Event::Lagged`] in place of the overwritten
//! messages, then carries on with the oldest one still buffered.
//!
//! Subscriptions opened with [`Notifier::subscribe_in_session`] also end when
//! [`Notifier::end_session`] is called for that session.

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    task::{Context, Poll},
};

use futures_util::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tower_sessions::session::Id;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::Message;

/// One item of a [`Subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Message(Message),
    /// `skipped` broadcasts were overwritten before this subscriber read
    /// them. Some may have been addressed to it; refetch to catch up.
    Lagged { skipped: u64 },
}

struct SessionScope {
    token: CancellationToken,
    subscriptions: usize,
}

type Sessions = Arc<Mutex<HashMap<Id, SessionScope>>>;

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Message>,
    active: Arc<AtomicUsize>,
    sessions: Sessions,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self {
            tx,
            active: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::default(),
        }
    }

    /// Called once per committed insert. Having no listeners is not an error.
    pub fn publish(&self, msg: &Message) {
        let _ = self.tx.send(msg.clone());
    }

    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        self.active.fetch_add(1, Ordering::SeqCst);
        debug!(%user_id, "realtime subscription opened");
        Subscription {
            user_id,
            inner: Some(BroadcastStream::new(self.tx.subscribe())),
            scope: None,
            active: self.active.clone(),
        }
    }

    /// Like [`subscribe`](Self::subscribe), but the stream also ends once
    /// `session_id` is ended.
    pub fn subscribe_in_session(&self, session_id: Id, user_id: Uuid) -> Subscription {
        let token = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            let scope = sessions.entry(session_id).or_insert_with(|| SessionScope {
                token: CancellationToken::new(),
                subscriptions: 0,
            });
            scope.subscriptions += 1;
            scope.token.clone()
        };

        let mut subscription = self.subscribe(user_id);
        subscription.scope = Some(Scope {
            session_id,
            cancelled: Box::pin(token.cancelled_owned()),
            sessions: self.sessions.clone(),
        });
        subscription
    }

    /// Ends every subscription opened under `session_id`.
    pub fn end_session(&self, session_id: Id) {
        let scope = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session_id);

        if let Some(scope) = scope {
            debug!(subscriptions = scope.subscriptions, "ending realtime subscriptions for session");
            scope.token.cancel();
        }
    }

    /// Subscriptions that have not been cancelled or dropped yet.
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

struct Scope {
    session_id: Id,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    sessions: Sessions,
}

impl Scope {
    fn release(self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(scope) = sessions.get_mut(&self.session_id) {
            scope.subscriptions = scope.subscriptions.saturating_sub(1);
            if scope.subscriptions == 0 {
                sessions.remove(&self.session_id);
            }
        }
    }
}

pub struct Subscription {
    user_id: Uuid,
    inner: Option<BroadcastStream<Message>>,
    scope: Option<Scope>,
    active: Arc<AtomicUsize>,
}

impl Subscription {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    /// Releases the channel receiver. Calling it again does nothing; the
    /// stream ends either way.
    pub fn unsubscribe(&mut self) {
        if self.inner.take().is_some() {
            self.active.fetch_sub(1, Ordering::SeqCst);
            debug!(user_id = %self.user_id, "realtime subscription closed");
        }
        if let Some(scope) = self.scope.take() {
            scope.release();
        }
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        let this = self.get_mut();
        let user_id = this.user_id;

        if let Some(scope) = this.scope.as_mut() {
            if scope.cancelled.as_mut().poll(cx).is_ready() {
                debug!(%user_id, "session ended");
                this.unsubscribe();
                return Poll::Ready(None);
            }
        }

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        loop {
            match Pin::new(&mut *inner).poll_next(cx) {
                Poll::Ready(Some(Ok(msg))) if msg.involves(user_id) => return Poll::Ready(Some(Event::Message(msg))),
                Poll::Ready(Some(Ok(_))) => continue,
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(%user_id, skipped, "realtime subscriber lagged");
                    return Poll::Ready(Some(Event::Lagged { skipped }));
                }
                Poll::Ready(None) => {
                    this.unsubscribe();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
