//! Live picking sessions.
//!
//! A session wraps one order's [`PickList`] and gives it a real clock:
//! every arm of the confirm-to-remove guard spawns a sleeping task whose
//! [`AbortHandle`] is the cancellation token. The task is aborted when the
//! remove is confirmed, when an add supersedes it, or when the session is
//! released. At most one such task exists per item.
//!
//! Events are fanned out over a broadcast channel; each subscriber owns its
//! receiver.
//!
//! Each session also has an idle watchdog. A session that sees no add or
//! remove for the configured idle timeout is released as if its picker had
//! released it: picks are persisted first and the order is unlocked only
//! once that succeeds.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arrowhead_core::picking::{ItemProgress, PickListError};
use arrowhead_core::{NormalizedOrder, OrderId, OrderItemId, OrderStatus, PickEvent, PickList, UserId};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::db::{OrderStore, RepositoryError};

/// Buffered events per session before slow subscribers start lagging.
const EVENT_CAPACITY: usize = 256;

/// Errors from opening or addressing a picking session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Another picker already holds the order.
    #[error("order {order_id} is already being picked by {picker_id}")]
    AlreadyClaimed { order_id: OrderId, picker_id: UserId },

    /// No session matches the order and token.
    #[error("no active picking session for order {0}")]
    NotFound(OrderId),

    /// The order is past picking.
    #[error("order {order_id} cannot be picked while {status}")]
    NotPickable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The order is malformed for picking.
    #[error("order cannot be picked: {0}")]
    InvalidOrder(#[from] PickListError),

    /// The final picks could not be stored. The session stays open.
    #[error("failed to persist picks: {0}")]
    Persist(#[from] RepositoryError),
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickSnapshot {
    pub order_id: OrderId,
    pub picker_id: UserId,
    pub status: OrderStatus,
    pub all_items_complete: bool,
    pub items: Vec<ItemProgress>,
}

impl PickSnapshot {
    /// `(item, picked quantity)` pairs for persisting.
    #[must_use]
    pub fn picks(&self) -> Vec<(OrderItemId, u32)> {
        self.items
            .iter()
            .map(|item| (item.item_id.clone(), item.picked_quantity))
            .collect()
    }
}

struct SessionState {
    list: PickList,
    timers: HashMap<OrderItemId, AbortHandle>,
    last_activity: std::time::Instant,
    watchdog: Option<AbortHandle>,
}

/// One picker working one order.
pub struct PickSession {
    token: Uuid,
    picker_id: UserId,
    state: Mutex<SessionState>,
    events: broadcast::Sender<PickEvent>,
}

impl std::fmt::Debug for PickSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickSession")
            .field("token", &self.token)
            .field("picker_id", &self.picker_id)
            .finish_non_exhaustive()
    }
}

impl PickSession {
    #[must_use]
    pub const fn token(&self) -> Uuid {
        self.token
    }

    #[must_use]
    pub const fn picker_id(&self) -> &UserId {
        &self.picker_id
    }

    /// Receive every event published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PickEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> PickSnapshot {
        let state = self.state.lock().await;
        self.snapshot_of(&state.list)
    }

    /// Pick one more unit of an item.
    pub async fn add(self: &Arc<Self>, item_id: &OrderItemId) -> Vec<PickEvent> {
        let mut state = self.state.lock().await;
        let now = clock();
        state.last_activity = now;
        let events = state.list.add(item_id, now);
        self.settle(&mut state, &events);
        events
    }

    /// Request removal of one unit. The first request arms; the second
    /// within the window confirms.
    pub async fn remove(self: &Arc<Self>, item_id: &OrderItemId) -> Vec<PickEvent> {
        let mut state = self.state.lock().await;
        let now = clock();
        state.last_activity = now;
        let events = state.list.remove(item_id, now);
        self.settle(&mut state, &events);
        events
    }

    /// Timer callback. Harmless if the arm cycle already ended.
    async fn expire(self: &Arc<Self>, item_id: &OrderItemId) {
        let mut state = self.state.lock().await;
        let events = state.list.expire(item_id, clock());
        if state
            .list
            .item(item_id)
            .is_none_or(|item| !item.is_armed())
        {
            state.timers.remove(item_id);
        }
        if !events.is_empty() {
            tracing::debug!(item_id = %item_id, "Remove confirmation expired");
        }
        self.publish(&events);
    }

    async fn last_activity(&self) -> std::time::Instant {
        self.state.lock().await.last_activity
    }

    async fn touch(&self) {
        self.state.lock().await.last_activity = clock();
    }

    async fn detach_watchdog(&self) -> Option<AbortHandle> {
        self.state.lock().await.watchdog.take()
    }

    /// Cancel pending removes and report the final state. The session stays
    /// usable.
    async fn close(&self) -> PickSnapshot {
        let mut state = self.state.lock().await;
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        let events = state.list.disarm_all();
        self.publish(&events);
        self.snapshot_of(&state.list)
    }

    /// Start or cancel timers to match the guard changes in `events`, then
    /// publish them.
    fn settle(self: &Arc<Self>, state: &mut SessionState, events: &[PickEvent]) {
        for event in events {
            let PickEvent::RemoveArmed { item_id, armed } = event else {
                continue;
            };
            if let Some(previous) = state.timers.remove(item_id) {
                previous.abort();
            }
            if !armed {
                continue;
            }
            let Some(deadline) = state.list.item(item_id).and_then(|item| item.armed_deadline())
            else {
                continue;
            };

            let session = Arc::clone(self);
            let timer_item = item_id.clone();
            let task = tokio::spawn(async move {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
                session.expire(&timer_item).await;
            });
            state.timers.insert(item_id.clone(), task.abort_handle());
        }
        self.publish(events);
    }

    fn publish(&self, events: &[PickEvent]) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event.clone());
        }
    }

    fn snapshot_of(&self, list: &PickList) -> PickSnapshot {
        PickSnapshot {
            order_id: list.order_id().clone(),
            picker_id: self.picker_id.clone(),
            status: list.status(),
            all_items_complete: list.all_items_complete(),
            items: list.progress(),
        }
    }
}

/// Registry of active sessions, at most one per order.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct PickingService {
    inner: Arc<Registry>,
}

struct Registry {
    sessions: Mutex<HashMap<OrderId, Arc<PickSession>>>,
    store: Arc<dyn OrderStore>,
    window: Duration,
    idle_timeout: Duration,
}

impl std::fmt::Debug for PickingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickingService")
            .field("window", &self.inner.window)
            .field("idle_timeout", &self.inner.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl PickingService {
    /// Sessions persist their picks to `store` when they end.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, window: Duration, idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Registry {
                sessions: Mutex::new(HashMap::new()),
                store,
                window,
                idle_timeout,
            }),
        }
    }

    /// Open a session on a normalized order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyClaimed` if the order has a session,
    /// `NotPickable` if it is past picking, and `InvalidOrder` if it lacks
    /// ids or items.
    pub async fn claim(
        &self,
        order: &NormalizedOrder,
        picker_id: UserId,
    ) -> Result<Arc<PickSession>, SessionError> {
        let list = PickList::from_order(order, self.inner.window)?;
        let order_id = list.order_id().clone();
        let status = list.status();
        if !matches!(status, OrderStatus::Pending | OrderStatus::Picking) {
            return Err(SessionError::NotPickable { order_id, status });
        }

        let mut sessions = self.inner.sessions.lock().await;
        if let Some(existing) = sessions.get(&order_id) {
            return Err(SessionError::AlreadyClaimed {
                order_id,
                picker_id: existing.picker_id.clone(),
            });
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let session = Arc::new(PickSession {
            token: Uuid::new_v4(),
            picker_id,
            state: Mutex::new(SessionState {
                list,
                timers: HashMap::new(),
                last_activity: clock(),
                watchdog: None,
            }),
            events,
        });

        // `finish` needs the registry lock held here, so the watchdog cannot
        // act before the session is registered.
        let watchdog = tokio::spawn(self.clone().release_when_idle(
            order_id.clone(),
            Arc::clone(&session),
        ));
        session.state.lock().await.watchdog = Some(watchdog.abort_handle());
        sessions.insert(order_id.clone(), Arc::clone(&session));

        tracing::info!(
            order_id = %order_id,
            picker_id = %session.picker_id,
            "Picking session claimed"
        );
        Ok(session)
    }

    /// Look up a session by order and token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if there is no session for the order
    /// or the token does not match.
    pub async fn session(
        &self,
        order_id: &OrderId,
        token: Uuid,
    ) -> Result<Arc<PickSession>, SessionError> {
        self.inner
            .sessions
            .lock()
            .await
            .get(order_id)
            .filter(|session| session.token == token)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(order_id.clone()))
    }

    /// Whether any session holds the order.
    pub async fn is_active(&self, order_id: &OrderId) -> bool {
        self.inner.sessions.lock().await.contains_key(order_id)
    }

    /// End a session: cancel its timers, persist its picks, then unlock the
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if there is no matching session and
    /// `SessionError::Persist` if the store rejects the picks. After a
    /// persistence failure the session is still active and the release can
    /// be retried.
    pub async fn release(&self, order_id: &OrderId, token: Uuid) -> Result<PickSnapshot, SessionError> {
        let (session, snapshot) = self.finish(order_id, token).await?;
        if let Some(watchdog) = session.detach_watchdog().await {
            watchdog.abort();
        }
        tracing::info!(
            order_id = %order_id,
            status = %snapshot.status,
            "Picking session released"
        );
        Ok(snapshot)
    }

    /// Drop a session without persisting anything.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if there is no matching session.
    pub async fn abandon(&self, order_id: &OrderId, token: Uuid) -> Result<(), SessionError> {
        let session = {
            let mut sessions = self.inner.sessions.lock().await;
            if sessions
                .get(order_id)
                .is_some_and(|session| session.token == token)
            {
                sessions.remove(order_id)
            } else {
                None
            }
        }
        .ok_or_else(|| SessionError::NotFound(order_id.clone()))?;

        session.close().await;
        if let Some(watchdog) = session.detach_watchdog().await {
            watchdog.abort();
        }
        tracing::info!(order_id = %order_id, "Picking session abandoned");
        Ok(())
    }

    /// Persist the session's picks and unregister it. The registry stays
    /// locked throughout, so nothing can claim the order in between.
    async fn finish(
        &self,
        order_id: &OrderId,
        token: Uuid,
    ) -> Result<(Arc<PickSession>, PickSnapshot), SessionError> {
        let mut sessions = self.inner.sessions.lock().await;
        let session = sessions
            .get(order_id)
            .filter(|session| session.token == token)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(order_id.clone()))?;

        let snapshot = session.close().await;
        self.inner
            .store
            .record_picks(order_id, snapshot.status, &snapshot.picks())?;
        sessions.remove(order_id);
        Ok((session, snapshot))
    }

    /// Watchdog body: sleep until the session has been idle for the full
    /// timeout, then release it. A failed release is retried after another
    /// idle period.
    async fn release_when_idle(self, order_id: OrderId, session: Arc<PickSession>) {
        let idle_timeout = self.inner.idle_timeout;
        loop {
            let deadline = session.last_activity().await + idle_timeout;
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            if session.last_activity().await + idle_timeout > clock() {
                continue;
            }

            match self.finish(&order_id, session.token).await {
                Ok((_, snapshot)) => {
                    // Clear this task's own handle without aborting it
                    session.detach_watchdog().await;
                    tracing::info!(
                        order_id = %order_id,
                        picker_id = %session.picker_id,
                        status = %snapshot.status,
                        "Idle picking session released"
                    );
                    return;
                }
                Err(SessionError::NotFound(_)) => return,
                Err(e) => {
                    tracing::warn!(
                        order_id = %order_id,
                        error = %e,
                        "Failed to release idle picking session"
                    );
                    session.touch().await;
                }
            }
        }
    }
}

/// Current time on the runtime clock, so paused test time applies.
fn clock() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
