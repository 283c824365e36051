//! Per-item quantity controller with the confirm-to-remove guard.

use std::time::{Duration, Instant};

use super::{GuardViolation, PickEvent, PickTier};
use crate::types::OrderItemId;

/// Default confirm-to-remove window.
pub const DEFAULT_REMOVE_WINDOW: Duration = Duration::from_secs(2);

/// Confirm-to-remove sub-state.
///
/// ```text
/// Idle --remove--> Armed { since } --remove within window--> Idle (decrement)
///                                  --window elapses---------> Idle (no change)
///                                  --add--------------------> Idle (superseded)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveGuard {
    #[default]
    Idle,
    Armed { since: Instant },
}

impl RemoveGuard {
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }
}

/// Drives one item's picked quantity between `0` and its target.
///
/// Time is an argument: the caller owns the clock and the expiry timer, and
/// reports back through [`ItemPicker::expire`]. A stale expiry (one whose
/// arm cycle was already confirmed or superseded) does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPicker {
    item_id: OrderItemId,
    current: u32,
    target: u32,
    guard: RemoveGuard,
    window: Duration,
}

impl ItemPicker {
    /// Create a controller. `current` is clamped into `0..=target`.
    #[must_use]
    pub fn new(item_id: OrderItemId, current: u32, target: u32, window: Duration) -> Self {
        Self {
            item_id,
            current: current.min(target),
            target,
            guard: RemoveGuard::Idle,
            window,
        }
    }

    #[must_use]
    pub const fn item_id(&self) -> &OrderItemId {
        &self.item_id
    }

    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    #[must_use]
    pub const fn target(&self) -> u32 {
        self.target
    }

    #[must_use]
    pub fn tier(&self) -> PickTier {
        PickTier::classify(self.current, self.target)
    }

    #[must_use]
    pub const fn guard(&self) -> RemoveGuard {
        self.guard
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.guard.is_armed()
    }

    /// Whether the target quantity has been reached.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.target > 0 && self.current >= self.target
    }

    /// When the pending arm cycle lapses, if one is pending.
    #[must_use]
    pub fn armed_deadline(&self) -> Option<Instant> {
        match self.guard {
            RemoveGuard::Armed { since } => since.checked_add(self.window),
            RemoveGuard::Idle => None,
        }
    }

    /// Pick one more unit.
    ///
    /// An add while armed supersedes the pending remove: the guard is
    /// disarmed and the add still applies.
    pub fn add(&mut self, _now: Instant) -> Vec<PickEvent> {
        if self.current >= self.target {
            return vec![self.violation(GuardViolation::AtTarget)];
        }

        let mut events = self.disarm();
        self.current += 1;
        events.push(self.quantity_changed());
        events
    }

    /// Request removal of one unit.
    ///
    /// The first request arms the guard; a second request inside the window
    /// confirms and decrements. A request after the window has lapsed (the
    /// expiry not yet delivered) starts a fresh arm cycle.
    pub fn remove(&mut self, now: Instant) -> Vec<PickEvent> {
        if self.current == 0 {
            return vec![self.violation(GuardViolation::AtZero)];
        }

        match self.guard {
            RemoveGuard::Armed { since } if now.saturating_duration_since(since) < self.window => {
                self.guard = RemoveGuard::Idle;
                self.current -= 1;
                vec![
                    self.quantity_changed(),
                    PickEvent::RemoveArmed {
                        item_id: self.item_id.clone(),
                        armed: false,
                    },
                ]
            }
            // Idle, or an arm cycle whose expiry has not been delivered yet.
            _ => {
                self.guard = RemoveGuard::Armed { since: now };
                vec![PickEvent::RemoveArmed {
                    item_id: self.item_id.clone(),
                    armed: true,
                }]
            }
        }
    }

    /// Deliver the expiry timer. Disarms only if the current arm cycle has
    /// actually lapsed at `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<PickEvent> {
        match self.armed_deadline() {
            Some(deadline) if now >= deadline => self.disarm(),
            _ => Vec::new(),
        }
    }

    /// Drop any pending arm cycle without changing the quantity.
    pub fn disarm(&mut self) -> Vec<PickEvent> {
        if self.guard.is_armed() {
            self.guard = RemoveGuard::Idle;
            vec![PickEvent::RemoveArmed {
                item_id: self.item_id.clone(),
                armed: false,
            }]
        } else {
            Vec::new()
        }
    }

    fn quantity_changed(&self) -> PickEvent {
        PickEvent::QuantityChanged {
            item_id: self.item_id.clone(),
            new_quantity: self.current,
            tier: self.tier(),
        }
    }

    fn violation(&self, violation: GuardViolation) -> PickEvent {
        tracing::debug!(item_id = %self.item_id, %violation, "Rejected pick request");
        PickEvent::GuardViolation {
            item_id: Some(self.item_id.clone()),
            violation,
        }
    }
}
