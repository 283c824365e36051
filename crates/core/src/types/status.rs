//! Status and priority enums for orders.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Progression is forward-only:
///
/// ```text
/// PENDING -> PICKING -> READY_TO_PACK -> PACKED -> SHIPPED
///
/// any non-terminal status -> CANCELLED
/// ```
///
/// `PENDING -> READY_TO_PACK` is also allowed for orders whose items were
/// all picked in a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Picking,
    ReadyToPack,
    Packed,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Picking,
        Self::ReadyToPack,
        Self::Packed,
        Self::Shipped,
        Self::Cancelled,
    ];

    /// Wire name (`READY_TO_PACK`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Picking => "PICKING",
            Self::ReadyToPack => "READY_TO_PACK",
            Self::Packed => "PACKED",
            Self::Shipped => "SHIPPED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// `SHIPPED` and `CANCELLED` accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Shipped | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is a forward step.
    ///
    /// Item-level guards (every item picked) are checked separately by
    /// [`crate::picking::PickList::advance`].
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Shipped | Self::Cancelled, _) => false,
            (_, Self::Cancelled)
            | (Self::Pending, Self::Picking | Self::ReadyToPack)
            | (Self::Picking, Self::ReadyToPack)
            | (Self::ReadyToPack, Self::Packed)
            | (Self::Packed, Self::Shipped) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Order priority, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    Overnight,
    Urgent,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Normal, Self::Overnight, Self::Urgent];

    /// Wire name (`OVERNIGHT`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::Overnight => "OVERNIGHT",
            Self::Urgent => "URGENT",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("invalid priority: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(
            "ready_to_pack".parse::<OrderStatus>().unwrap(),
            OrderStatus::ReadyToPack
        );
        assert_eq!(" SHIPPED ".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("DONE".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_wire_names() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_forward_only_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_advance_to(Picking));
        assert!(Picking.can_advance_to(ReadyToPack));
        assert!(ReadyToPack.can_advance_to(Packed));
        assert!(Packed.can_advance_to(Shipped));
        assert!(Picking.can_advance_to(Cancelled));

        assert!(!Picking.can_advance_to(Pending));
        assert!(!Packed.can_advance_to(ReadyToPack));
        assert!(!Picking.can_advance_to(Packed));
        assert!(!Picking.can_advance_to(Picking));
        assert!(!ReadyToPack.can_advance_to(Shipped));
        assert!(!Shipped.can_advance_to(Cancelled));
        assert!(!Cancelled.can_advance_to(Pending));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Urgent > Priority::Overnight);
        assert!(Priority::Overnight > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::default(), Priority::Normal);
        assert_eq!("overnight".parse::<Priority>().unwrap(), Priority::Overnight);
        assert!("HIGH".parse::<Priority>().is_err());
    }
}
