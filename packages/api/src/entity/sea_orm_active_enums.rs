use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of an order.
///
/// Orders move strictly forward: pending → confirmed → shipping → completed.
/// Cancellation is a side exit, allowed only while the order has not shipped
/// (pending or confirmed), and must restore the stock it reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "shipping")]
    Shipping,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Human-readable label, used by the admin serializations.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending confirmation",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipping => "Shipping",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// The single forward step of the lifecycle, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Shipping),
            OrderStatus::Shipping => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    /// Whether `target` is the legal forward transition from `self`.
    /// Cancellation is never a forward transition; it goes through the
    /// cancel endpoint so restocking cannot be skipped.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }

    /// Cancellation is only permitted before the order ships.
    pub fn cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn lifecycle_is_linear() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Shipping));
        assert!(Shipping.can_transition_to(Completed));

        // No skipping, no going back, no cancelling through this path.
        assert!(!Pending.can_transition_to(Shipping));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Shipping));
        assert!(!Pending.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn cancellable_only_before_shipping() {
        assert!(Pending.cancellable());
        assert!(Confirmed.cancellable());
        assert!(!Shipping.cancellable());
        assert!(!Completed.cancellable());
        assert!(!Cancelled.cancellable());
    }
}
