//! Order status commands.
//!
//! Each command writes first and hands back the row the backend confirmed;
//! callers render from that row, never from a locally patched copy. Any
//! status may move to any other.

use std::sync::Arc;

use neonflake_core::{OrderId, OrderStatus, PaymentStatus};
use thiserror::Error;

use super::notifications::{Notifier, ToastKind};
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{Order, OrderPatch};

/// A status change an operator can apply to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCommand {
    Process,
    Cancel,
    Deliver,
    AcceptPayment,
}

impl OrderCommand {
    /// Parse the path segment used by the order action routes.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "process" => Some(Self::Process),
            "cancel" => Some(Self::Cancel),
            "deliver" => Some(Self::Deliver),
            "accept_payment" => Some(Self::AcceptPayment),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Cancel => "cancel",
            Self::Deliver => "deliver",
            Self::AcceptPayment => "accept_payment",
        }
    }

    /// Columns to write for `order`.
    #[must_use]
    pub fn patch_for(self, order: &Order) -> OrderPatch {
        match self {
            Self::Process => OrderPatch {
                status: Some(OrderStatus::Processing),
                payment_status: None,
            },
            Self::Cancel => OrderPatch {
                status: Some(OrderStatus::Cancelled),
                payment_status: None,
            },
            Self::Deliver => OrderPatch {
                status: Some(OrderStatus::Delivered),
                payment_status: None,
            },
            Self::AcceptPayment => OrderPatch {
                status: (order.status == OrderStatus::New).then_some(OrderStatus::Processing),
                payment_status: Some(PaymentStatus::Paid),
            },
        }
    }

    /// Notification for a confirmed command. `before` is the order as it
    /// was prior to the write.
    fn outcome(self, before: &Order) -> (String, ToastKind) {
        let id = &before.id;
        match self {
            Self::Process => (format!("Order #{id} has been set to processing"), ToastKind::Success),
            Self::Cancel => (format!("Order #{id} has been cancelled"), ToastKind::Error),
            Self::Deliver => (format!("Order #{id} has been marked as delivered"), ToastKind::Success),
            Self::AcceptPayment if before.status == OrderStatus::New => (
                format!("Order #{id} has been set to processing and payment accepted"),
                ToastKind::Success,
            ),
            Self::AcceptPayment => (format!("Payment for Order #{id} has been accepted"), ToastKind::Success),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderCommandError {
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OrderCommandError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            e => Self::Repository(e),
        }
    }
}

/// Applies [`OrderCommand`]s and lists orders.
#[derive(Clone)]
pub struct OrderCommands {
    orders: Arc<dyn OrderRepository>,
    notifier: Notifier,
}

impl OrderCommands {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>, notifier: Notifier) -> Self {
        Self { orders, notifier }
    }

    /// Orders newest first, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns the repository error after notifying.
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        self.orders.list(status).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to fetch orders");
            self.notifier.error("Failed to fetch orders");
        })
    }

    /// Apply `command` to order `id` and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `OrderCommandError::NotFound` when no order has that id.
    #[tracing::instrument(skip(self), fields(command = command.as_str()))]
    pub async fn execute(&self, command: OrderCommand, id: &OrderId) -> Result<Order, OrderCommandError> {
        let result = async {
            let before = self.orders.get(id).await?;
            let patch = command.patch_for(&before);
            let after = self.orders.update(id, &patch).await?;
            Ok::<_, RepositoryError>((before, after))
        }
        .await;

        match result {
            Ok((before, after)) => {
                let (message, kind) = command.outcome(&before);
                tracing::info!(order_id = %id, status = %after.status, payment = %after.payment_status, "Order updated");
                self.notifier.notify(message, kind);
                Ok(after)
            }
            Err(e) => {
                tracing::error!(order_id = %id, error = %e, "Failed to update order");
                self.notifier.error(format!("Failed to update order #{id}"));
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for OrderCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderCommands").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::MockOrderRepository;
    use crate::models::tests::order;
    use testresult::TestResult;

    fn commands(repo: MockOrderRepository) -> (OrderCommands, Notifier) {
        let notifier = Notifier::new(Duration::from_secs(5));
        (OrderCommands::new(Arc::new(repo), notifier.clone()), notifier)
    }

    #[test]
    fn test_parse() {
        assert_eq!(OrderCommand::parse("accept_payment"), Some(OrderCommand::AcceptPayment));
        assert_eq!(OrderCommand::parse("refund"), None);
    }

    #[test]
    fn test_accept_payment_moves_new_orders_to_processing() {
        let new = order("7", 100, OrderStatus::New, 1);
        let patch = OrderCommand::AcceptPayment.patch_for(&new);
        assert_eq!(patch.status, Some(OrderStatus::Processing));
        assert_eq!(patch.payment_status, Some(PaymentStatus::Paid));

        let delivered = order("8", 100, OrderStatus::Delivered, 1);
        let patch = OrderCommand::AcceptPayment.patch_for(&delivered);
        assert_eq!(patch.status, None);
    }

    #[test]
    fn test_any_status_may_move_to_any_other() {
        let cancelled = order("9", 100, OrderStatus::Cancelled, 1);
        assert_eq!(
            OrderCommand::Deliver.patch_for(&cancelled).status,
            Some(OrderStatus::Delivered)
        );
    }

    #[tokio::test]
    async fn test_execute_returns_confirmed_row() -> TestResult {
        let mut repo = MockOrderRepository::new();
        repo.expect_get()
            .once()
            .return_once(|_| Ok(order("1042", 2499, OrderStatus::New, 2)));
        repo.expect_update()
            .once()
            .withf(|id, patch| id.as_str() == "1042" && patch.status == Some(OrderStatus::Processing))
            .return_once(|_, _| {
                let mut stored = order("1042", 2499, OrderStatus::Processing, 2);
                stored.payment_status = PaymentStatus::Paid;
                Ok(stored)
            });

        let (commands, notifier) = commands(repo);
        let updated = commands
            .execute(OrderCommand::AcceptPayment, &OrderId::new("1042"))
            .await?;

        assert_eq!(updated.status, OrderStatus::Processing);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        let toasts = notifier.snapshot();
        assert_eq!(
            toasts[0].message,
            "Order #1042 has been set to processing and payment accepted"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_notifies_with_error_kind() -> TestResult {
        let mut repo = MockOrderRepository::new();
        repo.expect_get()
            .return_once(|_| Ok(order("5", 10, OrderStatus::Processing, 1)));
        repo.expect_update()
            .return_once(|_, _| Ok(order("5", 10, OrderStatus::Cancelled, 1)));

        let (commands, notifier) = commands(repo);
        commands.execute(OrderCommand::Cancel, &OrderId::new("5")).await?;
        let toast = &notifier.snapshot()[0];
        assert_eq!(toast.message, "Order #5 has been cancelled");
        assert_eq!(toast.kind, ToastKind::Error);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_order_is_not_written() {
        let mut repo = MockOrderRepository::new();
        repo.expect_get().return_once(|_| Err(RepositoryError::NotFound));
        repo.expect_update().never();

        let (commands, notifier) = commands(repo);
        let err = commands
            .execute(OrderCommand::Deliver, &OrderId::new("404"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderCommandError::NotFound));
        assert_eq!(notifier.snapshot()[0].message, "Failed to update order #404");
    }
}
