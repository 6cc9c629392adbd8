//! Fire-and-forget notifications.
//!
//! The order workflow enqueues notifications after its transaction commits.
//! [`EmailQueue`] hands them to a background worker over a bounded channel.
//! Enqueueing never blocks and never fails the caller: when the backlog is
//! full the notification is dropped and reported to Sentry. The queue lives
//! in memory, so a backlog that has not been sent is lost if the process dies.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use dac_retail_core::{Email, ProductId};

use super::email::{self, MailTransport};
use crate::models::{Order, OrderWithLines};

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// The customer, at the email captured on the order.
    Customer(Email),
    /// The operations mailbox (`ADMIN_EMAIL`).
    Operations,
}

/// A message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    OrderConfirmation(Box<OrderWithLines>),
    OrderCancellation(Box<Order>),
    LowStockAlert {
        product_id: ProductId,
        product_name: String,
        quantity_available: i32,
    },
}

impl Notification {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OrderConfirmation(_) => "order_confirmation",
            Self::OrderCancellation(_) => "order_cancellation",
            Self::LowStockAlert { .. } => "low_stock_alert",
        }
    }
}

/// Accepts notifications for later delivery.
pub trait NotificationDispatcher: Send + Sync {
    /// Queue `notification` for `recipient`. Never blocks; delivery failures
    /// are logged by the dispatcher, not reported to the caller.
    fn enqueue(&self, recipient: Recipient, notification: Notification);
}

#[derive(Debug)]
struct Envelope {
    recipient: Recipient,
    notification: Notification,
}

/// Dispatcher backed by an in-process queue and one worker task.
#[derive(Clone)]
pub struct EmailQueue {
    sender: mpsc::Sender<Envelope>,
}

impl EmailQueue {
    /// Create a queue holding up to `capacity` unsent emails and spawn its
    /// worker.
    ///
    /// The worker exits once every clone of the queue has been dropped and
    /// the backlog is drained; await the handle to flush on shutdown.
    pub fn spawn<T>(transport: T, operations: Email, capacity: usize) -> (Self, JoinHandle<()>)
    where
        T: MailTransport + 'static,
    {
        let (queue, receiver) = Self::channel(capacity);
        let handle = tokio::spawn(run_worker(receiver, transport, operations));
        (queue, handle)
    }

    fn channel(capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl NotificationDispatcher for EmailQueue {
    fn enqueue(&self, recipient: Recipient, notification: Notification) {
        let kind = notification.kind();
        let envelope = Envelope {
            recipient,
            notification,
        };
        match self.sender.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                let event_id = sentry::capture_message(
                    "Email queue full, notification dropped",
                    sentry::Level::Error,
                );
                error!(
                    kind,
                    recipient = ?envelope.recipient,
                    sentry_event_id = %event_id,
                    "Email queue full, notification dropped"
                );
            }
            Err(TrySendError::Closed(_)) => {
                warn!(kind, "Email queue closed, notification dropped");
            }
        }
    }
}

async fn run_worker<T: MailTransport>(
    mut receiver: mpsc::Receiver<Envelope>,
    transport: T,
    operations: Email,
) {
    while let Some(envelope) = receiver.recv().await {
        let to = match &envelope.recipient {
            Recipient::Customer(email) => email.as_str(),
            Recipient::Operations => operations.as_str(),
        };
        let kind = envelope.notification.kind();

        let rendered = match email::render(&envelope.notification) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!(kind, error = %e, "Failed to render notification");
                continue;
            }
        };
        if let Err(e) = transport.send(to, &rendered).await {
            let event_id = sentry::capture_error(&e);
            error!(kind, to = %to, error = %e, sentry_event_id = %event_id, "Failed to send notification");
        }
    }
    info!("Email queue drained");
}
