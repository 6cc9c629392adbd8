//! Email rendering and delivery.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain text
//! templates.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use dac_retail_core::ProductId;

use super::notifications::Notification;
use crate::config::EmailConfig;
use crate::models::{Order, OrderWithLines};

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order: &'a OrderWithLines,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order: &'a OrderWithLines,
}

#[derive(Template)]
#[template(path = "email/order_cancellation.html")]
struct OrderCancellationHtml<'a> {
    order: &'a Order,
}

#[derive(Template)]
#[template(path = "email/order_cancellation.txt")]
struct OrderCancellationText<'a> {
    order: &'a Order,
}

#[derive(Template)]
#[template(path = "email/low_stock.html")]
struct LowStockHtml<'a> {
    product_id: ProductId,
    product_name: &'a str,
    quantity_available: i32,
}

#[derive(Template)]
#[template(path = "email/low_stock.txt")]
struct LowStockText<'a> {
    product_id: ProductId,
    product_name: &'a str,
    quantity_available: i32,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the subject and both bodies of a notification.
///
/// # Errors
///
/// Returns an error if a template fails to render.
pub fn render(notification: &Notification) -> Result<RenderedEmail, EmailError> {
    let rendered = match notification {
        Notification::OrderConfirmation(order) => RenderedEmail {
            subject: format!("Order Confirmation #{}", order.order.order_number),
            text: OrderConfirmationText { order }.render()?,
            html: OrderConfirmationHtml { order }.render()?,
        },
        Notification::OrderCancellation(order) => RenderedEmail {
            subject: format!("Order Cancellation #{}", order.order_number),
            text: OrderCancellationText { order }.render()?,
            html: OrderCancellationHtml { order }.render()?,
        },
        Notification::LowStockAlert {
            product_id,
            product_name,
            quantity_available,
        } => RenderedEmail {
            subject: format!("Low Quantity Alert: {product_name}"),
            text: LowStockText {
                product_id: *product_id,
                product_name,
                quantity_available: *quantity_available,
            }
            .render()?,
            html: LowStockHtml {
                product_id: *product_id,
                product_name,
                quantity_available: *quantity_available,
            }
            .render()?,
        },
    };
    Ok(rendered)
}

/// Something that can deliver a rendered email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `email` to `to`.
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError>;
}

/// SMTP delivery.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for EmailService {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        self.mailer.send(message).await?;

        tracing::info!(to = %to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use dac_retail_core::{
        Email, MobileNumber, OrderId, OrderLineId, OrderNumber, PaymentMethod, PinCode, Price,
        ShippingStatus, UserId,
    };

    use super::*;
    use crate::models::{OrderLine, ShippingDetails};

    fn order() -> OrderWithLines {
        OrderWithLines {
            order: Order {
                id: OrderId::new(1),
                user_id: UserId::new(1),
                order_number: OrderNumber::parse("KQ7M2X9P").unwrap(),
                shipping: ShippingDetails {
                    full_name: "Asha Rao".to_string(),
                    email: Email::parse("asha@example.com").unwrap(),
                    address: "12 MG Road".to_string(),
                    city: "Bengaluru".to_string(),
                    pin_code: PinCode::parse("560001").unwrap(),
                    state: "Karnataka".to_string(),
                    mobile: MobileNumber::parse("9876543210").unwrap(),
                },
                order_date: Utc::now(),
                payment_method: PaymentMethod::Upi,
                total: Price::from_paise(3000),
                shipping_status: ShippingStatus::NotShipped,
            },
            items: vec![OrderLine {
                id: OrderLineId::new(2),
                order_id: OrderId::new(1),
                product_id: ProductId::new(3),
                product_name: "Linen Shirt".to_string(),
                seller: "Acme".to_string(),
                quantity: 3,
                price: Price::from_paise(1000),
                total: Price::from_paise(3000),
            }],
        }
    }

    #[test]
    fn test_confirmation_lists_items_and_total() {
        let email = render(&Notification::OrderConfirmation(Box::new(order()))).unwrap();
        assert_eq!(email.subject, "Order Confirmation #KQ7M2X9P");
        assert!(email.text.contains("Linen Shirt"));
        assert!(email.text.contains("Rs. 30.00"));
        assert!(email.html.contains("Asha Rao"));
    }

    #[test]
    fn test_cancellation_mentions_order_number() {
        let email = render(&Notification::OrderCancellation(Box::new(order().order))).unwrap();
        assert!(email.subject.contains("KQ7M2X9P"));
        assert!(email.text.contains("KQ7M2X9P"));
    }

    #[test]
    fn test_low_stock_names_product() {
        let email = render(&Notification::LowStockAlert {
            product_id: ProductId::new(3),
            product_name: "Linen Shirt".to_string(),
            quantity_available: 1,
        })
        .unwrap();
        assert_eq!(email.subject, "Low Quantity Alert: Linen Shirt");
        assert!(email.html.contains("Linen Shirt"));
    }
}
