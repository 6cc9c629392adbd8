//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Category and product reads, catalog seeding
//! - `cart` - Per-user cart lines
//! - `orders` - Order placement and cancellation
//! - `payments` - Payment profile bookkeeping
//! - `shipments` - Shipment creation and tracking
//! - `notifications` / `email` - Queued transactional email
//! - `invoice` - Invoice documents for placed orders

pub mod cart;
pub mod catalog;
pub mod email;
pub mod error;
pub mod invoice;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod shipments;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use email::{EmailError, EmailService, MailTransport, RenderedEmail};
pub use error::CommerceError;
pub use invoice::{HtmlInvoiceRenderer, InvoiceError, InvoiceRef, InvoiceRenderer};
pub use notifications::{EmailQueue, Notification, NotificationDispatcher, Recipient};
pub use orders::{MAX_PLACEMENT_ATTEMPTS, OrderPolicy, OrderService, PlacedOrder};
pub use payments::PaymentService;
pub use shipments::ShipmentService;
