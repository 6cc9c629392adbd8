//! Status and choice enums for orders, payments, shipments and sizes.
//!
//! Each enum maps to a PostgreSQL enum type in the `store` schema when the
//! `postgres` feature is enabled. The `Display` and `FromStr` forms match the
//! database labels and the JSON representation.

use serde::{Deserialize, Serialize};

/// Implement `Display`/`FromStr` using the snake_case labels of an enum.
macro_rules! impl_labels {
    ($name:ident, $what:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The snake_case label used in the database and JSON.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $what, ": {}"), s)),
                }
            }
        }
    };
}

/// Order lifecycle state.
///
/// Only `NotShipped -> Cancelled` is available to customers. Shipment
/// operations move `NotShipped -> Shipped -> Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.shipping_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    #[default]
    NotShipped,
    Shipped,
    Delivered,
    Cancelled,
}

impl_labels!(ShippingStatus, "shipping status", {
    NotShipped => "not_shipped",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl ShippingStatus {
    /// Whether a customer may still cancel an order in this state.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::NotShipped)
    }
}

/// Carrier-side delivery progress of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.delivery_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    InTransit,
    OutForDelivery,
    Delivered,
}

impl_labels!(DeliveryStatus, "delivery status", {
    InTransit => "in_transit",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
});

impl DeliveryStatus {
    /// Delivery status only moves forward; skipping a step is allowed.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        next > self
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    DebitCreditCard,
    Upi,
}

impl_labels!(PaymentMethod, "payment method", {
    CashOnDelivery => "cash_on_delivery",
    DebitCreditCard => "debit_credit_card",
    Upi => "upi",
});

impl PaymentMethod {
    /// Human readable label printed on invoices.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::DebitCreditCard => "Debit/Credit Card",
            Self::Upi => "UPI",
        }
    }

    /// Whether the method can be saved on a payment profile.
    ///
    /// Cash on delivery has nothing to remember.
    #[must_use]
    pub const fn is_storable(self) -> bool {
        !matches!(self, Self::CashOnDelivery)
    }
}

/// Card network of a saved card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.card_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Visa,
    Mastercard,
    Rupay,
}

impl_labels!(CardType, "card type", {
    Visa => "visa",
    Mastercard => "mastercard",
    Rupay => "rupay",
});

/// Shipping carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.courier", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Courier {
    Bluedart,
    Delhivery,
    IndiaPost,
    #[default]
    Other,
}

impl_labels!(Courier, "courier", {
    Bluedart => "bluedart",
    Delhivery => "delhivery",
    IndiaPost => "india_post",
    Other => "other",
});

/// Size family a product can be offered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.size_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SizeKind {
    Shirt,
    TrouserWaist,
    Footwear,
}

impl_labels!(SizeKind, "size kind", {
    Shirt => "shirt",
    TrouserWaist => "trouser_waist",
    Footwear => "footwear",
});

impl SizeKind {
    /// The sizes offered in this family.
    #[must_use]
    pub const fn allowed_sizes(self) -> &'static [&'static str] {
        match self {
            Self::Shirt => &["34", "36", "38", "40", "42", "44"],
            Self::TrouserWaist => &["28", "30", "32", "34", "36", "38", "40"],
            Self::Footwear => &["6", "7", "8", "9", "10"],
        }
    }

    /// Whether `size` is a valid label for this family.
    #[must_use]
    pub fn allows(self, size: &str) -> bool {
        self.allowed_sizes().contains(&size)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_shipped_is_cancellable() {
        assert!(ShippingStatus::NotShipped.is_cancellable());
        assert!(!ShippingStatus::Shipped.is_cancellable());
        assert!(!ShippingStatus::Delivered.is_cancellable());
        assert!(!ShippingStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_delivery_status_moves_forward_only() {
        use DeliveryStatus::{Delivered, InTransit, OutForDelivery};

        assert!(InTransit.can_advance_to(OutForDelivery));
        assert!(InTransit.can_advance_to(Delivered));
        assert!(OutForDelivery.can_advance_to(Delivered));
        assert!(!Delivered.can_advance_to(InTransit));
        assert!(!OutForDelivery.can_advance_to(OutForDelivery));
    }

    #[test]
    fn test_labels_round_trip() {
        for status in ShippingStatus::ALL {
            assert_eq!(status.as_str().parse::<ShippingStatus>().unwrap(), *status);
        }
        for courier in Courier::ALL {
            assert_eq!(courier.to_string().parse::<Courier>().unwrap(), *courier);
        }
        assert!("lost".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn test_serde_matches_labels() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"cash_on_delivery\"");
        let json = serde_json::to_string(&SizeKind::TrouserWaist).unwrap();
        assert_eq!(json, format!("\"{}\"", SizeKind::TrouserWaist));
    }

    #[test]
    fn test_size_families() {
        assert!(SizeKind::Shirt.allows("38"));
        assert!(!SizeKind::Shirt.allows("28"));
        assert!(SizeKind::Footwear.allows("10"));
        assert!(!SizeKind::TrouserWaist.allows("42"));
    }

    #[test]
    fn test_cash_on_delivery_is_not_storable() {
        assert!(!PaymentMethod::CashOnDelivery.is_storable());
        assert!(PaymentMethod::Upi.is_storable());
        assert_eq!(PaymentMethod::DebitCreditCard.display_name(), "Debit/Credit Card");
    }
}
