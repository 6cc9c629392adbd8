//! Newtype IDs for type-safe entity references.
//!
//! Every table in the `store` schema uses a `SERIAL` primary key. Wrapping
//! those integers in distinct types keeps a `ProductId` from being passed
//! where a `CartId` is expected.

/// Define a type-safe ID wrapper around `i32`.
///
/// IDs are ordered so callers can sort them; the order workflow locks product
/// rows in ascending ID order.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// A customer account. Accounts are owned by the external auth service.
    UserId
);
define_id!(CategoryId);
define_id!(ProductId);
define_id!(CartId);
define_id!(CartLineId);
define_id!(OrderId);
define_id!(OrderLineId);
define_id!(PaymentProfileId);
define_id!(ShipmentId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_sort_numerically() {
        let mut ids = vec![ProductId::new(7), ProductId::new(2), ProductId::new(5)];
        ids.sort();
        assert_eq!(
            ids,
            vec![ProductId::new(2), ProductId::new(5), ProductId::new(7)]
        );
    }

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&OrderId::new(42)).unwrap();
        assert_eq!(json, "42");
        let parsed: OrderId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.as_i32(), 42);
    }
}
