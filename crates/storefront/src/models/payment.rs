//! Payment profiles.
//!
//! A profile is bookkeeping only. No payment is captured, and card numbers
//! are reduced to their last four digits before they reach the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dac_retail_core::{CardType, MobileNumber, PaymentMethod, PaymentProfileId, PinCode, UserId};

use super::order::ShippingDetails;

/// Errors that can occur when validating a payment method update.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethodError {
    #[error("{0} cannot be saved as a payment method")]
    NotStorable(PaymentMethod),
    #[error("card type is required for card payments")]
    MissingCardType,
    #[error("card number must be 12-19 digits")]
    InvalidCardNumber,
}

/// Billing address copied from an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingDetails {
    pub address: String,
    pub city: String,
    pub pin_code: PinCode,
    pub state: String,
    pub mobile: MobileNumber,
}

impl From<&ShippingDetails> for BillingDetails {
    fn from(shipping: &ShippingDetails) -> Self {
        Self {
            address: shipping.address.clone(),
            city: shipping.city.clone(),
            pin_code: shipping.pin_code.clone(),
            state: shipping.state.clone(),
            mobile: shipping.mobile.clone(),
        }
    }
}

/// A user's stored billing record. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentProfile {
    pub id: PaymentProfileId,
    pub user_id: UserId,
    /// Absent when the profile was saved before the user ever ordered.
    pub billing: Option<BillingDetails>,
    pub payment_method: Option<PaymentMethod>,
    pub card_type: Option<CardType>,
    pub card_last4: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payment method form as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub card_type: Option<CardType>,
    #[serde(default)]
    pub card_number: Option<String>,
}

impl PaymentMethodRequest {
    /// Validate the form, masking the card number.
    ///
    /// # Errors
    ///
    /// Returns an error for cash on delivery, for card payments without a
    /// card type, or for a card number that is not 12-19 digits.
    pub fn validate(&self) -> Result<PaymentMethodUpdate, PaymentMethodError> {
        match self.payment_method {
            PaymentMethod::CashOnDelivery => Err(PaymentMethodError::NotStorable(
                PaymentMethod::CashOnDelivery,
            )),
            PaymentMethod::Upi => Ok(PaymentMethodUpdate {
                payment_method: PaymentMethod::Upi,
                card_type: None,
                card_last4: None,
            }),
            PaymentMethod::DebitCreditCard => {
                let card_type = self.card_type.ok_or(PaymentMethodError::MissingCardType)?;
                let card_last4 = self
                    .card_number
                    .as_deref()
                    .map(last_four_digits)
                    .transpose()?;
                Ok(PaymentMethodUpdate {
                    payment_method: PaymentMethod::DebitCreditCard,
                    card_type: Some(card_type),
                    card_last4,
                })
            }
        }
    }
}

fn last_four_digits(card_number: &str) -> Result<String, PaymentMethodError> {
    let digits: String = card_number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if !(12..=19).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PaymentMethodError::InvalidCardNumber);
    }
    Ok(digits.get(digits.len() - 4..).unwrap_or_default().to_owned())
}

/// Validated payment method fields, ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethodUpdate {
    pub payment_method: PaymentMethod,
    pub card_type: Option<CardType>,
    pub card_last4: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card(number: Option<&str>) -> PaymentMethodRequest {
        PaymentMethodRequest {
            payment_method: PaymentMethod::DebitCreditCard,
            card_type: Some(CardType::Visa),
            card_number: number.map(str::to_string),
        }
    }

    #[test]
    fn test_card_number_is_masked() {
        let update = card(Some("4111 1111 1111 1234")).validate().unwrap();
        assert_eq!(update.card_last4.as_deref(), Some("1234"));
        assert_eq!(update.card_type, Some(CardType::Visa));
    }

    #[test]
    fn test_card_number_must_be_digits() {
        assert_eq!(
            card(Some("4111-abcd-1111")).validate(),
            Err(PaymentMethodError::InvalidCardNumber)
        );
        assert_eq!(
            card(Some("12345")).validate(),
            Err(PaymentMethodError::InvalidCardNumber)
        );
    }

    #[test]
    fn test_card_requires_type() {
        let mut request = card(None);
        request.card_type = None;
        assert_eq!(request.validate(), Err(PaymentMethodError::MissingCardType));
    }

    #[test]
    fn test_upi_drops_card_fields() {
        let request = PaymentMethodRequest {
            payment_method: PaymentMethod::Upi,
            card_type: Some(CardType::Rupay),
            card_number: Some("4111111111111111".to_string()),
        };
        let update = request.validate().unwrap();
        assert_eq!(update.card_type, None);
        assert_eq!(update.card_last4, None);
    }

    #[test]
    fn test_cash_on_delivery_rejected() {
        let request = PaymentMethodRequest {
            payment_method: PaymentMethod::CashOnDelivery,
            card_type: None,
            card_number: None,
        };
        assert!(matches!(
            request.validate(),
            Err(PaymentMethodError::NotStorable(_))
        ));
    }
}
