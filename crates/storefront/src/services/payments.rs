//! Payment profile bookkeeping. No money moves here.

use std::sync::Arc;

use tracing::instrument;

use dac_retail_core::UserId;

use super::CommerceError;
use crate::db::Store;
use crate::models::{BillingDetails, PaymentMethodRequest, PaymentProfile};

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn Store>,
}

impl PaymentService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list_profiles(&self, user: UserId) -> Result<Vec<PaymentProfile>, CommerceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.list_payment_profiles(user).await?)
    }

    /// Save the user's preferred payment method.
    ///
    /// Creates the profile if the user has none, copying billing details from
    /// their earliest order when there is one.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the method cannot be stored or the card
    /// details are malformed.
    #[instrument(skip(self, request), fields(user_id = %user, method = %request.payment_method))]
    pub async fn save_payment_method(
        &self,
        user: UserId,
        request: &PaymentMethodRequest,
    ) -> Result<PaymentProfile, CommerceError> {
        let update = request.validate()?;

        let mut uow = self.store.begin().await?;
        let billing = uow
            .earliest_order(user)
            .await?
            .map(|order| BillingDetails::from(&order.shipping));
        let profile = uow
            .save_payment_method(user, billing.as_ref(), &update)
            .await?;
        uow.commit().await?;
        Ok(profile)
    }
}
