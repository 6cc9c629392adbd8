//! Payment profile queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dac_retail_core::{CardType, MobileNumber, PaymentMethod, PaymentProfileId, PinCode, UserId};

use super::{PgUnitOfWork, corrupt};
use crate::db::RepositoryError;
use crate::db::store::PaymentStore;
use crate::models::{BillingDetails, PaymentMethodUpdate, PaymentProfile};

#[derive(sqlx::FromRow)]
struct PaymentProfileRow {
    id: PaymentProfileId,
    user_id: UserId,
    address: Option<String>,
    city: Option<String>,
    pin_code: Option<String>,
    state: Option<String>,
    mobile: Option<String>,
    payment_method: Option<PaymentMethod>,
    card_type: Option<CardType>,
    card_last4: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentProfileRow> for PaymentProfile {
    type Error = RepositoryError;

    fn try_from(row: PaymentProfileRow) -> Result<Self, Self::Error> {
        let billing = match (row.address, row.city, row.pin_code, row.state, row.mobile) {
            (Some(address), Some(city), Some(pin_code), Some(state), Some(mobile)) => {
                Some(BillingDetails {
                    address,
                    city,
                    pin_code: PinCode::parse(&pin_code).map_err(|e| corrupt("pin code", e))?,
                    state,
                    mobile: MobileNumber::parse(&mobile).map_err(|e| corrupt("mobile", e))?,
                })
            }
            _ => None,
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            billing,
            payment_method: row.payment_method,
            card_type: row.card_type,
            card_last4: row.card_last4,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PaymentStore for PgUnitOfWork {
    async fn list_payment_profiles(
        &mut self,
        user: UserId,
    ) -> Result<Vec<PaymentProfile>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentProfileRow>(
            r"
            SELECT id, user_id, address, city, pin_code, state, mobile, payment_method,
                   card_type, card_last4, created_at
            FROM store.payment_profile
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(PaymentProfile::try_from).collect()
    }

    async fn insert_payment_profile_if_absent(
        &mut self,
        user: UserId,
        billing: &BillingDetails,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO store.payment_profile (user_id, address, city, pin_code, state, mobile)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user)
        .bind(&billing.address)
        .bind(&billing.city)
        .bind(billing.pin_code.as_str())
        .bind(&billing.state)
        .bind(billing.mobile.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_payment_method(
        &mut self,
        user: UserId,
        billing: Option<&BillingDetails>,
        method: &PaymentMethodUpdate,
    ) -> Result<PaymentProfile, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentProfileRow>(
            r"
            INSERT INTO store.payment_profile (
                user_id, address, city, pin_code, state, mobile,
                payment_method, card_type, card_last4
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                payment_method = EXCLUDED.payment_method,
                card_type = EXCLUDED.card_type,
                card_last4 = EXCLUDED.card_last4
            RETURNING id, user_id, address, city, pin_code, state, mobile, payment_method,
                card_type, card_last4, created_at
            ",
        )
        .bind(user)
        .bind(billing.map(|b| b.address.as_str()))
        .bind(billing.map(|b| b.city.as_str()))
        .bind(billing.map(|b| b.pin_code.as_str()))
        .bind(billing.map(|b| b.state.as_str()))
        .bind(billing.map(|b| b.mobile.as_str()))
        .bind(method.payment_method)
        .bind(method.card_type)
        .bind(&method.card_last4)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }
}
