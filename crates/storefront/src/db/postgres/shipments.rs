//! Shipment queries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use dac_retail_core::{Courier, DeliveryStatus, OrderId, ShipmentId, UserId};

use super::PgUnitOfWork;
use crate::db::RepositoryError;
use crate::db::store::ShipmentStore;
use crate::models::{NewShipment, Shipment};

#[derive(sqlx::FromRow)]
struct ShipmentRow {
    id: ShipmentId,
    order_id: OrderId,
    courier: Courier,
    tracking_id: String,
    shipped_at: DateTime<Utc>,
    expected_delivery_date: NaiveDate,
    delivery_status: DeliveryStatus,
}

impl From<ShipmentRow> for Shipment {
    fn from(row: ShipmentRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            courier: row.courier,
            tracking_id: row.tracking_id,
            shipped_at: row.shipped_at,
            expected_delivery_date: row.expected_delivery_date,
            delivery_status: row.delivery_status,
        }
    }
}

#[async_trait]
impl ShipmentStore for PgUnitOfWork {
    async fn insert_shipment(
        &mut self,
        shipment: &NewShipment,
    ) -> Result<Shipment, RepositoryError> {
        let row = sqlx::query_as::<_, ShipmentRow>(
            r"
            INSERT INTO store.shipment (order_id, courier, tracking_id, expected_delivery_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, courier, tracking_id, shipped_at, expected_delivery_date,
                delivery_status
            ",
        )
        .bind(shipment.order_id)
        .bind(shipment.courier)
        .bind(&shipment.tracking_id)
        .bind(shipment.expected_delivery_date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.into())
    }

    async fn find_shipment(&mut self, order: OrderId) -> Result<Option<Shipment>, RepositoryError> {
        let row = sqlx::query_as::<_, ShipmentRow>(
            r"
            SELECT id, order_id, courier, tracking_id, shipped_at, expected_delivery_date,
                   delivery_status
            FROM store.shipment
            WHERE order_id = $1
            ",
        )
        .bind(order)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Shipment::from))
    }

    async fn set_delivery_status(
        &mut self,
        shipment: ShipmentId,
        status: DeliveryStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE store.shipment SET delivery_status = $2 WHERE id = $1")
            .bind(shipment)
            .bind(status)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_shipments(&mut self, user: UserId) -> Result<Vec<Shipment>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            r#"
            SELECT s.id, s.order_id, s.courier, s.tracking_id, s.shipped_at,
                   s.expected_delivery_date, s.delivery_status
            FROM store.shipment s
            JOIN store."order" o ON o.id = s.order_id
            WHERE o.user_id = $1
            ORDER BY s.shipped_at DESC, s.id DESC
            "#,
        )
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(Shipment::from).collect())
    }
}
