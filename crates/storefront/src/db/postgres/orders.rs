//! Order queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dac_retail_core::{
    Email, MobileNumber, OrderId, OrderLineId, OrderNumber, PaymentMethod, PinCode, Price,
    ProductId, ShippingStatus, UserId,
};

use super::{PgUnitOfWork, corrupt};
use crate::db::RepositoryError;
use crate::db::store::OrderStore;
use crate::models::{NewOrder, NewOrderLine, Order, OrderLine, ShippingDetails};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    order_number: OrderNumber,
    full_name: String,
    email: String,
    address: String,
    city: String,
    pin_code: String,
    state: String,
    mobile: String,
    order_date: DateTime<Utc>,
    payment_method: PaymentMethod,
    total: Price,
    shipping_status: ShippingStatus,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            order_number: row.order_number,
            shipping: ShippingDetails {
                full_name: row.full_name,
                email: Email::parse(&row.email).map_err(|e| corrupt("email", e))?,
                address: row.address,
                city: row.city,
                pin_code: PinCode::parse(&row.pin_code).map_err(|e| corrupt("pin code", e))?,
                state: row.state,
                mobile: MobileNumber::parse(&row.mobile).map_err(|e| corrupt("mobile", e))?,
            },
            order_date: row.order_date,
            payment_method: row.payment_method,
            total: row.total,
            shipping_status: row.shipping_status,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    seller: String,
    quantity: i32,
    price: Price,
    total: Price,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            seller: row.seller,
            quantity: row.quantity,
            price: row.price,
            total: row.total,
        }
    }
}

#[async_trait]
impl OrderStore for PgUnitOfWork {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let shipping = &order.shipping;
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO store."order" (
                user_id, order_number, full_name, email, address, city, pin_code, state,
                mobile, payment_method
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, order_number, full_name, email, address, city, pin_code,
                state, mobile, order_date, payment_method, total, shipping_status
            "#,
        )
        .bind(order.user_id)
        .bind(&order.order_number)
        .bind(&shipping.full_name)
        .bind(shipping.email.as_str())
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(shipping.pin_code.as_str())
        .bind(&shipping.state)
        .bind(shipping.mobile.as_str())
        .bind(order.payment_method)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn insert_order_line(
        &mut self,
        line: &NewOrderLine,
    ) -> Result<OrderLine, RepositoryError> {
        let row = sqlx::query_as::<_, OrderLineRow>(
            r"
            INSERT INTO store.order_line (
                order_id, product_id, product_name, seller, quantity, price, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, order_id, product_id, product_name, seller, quantity, price, total
            ",
        )
        .bind(line.order_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(&line.seller)
        .bind(line.quantity)
        .bind(line.price)
        .bind(line.total)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.into())
    }

    async fn order_lines(&mut self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT id, order_id, product_id, product_name, seller, quantity, price, total
            FROM store.order_line
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    async fn set_order_total(
        &mut self,
        order: OrderId,
        total: Price,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(r#"UPDATE store."order" SET total = $2 WHERE id = $1"#)
            .bind(order)
            .bind(total)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_order(
        &mut self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_number, full_name, email, address, city, pin_code,
                   state, mobile, order_date, payment_method, total, shipping_status
            FROM store."order"
            WHERE order_number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn lock_order(
        &mut self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_number, full_name, email, address, city, pin_code,
                   state, mobile, order_date, payment_method, total, shipping_status
            FROM store."order"
            WHERE order_number = $1
            FOR UPDATE
            "#,
        )
        .bind(number)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_number, full_name, email, address, city, pin_code,
                   state, mobile, order_date, payment_method, total, shipping_status
            FROM store."order"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_orders(&mut self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_number, full_name, email, address, city, pin_code,
                   state, mobile, order_date, payment_method, total, shipping_status
            FROM store."order"
            WHERE user_id = $1
            ORDER BY order_date DESC, id DESC
            "#,
        )
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn earliest_order(&mut self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, order_number, full_name, email, address, city, pin_code,
                   state, mobile, order_date, payment_method, total, shipping_status
            FROM store."order"
            WHERE user_id = $1
            ORDER BY order_date, id
            LIMIT 1
            "#,
        )
        .bind(user)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn set_shipping_status(
        &mut self,
        order: OrderId,
        status: ShippingStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query(r#"UPDATE store."order" SET shipping_status = $2 WHERE id = $1"#)
                .bind(order)
                .bind(status)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
