//! In-memory store for tests and local development.
//!
//! A unit of work holds the store's async mutex for its whole lifetime and
//! edits a private copy of the state. Commit writes the copy back; drop
//! discards it. Units of work therefore run one at a time, which behaves
//! like serializable isolation.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use dac_retail_core::{
    CartId, CartLineId, CategoryId, DeliveryStatus, OrderId, OrderLineId, OrderNumber,
    PaymentProfileId, Price, ProductId, ShipmentId, ShippingStatus, UserId,
};

use super::RepositoryError;
use super::store::{
    CartStore, CatalogStore, OrderStore, PaymentStore, ShipmentStore, Store, UnitOfWork,
};
use crate::models::{
    BillingDetails, Cart, CartLine, Category, NewOrder, NewOrderLine, NewProduct, NewShipment,
    Order, OrderLine, PaymentMethodUpdate, PaymentProfile, Product, ProductSize, Shipment,
};

/// Everything the store holds. Compare two snapshots to assert that a
/// failed operation changed nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryState {
    last_id: i32,
    pub categories: BTreeMap<CategoryId, Category>,
    pub products: BTreeMap<ProductId, Product>,
    pub carts: BTreeMap<CartId, Cart>,
    pub cart_lines: BTreeMap<CartLineId, CartLine>,
    pub orders: BTreeMap<OrderId, Order>,
    pub order_lines: BTreeMap<OrderLineId, OrderLine>,
    pub payment_profiles: BTreeMap<PaymentProfileId, PaymentProfile>,
    pub shipments: BTreeMap<ShipmentId, Shipment>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    /// Current stock of a product, if it exists.
    #[must_use]
    pub fn stock(&self, id: ProductId) -> Option<i32> {
        self.products.get(&id).map(|p| p.quantity_available)
    }

    /// Lines of the order with the given number.
    #[must_use]
    pub fn lines_of(&self, number: &OrderNumber) -> Vec<&OrderLine> {
        let Some(order) = self.orders.values().find(|o| &o.order_number == number) else {
            return Vec::new();
        };
        self.order_lines
            .values()
            .filter(|line| line.order_id == order.id)
            .collect()
    }

    fn cart_of(&self, user: UserId) -> Option<&Cart> {
        self.carts.values().find(|cart| cart.user_id == user)
    }

    fn order_by_number(&self, number: &OrderNumber) -> Option<&Order> {
        self.orders.values().find(|o| &o.order_number == number)
    }
}

/// A failure to inject into the next commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitFailure {
    /// Fail as if the transaction lost a race (retryable).
    Conflict,
    /// Fail as if the database went away.
    Unavailable,
}

impl CommitFailure {
    fn into_error(self) -> RepositoryError {
        match self {
            Self::Conflict => RepositoryError::Conflict("could not serialize access".to_owned()),
            Self::Unavailable => RepositoryError::Database(sqlx::Error::PoolClosed),
        }
    }
}

/// Store backed by process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    commit_failures: Arc<StdMutex<VecDeque<CommitFailure>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Make the next commit fail. Calls queue up.
    pub fn fail_next_commit(&self, failure: CommitFailure) {
        if let Ok(mut failures) = self.commit_failures.lock() {
            failures.push_back(failure);
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            commit_failures: Arc::clone(&self.commit_failures),
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    commit_failures: Arc<StdMutex<VecDeque<CommitFailure>>>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let injected = self
            .commit_failures
            .lock()
            .ok()
            .and_then(|mut failures| failures.pop_front());
        if let Some(failure) = injected {
            return Err(failure.into_error());
        }

        let Self {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

fn normalized_sizes(product: &NewProduct) -> Vec<ProductSize> {
    let mut sizes = product.sizes.clone();
    sizes.sort();
    sizes.dedup();
    sizes
}

#[async_trait]
impl CatalogStore for MemoryUnitOfWork {
    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories: Vec<Category> = self.working.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn upsert_category(&mut self, name: &str) -> Result<Category, RepositoryError> {
        if let Some(existing) = self.working.categories.values().find(|c| c.name == name) {
            return Ok(existing.clone());
        }
        let category = Category {
            id: CategoryId::new(self.working.next_id()),
            name: name.to_owned(),
        };
        self.working
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_products(
        &mut self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .working
            .products
            .values()
            .filter(|p| category.is_none_or(|id| p.category_id == id))
            .cloned()
            .collect())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn upsert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        if product.quantity_available < 0 {
            return Err(RepositoryError::Constraint(
                "quantity_available must not be negative".to_owned(),
            ));
        }
        if !self.working.categories.contains_key(&product.category_id) {
            return Err(RepositoryError::Constraint(format!(
                "unknown category {}",
                product.category_id
            )));
        }

        let existing = self
            .working
            .products
            .values()
            .find(|p| p.category_id == product.category_id && p.name == product.name)
            .map(|p| (p.id, p.created_at));
        let (id, created_at) = match existing {
            Some(found) => found,
            None => (ProductId::new(self.working.next_id()), Utc::now()),
        };

        let stored = Product {
            id,
            category_id: product.category_id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            quantity_available: product.quantity_available,
            image: product.image.clone(),
            seller: product.seller.clone(),
            brand_name: product.brand_name.clone(),
            listing_date: product.listing_date,
            manufacturing_date: product.manufacturing_date,
            expiry_date: product.expiry_date,
            highlights: product.highlights.clone(),
            color: product.color.clone(),
            fabric: product.fabric.clone(),
            sizes: normalized_sizes(product),
            created_at,
        };
        self.working.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .iter()
            .filter_map(|id| self.working.products.get(id).cloned())
            .collect())
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: i32) -> Result<i32, RepositoryError> {
        let product = self
            .working
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        let quantity = product
            .quantity_available
            .checked_add(delta)
            .filter(|q| *q >= 0)
            .ok_or_else(|| {
                RepositoryError::Constraint(format!("stock of product {id} would go negative"))
            })?;
        product.quantity_available = quantity;
        Ok(quantity)
    }
}

#[async_trait]
impl CartStore for MemoryUnitOfWork {
    async fn find_cart(&mut self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.working.cart_of(user).cloned())
    }

    async fn lock_cart(&mut self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        self.find_cart(user).await
    }

    async fn get_or_create_cart(&mut self, user: UserId) -> Result<Cart, RepositoryError> {
        if let Some(cart) = self.working.cart_of(user) {
            return Ok(cart.clone());
        }
        let cart = Cart {
            id: CartId::new(self.working.next_id()),
            user_id: user,
            created_at: Utc::now(),
        };
        self.working.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        Ok(self
            .working
            .cart_lines
            .values()
            .filter(|line| line.cart_id == cart)
            .cloned()
            .collect())
    }

    async fn add_to_line(
        &mut self,
        cart: CartId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        if !self.working.products.contains_key(&product) {
            return Err(RepositoryError::Constraint(format!(
                "unknown product {product}"
            )));
        }

        let existing = self
            .working
            .cart_lines
            .values_mut()
            .find(|line| line.cart_id == cart && line.product_id == product);
        if let Some(line) = existing {
            let total = line
                .quantity
                .checked_add(quantity)
                .filter(|q| *q >= 1)
                .ok_or_else(|| RepositoryError::Constraint("quantity out of range".to_owned()))?;
            line.quantity = total;
            return Ok(line.clone());
        }

        if quantity < 1 {
            return Err(RepositoryError::Constraint(
                "quantity must be at least 1".to_owned(),
            ));
        }
        let line = CartLine {
            id: CartLineId::new(self.working.next_id()),
            cart_id: cart,
            product_id: product,
            quantity,
        };
        self.working.cart_lines.insert(line.id, line.clone());
        Ok(line)
    }

    async fn remove_line(
        &mut self,
        cart: CartId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let before = self.working.cart_lines.len();
        self.working
            .cart_lines
            .retain(|_, line| !(line.cart_id == cart && line.product_id == product));
        Ok(self.working.cart_lines.len() < before)
    }

    async fn clear_cart(&mut self, cart: CartId) -> Result<(), RepositoryError> {
        self.working.cart_lines.retain(|_, line| line.cart_id != cart);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryUnitOfWork {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        if self.working.order_by_number(&order.order_number).is_some() {
            return Err(RepositoryError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }
        let stored = Order {
            id: OrderId::new(self.working.next_id()),
            user_id: order.user_id,
            order_number: order.order_number.clone(),
            shipping: order.shipping.clone(),
            order_date: Utc::now(),
            payment_method: order.payment_method,
            total: Price::ZERO,
            shipping_status: ShippingStatus::NotShipped,
        };
        self.working.orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn insert_order_line(
        &mut self,
        line: &NewOrderLine,
    ) -> Result<OrderLine, RepositoryError> {
        if !self.working.orders.contains_key(&line.order_id) {
            return Err(RepositoryError::NotFound);
        }
        let stored = OrderLine {
            id: OrderLineId::new(self.working.next_id()),
            order_id: line.order_id,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            seller: line.seller.clone(),
            quantity: line.quantity,
            price: line.price,
            total: line.total,
        };
        self.working.order_lines.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn order_lines(&mut self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self
            .working
            .order_lines
            .values()
            .filter(|line| line.order_id == order)
            .cloned()
            .collect())
    }

    async fn set_order_total(
        &mut self,
        order: OrderId,
        total: Price,
    ) -> Result<(), RepositoryError> {
        let order = self
            .working
            .orders
            .get_mut(&order)
            .ok_or(RepositoryError::NotFound)?;
        order.total = total;
        Ok(())
    }

    async fn find_order(
        &mut self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self.working.order_by_number(number).cloned())
    }

    async fn lock_order(
        &mut self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        self.find_order(number).await
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn list_orders(&mut self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .working
            .orders
            .values()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.order_date, b.id).cmp(&(a.order_date, a.id)));
        Ok(orders)
    }

    async fn earliest_order(&mut self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .working
            .orders
            .values()
            .filter(|o| o.user_id == user)
            .min_by_key(|o| (o.order_date, o.id))
            .cloned())
    }

    async fn set_shipping_status(
        &mut self,
        order: OrderId,
        status: ShippingStatus,
    ) -> Result<(), RepositoryError> {
        let order = self
            .working
            .orders
            .get_mut(&order)
            .ok_or(RepositoryError::NotFound)?;
        order.shipping_status = status;
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for MemoryUnitOfWork {
    async fn list_payment_profiles(
        &mut self,
        user: UserId,
    ) -> Result<Vec<PaymentProfile>, RepositoryError> {
        Ok(self
            .working
            .payment_profiles
            .values()
            .filter(|p| p.user_id == user)
            .cloned()
            .collect())
    }

    async fn insert_payment_profile_if_absent(
        &mut self,
        user: UserId,
        billing: &BillingDetails,
    ) -> Result<bool, RepositoryError> {
        if self
            .working
            .payment_profiles
            .values()
            .any(|p| p.user_id == user)
        {
            return Ok(false);
        }
        let profile = PaymentProfile {
            id: PaymentProfileId::new(self.working.next_id()),
            user_id: user,
            billing: Some(billing.clone()),
            payment_method: None,
            card_type: None,
            card_last4: None,
            created_at: Utc::now(),
        };
        self.working.payment_profiles.insert(profile.id, profile);
        Ok(true)
    }

    async fn save_payment_method(
        &mut self,
        user: UserId,
        billing: Option<&BillingDetails>,
        method: &PaymentMethodUpdate,
    ) -> Result<PaymentProfile, RepositoryError> {
        let existing = self
            .working
            .payment_profiles
            .values_mut()
            .find(|p| p.user_id == user);
        if let Some(profile) = existing {
            profile.payment_method = Some(method.payment_method);
            profile.card_type = method.card_type;
            profile.card_last4.clone_from(&method.card_last4);
            return Ok(profile.clone());
        }

        let profile = PaymentProfile {
            id: PaymentProfileId::new(self.working.next_id()),
            user_id: user,
            billing: billing.cloned(),
            payment_method: Some(method.payment_method),
            card_type: method.card_type,
            card_last4: method.card_last4.clone(),
            created_at: Utc::now(),
        };
        self.working
            .payment_profiles
            .insert(profile.id, profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl ShipmentStore for MemoryUnitOfWork {
    async fn insert_shipment(
        &mut self,
        shipment: &NewShipment,
    ) -> Result<Shipment, RepositoryError> {
        if self
            .working
            .shipments
            .values()
            .any(|s| s.order_id == shipment.order_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "order {} already has a shipment",
                shipment.order_id
            )));
        }
        let stored = Shipment {
            id: ShipmentId::new(self.working.next_id()),
            order_id: shipment.order_id,
            courier: shipment.courier,
            tracking_id: shipment.tracking_id.clone(),
            shipped_at: Utc::now(),
            expected_delivery_date: shipment.expected_delivery_date,
            delivery_status: DeliveryStatus::InTransit,
        };
        self.working.shipments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_shipment(&mut self, order: OrderId) -> Result<Option<Shipment>, RepositoryError> {
        Ok(self
            .working
            .shipments
            .values()
            .find(|s| s.order_id == order)
            .cloned())
    }

    async fn set_delivery_status(
        &mut self,
        shipment: ShipmentId,
        status: DeliveryStatus,
    ) -> Result<(), RepositoryError> {
        let shipment = self
            .working
            .shipments
            .get_mut(&shipment)
            .ok_or(RepositoryError::NotFound)?;
        shipment.delivery_status = status;
        Ok(())
    }

    async fn list_shipments(&mut self, user: UserId) -> Result<Vec<Shipment>, RepositoryError> {
        let orders = &self.working.orders;
        let mut shipments: Vec<Shipment> = self
            .working
            .shipments
            .values()
            .filter(|s| orders.get(&s.order_id).is_some_and(|o| o.user_id == user))
            .cloned()
            .collect();
        shipments.sort_by(|a, b| (b.shipped_at, b.id).cmp(&(a.shipped_at, a.id)));
        Ok(shipments)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn new_product(category: CategoryId, name: &str, stock: i32) -> NewProduct {
        NewProduct {
            category_id: category,
            name: name.to_owned(),
            description: String::new(),
            price: Price::from_paise(1000),
            quantity_available: stock,
            image: None,
            seller: "Acme".to_owned(),
            brand_name: "Acme".to_owned(),
            listing_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            manufacturing_date: None,
            expiry_date: None,
            highlights: String::new(),
            color: None,
            fabric: None,
            sizes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_changes_visible() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let category = uow.upsert_category("Shirts").await.unwrap();
        uow.commit().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.categories.get(&category.id), Some(&category));
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.upsert_category("Shirts").await.unwrap();
        }
        assert_eq!(store.snapshot().await, MemoryState::default());
    }

    #[tokio::test]
    async fn test_injected_commit_failure_discards_changes() {
        let store = MemoryStore::new();
        store.fail_next_commit(CommitFailure::Conflict);

        let mut uow = store.begin().await.unwrap();
        uow.upsert_category("Shirts").await.unwrap();
        let err = uow.commit().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(store.snapshot().await.categories.is_empty());

        let mut uow = store.begin().await.unwrap();
        uow.upsert_category("Shirts").await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(store.snapshot().await.categories.len(), 1);
    }

    #[tokio::test]
    async fn test_stock_never_goes_negative() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let category = uow.upsert_category("Shoes").await.unwrap();
        let product = uow
            .upsert_product(&new_product(category.id, "Runner", 1))
            .await
            .unwrap();

        assert_eq!(uow.adjust_stock(product.id, -1).await.unwrap(), 0);
        assert!(matches!(
            uow.adjust_stock(product.id, -1).await,
            Err(RepositoryError::Constraint(_))
        ));
        assert_eq!(uow.adjust_stock(product.id, 3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_upsert_product_keeps_identity() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let category = uow.upsert_category("Shoes").await.unwrap();
        let first = uow
            .upsert_product(&new_product(category.id, "Runner", 1))
            .await
            .unwrap();
        let second = uow
            .upsert_product(&new_product(category.id, "Runner", 9))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity_available, 9);
        assert_eq!(uow.list_products(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_to_line_increments() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let category = uow.upsert_category("Shoes").await.unwrap();
        let product = uow
            .upsert_product(&new_product(category.id, "Runner", 5))
            .await
            .unwrap();
        let cart = uow.get_or_create_cart(UserId::new(7)).await.unwrap();

        uow.add_to_line(cart.id, product.id, 1).await.unwrap();
        let line = uow.add_to_line(cart.id, product.id, 2).await.unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(uow.cart_lines(cart.id).await.unwrap().len(), 1);

        assert!(uow.remove_line(cart.id, product.id).await.unwrap());
        assert!(!uow.remove_line(cart.id, product.id).await.unwrap());
    }
}
