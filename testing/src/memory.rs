//! In-memory order store for fast, deterministic testing.
//!
//! - [`InMemoryOrderStore`]: `BTreeMap`-backed tables behind `Arc<RwLock>`
//! - [`InMemoryOrderReader`]: an immutable snapshot taken at `begin_read`
//!
//! Every reader call appends its [`QueryKind`] to a shared log, so tests can
//! assert exactly which round trips a strategy issued. An [`Outage`] can be
//! injected to make sessions fail on demand.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use chrono::{DateTime, Utc};
use order_query_core::{
    Address, Delivery, DeliveryId, DeliveryStatus, FlatOrderRow, Item, ItemId, Member, MemberId,
    Order, OrderCriteria, OrderDraft, OrderGraphRow, OrderId, OrderItem, OrderItemId, OrderLineRow,
    OrderReader, OrderRoot, OrderStore, OrderSummaryView, Pagination, QueryError, QueryKind,
    Result,
};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Simulated substrate failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outage {
    /// `begin_read` fails.
    OnBegin,
    /// The session serves this many round trips, then every call fails.
    AfterRoundTrips(usize),
}

/// The stored tables.
#[derive(Clone, Debug, Default)]
struct Tables {
    members: BTreeMap<MemberId, Member>,
    items: BTreeMap<ItemId, Item>,
    deliveries: BTreeMap<DeliveryId, Delivery>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
}

impl Tables {
    /// Orders inner-joined with member and delivery, filtered, ascending by id.
    fn roots(&self, criteria: &OrderCriteria) -> Vec<OrderRoot> {
        self.orders
            .values()
            .filter_map(|order| {
                let member = self.members.get(&order.member_id())?;
                let delivery = self.deliveries.get(&order.delivery_id())?;
                criteria
                    .matches(order.status(), &member.name)
                    .then(|| OrderRoot {
                        order: order.clone(),
                        member: member.clone(),
                        delivery: delivery.clone(),
                    })
            })
            .collect()
    }

    /// Lines of `order_id` inner-joined with their item, ascending by id.
    fn lines_of(&self, order_id: OrderId) -> impl Iterator<Item = (&OrderItem, &Item)> {
        self.order_items
            .values()
            .filter(move |order_item| order_item.order_id() == order_id)
            .filter_map(move |order_item| Some((order_item, self.items.get(&order_item.item_id())?)))
    }

    fn graph_rows(&self, criteria: &OrderCriteria) -> Vec<OrderGraphRow> {
        self.roots(criteria)
            .into_iter()
            .flat_map(|root| {
                self.lines_of(root.order.id())
                    .map(|(order_item, item)| OrderGraphRow {
                        order: root.order.clone(),
                        member: root.member.clone(),
                        delivery: root.delivery.clone(),
                        order_item: order_item.clone(),
                        item: item.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

fn summary(root: &OrderRoot) -> OrderSummaryView {
    OrderSummaryView {
        id: root.order.id(),
        buyer_name: root.member.name.clone(),
        order_date: root.order.order_date(),
        status: root.order.status(),
        address: root.delivery.address.clone(),
    }
}

/// In-memory implementation of [`OrderStore`].
///
/// Clones share the same tables and round-trip log.
///
/// # Example
///
/// ```
/// use order_query_testing::InMemoryOrderStore;
/// use order_query_core::{Address, OrderDraft};
///
/// let store = InMemoryOrderStore::new();
/// let member = store.insert_member("spring", Address::new("Seoul", "1", "1111"));
/// let book = store.insert_item("JPA1 BOOK", 10_000, 100);
///
/// let draft = OrderDraft::new(member.id).with_line(book.id, 2);
/// let order_id = store.place_order(&draft, order_query_testing::test_time()).unwrap();
///
/// assert!(store.order(order_id).is_some());
/// assert_eq!(store.item(book.id).unwrap().stock_quantity, 98);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<RwLock<Tables>>,
    log: Arc<RwLock<Vec<QueryKind>>>,
    outage: Arc<RwLock<Option<Outage>>>,
    sessions: Arc<AtomicUsize>,
    sequence: Arc<AtomicI64>,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Register a member.
    pub fn insert_member(&self, name: impl Into<String>, address: Address) -> Member {
        let member = Member {
            id: MemberId::new(self.next_id()),
            name: name.into(),
            address,
        };
        self.tables
            .write()
            .unwrap()
            .members
            .insert(member.id, member.clone());
        member
    }

    /// Add a catalog item.
    pub fn insert_item(&self, name: impl Into<String>, price: i64, stock_quantity: i32) -> Item {
        let item = Item {
            id: ItemId::new(self.next_id()),
            name: name.into(),
            price,
            stock_quantity,
        };
        self.tables
            .write()
            .unwrap()
            .items
            .insert(item.id, item.clone());
        item
    }

    /// Change an item's catalog price. Existing order lines keep theirs.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotFound`] for an unknown item.
    pub fn set_item_price(&self, id: ItemId, price: i64) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        let item = tables
            .items
            .get_mut(&id)
            .ok_or_else(|| QueryError::not_found("item", id.get()))?;
        item.price = price;
        Ok(())
    }

    /// Place an order: copy the member's address into a new delivery,
    /// snapshot each item's price and take the quantities out of stock.
    ///
    /// Nothing is written unless every line succeeds.
    ///
    /// # Errors
    ///
    /// - [`QueryError::ValidationFailed`] for an empty draft, a non-positive
    ///   quantity or insufficient stock.
    /// - [`QueryError::NotFound`] for an unknown member or item.
    pub fn place_order(&self, draft: &OrderDraft, order_date: DateTime<Utc>) -> Result<OrderId> {
        draft.validate()?;
        let mut tables = self.tables.write().unwrap();

        let member = tables
            .members
            .get(&draft.member_id)
            .cloned()
            .ok_or_else(|| QueryError::not_found("member", draft.member_id.get()))?;

        let mut touched: BTreeMap<ItemId, Item> = BTreeMap::new();
        for (item_id, quantity) in &draft.lines {
            let item = match touched.entry(*item_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(
                    tables
                        .items
                        .get(item_id)
                        .cloned()
                        .ok_or_else(|| QueryError::not_found("item", item_id.get()))?,
                ),
            };
            item.remove_stock(*quantity)?;
        }

        let delivery = Delivery {
            id: DeliveryId::new(self.next_id()),
            address: member.address.clone(),
            status: DeliveryStatus::Ready,
        };
        let order = Order::place(
            OrderId::new(self.next_id()),
            member.id,
            delivery.id,
            order_date,
        );

        let mut order_items = Vec::with_capacity(draft.lines.len());
        for (item_id, quantity) in &draft.lines {
            let item = tables
                .items
                .get(item_id)
                .ok_or_else(|| QueryError::not_found("item", item_id.get()))?;
            order_items.push(OrderItem::snapshot(
                OrderItemId::new(self.next_id()),
                order.id(),
                item,
                *quantity,
            )?);
        }

        let order_id = order.id();
        tables.items.extend(touched);
        tables.deliveries.insert(delivery.id, delivery);
        tables.orders.insert(order_id, order);
        tables
            .order_items
            .extend(order_items.into_iter().map(|line| (line.id(), line)));

        tracing::debug!(order_id = order_id.get(), "Placed order in memory");
        Ok(order_id)
    }

    /// Cancel an order and put its quantities back into stock.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] for an unknown order.
    /// - [`QueryError::ValidationFailed`] if the delivery is completed or
    ///   the order is already cancelled.
    pub fn cancel_order(&self, id: OrderId) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        let tables = &mut *tables;

        let order = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| QueryError::not_found("order", id.get()))?;
        let delivery = tables
            .deliveries
            .get(&order.delivery_id())
            .ok_or_else(|| QueryError::not_found("delivery", order.delivery_id().get()))?;
        order.cancel(delivery)?;

        for order_item in tables.order_items.values().filter(|line| line.order_id() == id) {
            if let Some(item) = tables.items.get_mut(&order_item.item_id()) {
                item.add_stock(order_item.quantity());
            }
        }
        Ok(())
    }

    /// Mark an order's delivery as completed.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotFound`] for an unknown order.
    pub fn complete_delivery(&self, order_id: OrderId) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        let delivery_id = tables
            .orders
            .get(&order_id)
            .map(Order::delivery_id)
            .ok_or_else(|| QueryError::not_found("order", order_id.get()))?;
        if let Some(delivery) = tables.deliveries.get_mut(&delivery_id) {
            delivery.status = DeliveryStatus::Completed;
        }
        Ok(())
    }

    /// Remove a catalog item, leaving dangling order lines behind.
    pub fn remove_item(&self, id: ItemId) {
        self.tables.write().unwrap().items.remove(&id);
    }

    /// Current state of an item.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.tables.read().unwrap().items.get(&id).cloned()
    }

    /// Current state of an order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.tables.read().unwrap().orders.get(&id).cloned()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.tables.read().unwrap().orders.len()
    }

    /// Number of stored order lines.
    #[must_use]
    pub fn order_item_count(&self) -> usize {
        self.tables.read().unwrap().order_items.len()
    }

    /// Make subsequent sessions fail.
    pub fn set_outage(&self, outage: Outage) {
        *self.outage.write().unwrap() = Some(outage);
    }

    /// Let subsequent sessions succeed again.
    pub fn clear_outage(&self) {
        *self.outage.write().unwrap() = None;
    }

    /// Every round trip issued since the last [`Self::reset_log`].
    #[must_use]
    pub fn round_trips(&self) -> Vec<QueryKind> {
        self.log.read().unwrap().clone()
    }

    /// Number of round trips issued since the last [`Self::reset_log`].
    #[must_use]
    pub fn round_trip_count(&self) -> usize {
        self.log.read().unwrap().len()
    }

    /// Number of round trips of one kind.
    #[must_use]
    pub fn count(&self, kind: QueryKind) -> usize {
        self.log.read().unwrap().iter().filter(|k| **k == kind).count()
    }

    /// Number of sessions opened since the last [`Self::reset_log`].
    #[must_use]
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Forget recorded round trips and sessions.
    pub fn reset_log(&self) {
        self.log.write().unwrap().clear();
        self.sessions.store(0, Ordering::SeqCst);
    }
}

impl OrderStore for InMemoryOrderStore {
    type Reader = InMemoryOrderReader;

    async fn begin_read(&self) -> Result<InMemoryOrderReader> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        let outage = *self.outage.read().unwrap();
        if outage == Some(Outage::OnBegin) {
            return Err(QueryError::StoreUnavailable(
                "in-memory store is down".to_string(),
            ));
        }
        Ok(InMemoryOrderReader {
            snapshot: Arc::new(self.tables.read().unwrap().clone()),
            log: Arc::clone(&self.log),
            outage,
            served: 0,
        })
    }
}

/// One snapshot session over an [`InMemoryOrderStore`].
#[derive(Debug)]
pub struct InMemoryOrderReader {
    snapshot: Arc<Tables>,
    log: Arc<RwLock<Vec<QueryKind>>>,
    outage: Option<Outage>,
    served: usize,
}

impl InMemoryOrderReader {
    fn record(&mut self, kind: QueryKind) -> Result<&Tables> {
        if matches!(self.outage, Some(Outage::AfterRoundTrips(limit)) if self.served >= limit) {
            return Err(QueryError::StoreUnavailable(format!(
                "in-memory store went down before {kind}"
            )));
        }
        self.served += 1;
        self.log.write().unwrap().push(kind);
        Ok(&self.snapshot)
    }
}

impl OrderReader for InMemoryOrderReader {
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.record(QueryKind::OrderById)?.orders.get(&id).cloned())
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.record(QueryKind::MemberById)?.members.get(&id).cloned())
    }

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Option<Delivery>> {
        Ok(self
            .record(QueryKind::DeliveryById)?
            .deliveries
            .get(&id)
            .cloned())
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.record(QueryKind::ItemById)?.items.get(&id).cloned())
    }

    async fn find_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self
            .record(QueryKind::OrderItemsByOrder)?
            .order_items
            .values()
            .filter(|line| line.order_id() == order_id)
            .cloned()
            .collect())
    }

    async fn search_orders(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<Order>> {
        let tables = self.record(QueryKind::Orders)?;
        let matching = tables.orders.values().filter(|order| {
            tables
                .members
                .get(&order.member_id())
                .is_some_and(|member| criteria.matches(order.status(), &member.name))
        });
        Ok(window.apply(matching.cloned()))
    }

    async fn search_order_roots(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<OrderRoot>> {
        let tables = self.record(QueryKind::OrderRoots)?;
        Ok(window.apply(tables.roots(criteria)))
    }

    async fn search_order_graph(&mut self, criteria: &OrderCriteria) -> Result<Vec<OrderGraphRow>> {
        Ok(self.record(QueryKind::OrderGraphRows)?.graph_rows(criteria))
    }

    async fn order_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderItem>> {
        let wanted: HashSet<OrderId> = order_ids.iter().copied().collect();
        Ok(self
            .record(QueryKind::OrderItemsBatch)?
            .order_items
            .values()
            .filter(|line| wanted.contains(&line.order_id()))
            .cloned()
            .collect())
    }

    async fn items_in(&mut self, item_ids: &[ItemId]) -> Result<Vec<Item>> {
        let tables = self.record(QueryKind::ItemsBatch)?;
        let wanted: HashSet<ItemId> = item_ids.iter().copied().collect();
        Ok(tables
            .items
            .values()
            .filter(|item| wanted.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn project_order_headers(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<OrderSummaryView>> {
        let tables = self.record(QueryKind::OrderHeaders)?;
        Ok(window.apply(tables.roots(criteria).iter().map(summary)))
    }

    async fn project_order_lines(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderLineRow>> {
        let tables = self.record(QueryKind::OrderLines)?;
        let wanted: HashSet<OrderId> = order_ids.iter().copied().collect();
        Ok(tables
            .order_items
            .values()
            .filter(|line| wanted.contains(&line.order_id()))
            .filter_map(|line| {
                let item = tables.items.get(&line.item_id())?;
                Some(OrderLineRow {
                    order_id: line.order_id(),
                    item_name: item.name.clone(),
                    unit_price: line.unit_price(),
                    quantity: line.quantity(),
                })
            })
            .collect())
    }

    async fn project_flat_rows(&mut self, criteria: &OrderCriteria) -> Result<Vec<FlatOrderRow>> {
        let tables = self.record(QueryKind::FlatOrderRows)?;
        Ok(tables
            .graph_rows(criteria)
            .into_iter()
            .map(|row| FlatOrderRow {
                order_id: row.order.id(),
                buyer_name: row.member.name,
                order_date: row.order.order_date(),
                status: row.order.status(),
                address: row.delivery.address,
                item_name: row.item.name,
                unit_price: row.order_item.unit_price(),
                quantity: row.order_item.quantity(),
            })
            .collect())
    }

    async fn finish(self) -> Result<()> {
        Ok(())
    }
}
