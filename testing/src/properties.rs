//! Property-based testing utilities using proptest.
//!
//! [`arb_dataset`] generates a random but valid shop (members, catalog,
//! orders, some cancelled) and [`arb_criteria`] a filter that hits it often
//! enough to be interesting.

#![allow(clippy::unwrap_used)] // Generated datasets always satisfy the write rules
#![allow(clippy::missing_panics_doc)]

use crate::fixtures::test_time;
use crate::memory::InMemoryOrderStore;
use chrono::Duration;
use order_query_core::{Address, OrderCriteria, OrderDraft, OrderId, OrderStatus};
use proptest::prelude::*;

/// Buyer names, chosen to overlap on substrings and to contain LIKE
/// metacharacters.
pub const BUYER_NAMES: [&str; 6] = ["spring", "summer", "autumn", "winter", "s_m", "100%"];

/// Needles used by [`arb_criteria`].
pub const NEEDLES: [&str; 9] = ["s", "sp", "um", "_", "%", "m", "er", "zz", "  "];

/// One generated order.
#[derive(Debug, Clone)]
pub struct OrderSpec {
    /// Index into [`DatasetSpec::buyers`]
    pub buyer: usize,
    /// (index into [`DatasetSpec::catalog`], quantity)
    pub lines: Vec<(usize, i32)>,
    /// Cancel after placing
    pub cancelled: bool,
}

/// A generated dataset, loaded with [`DatasetSpec::load`].
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// Member names
    pub buyers: Vec<String>,
    /// (item name, price)
    pub catalog: Vec<(String, i64)>,
    /// Orders in placement order
    pub orders: Vec<OrderSpec>,
}

impl DatasetSpec {
    /// Total number of order lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.orders.iter().map(|order| order.lines.len()).sum()
    }

    /// Write the dataset into a fresh store.
    #[must_use]
    pub fn load(&self) -> (InMemoryOrderStore, Vec<OrderId>) {
        let store = InMemoryOrderStore::new();

        let members: Vec<_> = self
            .buyers
            .iter()
            .enumerate()
            .map(|(n, name)| store.insert_member(name.clone(), Address::new("City", format!("{n}"), "0000")))
            .collect();
        let items: Vec<_> = self
            .catalog
            .iter()
            .map(|(name, price)| store.insert_item(name.clone(), *price, i32::MAX / 2))
            .collect();

        let mut placed = Vec::with_capacity(self.orders.len());
        for (n, spec) in self.orders.iter().enumerate() {
            let mut draft = OrderDraft::new(members[spec.buyer % members.len()].id);
            for (item, quantity) in &spec.lines {
                draft = draft.with_line(items[item % items.len()].id, *quantity);
            }
            let order_date = test_time() + Duration::seconds(i64::try_from(n).unwrap());
            let order_id = store.place_order(&draft, order_date).unwrap();
            if spec.cancelled {
                store.cancel_order(order_id).unwrap();
            }
            placed.push(order_id);
        }

        (store, placed)
    }
}

fn arb_order(buyers: usize, catalog: usize) -> impl Strategy<Value = OrderSpec> {
    (
        0..buyers,
        prop::collection::vec((0..catalog, 1i32..5), 1..5),
        prop::bool::weighted(0.2),
    )
        .prop_map(|(buyer, lines, cancelled)| OrderSpec {
            buyer,
            lines,
            cancelled,
        })
}

/// A random dataset with up to `max_orders` orders.
pub fn arb_dataset(max_orders: usize) -> impl Strategy<Value = DatasetSpec> {
    (
        prop::sample::subsequence(BUYER_NAMES.to_vec(), 1..=BUYER_NAMES.len()),
        1usize..6,
    )
        .prop_flat_map(move |(buyers, catalog)| {
            let buyer_count = buyers.len();
            (
                Just(buyers),
                prop::collection::vec(1_000i64..50_000, catalog),
                prop::collection::vec(arb_order(buyer_count, catalog), 0..=max_orders),
            )
        })
        .prop_map(|(buyers, prices, orders)| DatasetSpec {
            buyers: buyers.into_iter().map(str::to_string).collect(),
            catalog: prices
                .into_iter()
                .enumerate()
                .map(|(n, price)| (format!("BOOK-{n}"), price))
                .collect(),
            orders,
        })
}

/// A random filter: optional status, optional needle from [`NEEDLES`].
pub fn arb_criteria() -> impl Strategy<Value = OrderCriteria> {
    (
        prop::option::of(prop::sample::select(vec![OrderStatus::Placed, OrderStatus::Cancelled])),
        prop::option::of(prop::sample::select(NEEDLES.to_vec())),
    )
        .prop_map(|(status, needle)| {
            let criteria = status.map_or_else(OrderCriteria::any, |status| {
                OrderCriteria::any().with_status(status)
            });
            match needle {
                Some(needle) => criteria.with_buyer_name(needle),
                None => criteria,
            }
        })
}
