//! Sample datasets.
//!
//! Every fixture writes through the store's regular write path, so stock,
//! price snapshots and delivery addresses follow the model rules.

#![allow(clippy::unwrap_used)] // Fixtures only fail on a broken store
#![allow(clippy::missing_panics_doc)]

use crate::memory::InMemoryOrderStore;
use chrono::{DateTime, Duration, Utc};
use order_query_core::{Address, ItemId, OrderDraft, OrderId};

/// Fixed timestamp for deterministic tests (2025-01-01 00:00:00 UTC).
///
/// # Panics
///
/// Never in practice: the timestamp is hardcoded.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .expect("hardcoded timestamp should always parse")
        .with_timezone(&Utc)
}

/// Identities created by [`spring_summer`].
#[derive(Debug, Clone, Copy)]
pub struct SpringSummer {
    /// Buyer "spring", two lines
    pub spring_order: OrderId,
    /// Buyer "summer", one line
    pub summer_order: OrderId,
    /// Item on the first line of `spring_order`
    pub first_book: ItemId,
}

/// Two orders: "spring" with two items, "summer" with one.
pub fn spring_summer(store: &InMemoryOrderStore) -> SpringSummer {
    let spring = store.insert_member("spring", Address::new("Seoul", "1", "1111"));
    let summer = store.insert_member("summer", Address::new("Busan", "2", "2222"));

    let first_book = store.insert_item("JPA1 BOOK", 10_000, 100);
    let second_book = store.insert_item("JPA2 BOOK", 20_000, 100);
    let third_book = store.insert_item("SPRING1 BOOK", 20_000, 200);

    let spring_order = store
        .place_order(
            &OrderDraft::new(spring.id)
                .with_line(first_book.id, 1)
                .with_line(second_book.id, 2),
            test_time(),
        )
        .unwrap();
    let summer_order = store
        .place_order(
            &OrderDraft::new(summer.id).with_line(third_book.id, 3),
            test_time() + Duration::minutes(1),
        )
        .unwrap();

    SpringSummer {
        spring_order,
        summer_order,
        first_book: first_book.id,
    }
}

/// The bookshop demo data: two members, four books, one order each.
pub fn bookshop(store: &InMemoryOrderStore) -> Vec<OrderId> {
    let user_a = store.insert_member("userA", Address::new("Seoul", "1", "1111"));
    let user_b = store.insert_member("userB", Address::new("Jinju", "2", "2222"));

    let jpa1 = store.insert_item("JPA1 BOOK", 10_000, 100);
    let jpa2 = store.insert_item("JPA2 BOOK", 20_000, 100);
    let spring1 = store.insert_item("SPRING1 BOOK", 20_000, 200);
    let spring2 = store.insert_item("SPRING2 BOOK", 40_000, 300);

    vec![
        store
            .place_order(
                &OrderDraft::new(user_a.id)
                    .with_line(jpa1.id, 1)
                    .with_line(jpa2.id, 2),
                test_time(),
            )
            .unwrap(),
        store
            .place_order(
                &OrderDraft::new(user_b.id)
                    .with_line(spring1.id, 3)
                    .with_line(spring2.id, 4),
                test_time() + Duration::hours(1),
            )
            .unwrap(),
    ]
}

/// `orders` orders for `buyers` members, each with `lines_per_order` lines
/// cycling through a catalog of `catalog` items.
pub fn bulk(
    store: &InMemoryOrderStore,
    buyers: usize,
    orders: usize,
    lines_per_order: usize,
    catalog: usize,
) -> Vec<OrderId> {
    let members: Vec<_> = (0..buyers.max(1))
        .map(|n| store.insert_member(format!("buyer-{n}"), Address::new("City", format!("{n}"), "0000")))
        .collect();
    let items: Vec<_> = (0..catalog.max(1))
        .map(|n| store.insert_item(format!("item-{n}"), 1_000, i32::MAX))
        .collect();

    (0..orders)
        .map(|n| {
            let mut draft = OrderDraft::new(members[n % members.len()].id);
            for line in 0..lines_per_order.max(1) {
                draft = draft.with_line(items[(n + line) % items.len()].id, 1);
            }
            store
                .place_order(&draft, test_time() + Duration::seconds(i64::try_from(n).unwrap()))
                .unwrap()
        })
        .collect()
}
