//! Bookshop sample data for an empty database.

use chrono::{Duration, Utc};
use order_query_core::{Address, OrderDraft};
use order_query_postgres::PgOrderStore;

/// Insert two members, four books and one order per member, unless the
/// database already holds members.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub async fn bookshop(store: &PgOrderStore) -> anyhow::Result<()> {
    let (members,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM member")
        .fetch_one(store.pool())
        .await?;
    if members > 0 {
        tracing::info!(members, "Database already seeded, skipping");
        return Ok(());
    }

    let user_a = store
        .insert_member("userA", &Address::new("Seoul", "1", "1111"))
        .await?;
    let user_b = store
        .insert_member("userB", &Address::new("Jinju", "2", "2222"))
        .await?;

    let jpa1 = store.insert_item("JPA1 BOOK", 10_000, 100).await?;
    let jpa2 = store.insert_item("JPA2 BOOK", 20_000, 100).await?;
    let spring1 = store.insert_item("SPRING1 BOOK", 20_000, 200).await?;
    let spring2 = store.insert_item("SPRING2 BOOK", 40_000, 300).await?;

    let now = Utc::now();
    store
        .place_order(
            &OrderDraft::new(user_a.id)
                .with_line(jpa1.id, 1)
                .with_line(jpa2.id, 2),
            now,
        )
        .await?;
    store
        .place_order(
            &OrderDraft::new(user_b.id)
                .with_line(spring1.id, 3)
                .with_line(spring2.id, 4),
            now + Duration::seconds(1),
        )
        .await?;

    tracing::info!("Seeded bookshop data");
    Ok(())
}
