//! Integration tests for `OrderQueries` over the in-memory store.

#![allow(clippy::unwrap_used)] // Tests can unwrap

use order_query_core::{
    FetchStrategy, OrderCriteria, OrderId, OrderQueries, OrderStatus, Pagination, QueryConfig,
    QueryError, QueryKind,
};
use order_query_testing::fixtures::{self, SpringSummer};
use order_query_testing::{InMemoryOrderStore, Outage};

fn spring_summer() -> (InMemoryOrderStore, OrderQueries<InMemoryOrderStore>, SpringSummer) {
    let store = InMemoryOrderStore::new();
    let ids = fixtures::spring_summer(&store);
    let queries = OrderQueries::new(store.clone(), QueryConfig::default()).unwrap();
    store.reset_log();
    (store, queries, ids)
}

#[tokio::test]
async fn test_buyer_substring_matches_both_orders() {
    let (_, queries, ids) = spring_summer();
    let criteria = OrderCriteria::any().with_buyer_name("s");

    for strategy in FetchStrategy::ALL {
        let views = queries.list_orders(&criteria, strategy, None).await.unwrap();

        let ids_found: Vec<OrderId> = views.iter().map(|view| view.id).collect();
        assert_eq!(ids_found, vec![ids.spring_order, ids.summer_order], "{strategy}");
        assert_eq!(views[0].buyer_name, "spring");
        assert_eq!(views[0].items.len(), 2);
        assert_eq!(views[1].items.len(), 1);
    }
}

#[tokio::test]
async fn test_cancelled_filter_on_placed_orders_is_empty() {
    let (_, queries, _) = spring_summer();
    let criteria = OrderCriteria::any().with_status(OrderStatus::Cancelled);

    for strategy in FetchStrategy::ALL {
        let views = queries.list_orders(&criteria, strategy, None).await.unwrap();
        assert!(views.is_empty(), "{strategy}");
    }
}

#[tokio::test]
async fn test_like_metacharacters_match_literally() {
    let store = InMemoryOrderStore::new();
    fixtures::spring_summer(&store);
    let queries = OrderQueries::new(store, QueryConfig::default()).unwrap();

    for needle in ["%", "_", "s%"] {
        let criteria = OrderCriteria::any().with_buyer_name(needle);
        let views = queries
            .list_orders(&criteria, FetchStrategy::default(), None)
            .await
            .unwrap();
        assert!(views.is_empty(), "needle {needle:?} matched");
    }
}

#[tokio::test]
async fn test_view_contents() {
    let (_, queries, ids) = spring_summer();

    let view = queries.find_order(ids.spring_order).await.unwrap();

    assert_eq!(view.buyer_name, "spring");
    assert_eq!(view.status, OrderStatus::Placed);
    assert_eq!(view.address.city, "Seoul");
    assert_eq!(view.items[0].item_name, "JPA1 BOOK");
    assert_eq!(view.items[0].unit_price, 10_000);
    assert_eq!(view.items[0].quantity, 1);
    assert_eq!(view.items[1].item_name, "JPA2 BOOK");
    assert_eq!(view.items[1].quantity, 2);
}

#[tokio::test]
async fn test_round_trips_per_strategy() {
    let (store, queries, _) = spring_summer();
    let criteria = OrderCriteria::any();

    // two orders with 2 and 1 lines, 3 distinct items, default batch size
    let expected = [
        (FetchStrategy::EntityGraph, 1 + 3 * 2 + 3),
        (FetchStrategy::EntityToView, 1 + 3 * 2 + 3),
        (FetchStrategy::FetchJoinGraph, 1),
        (FetchStrategy::FetchJoinBatched, 3),
        (FetchStrategy::ProjectionPerOrder, 1 + 2),
        (FetchStrategy::ProjectionBatched, 2),
        (FetchStrategy::ProjectionFlat, 1),
    ];

    for (strategy, round_trips) in expected {
        store.reset_log();
        queries.list_orders(&criteria, strategy, None).await.unwrap();
        assert_eq!(store.round_trip_count(), round_trips, "{strategy}");
        assert_eq!(store.sessions(), 1, "{strategy}");
    }
}

#[tokio::test]
async fn test_batched_fetch_join_issues_ceil_n_over_b_batches() {
    let store = InMemoryOrderStore::new();
    fixtures::bulk(&store, 3, 10, 2, 7);
    let queries = OrderQueries::new(store.clone(), QueryConfig::new().with_batch_size(3)).unwrap();
    store.reset_log();

    let views = queries
        .list_orders(&OrderCriteria::any(), FetchStrategy::FetchJoinBatched, None)
        .await
        .unwrap();

    assert_eq!(views.len(), 10);
    assert_eq!(store.count(QueryKind::OrderRoots), 1);
    assert_eq!(store.count(QueryKind::OrderItemsBatch), 4);
    assert_eq!(store.count(QueryKind::ItemsBatch), 3);
}

#[tokio::test]
async fn test_empty_header_page_costs_one_round_trip() {
    let (store, queries, _) = spring_summer();
    let criteria = OrderCriteria::any().with_buyer_name("winter");

    let views = queries
        .list_orders(&criteria, FetchStrategy::ProjectionBatched, None)
        .await
        .unwrap();

    assert!(views.is_empty());
    assert_eq!(store.round_trips(), vec![QueryKind::OrderHeaders]);
}

#[tokio::test]
async fn test_pages_concatenate() {
    let store = InMemoryOrderStore::new();
    fixtures::bulk(&store, 2, 6, 2, 4);
    let queries = OrderQueries::new(store, QueryConfig::default()).unwrap();
    let criteria = OrderCriteria::any();

    for strategy in FetchStrategy::ALL.into_iter().filter(FetchStrategy::supports_pagination) {
        let first = Pagination::new(0, 2).unwrap();
        let page_a = queries.list_orders(&criteria, strategy, Some(first)).await.unwrap();
        let page_b = queries
            .list_orders(&criteria, strategy, Some(first.next()))
            .await
            .unwrap();
        let whole = queries
            .list_orders(&criteria, strategy, Some(Pagination::new(0, 4).unwrap()))
            .await
            .unwrap();

        let joined: Vec<_> = page_a.into_iter().chain(page_b).collect();
        assert_eq!(joined, whole, "{strategy}");
        assert_eq!(whole.len(), 4);
    }
}

#[tokio::test]
async fn test_unpaginated_requests_are_capped_by_max_rows() {
    let store = InMemoryOrderStore::new();
    fixtures::bulk(&store, 2, 5, 1, 2);
    let queries = OrderQueries::new(store, QueryConfig::new().with_max_rows(3)).unwrap();
    let criteria = OrderCriteria::any();

    let capped = queries
        .list_orders(&criteria, FetchStrategy::FetchJoinBatched, None)
        .await
        .unwrap();
    assert_eq!(capped.len(), 3);

    let uncapped = queries
        .list_orders(&criteria, FetchStrategy::FetchJoinGraph, None)
        .await
        .unwrap();
    assert_eq!(uncapped.len(), 5);
}

#[tokio::test]
async fn test_flat_projection_rejects_pagination_without_touching_the_store() {
    let (store, queries, _) = spring_summer();

    let result = queries
        .list_orders(
            &OrderCriteria::any(),
            FetchStrategy::ProjectionFlat,
            Some(Pagination::first(10)),
        )
        .await;

    assert!(matches!(
        result,
        Err(QueryError::UnsupportedPagination {
            strategy: FetchStrategy::ProjectionFlat
        })
    ));
    assert_eq!(store.sessions(), 0);
    assert_eq!(store.round_trip_count(), 0);
}

#[tokio::test]
async fn test_find_missing_order() {
    let (_, queries, _) = spring_summer();

    let result = queries.find_order(OrderId::new(9_999)).await;

    assert!(matches!(
        result,
        Err(QueryError::NotFound {
            entity: "order",
            id: 9_999
        })
    ));
}

#[tokio::test]
async fn test_missing_item_is_not_found() {
    let (store, queries, ids) = spring_summer();
    store.remove_item(ids.first_book);

    for strategy in [FetchStrategy::EntityGraph, FetchStrategy::FetchJoinBatched] {
        let result = queries.list_orders(&OrderCriteria::any(), strategy, None).await;
        assert!(
            matches!(result, Err(QueryError::NotFound { entity: "item", .. })),
            "{strategy}"
        );
    }
}

#[tokio::test]
async fn test_outage_yields_no_partial_result() {
    let (store, queries, ids) = spring_summer();

    store.set_outage(Outage::OnBegin);
    let result = queries
        .list_orders(&OrderCriteria::any(), FetchStrategy::default(), None)
        .await;
    assert!(matches!(result, Err(QueryError::StoreUnavailable(_))));

    store.set_outage(Outage::AfterRoundTrips(2));
    for strategy in [FetchStrategy::EntityGraph, FetchStrategy::FetchJoinBatched] {
        let result = queries.list_orders(&OrderCriteria::any(), strategy, None).await;
        assert!(matches!(result, Err(QueryError::StoreUnavailable(_))), "{strategy}");
    }
    assert!(matches!(
        queries.find_order(ids.spring_order).await,
        Err(QueryError::StoreUnavailable(_))
    ));

    store.clear_outage();
    assert!(queries.find_order(ids.spring_order).await.is_ok());
}

#[tokio::test]
async fn test_unit_price_is_a_snapshot() {
    let (store, queries, ids) = spring_summer();
    store.set_item_price(ids.first_book, 99_000).unwrap();

    for strategy in FetchStrategy::ALL {
        let views = queries
            .list_orders(&OrderCriteria::any(), strategy, None)
            .await
            .unwrap();
        assert_eq!(views[0].items[0].unit_price, 10_000, "{strategy}");
    }
}

#[tokio::test]
async fn test_cancel_rules() {
    let (store, queries, ids) = spring_summer();
    let stock_before = store.item(ids.first_book).unwrap().stock_quantity;

    store.cancel_order(ids.spring_order).unwrap();
    assert_eq!(
        store.item(ids.first_book).unwrap().stock_quantity,
        stock_before + 1
    );
    assert!(matches!(
        store.cancel_order(ids.spring_order),
        Err(QueryError::ValidationFailed(_))
    ));

    store.complete_delivery(ids.summer_order).unwrap();
    assert!(matches!(
        store.cancel_order(ids.summer_order),
        Err(QueryError::ValidationFailed(_))
    ));

    let cancelled = queries
        .list_orders(
            &OrderCriteria::any().with_status(OrderStatus::Cancelled),
            FetchStrategy::ProjectionFlat,
            None,
        )
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, ids.spring_order);
}

#[tokio::test]
async fn test_order_summaries_take_one_round_trip() {
    let (store, queries, ids) = spring_summer();

    let summaries = queries
        .list_order_summaries(&OrderCriteria::any(), Some(Pagination::first(1)))
        .await
        .unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, ids.spring_order);
    assert_eq!(summaries[0].address.zipcode, "1111");
    assert_eq!(store.round_trips(), vec![QueryKind::OrderHeaders]);
}
