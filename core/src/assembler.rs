//! Regrouping of row-multiplied query results into nested views.
//!
//! A to-many join returns one row per child. Everything here is a
//! deterministic fold over such rows: group by a key, keep groups in
//! first-seen order, keep children in row order.

use crate::model::{OrderGraph, OrderId, OrderLine};
use crate::store::{FlatOrderRow, OrderGraphRow, OrderLineRow};
use crate::view::{OrderLineView, OrderSummaryView, OrderView};
use std::collections::HashMap;
use std::hash::Hash;

/// Group `rows` by `key_of`, preserving first-seen group order and the
/// relative order of rows inside each group.
///
/// ```
/// use order_query_core::assembler::group_by_key;
///
/// let grouped = group_by_key(vec![(2, 'a'), (1, 'b'), (2, 'c')], |(k, _)| *k);
/// assert_eq!(grouped, vec![(2, vec![(2, 'a'), (2, 'c')]), (1, vec![(1, 'b')])]);
/// ```
pub fn group_by_key<K, V, F>(rows: impl IntoIterator<Item = V>, key_of: F) -> Vec<(K, Vec<V>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&V) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<V>)> = Vec::new();

    for row in rows {
        let key = key_of(&row);
        match index.get(&key) {
            Some(&position) => groups[position].1.push(row),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }

    groups
}

/// Collapse full-graph fetch-join rows into one graph per distinct order.
///
/// The order, member and delivery of the first row seen for an order win;
/// later rows only contribute their line.
#[must_use]
pub fn fold_graph_rows(rows: Vec<OrderGraphRow>) -> Vec<OrderGraph> {
    group_by_key(rows, |row| row.order.id())
        .into_iter()
        .filter_map(|(_, rows)| {
            let mut rows = rows.into_iter();
            let first = rows.next()?;
            let mut lines = vec![OrderLine {
                order_item: first.order_item,
                item: first.item,
            }];
            lines.extend(rows.map(|row| OrderLine {
                order_item: row.order_item,
                item: row.item,
            }));
            Some(OrderGraph {
                order: first.order,
                member: first.member,
                delivery: first.delivery,
                lines,
            })
        })
        .collect()
}

/// Attach projected lines to their headers by order id.
///
/// Header order is kept. A header with no lines gets an empty item list;
/// lines whose order is not among the headers are dropped.
#[must_use]
pub fn attach_lines(headers: Vec<OrderSummaryView>, lines: Vec<OrderLineRow>) -> Vec<OrderView> {
    let mut lines_by_order: HashMap<OrderId, Vec<OrderLineView>> = HashMap::new();
    for line in lines {
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(OrderLineView::from(line));
    }

    headers
        .into_iter()
        .map(|header| {
            let items = lines_by_order.remove(&header.id).unwrap_or_default();
            header.with_items(items)
        })
        .collect()
}

/// Group flat projection rows into nested views.
///
/// Rows are grouped by the whole order-identifying tuple (id, buyer name,
/// date, status, address). Grouping the same rows twice yields the same
/// views in the same order.
#[must_use]
pub fn group_flat_rows(rows: Vec<FlatOrderRow>) -> Vec<OrderView> {
    group_by_key(rows, |row| OrderSummaryView {
        id: row.order_id,
        buyer_name: row.buyer_name.clone(),
        order_date: row.order_date,
        status: row.status,
        address: row.address.clone(),
    })
    .into_iter()
    .map(|(header, rows)| {
        header.with_items(
            rows.into_iter()
                .map(|row| OrderLineView {
                    item_name: row.item_name,
                    unit_price: row.unit_price,
                    quantity: row.quantity,
                })
                .collect(),
        )
    })
    .collect()
}
