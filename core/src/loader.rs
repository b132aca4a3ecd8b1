//! Explicit batched loading of to-many relations.
//!
//! Instead of loading a collection the first time it is touched, a strategy
//! hands the loader every parent key it needs at once. The loader splits the
//! keys into IN-lists of at most `batch_size` and issues those queries one
//! after another, then returns the children keyed by parent.
//!
//! ```text
//! keys: [1, 2, 3, 4, 5]   batch_size: 2
//!
//! order_items_in([1, 2])  ─┐
//! order_items_in([3, 4])   ├─▶ {1: [..], 2: [..], 3: [..], 4: [..], 5: [..]}
//! order_items_in([5])     ─┘
//! ```
//!
//! Round trips for N distinct keys: `ceil(N / batch_size)`.

use crate::error::Result;
use crate::model::{Item, ItemId, OrderId, OrderItem};
use crate::store::OrderReader;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Batched IN-list loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLoader {
    batch_size: usize,
}

impl BatchLoader {
    /// Create a loader. A `batch_size` of zero is treated as one.
    #[must_use]
    pub const fn new(batch_size: usize) -> Self {
        Self {
            batch_size: if batch_size == 0 { 1 } else { batch_size },
        }
    }

    /// Keys per IN-list.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of queries needed for `key_count` distinct keys.
    #[must_use]
    pub const fn batch_count(&self, key_count: usize) -> usize {
        key_count.div_ceil(self.batch_size)
    }

    /// Load the lines of every order in `order_ids`, grouped by order.
    ///
    /// Orders without lines map to an empty vector. Lines keep the order the
    /// store returned them in.
    ///
    /// # Errors
    ///
    /// Propagates the first store failure; nothing is returned for the
    /// batches that succeeded before it.
    pub async fn order_items<R: OrderReader>(
        &self,
        reader: &mut R,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>> {
        let keys = distinct(order_ids.iter().copied());
        let mut grouped: HashMap<OrderId, Vec<OrderItem>> =
            keys.iter().map(|id| (*id, Vec::new())).collect();
        tracing::debug!(orders = keys.len(), batches = self.batch_count(keys.len()), "Loading order items");

        for (batch, chunk) in keys.chunks(self.batch_size).enumerate() {
            tracing::debug!(batch, keys = chunk.len(), "Loading order items batch");
            for order_item in reader.order_items_in(chunk).await? {
                grouped
                    .entry(order_item.order_id())
                    .or_default()
                    .push(order_item);
            }
        }

        Ok(grouped)
    }

    /// Load catalog items by id.
    ///
    /// Ids with no matching item are absent from the result.
    ///
    /// # Errors
    ///
    /// Propagates the first store failure.
    pub async fn items<R: OrderReader>(
        &self,
        reader: &mut R,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, Item>> {
        let keys = distinct(item_ids.iter().copied());
        let mut items = HashMap::with_capacity(keys.len());
        tracing::debug!(items = keys.len(), batches = self.batch_count(keys.len()), "Loading items");

        for (batch, chunk) in keys.chunks(self.batch_size).enumerate() {
            tracing::debug!(batch, keys = chunk.len(), "Loading items batch");
            items.extend(reader.items_in(chunk).await?.into_iter().map(|item| (item.id, item)));
        }

        Ok(items)
    }
}

/// Drop repeated keys, keeping first-seen order.
fn distinct<K: Copy + Eq + Hash>(keys: impl IntoIterator<Item = K>) -> Vec<K> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(*key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_batch_size_is_one() {
        assert_eq!(BatchLoader::new(0).batch_size(), 1);
    }

    #[test]
    fn test_batch_count() {
        let loader = BatchLoader::new(3);
        assert_eq!(loader.batch_count(0), 0);
        assert_eq!(loader.batch_count(1), 1);
        assert_eq!(loader.batch_count(3), 1);
        assert_eq!(loader.batch_count(4), 2);
        assert_eq!(loader.batch_count(9), 3);
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        assert_eq!(distinct([3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
