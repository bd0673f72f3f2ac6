//! A single price level: a FIFO queue of resting orders at one price.
//!
//! The level keeps arrival order in a `VecDeque` of order ids while the
//! orders themselves live in a `HashMap`, so cancellation by id is O(1)
//! without disturbing the queue. A cancelled id left in the queue becomes a
//! tombstone that head operations skip lazily.

use crate::engine::types::{Order, OrderId, Side};
use std::collections::{HashMap, VecDeque};

/// Outcome of filling the head order of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadFill {
    /// The maker order that was filled.
    pub maker_id: OrderId,
    /// Quantity executed against the head.
    pub filled: u64,
    /// Maker quantity left after the fill; zero means the maker left the
    /// book.
    pub maker_remaining: u64,
}

/// FIFO queue of resting orders at a single price.
///
/// Invariants: every order in the level has this level's price and side,
/// `remaining > 0`, and a non-terminal status; the queue is ordered by
/// submission sequence ascending.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: u128,
    side: Side,
    queue: VecDeque<OrderId>,
    orders: HashMap<OrderId, Order>,
    total_quantity: u64,
}

impl PriceLevel {
    /// Creates an empty level at the given price.
    #[must_use]
    pub fn new(price: u128, side: Side) -> Self {
        Self {
            price,
            side,
            queue: VecDeque::new(),
            orders: HashMap::new(),
            total_quantity: 0,
        }
    }

    /// The price shared by every order in this level.
    #[must_use]
    #[inline]
    pub fn price(&self) -> u128 {
        self.price
    }

    /// The side shared by every order in this level.
    #[must_use]
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Sum of remaining quantity across all live orders, maintained
    /// incrementally.
    #[must_use]
    #[inline]
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    /// Number of live orders resting at this level.
    #[must_use]
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Whether no live orders rest at this level.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Appends a resting order at the tail of the queue.
    ///
    /// The order must match the level's price and side and carry remaining
    /// quantity; a same-priced newcomer always queues behind existing
    /// residents.
    pub fn append(&mut self, order: Order) {
        debug_assert_eq!(order.price, Some(self.price));
        debug_assert_eq!(order.side, self.side);
        debug_assert!(order.remaining > 0);
        debug_assert!(!order.status.is_terminal());

        self.total_quantity += order.remaining;
        self.queue.push_back(order.id);
        self.orders.insert(order.id, order);
    }

    /// Returns the oldest live resting order, skipping tombstones.
    pub fn peek_head(&mut self) -> Option<&Order> {
        self.drop_dead_head();
        self.queue.front().and_then(|id| self.orders.get(id))
    }

    /// Fills the head order with up to `quantity` units.
    ///
    /// Executes `min(quantity, head.remaining)`, decrements the aggregate
    /// quantity, and removes the head from the level when exhausted.
    /// Returns `None` when the level has no live orders.
    pub fn fill_head(&mut self, quantity: u64) -> Option<HeadFill> {
        self.drop_dead_head();
        let head_id = *self.queue.front()?;
        let order = self.orders.get_mut(&head_id)?;

        let filled = quantity.min(order.remaining);
        order.fill(filled);
        self.total_quantity -= filled;

        let maker_remaining = order.remaining;
        if maker_remaining == 0 {
            self.queue.pop_front();
            self.orders.remove(&head_id);
        }

        Some(HeadFill {
            maker_id: head_id,
            filled,
            maker_remaining,
        })
    }

    /// Removes an order by id in O(1), leaving a queue tombstone.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let order = self.orders.remove(&order_id)?;
        self.total_quantity -= order.remaining;
        self.drop_dead_head();
        Some(order)
    }

    /// Returns a live resting order by id.
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Iterates live orders in FIFO (submission sequence) order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.queue.iter().filter_map(|id| self.orders.get(id))
    }

    /// Pops dead ids off the queue head so `front()` is always live.
    fn drop_dead_head(&mut self) {
        while let Some(id) = self.queue.front() {
            if self.orders.contains_key(id) {
                break;
            }
            self.queue.pop_front();
        }
    }
}
