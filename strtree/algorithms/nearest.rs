//! Branch-and-bound nearest neighbour search for the STR tree
//!
//! All searches work on pairs of boundables (a tree node, or an external item)
//! kept in a min-heap ordered by a lower bound of the distance between the two
//! sides:
//!
//! 1. Pop the pair with the smallest lower bound
//! 2. If it cannot beat the best distance found so far, stop
//! 3. If both sides are items, the pair becomes the new best
//! 4. Otherwise expand one composite side (the larger one when both are
//!    composite) and push every child pair that can still beat the best
//!
//! Leaf pairs use the item metric, all other pairs use the envelope distance.
//! The same loop answers the single-item, k-nearest, tree-vs-tree, self-pair
//! and within-distance queries.

use super::super::envelope::Envelope;
use super::super::node::{Node, NodeId};
use super::super::strtree::STRtree;
use super::distance::{ItemBoundable, ItemDistance};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::ptr;
use tracing::trace;

/// One side of a candidate pair
enum Boundable<'a, T, const D: usize> {
    /// A node of some tree, addressed inside its own arena
    Node { id: NodeId, arena: &'a [Node<T, D>] },
    /// An item that is not stored in any tree
    External(ItemBoundable<'a, T, D>),
}

impl<T, const D: usize> Clone for Boundable<'_, T, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const D: usize> Copy for Boundable<'_, T, D> {}

impl<'a, T, const D: usize> Boundable<'a, T, D> {
    fn node(id: NodeId, arena: &'a [Node<T, D>]) -> Self {
        Boundable::Node { id, arena }
    }

    fn bounds(&self) -> &'a Envelope<D> {
        match *self {
            Boundable::Node { id, arena } => &arena[id.0].bounds,
            Boundable::External(ref item) => item.envelope,
        }
    }

    /// The item with its envelope, for leaves and external items
    fn as_item(&self) -> Option<ItemBoundable<'a, T, D>> {
        match *self {
            Boundable::Node { id, arena } => {
                let node = &arena[id.0];
                node.item
                    .as_ref()
                    .map(|item| ItemBoundable::new(&node.bounds, item))
            }
            Boundable::External(item) => Some(item),
        }
    }

    fn is_composite(&self) -> bool {
        match *self {
            Boundable::Node { id, arena } => !arena[id.0].is_leaf(),
            Boundable::External(_) => false,
        }
    }

    fn children(&self) -> Vec<Boundable<'a, T, D>> {
        match *self {
            Boundable::Node { id, arena } => arena[id.0]
                .children
                .iter()
                .map(|&child| Boundable::node(child, arena))
                .collect(),
            Boundable::External(_) => Vec::new(),
        }
    }

    fn node_id(&self) -> Option<NodeId> {
        match *self {
            Boundable::Node { id, .. } => Some(id),
            Boundable::External(_) => None,
        }
    }

    /// Both sides are the same leaf of the same tree
    fn is_same_leaf(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Boundable::Node { id: a, arena: arena_a }, Boundable::Node { id: b, arena: arena_b }) => {
                a == b && ptr::eq(arena_a, arena_b) && arena_a[a.0].is_leaf()
            }
            _ => false,
        }
    }
}

/// A candidate pair and the lower bound of its distance
struct BoundablePair<'a, T, const D: usize> {
    a: Boundable<'a, T, D>,
    b: Boundable<'a, T, D>,
    distance: f64,
}

impl<'a, T, const D: usize> BoundablePair<'a, T, D> {
    fn new<M: ItemDistance<T, D>>(a: Boundable<'a, T, D>, b: Boundable<'a, T, D>, metric: &M) -> Self {
        let distance = match (a.as_item(), b.as_item()) {
            (Some(x), Some(y)) => metric.distance(&x, &y),
            _ => a.bounds().distance(b.bounds()),
        };
        BoundablePair { a, b, distance }
    }

    fn is_leaves(&self) -> bool {
        !self.a.is_composite() && !self.b.is_composite()
    }

    /// Upper bound of the distance between anything inside the two sides
    fn maximum_distance(&self) -> f64 {
        self.a.bounds().maximum_distance(self.b.bounds())
    }

    fn ids(&self) -> Option<(NodeId, NodeId)> {
        Some((self.a.node_id()?, self.b.node_id()?))
    }
}

// BinaryHeap is a max-heap; the search queue wraps pairs in `Reverse`
impl<T, const D: usize> PartialEq for BoundablePair<'_, T, D> {
    fn eq(&self, other: &Self) -> bool {
        self.distance.total_cmp(&other.distance) == Ordering::Equal
    }
}

impl<T, const D: usize> Eq for BoundablePair<'_, T, D> {}

impl<T, const D: usize> PartialOrd for BoundablePair<'_, T, D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, const D: usize> Ord for BoundablePair<'_, T, D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

type PairQueue<'a, T, const D: usize> = BinaryHeap<Reverse<BoundablePair<'a, T, D>>>;

/// Expand the composite side of `pair` and push every child pair accepted by `admit`
fn expand_to_queue<'a, T, const D: usize, M, F>(
    pair: &BoundablePair<'a, T, D>,
    queue: &mut PairQueue<'a, T, D>,
    metric: &M,
    admit: F,
) where
    M: ItemDistance<T, D>,
    F: Fn(f64) -> bool,
{
    let expand_a = match (pair.a.is_composite(), pair.b.is_composite()) {
        (true, true) => pair.a.bounds().measure() > pair.b.bounds().measure(),
        (true, false) => true,
        (false, true) => false,
        (false, false) => return,
    };

    let (expanded, fixed) = if expand_a { (pair.a, pair.b) } else { (pair.b, pair.a) };
    for child in expanded.children() {
        let (a, b) = if expand_a { (child, fixed) } else { (fixed, child) };
        if a.is_same_leaf(&b) {
            continue;
        }
        let child_pair = BoundablePair::new(a, b, metric);
        if admit(child_pair.distance) {
            queue.push(Reverse(child_pair));
        }
    }
}

/// Closest leaf pair reachable from `init`
fn nearest_pair<'a, T, const D: usize, M>(
    init: BoundablePair<'a, T, D>,
    metric: &M,
) -> Option<BoundablePair<'a, T, D>>
where
    M: ItemDistance<T, D>,
{
    let mut best_distance = f64::INFINITY;
    let mut best = None;
    let mut popped = 0usize;

    let mut queue = PairQueue::new();
    queue.push(Reverse(init));

    while let Some(Reverse(pair)) = queue.pop() {
        popped += 1;
        // 剩余的候选对不可能比当前最优更近
        if pair.distance >= best_distance {
            break;
        }
        if pair.is_leaves() {
            best_distance = pair.distance;
            best = Some(pair);
            if best_distance <= 0.0 {
                break;
            }
        } else {
            expand_to_queue(&pair, &mut queue, metric, |d| d < best_distance);
        }
    }

    trace!(popped, distance = best_distance, "nearest pair search finished");
    best
}

/// Up to `k` closest leaf pairs reachable from `init`, ascending by distance
fn k_nearest_pairs<'a, T, const D: usize, M>(
    init: BoundablePair<'a, T, D>,
    k: usize,
    metric: &M,
) -> Vec<BoundablePair<'a, T, D>>
where
    M: ItemDistance<T, D>,
{
    if k == 0 {
        return Vec::new();
    }

    // 最大堆：堆顶是目前找到的第 k 近的结果
    let mut found: BinaryHeap<BoundablePair<'a, T, D>> = BinaryHeap::with_capacity(k.saturating_add(1));
    let mut bound = f64::INFINITY;

    let mut queue = PairQueue::new();
    queue.push(Reverse(init));

    while let Some(Reverse(pair)) = queue.pop() {
        if pair.distance >= bound {
            break;
        }
        if pair.is_leaves() {
            found.push(pair);
            if found.len() > k {
                found.pop();
            }
            if found.len() == k {
                bound = found.peek().map_or(f64::INFINITY, |p| p.distance);
            }
        } else {
            expand_to_queue(&pair, &mut queue, metric, |d| d < bound);
        }
    }

    found.into_sorted_vec()
}

/// Whether some leaf pair reachable from `init` is within `max_distance`
fn within_distance<T, const D: usize, M>(init: BoundablePair<'_, T, D>, max_distance: f64, metric: &M) -> bool
where
    M: ItemDistance<T, D>,
{
    let mut queue = PairQueue::new();
    queue.push(Reverse(init));

    while let Some(Reverse(pair)) = queue.pop() {
        if pair.distance > max_distance {
            return false;
        }
        // 两侧任意内容之间的距离都不会超过包围盒的最大距离
        if pair.maximum_distance() <= max_distance {
            return true;
        }
        if pair.is_leaves() {
            return true;
        }
        expand_to_queue(&pair, &mut queue, metric, |d| d <= max_distance);
    }
    false
}

/// 最近邻搜索相关算法
impl<T, const D: usize> STRtree<T, D> {
    /// 树中距离最近的两个不同条目
    ///
    /// 条目少于两个时返回 None。
    pub fn nearest_neighbour<M>(&mut self, metric: M) -> Option<(&T, &T)>
    where
        M: ItemDistance<T, D>,
    {
        self.build();
        let root = self.root?;
        let (a, b) = {
            let arena = &self.nodes[..];
            let side = Boundable::node(root, arena);
            let init = BoundablePair::new(side, side, &metric);
            nearest_pair(init, &metric)?.ids()?
        };
        Some((self.nodes[a.0].item.as_ref()?, self.nodes[b.0].item.as_ref()?))
    }

    /// 与外部条目 `(envelope, item)` 距离最近的条目
    pub fn nearest_neighbour_to<M>(&mut self, envelope: &Envelope<D>, item: &T, metric: M) -> Option<&T>
    where
        M: ItemDistance<T, D>,
    {
        let best = self.k_nearest_ids(envelope, item, 1, &metric).into_iter().next()?;
        self.nodes[best.0 .0].item.as_ref()
    }

    /// 与外部条目距离最近的 k 个条目及其距离，按距离升序排列
    pub fn k_nearest_neighbours<M>(
        &mut self,
        envelope: &Envelope<D>,
        item: &T,
        k: usize,
        metric: M,
    ) -> Vec<(&T, f64)>
    where
        M: ItemDistance<T, D>,
    {
        let found = self.k_nearest_ids(envelope, item, k, &metric);
        found
            .into_iter()
            .filter_map(|(id, distance)| self.nodes[id.0].item.as_ref().map(|item| (item, distance)))
            .collect()
    }

    fn k_nearest_ids<M>(&mut self, envelope: &Envelope<D>, item: &T, k: usize, metric: &M) -> Vec<(NodeId, f64)>
    where
        M: ItemDistance<T, D>,
    {
        self.build();
        let Some(root) = self.root else {
            return Vec::new();
        };
        // 结果不会多于树中的条目数
        let k = k.min(self.len());
        let init = BoundablePair::new(
            Boundable::node(root, &self.nodes),
            Boundable::External(ItemBoundable::new(envelope, item)),
            metric,
        );
        k_nearest_pairs(init, k, metric)
            .into_iter()
            .filter_map(|pair| pair.a.node_id().map(|id| (id, pair.distance)))
            .collect()
    }

    /// 两棵树之间距离最近的一对条目，第一个来自本树，第二个来自 `other`
    pub fn nearest_neighbour_tree<'a, M>(&'a mut self, other: &'a mut Self, metric: M) -> Option<(&'a T, &'a T)>
    where
        M: ItemDistance<T, D>,
    {
        self.build();
        other.build();
        let (root_a, root_b) = (self.root?, other.root?);
        let (a, b) = {
            let init = BoundablePair::new(
                Boundable::node(root_a, &self.nodes),
                Boundable::node(root_b, &other.nodes),
                &metric,
            );
            nearest_pair(init, &metric)?.ids()?
        };
        Some((self.nodes[a.0].item.as_ref()?, other.nodes[b.0].item.as_ref()?))
    }

    /// 两棵树中是否存在一对条目，其距离不超过 `max_distance`
    pub fn is_within_distance<M>(&mut self, other: &mut Self, metric: M, max_distance: f64) -> bool
    where
        M: ItemDistance<T, D>,
    {
        self.build();
        other.build();
        // 删除不会收紧边界，全部删空的树仍保留原来的根
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let (Some(root_a), Some(root_b)) = (self.root, other.root) else {
            return false;
        };
        let init = BoundablePair::new(
            Boundable::node(root_a, &self.nodes),
            Boundable::node(root_b, &other.nodes),
            &metric,
        );
        within_distance(init, max_distance, &metric)
    }
}
