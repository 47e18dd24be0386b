use super::super::envelope::Envelope;
use super::super::node::{ItemId, NodeId};
use super::super::strtree::STRtree;
use std::ops::ControlFlow;

/// 查询和遍历相关算法
impl<T, const D: usize> STRtree<T, D> {
    /// 查询所有包围盒与 `search` 相交的条目
    pub fn query(&mut self, search: &Envelope<D>) -> Vec<&T> {
        let ids = self.query_ids(search);
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    /// 查询所有包围盒与 `search` 相交的条目句柄
    pub fn query_ids(&mut self, search: &Envelope<D>) -> Vec<ItemId> {
        let mut results = Vec::new();
        let _ = self.query_leaves(search, &mut |leaf: NodeId, _: &T| {
            results.push(ItemId(leaf.0));
            ControlFlow::Continue(())
        });
        results
    }

    /// 带访问器的查询，访问器返回 `ControlFlow::Break` 时立即停止
    ///
    /// 返回值表示查询是否被访问器提前终止。
    pub fn query_visit<F>(&mut self, search: &Envelope<D>, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(&T) -> ControlFlow<()>,
    {
        self.query_leaves(search, &mut |_: NodeId, item: &T| visitor(item))
    }

    /// 按树的顺序访问所有仍然可以从根到达的条目
    pub fn iterate<F>(&mut self, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(&T) -> ControlFlow<()>,
    {
        self.build();
        match self.root {
            Some(root) => self.iterate_node(root, &mut visitor),
            None => ControlFlow::Continue(()),
        }
    }

    /// 收集所有仍在树中的条目
    pub fn items(&mut self) -> Vec<&T> {
        let mut ids = Vec::with_capacity(self.len());
        self.build();
        if let Some(root) = self.root {
            self.collect_leaf_ids(root, &mut ids);
        }
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    fn query_leaves<F>(&mut self, search: &Envelope<D>, visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(NodeId, &T) -> ControlFlow<()>,
    {
        self.build();
        let Some(root) = self.root else {
            return ControlFlow::Continue(());
        };
        if !self.nodes[root.0].intersects(search) {
            return ControlFlow::Continue(());
        }
        self.query_node(root, search, visitor)
    }

    /// 递归查询：跳过边界与查询框不相交的子树
    fn query_node<F>(&self, id: NodeId, search: &Envelope<D>, visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(NodeId, &T) -> ControlFlow<()>,
    {
        for &child in &self.nodes[id.0].children {
            let node = &self.nodes[child.0];
            if !node.intersects(search) {
                continue;
            }
            match node.item.as_ref() {
                Some(item) => visitor(child, item)?,
                None => self.query_node(child, search, visitor)?,
            }
        }
        ControlFlow::Continue(())
    }

    fn iterate_node<F>(&self, id: NodeId, visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&T) -> ControlFlow<()>,
    {
        let node = &self.nodes[id.0];
        if let Some(item) = node.item.as_ref() {
            return visitor(item);
        }
        for &child in &node.children {
            self.iterate_node(child, visitor)?;
        }
        ControlFlow::Continue(())
    }

    fn collect_leaf_ids(&self, id: NodeId, ids: &mut Vec<ItemId>) {
        let node = &self.nodes[id.0];
        if node.is_leaf() {
            ids.push(ItemId(id.0));
            return;
        }
        for &child in &node.children {
            self.collect_leaf_ids(child, ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strtree::envelope::{Envelope2D, Envelope3D};
    use crate::strtree::strtree::{STRtree2D, STRtree3D};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_boxes_2d(rng: &mut StdRng, count: usize) -> Vec<Envelope2D> {
        (0..count)
            .map(|_| {
                let x = rng.gen_range(0.0..100.0);
                let y = rng.gen_range(0.0..100.0);
                let w = rng.gen_range(0.0..5.0);
                let h = rng.gen_range(0.0..5.0);
                Envelope2D::new(x, y, x + w, y + h)
            })
            .collect()
    }

    #[test]
    fn test_query_three_boxes() {
        let mut tree = STRtree2D::new(2);
        tree.insert(Envelope2D::new(0.0, 0.0, 1.0, 1.0), 1).unwrap();
        tree.insert(Envelope2D::new(5.0, 5.0, 6.0, 6.0), 2).unwrap();
        tree.insert(Envelope2D::new(2.0, 2.0, 3.0, 3.0), 3).unwrap();

        let mut results: Vec<i32> = tree
            .query(&Envelope2D::new(0.0, 0.0, 3.0, 3.0))
            .into_iter()
            .copied()
            .collect();
        results.sort();
        assert_eq!(results, vec![1, 3]);
    }

    #[test]
    fn test_query_touching_boundary() {
        let mut tree = STRtree2D::new(4);
        tree.insert(Envelope2D::new(0.0, 0.0, 1.0, 1.0), "a").unwrap();

        assert_eq!(tree.query(&Envelope2D::new(1.0, 1.0, 2.0, 2.0)), vec![&"a"]);
        assert!(tree.query(&Envelope2D::new(1.5, 1.5, 2.0, 2.0)).is_empty());
    }

    #[test]
    fn test_query_empty_tree() {
        let mut tree: STRtree2D<u32> = STRtree::new(4);
        assert!(tree.query(&Envelope2D::new(0.0, 0.0, 10.0, 10.0)).is_empty());
        assert!(tree.items().is_empty());
        assert_eq!(tree.iterate(|_| ControlFlow::Break(())), ControlFlow::Continue(()));
    }

    #[test]
    fn test_query_null_search_finds_nothing() {
        let mut tree = STRtree2D::new(4);
        tree.insert(Envelope2D::new(0.0, 0.0, 1.0, 1.0), 1).unwrap();
        assert!(tree.query(&Envelope2D::null()).is_empty());
    }

    #[test]
    fn test_query_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(2024);
        let boxes = random_boxes_2d(&mut rng, 2000);

        for capacity in [2, 4, 10] {
            let mut tree = STRtree2D::new(capacity);
            for (i, b) in boxes.iter().enumerate() {
                tree.insert(*b, i).unwrap();
            }

            for _ in 0..50 {
                let x = rng.gen_range(-10.0..100.0);
                let y = rng.gen_range(-10.0..100.0);
                let search = Envelope2D::new(x, y, x + rng.gen_range(0.0..30.0), y + rng.gen_range(0.0..30.0));

                let mut expected: Vec<usize> = boxes
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.intersects(&search))
                    .map(|(i, _)| i)
                    .collect();
                let mut actual: Vec<usize> = tree.query(&search).into_iter().copied().collect();
                expected.sort_unstable();
                actual.sort_unstable();
                assert_eq!(actual, expected, "capacity {} search {}", capacity, search);
            }
        }
    }

    #[test]
    fn test_query_3d() {
        let mut tree = STRtree3D::new(3);
        for i in 0..27 {
            let p = [(i % 3) as f64, ((i / 3) % 3) as f64, (i / 9) as f64];
            tree.insert(Envelope3D::from_point(p), i).unwrap();
        }

        let search = Envelope3D::new(0.5, 0.5, 0.5, 2.0, 2.0, 2.0);
        let mut results: Vec<i32> = tree.query(&search).into_iter().copied().collect();
        results.sort();
        // x, y, z 均取 1 或 2
        assert_eq!(results, vec![13, 14, 16, 17, 22, 23, 25, 26]);
    }

    #[test]
    fn test_query_visit_early_stop() {
        let mut tree = STRtree2D::new(3);
        for i in 0..100 {
            let v = i as f64;
            tree.insert(Envelope2D::new(v, v, v + 1.0, v + 1.0), i).unwrap();
        }

        let mut seen = 0;
        let flow = tree.query_visit(&Envelope2D::new(0.0, 0.0, 100.0, 100.0), |_| {
            seen += 1;
            if seen == 5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(seen, 5);

        let mut all = 0;
        let flow = tree.query_visit(&Envelope2D::new(0.0, 0.0, 100.0, 100.0), |_| {
            all += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(all, 100);
    }

    #[test]
    fn test_iterate_visits_everything() {
        let mut rng = StdRng::seed_from_u64(9);
        let boxes = random_boxes_2d(&mut rng, 300);
        let mut tree = STRtree2D::new(6);
        for (i, b) in boxes.iter().enumerate() {
            tree.insert(*b, i).unwrap();
        }

        let mut seen = Vec::new();
        let _ = tree.iterate(|item| {
            seen.push(*item);
            ControlFlow::Continue(())
        });
        seen.sort_unstable();
        assert_eq!(seen, (0..300).collect::<Vec<_>>());

        let mut items: Vec<usize> = tree.items().into_iter().copied().collect();
        items.sort_unstable();
        assert_eq!(items, seen);
    }

    #[test]
    fn test_query_ids_resolve_to_items() {
        let mut tree = STRtree2D::new(2);
        let a = tree.insert(Envelope2D::new(0.0, 0.0, 1.0, 1.0), "a").unwrap();
        let _b = tree.insert(Envelope2D::new(8.0, 8.0, 9.0, 9.0), "b").unwrap();

        let ids = tree.query_ids(&Envelope2D::new(0.5, 0.5, 0.6, 0.6));
        assert_eq!(ids, vec![a]);
        assert_eq!(tree.get(ids[0]), Some(&"a"));
    }
}
