//! Sort-Tile-Recursive 批量构建
//!
//! 每一层的构建过程：
//! 1. 按第一个轴（二维为 X，三维为 Z）的中点排序，切成若干分片，
//!    分片数为 `ceil(minLeafCount ^ (1/k))`，k 为剩余轴数
//! 2. 在每个分片内按下一个轴排序并继续切片
//! 3. 最后一个轴（Y）排序后，每 `node_capacity` 个连续节点组成一个父节点
//!
//! 新一层的父节点作为下一轮的输入，直到只剩一个节点（根）。

use super::super::node::{Node, NodeId};
use super::super::strtree::STRtree;
use super::utils::{iroot_ceil, str_axes};
use tracing::{debug, trace};

impl<T, const D: usize> STRtree<T, D> {
    /// 构建树；只会执行一次，之后的调用不做任何事
    ///
    /// 所有查询、最近邻搜索和删除都会隐式调用它。
    pub fn build(&mut self) {
        if self.built {
            return;
        }
        self.built = true;

        // 构建之前 arena 中只有叶子节点
        let leaves: Vec<NodeId> = (0..self.nodes.len()).map(NodeId).collect();
        if leaves.is_empty() {
            self.root = None;
            debug!("built empty STR tree");
            return;
        }
        let num_leaves = leaves.len();

        // 根节点必须是内部节点，所以即使只有一个叶子也至少打包一层
        let mut level = 0;
        let mut current = leaves;
        let root = loop {
            level += 1;
            let parents = self.create_parent_nodes(current, level);
            trace!(level, nodes = parents.len(), "packed STR level");
            if parents.len() == 1 {
                break parents[0];
            }
            current = parents;
        };
        self.root = Some(root);

        debug!(
            leaves = num_leaves,
            levels = level,
            nodes = self.nodes.len(),
            capacity = self.node_capacity(),
            "built STR tree"
        );
    }

    /// 把一层节点打包成上一层的父节点
    fn create_parent_nodes(&mut self, children: Vec<NodeId>, new_level: usize) -> Vec<NodeId> {
        let count = children.len();
        let axes = str_axes::<D>();
        let mut parents = Vec::with_capacity(count.div_ceil(self.node_capacity()));
        self.pack_slice(children, &axes, new_level, &mut parents);
        debug_assert!(
            parents.len() < count || count == 1,
            "STR packing must shrink each level"
        );
        parents
    }

    /// 沿 `axes[0]` 排序并切片，递归处理剩余的轴
    fn pack_slice(
        &mut self,
        mut slice: Vec<NodeId>,
        axes: &[usize],
        new_level: usize,
        parents: &mut Vec<NodeId>,
    ) {
        if slice.is_empty() {
            return;
        }
        let Some((&axis, rest)) = axes.split_first() else {
            self.add_parent_nodes(&slice, new_level, parents);
            return;
        };

        self.sort_by_mid(&mut slice, axis);
        if rest.is_empty() {
            self.add_parent_nodes(&slice, new_level, parents);
            return;
        }

        let min_leaf_count = slice.len().div_ceil(self.node_capacity());
        let slice_count = iroot_ceil(min_leaf_count, axes.len() as u32);
        let slice_capacity = slice.len().div_ceil(slice_count);
        for sub_slice in slice.chunks(slice_capacity) {
            self.pack_slice(sub_slice.to_vec(), rest, new_level, parents);
        }
    }

    /// 每 `node_capacity` 个连续节点组成一个父节点
    fn add_parent_nodes(&mut self, slice: &[NodeId], new_level: usize, parents: &mut Vec<NodeId>) {
        for group in slice.chunks(self.node_capacity()) {
            let mut parent = Node::internal(new_level);
            for &child in group {
                let child_bounds = self.nodes[child.0].bounds;
                parent.add_child(child, &child_bounds);
            }
            let id = NodeId(self.nodes.len());
            self.nodes.push(parent);
            parents.push(id);
        }
    }

    /// 按指定轴的中点稳定排序
    fn sort_by_mid(&self, slice: &mut [NodeId], axis: usize) {
        let nodes = &self.nodes;
        slice.sort_by(|a, b| {
            nodes[a.0]
                .bounds
                .mid(axis)
                .total_cmp(&nodes[b.0].bounds.mid(axis))
        });
    }
}
