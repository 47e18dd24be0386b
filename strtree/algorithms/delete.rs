use super::super::envelope::Envelope;
use super::super::node::{ItemId, NodeId};
use super::super::strtree::STRtree;
use tracing::trace;

/// STR 树删除算法实现
///
/// 删除只把叶子从父节点中摘除，不做重新平衡，也不收紧祖先节点的边界。
impl<T, const D: usize> STRtree<T, D> {
    /// 删除条目 `item`，`search` 为用来定位它的包围盒（通常就是插入时的包围盒）
    ///
    /// 返回是否真的删除了条目；条目不存在或已删除时返回 false，树保持不变。
    pub fn remove(&mut self, search: &Envelope<D>, item: ItemId) -> bool {
        self.remove_and_take(search, item).is_some()
    }

    /// 删除条目并返回它
    pub fn remove_and_take(&mut self, search: &Envelope<D>, item: ItemId) -> Option<T> {
        self.build();
        let root = self.root?;
        if !self.nodes[root.0].intersects(search) || self.get(item).is_none() {
            return None;
        }

        if !self.remove_from(root, search, item) {
            trace!(%item, "item not found under search envelope");
            return None;
        }

        // 叶子节点留在 arena 中但已不可达
        self.num_removed += 1;
        trace!(%item, remaining = self.len(), "removed item");
        self.nodes[item.0].item.take()
    }

    /// 先尝试从当前节点的直接子节点中删除，否则递归进入相交的内部子节点
    fn remove_from(&mut self, id: NodeId, search: &Envelope<D>, item: ItemId) -> bool {
        if self.nodes[id.0].remove_item(item) {
            return true;
        }

        let children = self.nodes[id.0].children.clone();
        for child in children {
            let node = &self.nodes[child.0];
            if node.is_leaf() || !node.intersects(search) {
                continue;
            }
            if self.remove_from(child, search, item) {
                // 摘除已经没有子节点的内部节点
                if self.nodes[child.0].is_empty() {
                    self.nodes[id.0].remove_child(child);
                }
                return true;
            }
        }
        false
    }
}
