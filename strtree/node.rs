use super::envelope::Envelope;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// 节点句柄：节点在树 arena 中的下标
///
/// arena 只追加不删除，所以句柄在树的整个生命周期内有效。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display(fmt = "node#{}", _0)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// 条目句柄：插入时返回，删除时按身份（而不是按值）定位条目
///
/// 每个条目对应唯一一个叶子节点，句柄即该叶子节点在 arena 中的位置。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display(fmt = "item#{}", _0)]
pub struct ItemId(pub(crate) usize);

impl ItemId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn node(self) -> NodeId {
        NodeId(self.0)
    }
}

/// STR 树节点
///
/// - 叶子节点：持有一个条目，边界等于插入时给出的包围盒，没有子节点
/// - 内部节点：持有子节点句柄，边界是所有子节点边界的并集
#[derive(Debug, Clone)]
pub struct Node<T, const D: usize> {
    /// 节点边界
    pub(crate) bounds: Envelope<D>,
    /// 节点层级，叶子为 0，越靠近根越大
    pub(crate) level: usize,
    /// 子节点（非拥有的句柄，仅内部节点）
    pub(crate) children: Vec<NodeId>,
    /// 条目（仅叶子节点）
    pub(crate) item: Option<T>,
}

impl<T, const D: usize> Node<T, D> {
    /// 创建叶子节点
    pub(crate) fn leaf(bounds: Envelope<D>, item: T) -> Self {
        Node {
            bounds,
            level: 0,
            children: Vec::new(),
            item: Some(item),
        }
    }

    /// 创建空的内部节点，边界为空包围盒，等待 add_child
    pub(crate) fn internal(level: usize) -> Self {
        Node {
            bounds: Envelope::null(),
            level,
            children: Vec::new(),
            item: None,
        }
    }

    pub fn bounds(&self) -> &Envelope<D> {
        &self.bounds
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    /// 叶子节点 = 持有条目
    pub fn is_leaf(&self) -> bool {
        self.item.is_some()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn intersects(&self, env: &Envelope<D>) -> bool {
        self.bounds.intersects(env)
    }

    /// 追加子节点并扩展边界；不会改变已有子节点的顺序
    pub(crate) fn add_child(&mut self, child: NodeId, child_bounds: &Envelope<D>) {
        self.bounds.expand_to_include(child_bounds);
        self.children.push(child);
    }

    /// 从直接子节点中按身份删除持有该条目的叶子，只处理当前层
    pub(crate) fn remove_item(&mut self, item: ItemId) -> bool {
        self.remove_child(item.node())
    }

    /// 按身份删除直接子节点
    pub(crate) fn remove_child(&mut self, child: NodeId) -> bool {
        match self.children.iter().position(|c| *c == child) {
            Some(pos) => {
                self.children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// 子树中的节点总数（包括自身）
    pub fn num_nodes(&self, arena: &[Node<T, D>]) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| arena[c.0].num_nodes(arena))
            .sum::<usize>()
    }

    /// 子树中的叶子节点数
    pub fn num_leaf_nodes(&self, arena: &[Node<T, D>]) -> usize {
        let own = usize::from(self.is_leaf());
        own + self
            .children
            .iter()
            .map(|c| arena[c.0].num_leaf_nodes(arena))
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strtree::envelope::Envelope2D;

    fn arena() -> Vec<Node<&'static str, 2>> {
        vec![
            Node::leaf(Envelope2D::new(0.0, 0.0, 1.0, 1.0), "a"),
            Node::leaf(Envelope2D::new(4.0, 4.0, 5.0, 5.0), "b"),
            Node::leaf(Envelope2D::new(2.0, -1.0, 3.0, 0.0), "c"),
        ]
    }

    #[test]
    fn test_leaf_node() {
        let nodes = arena();
        assert!(nodes[0].is_leaf());
        assert_eq!(nodes[0].level(), 0);
        assert_eq!(nodes[0].item(), Some(&"a"));
        assert!(nodes[0].children().is_empty());
        assert_eq!(nodes[0].num_nodes(&nodes), 1);
        assert_eq!(nodes[0].num_leaf_nodes(&nodes), 1);
    }

    #[test]
    fn test_add_child_expands_bounds() {
        let mut nodes = arena();
        let mut parent = Node::internal(1);
        assert!(parent.bounds().is_null());
        assert!(!parent.is_leaf());

        for i in 0..3 {
            let b = nodes[i].bounds;
            parent.add_child(NodeId(i), &b);
        }
        assert_eq!(parent.bounds(), &Envelope2D::new(0.0, -1.0, 5.0, 5.0));
        assert_eq!(parent.children(), &[NodeId(0), NodeId(1), NodeId(2)]);

        nodes.push(parent);
        let root = &nodes[3];
        assert_eq!(root.num_nodes(&nodes), 4);
        assert_eq!(root.num_leaf_nodes(&nodes), 3);
    }

    #[test]
    fn test_remove_item_by_identity() {
        let nodes = arena();
        let mut parent: Node<&str, 2> = Node::internal(1);
        for i in 0..3 {
            parent.add_child(NodeId(i), &nodes[i].bounds);
        }

        assert!(parent.remove_item(ItemId(1)));
        assert_eq!(parent.children(), &[NodeId(0), NodeId(2)]);
        // 已删除的条目再删除返回 false
        assert!(!parent.remove_item(ItemId(1)));
        assert!(!parent.remove_child(NodeId(7)));
        // 删除不会收紧边界
        assert_eq!(parent.bounds(), &Envelope2D::new(0.0, -1.0, 5.0, 5.0));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(ItemId(3).to_string(), "item#3");
        assert_eq!(NodeId(12).to_string(), "node#12");
    }
}
