use super::envelope::Envelope;
use super::node::{ItemId, Node, NodeId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 默认节点容量（每个内部节点最多的子节点数）
pub const DEFAULT_NODE_CAPACITY: usize = 10;

/// 索引操作错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexError {
    #[error("tree is already built, no more items can be inserted")]
    AlreadyBuilt,
    #[error("cannot index an item with a null envelope")]
    NullEnvelope,
    #[error("cannot calculate bounding box for empty geometry")]
    EmptyGeometry,
}

/// 用于JSON序列化的简化树结构
#[derive(Debug, Serialize, Deserialize)]
pub struct TreeVisualization<const D: usize> {
    /// 根节点（如果存在）
    pub root: Option<NodeVisualization<D>>,
    /// 树的配置参数
    pub config: TreeConfig,
}

/// 用于JSON序列化的树配置
#[derive(Debug, Serialize, Deserialize)]
pub struct TreeConfig {
    pub node_capacity: usize,
    pub num_items: usize,
    pub dimensions: usize,
}

/// 用于JSON序列化的节点结构
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeVisualization<const D: usize> {
    pub id: NodeId,
    /// 节点边界
    pub bounds: Envelope<D>,
    /// 节点层级
    pub level: usize,
    /// 条目句柄（仅叶子节点）
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub item: Option<ItemId>,
    /// 子节点（仅内部节点）
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<NodeVisualization<D>>,
}

/// 基于 Sort-Tile-Recursive (STR) 批量装填的只读 R-tree
///
/// 先插入全部条目，第一次查询（或显式调用 [`STRtree::build`]）时一次性构建整棵树。
/// 构建之后不能再插入，只支持查询、最近邻搜索和尽力而为的删除。
///
/// 所有节点都存放在 `nodes` arena 中：前 `num_items` 个是按插入顺序排列的叶子节点，
/// 之后是构建时追加的内部节点。节点之间只通过 [`NodeId`] 相互引用。
#[derive(Debug, Clone)]
pub struct STRtree<T, const D: usize> {
    /// 节点 arena
    pub(crate) nodes: Vec<Node<T, D>>,
    /// 根节点
    pub(crate) root: Option<NodeId>,
    /// 每个内部节点最多的子节点数
    node_capacity: usize,
    /// 是否已经构建
    pub(crate) built: bool,
    /// 插入的条目数
    num_items: usize,
    /// 已删除的条目数
    pub(crate) num_removed: usize,
}

/// 二维 STR 树
pub type STRtree2D<T> = STRtree<T, 2>;

/// 三维 STR 树
pub type STRtree3D<T> = STRtree<T, 3>;

impl<T, const D: usize> STRtree<T, D> {
    /// 创建新的 STR 树
    pub fn new(node_capacity: usize) -> Self {
        assert!(node_capacity >= 2, "Node capacity must be at least 2");

        STRtree {
            nodes: Vec::new(),
            root: None,
            node_capacity,
            built: false,
            num_items: 0,
            num_removed: 0,
        }
    }

    /// 插入一个条目；只能在构建之前调用
    pub fn insert(&mut self, envelope: Envelope<D>, item: T) -> Result<ItemId, IndexError> {
        if self.built {
            warn!("rejected insert into an already built tree");
            return Err(IndexError::AlreadyBuilt);
        }
        if envelope.is_null() {
            return Err(IndexError::NullEnvelope);
        }

        let id = ItemId(self.nodes.len());
        self.nodes.push(Node::leaf(envelope, item));
        self.num_items += 1;
        Ok(id)
    }

    /// 获取节点容量
    pub fn node_capacity(&self) -> usize {
        self.node_capacity
    }

    /// 是否已经构建
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// 当前仍在树中的条目数
    pub fn len(&self) -> usize {
        self.num_items - self.num_removed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取根节点，必要时先构建
    pub fn root(&mut self) -> Option<&Node<T, D>> {
        self.build();
        self.root.map(|id| &self.nodes[id.0])
    }

    /// 获取根节点句柄，必要时先构建
    pub fn root_id(&mut self) -> Option<NodeId> {
        self.build();
        self.root
    }

    /// 按句柄获取节点
    pub fn node(&self, id: NodeId) -> &Node<T, D> {
        &self.nodes[id.0]
    }

    /// 全部节点（包括已被删除、不再可达的叶子）
    pub fn nodes(&self) -> &[Node<T, D>] {
        &self.nodes
    }

    /// 按句柄获取条目，已删除的条目返回 None
    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.leaf(id).and_then(|node| node.item.as_ref())
    }

    /// 条目插入时的包围盒
    pub fn envelope_of(&self, id: ItemId) -> Option<&Envelope<D>> {
        self.leaf(id).map(|node| &node.bounds)
    }

    fn leaf(&self, id: ItemId) -> Option<&Node<T, D>> {
        if id.0 >= self.num_items {
            return None;
        }
        self.nodes.get(id.0).filter(|node| node.is_leaf())
    }

    /// 树的深度（根节点层级 + 1），空树为 0
    pub fn depth(&mut self) -> usize {
        self.root().map_or(0, |node| node.level + 1)
    }

    /// 从根可达的节点数
    pub fn num_nodes(&mut self) -> usize {
        self.build();
        self.root
            .map_or(0, |id| self.nodes[id.0].num_nodes(&self.nodes))
    }

    /// 从根可达的叶子节点数
    pub fn num_leaf_nodes(&mut self) -> usize {
        self.build();
        self.root
            .map_or(0, |id| self.nodes[id.0].num_leaf_nodes(&self.nodes))
    }

    /// 导出树结构为JSON格式
    ///
    /// 返回包含完整树结构的JSON字符串，用于可视化和调试
    pub fn export_to_json(&mut self) -> Result<String, serde_json::Error> {
        self.build();
        let visualization = self.create_tree_visualization();
        serde_json::to_string_pretty(&visualization)
    }

    /// 创建用于可视化的树结构
    fn create_tree_visualization(&self) -> TreeVisualization<D> {
        TreeVisualization {
            root: self.root.map(|id| self.create_node_visualization(id)),
            config: TreeConfig {
                node_capacity: self.node_capacity,
                num_items: self.len(),
                dimensions: D,
            },
        }
    }

    /// 递归创建节点的可视化结构
    fn create_node_visualization(&self, id: NodeId) -> NodeVisualization<D> {
        let node = &self.nodes[id.0];
        NodeVisualization {
            id,
            bounds: node.bounds,
            level: node.level,
            item: node.is_leaf().then_some(ItemId(id.0)),
            children: node
                .children
                .iter()
                .map(|child| self.create_node_visualization(*child))
                .collect(),
        }
    }
}

impl<T, const D: usize> Default for STRtree<T, D> {
    /// 使用默认容量创建（capacity = 10）
    fn default() -> Self {
        Self::new(DEFAULT_NODE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strtree::envelope::{Envelope2D, Envelope3D};

    #[test]
    fn test_strtree_creation() {
        let tree: STRtree2D<u32> = STRtree::new(4);
        assert_eq!(tree.node_capacity(), 4);
        assert!(tree.is_empty());
        assert!(!tree.is_built());

        let default: STRtree3D<u32> = STRtree::default();
        assert_eq!(default.node_capacity(), DEFAULT_NODE_CAPACITY);
    }

    #[test]
    #[should_panic(expected = "Node capacity must be at least 2")]
    fn test_capacity_below_two_panics() {
        let _tree: STRtree2D<u32> = STRtree::new(1);
    }

    #[test]
    fn test_insert_and_get() {
        let mut tree = STRtree2D::new(4);
        let a = tree.insert(Envelope2D::new(0.0, 0.0, 1.0, 1.0), "a").unwrap();
        let b = tree.insert(Envelope2D::new(2.0, 2.0, 3.0, 3.0), "b").unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(a), Some(&"a"));
        assert_eq!(tree.get(b), Some(&"b"));
        assert_eq!(tree.envelope_of(b), Some(&Envelope2D::new(2.0, 2.0, 3.0, 3.0)));
        assert_eq!(tree.get(ItemId(9)), None);
    }

    #[test]
    fn test_insert_null_envelope_rejected() {
        let mut tree = STRtree3D::new(4);
        assert_eq!(
            tree.insert(Envelope3D::null(), 1),
            Err(IndexError::NullEnvelope)
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_after_build_rejected() {
        let mut tree = STRtree2D::new(4);
        tree.insert(Envelope2D::new(0.0, 0.0, 1.0, 1.0), 1).unwrap();
        assert!(tree.root().is_some());
        assert!(tree.is_built());

        let result = tree.insert(Envelope2D::new(5.0, 5.0, 6.0, 6.0), 2);
        assert_eq!(result, Err(IndexError::AlreadyBuilt));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_empty_tree_has_no_root() {
        let mut tree: STRtree2D<u32> = STRtree::new(4);
        assert!(tree.root().is_none());
        assert!(tree.is_built());
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.num_nodes(), 0);
        assert_eq!(tree.num_leaf_nodes(), 0);
    }

    #[test]
    fn test_json_export() {
        let mut tree = STRtree2D::new(3);
        for i in 0..10 {
            let x = (i as f64) * 10.0;
            let y = (i as f64) * 5.0;
            tree.insert(Envelope2D::new(x, y, x + 5.0, y + 5.0), i).unwrap();
        }

        let json = tree.export_to_json().expect("Failed to export JSON");

        assert!(json.contains("\"node_capacity\": 3"));
        assert!(json.contains("\"num_items\": 10"));
        assert!(json.contains("\"dimensions\": 2"));

        let parsed: TreeVisualization<2> = serde_json::from_str(&json).unwrap();
        let root = parsed.root.expect("root");
        assert_eq!(root.level, tree.depth() - 1);
        assert_eq!(root.bounds, Envelope2D::new(0.0, 0.0, 95.0, 50.0));
    }
}
