use super::super::node::NodeId;
use super::super::strtree::STRtree;
use std::fmt;

/// STR 树调试功能实现
impl<T, const D: usize> STRtree<T, D> {
    /// 打印完整的树结构用于调试
    ///
    /// 必要时先构建树，然后按 `Display` 的格式逐行输出每个节点的边界和层级
    #[allow(dead_code)]
    pub fn print_tree_structure_debug(&mut self) {
        self.build();
        println!("=== STR-tree Structure Debug ===");
        print!("{}", self);
        println!("=== End Debug ===");
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = &self.nodes[id.0];
        writeln!(f, "{}{} [{}]", "  ".repeat(depth), node.bounds, node.level)?;
        for &child in &node.children {
            self.fmt_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

/// 每个节点一行：`Env[...] [level]`，按深度缩进两个空格
impl<T, const D: usize> fmt::Display for STRtree<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.built {
            return writeln!(f, "(not built, {} items)", self.len());
        }
        match self.root {
            Some(root) => self.fmt_node(f, root, 0),
            None => writeln!(f, "(empty)"),
        }
    }
}
