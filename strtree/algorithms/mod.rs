// STR 树算法模块
//
// 这个模块包含 STR 树的所有核心算法实现，按功能分解为不同的子模块：
// - build: Sort-Tile-Recursive 批量构建
// - search: 范围查询和遍历
// - distance: 条目距离度量
// - nearest: 最近邻、k 近邻和距离判定
// - delete: 按句柄删除条目
// - debug: 调试和文本可视化
// - utils: 共用的工具函数

pub mod build;
pub mod debug;
pub mod delete;
pub mod distance;
pub mod nearest;
pub mod search;
pub mod utils;
