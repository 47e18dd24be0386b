use colored::*;
use std::fmt::Display;

/// 树统计信息，用于 `stats` 子命令
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub items: usize,
    pub dimensions: usize,
    pub node_capacity: usize,
    pub depth: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub bounds: Option<String>,
}

pub struct OutputFormatter;

impl OutputFormatter {
    /// 编号列表；空列表显示 `(empty result)`
    pub fn format_items<S: AsRef<str>>(items: &[S]) -> String {
        if items.is_empty() {
            return "(empty result)".yellow().to_string();
        }
        let mut result = String::new();
        for (i, item) in items.iter().enumerate() {
            result.push_str(&format!("{}) {}\n", (i + 1).to_string().blue(), item.as_ref()));
        }
        result.trim_end().to_string()
    }

    /// 带距离的编号列表
    pub fn format_neighbours<S: AsRef<str>>(neighbours: &[(S, f64)]) -> String {
        if neighbours.is_empty() {
            return "(empty result)".yellow().to_string();
        }
        let mut result = String::new();
        for (i, (label, distance)) in neighbours.iter().enumerate() {
            result.push_str(&format!(
                "{}) {} {}\n",
                (i + 1).to_string().blue(),
                label.as_ref(),
                Self::format_distance(*distance)
            ));
        }
        result.trim_end().to_string()
    }

    pub fn format_pair(a: &str, b: &str, distance: f64) -> String {
        format!("{} <-> {} {}", a.green(), b.green(), Self::format_distance(distance))
    }

    pub fn format_distance(distance: f64) -> String {
        format!("(distance) {}", format!("{:.6}", distance).cyan())
    }

    pub fn format_bool(value: bool) -> String {
        if value {
            "true".green().to_string()
        } else {
            "false".red().to_string()
        }
    }

    pub fn format_nil() -> String {
        "(nil)".red().to_string()
    }

    pub fn format_error<E: Display + ?Sized>(err: &E) -> String {
        format!("(error) {}", err.to_string().red())
    }

    pub fn format_stats(stats: &TreeStats) -> String {
        let bounds = stats.bounds.clone().unwrap_or_else(|| "(empty)".to_string());
        let rows = [
            ("items", stats.items.to_string()),
            ("dimensions", stats.dimensions.to_string()),
            ("node capacity", stats.node_capacity.to_string()),
            ("depth", stats.depth.to_string()),
            ("nodes", stats.nodes.to_string()),
            ("leaves", stats.leaves.to_string()),
            ("bounds", bounds),
        ];
        rows.iter()
            .map(|(name, value)| format!("{:<14} {}", format!("{}:", name).bold(), value.cyan()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
