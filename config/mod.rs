use crate::strtree::DEFAULT_NODE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// strtree 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrTreeConfig {
    /// 索引配置
    #[serde(default)]
    pub index: IndexConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 索引配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// 每个内部节点最多的子节点数
    #[serde(default = "default_node_capacity")]
    pub node_capacity: usize,

    /// 数据集维度：2 或 3
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别：trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 日志输出：stdout, stderr, file
    #[serde(default = "default_log_output")]
    pub output: String,

    /// 日志文件路径（当 output = file 时）
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub log_file: Option<PathBuf>,
}

// ============================================================================
// 默认值函数
// ============================================================================

fn default_node_capacity() -> usize {
    DEFAULT_NODE_CAPACITY
}

fn default_dimensions() -> usize {
    2
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_output() -> String {
    "stderr".to_string()
}

// ============================================================================
// 实现
// ============================================================================

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            node_capacity: default_node_capacity(),
            dimensions: default_dimensions(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: default_log_output(),
            log_file: None,
        }
    }
}

impl StrTreeConfig {
    /// 从文件加载配置
    ///
    /// 配置加载顺序（优先级从低到高）：
    /// 1. 默认配置（内嵌的 default.toml）
    /// 2. 用户配置文件（可选）
    /// 3. 环境变量（STRTREE__ 前缀，使用双下划线分隔嵌套）
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use strtree::config::StrTreeConfig;
    ///
    /// // 加载配置（如果文件不存在，使用默认配置）
    /// let config = StrTreeConfig::from_file("strtree.toml").unwrap();
    /// ```
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            // 1. 加载默认配置（内嵌）
            .add_source(config::File::from_str(
                include_str!("default.toml"),
                config::FileFormat::Toml,
            ))
            // 2. 加载用户配置（可选，不存在不报错）
            .add_source(config::File::with_name(path).required(false))
            // 3. 加载环境变量（STRTREE__ 前缀，双下划线分隔嵌套）
            .add_source(config::Environment::with_prefix("STRTREE").separator("__"))
            .build()
            .map_err(|e| format!("Failed to load config: {}", e))?;

        Ok(settings
            .try_deserialize()
            .map_err(|e| format!("Failed to parse config: {}", e))?)
    }

    /// 保存配置到文件
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use strtree::config::StrTreeConfig;
    ///
    /// let config = StrTreeConfig::default();
    /// config.save_to_file("strtree.toml").unwrap();
    /// ```
    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path, toml_string)
            .map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// 验证配置
    ///
    /// 检查配置的合法性，包括：
    /// - 节点容量
    /// - 维度
    /// - 日志级别和输出
    pub fn validate(&self) -> Result<(), String> {
        if self.index.node_capacity < 2 {
            return Err(format!(
                "Invalid node capacity: {}. Must be at least 2",
                self.index.node_capacity
            ));
        }

        match self.index.dimensions {
            2 | 3 => {}
            other => {
                return Err(format!(
                    "Invalid dimensions: {}. Must be one of: 2, 3",
                    other
                ))
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "Invalid log level: '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ))
            }
        }

        // 验证日志输出
        match self.logging.output.as_str() {
            "stdout" | "stderr" => {}
            "file" => {
                if self.logging.log_file.is_none() {
                    return Err(
                        "Log output is 'file' but log_file path is not specified".to_string()
                    );
                }
            }
            _ => {
                return Err(format!(
                    "Invalid log output: '{}'. Must be one of: stdout, stderr, file",
                    self.logging.output
                ))
            }
        }

        Ok(())
    }

    /// 打印配置摘要
    pub fn print_summary(&self) {
        println!("📋 STR-tree Configuration:");
        println!("   Node Capacity: {}", self.index.node_capacity);
        println!("   Dimensions:    {}", self.index.dimensions);
        println!();
        println!("   Log Level:     {}", self.logging.level);
        println!("   Log Output:    {}", self.logging.output);
        if let Some(ref log_file) = self.logging.log_file {
            println!("   Log File:      {}", log_file.display());
        }
        println!();
    }
}
