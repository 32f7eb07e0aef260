use crate::index::error::IndexError;
use crate::index::spatial_index::{IndexOptions, IndexType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// geoknn 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoKnnConfig {
    /// 索引构建配置
    pub index: IndexConfig,

    /// 查询配置
    pub query: QueryConfig,

    /// 日志配置
    pub logging: LoggingConfig,
}

/// 索引构建配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// 索引类型：rtree, quadtree
    #[serde(default = "default_index_type")]
    pub index_type: String,

    /// 叶子节点容量
    #[serde(default = "default_leaf_capacity")]
    pub leaf_capacity: usize,

    /// R-tree 内部节点扇出
    #[serde(default = "default_node_capacity")]
    pub node_capacity: usize,

    /// 四叉树最大深度
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// 查询配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// 默认返回的最近邻数量
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// 是否跳过不可通行（非机动车）的道路
    #[serde(default = "default_usable_only")]
    pub usable_only: bool,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别：trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 日志输出：stdout, file
    #[serde(default = "default_log_output")]
    pub output: String,

    /// 日志文件路径（当 output = file 时）
    pub log_file: Option<PathBuf>,
}

// ============================================================================
// 默认值函数
// ============================================================================

fn default_index_type() -> String {
    "rtree".to_string()
}

fn default_leaf_capacity() -> usize {
    crate::index::spatial_index::DEFAULT_LEAF_CAPACITY
}

fn default_node_capacity() -> usize {
    crate::index::spatial_index::DEFAULT_NODE_CAPACITY
}

fn default_max_depth() -> usize {
    crate::index::spatial_index::DEFAULT_MAX_DEPTH
}

fn default_k() -> usize {
    1
}

fn default_usable_only() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_output() -> String {
    "stdout".to_string()
}

// ============================================================================
// 实现
// ============================================================================

impl Default for GeoKnnConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig {
                index_type: default_index_type(),
                leaf_capacity: default_leaf_capacity(),
                node_capacity: default_node_capacity(),
                max_depth: default_max_depth(),
            },
            query: QueryConfig {
                default_k: default_k(),
                usable_only: default_usable_only(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                output: default_log_output(),
                log_file: None,
            },
        }
    }
}

impl GeoKnnConfig {
    /// 从文件加载配置
    ///
    /// 配置加载顺序（优先级从低到高）：
    /// 1. 默认配置（内嵌的 default.toml）
    /// 2. 用户配置文件（可选）
    /// 3. 环境变量（GEOKNN__ 前缀，使用双下划线分隔嵌套）
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use geoknn::config::GeoKnnConfig;
    ///
    /// // 加载配置（如果文件不存在，使用默认配置）
    /// let config = GeoKnnConfig::from_file("geoknn.toml").unwrap();
    /// ```
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("GEOKNN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| format!("Failed to load config: {}", e))?;

        Ok(settings
            .try_deserialize()
            .map_err(|e| format!("Failed to parse config: {}", e))?)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path, toml_string)
            .map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// 转换为索引构建参数
    pub fn index_options(&self) -> Result<IndexOptions, IndexError> {
        let options = IndexOptions {
            index_type: self.index.index_type.parse::<IndexType>()?,
            leaf_capacity: self.index.leaf_capacity,
            node_capacity: self.index.node_capacity,
            max_depth: self.index.max_depth,
        };
        options.validate()?;
        Ok(options)
    }

    /// 验证配置
    ///
    /// 检查索引参数、查询参数和日志配置的合法性
    pub fn validate(&self) -> Result<(), String> {
        self.index_options().map_err(|e| e.to_string())?;

        if self.query.default_k == 0 {
            return Err("Query default_k must be at least 1".to_string());
        }

        // 验证日志级别
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "Invalid log level: '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ))
            }
        }

        match self.logging.output.as_str() {
            "stdout" | "file" => {}
            _ => {
                return Err(format!(
                    "Invalid log output: '{}'. Must be one of: stdout, file",
                    self.logging.output
                ))
            }
        }

        // 验证日志文件配置
        if self.logging.output == "file" && self.logging.log_file.is_none() {
            return Err("Log output is 'file' but log_file path is not specified".to_string());
        }

        Ok(())
    }

    /// 打印配置摘要
    pub fn print_summary(&self) {
        println!("📋 geoknn Configuration:");
        println!("   Index Type:    {}", self.index.index_type);
        println!("   Leaf Capacity: {}", self.index.leaf_capacity);
        println!("   Node Capacity: {}", self.index.node_capacity);
        println!("   Max Depth:     {}", self.index.max_depth);
        println!();
        println!("   Default k:     {}", self.query.default_k);
        println!(
            "   Streets:       {}",
            if self.query.usable_only {
                "car-accessible only"
            } else {
                "all"
            }
        );
        println!();
        println!("   Log Level:     {}", self.logging.level);
        println!("   Log Output:    {}", self.logging.output);
        if let Some(ref log_file) = self.logging.log_file {
            println!("   Log File:      {}", log_file.display());
        }
        println!();
    }
}
