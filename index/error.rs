use thiserror::Error;

/// 索引构建和查询的错误类型
///
/// An index built from zero entries is not an error: it is a valid empty index
/// whose queries return no results.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    /// 调用方违反契约（k 为 0、查询点非有限值、包络 min > max、容量参数非法）
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// 条目包含非有限坐标，整个构建被中止
    #[error("Index build failed at entry {position}: {reason}")]
    BuildFailure { position: usize, reason: String },
}

impl IndexError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        IndexError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;
