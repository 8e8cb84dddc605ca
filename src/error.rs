//! # 统一错误处理模块
//!
//! 定义 gruneisen 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 前置条件错误（能带数不一致、空 q 点列表、无法确定应变）: 致命，整批失败
//! - 数值退化（频率低于截断）不在此处，由估计器以 NaN 标记
//! - 严格模式下的警告升级为 `StrictViolation`
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// gruneisen 统一错误类型
#[derive(Error, Debug)]
pub enum GruneisenError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unknown element '{0}' (no atomic mass available, use --mass)")]
    UnknownElement(String),

    // ─────────────────────────────────────────────────────────────
    // 前置条件错误（致命）
    // ─────────────────────────────────────────────────────────────
    #[error("No q-points requested")]
    EmptyQPoints,

    #[error("Band count mismatch between {first} and {second} states at q-point index {}", format_indices(.qpoints))]
    BandCountMismatch {
        first: String,
        second: String,
        qpoints: Vec<usize>,
    },

    #[error("{state} state returned {got} q-points, expected {expected}")]
    QPointCountMismatch {
        state: String,
        expected: usize,
        got: usize,
    },

    #[error("Cannot determine strain delta: {0}")]
    MissingStrainDelta(String),

    #[error("Structure mismatch: {0}")]
    StructureMismatch(String),

    // ─────────────────────────────────────────────────────────────
    // 数值 / 严格模式
    // ─────────────────────────────────────────────────────────────
    #[error("Strict mode: {0}")]
    StrictViolation(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid band path: {0}")]
    InvalidBandPath(String),

    // ─────────────────────────────────────────────────────────────
    // CSV / 绘图
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Plotting failed: {0}")]
    PlotError(String),
}

/// 错误信息中的 q 点索引列表（过长时截断）
fn format_indices(indices: &[usize]) -> String {
    let shown: Vec<String> = indices.iter().take(8).map(|i| i.to_string()).collect();
    if indices.len() > 8 {
        format!("{}, ... ({} total)", shown.join(", "), indices.len())
    } else {
        shown.join(", ")
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, GruneisenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_count_mismatch_message() {
        let err = GruneisenError::BandCountMismatch {
            first: "plus".to_string(),
            second: "minus".to_string(),
            qpoints: vec![3],
        };
        assert_eq!(
            err.to_string(),
            "Band count mismatch between plus and minus states at q-point index 3"
        );
    }

    #[test]
    fn test_format_indices_truncates() {
        let indices: Vec<usize> = (0..20).collect();
        let s = format_indices(&indices);
        assert!(s.starts_with("0, 1, 2"));
        assert!(s.ends_with("(20 total)"));
    }
}
