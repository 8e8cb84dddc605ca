//! # phonopy FORCE_CONSTANTS 解析器
//!
//! ## 格式说明
//! ```text
//! N_rows N_cols          # 旧格式只有一个 N（方阵）
//! i j                    # 1-based 原子索引
//! fxx fxy fxz            # 3x3 力常数块 (eV/Å²)
//! fyx fyy fyz
//! fzx fzy fzz
//! ...
//! ```
//! `N_rows == N_cols` 为完整力常数（行为超胞原子），
//! `N_rows < N_cols` 为紧凑格式（行为原胞原子，对应 p2s 映射）。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `phonon/solver.rs` 使用
//! - 无外部模块依赖

use crate::error::{GruneisenError, Result};
use crate::models::structure::Matrix3;
use std::fs;
use std::path::Path;

/// 力常数矩阵（稠密存储，按 [row][col] 排列 3x3 块）
#[derive(Debug, Clone, PartialEq)]
pub struct ForceConstants {
    num_rows: usize,
    num_cols: usize,
    blocks: Vec<Matrix3>,
}

impl ForceConstants {
    /// 全零力常数
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        ForceConstants {
            num_rows,
            num_cols,
            blocks: vec![[[0.0; 3]; 3]; num_rows * num_cols],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// 是否为紧凑格式（行数少于列数）
    pub fn is_compact(&self) -> bool {
        self.num_rows < self.num_cols
    }

    pub fn block(&self, row: usize, col: usize) -> &Matrix3 {
        &self.blocks[row * self.num_cols + col]
    }

    pub fn block_mut(&mut self, row: usize, col: usize) -> &mut Matrix3 {
        &mut self.blocks[row * self.num_cols + col]
    }

    /// 施加平移不变性（声学求和规则）
    ///
    /// 对每一行，把 Σ_j Φ_ij 从自作用块中扣除，使得每行之和为零。
    /// `self_col(row)` 给出该行原子在列索引中的位置。
    pub fn impose_translational_invariance(&mut self, self_col: impl Fn(usize) -> usize) {
        for row in 0..self.num_rows {
            let mut sum = [[0.0; 3]; 3];
            for col in 0..self.num_cols {
                let b = self.block(row, col);
                for a in 0..3 {
                    for c in 0..3 {
                        sum[a][c] += b[a][c];
                    }
                }
            }

            let diag = self.block_mut(row, self_col(row));
            for a in 0..3 {
                for c in 0..3 {
                    diag[a][c] -= sum[a][c];
                }
            }
        }
    }

    /// 行和的最大绝对值（检查声学求和规则的偏离程度）
    pub fn max_row_sum(&self) -> f64 {
        (0..self.num_rows)
            .map(|row| {
                let mut sum = [[0.0; 3]; 3];
                for col in 0..self.num_cols {
                    let b = self.block(row, col);
                    for a in 0..3 {
                        for c in 0..3 {
                            sum[a][c] += b[a][c];
                        }
                    }
                }
                sum.iter().flatten().fold(0.0_f64, |m, x| m.max(x.abs()))
            })
            .fold(0.0, f64::max)
    }
}

/// 解析 FORCE_CONSTANTS 文件
pub fn parse_force_constants_file(path: &Path) -> Result<ForceConstants> {
    let content = fs::read_to_string(path).map_err(|e| GruneisenError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_force_constants_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 FORCE_CONSTANTS
pub fn parse_force_constants_content(content: &str, source: &str) -> Result<ForceConstants> {
    let err = |reason: String| GruneisenError::ParseError {
        format: "FORCE_CONSTANTS".to_string(),
        path: source.to_string(),
        reason,
    };

    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| err("Empty file".to_string()))?;
    let dims: Vec<usize> = header
        .split_whitespace()
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<Vec<usize>, _>>()
        .map_err(|_| err(format!("Invalid header '{}'", header.trim())))?;

    let (num_rows, num_cols) = match dims.as_slice() {
        [n] => (*n, *n),
        [r, c] => (*r, *c),
        _ => return Err(err(format!("Invalid header '{}'", header.trim()))),
    };
    if num_rows == 0 || num_cols == 0 || num_rows > num_cols {
        return Err(err(format!("Invalid dimensions {} x {}", num_rows, num_cols)));
    }

    let mut fc = ForceConstants::zeros(num_rows, num_cols);
    let mut seen = vec![false; num_rows * num_cols];

    for _ in 0..num_rows * num_cols {
        let (line_no, index_line) = lines
            .next()
            .ok_or_else(|| err("Unexpected end of file".to_string()))?;
        let indices: Vec<usize> = index_line
            .split_whitespace()
            .take(2)
            .filter_map(|s| s.parse().ok())
            .collect();
        if indices.len() != 2 {
            return Err(err(format!("Invalid atom index pair at line {}", line_no + 1)));
        }

        let (i, j) = (indices[0], indices[1]);
        if i == 0 || j == 0 || i > num_rows || j > num_cols {
            return Err(err(format!(
                "Atom index pair ({}, {}) out of range at line {}",
                i,
                j,
                line_no + 1
            )));
        }
        let (row, col) = (i - 1, j - 1);
        if seen[row * num_cols + col] {
            return Err(err(format!("Duplicate block ({}, {}) at line {}", i, j, line_no + 1)));
        }
        seen[row * num_cols + col] = true;

        let block = fc.block_mut(row, col);
        for r in block.iter_mut() {
            let (line_no, values_line) = lines
                .next()
                .ok_or_else(|| err("Unexpected end of file".to_string()))?;
            let values: Vec<f64> = values_line
                .split_whitespace()
                .take(3)
                .filter_map(|s| s.parse().ok())
                .collect();
            if values.len() != 3 {
                return Err(err(format!("Invalid force constant row at line {}", line_no + 1)));
            }
            *r = [values[0], values[1], values[2]];
        }
    }

    Ok(fc)
}
