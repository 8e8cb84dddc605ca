//! # 声子求解模块
//!
//! 从原胞结构与超胞力常数计算任意 q 点上的声子频率与本征矢。
//!
//! ## 子模块
//! - `supercell`: 对角超胞与最短像搜索
//! - `dynmat`: 动力学矩阵构造与对角化
//! - `solver`: `PhononSolver` 接口及力常数实现
//!
//! ## 依赖关系
//! - 被 `gruneisen/` 与 `commands/` 使用
//! - 使用 `models/`, `parsers/force_constants.rs`

pub mod dynmat;
pub mod solver;
pub mod supercell;

pub use solver::{ForceConstantSolver, PhononSolver, SolverConfig};
