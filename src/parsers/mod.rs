//! # 解析器模块
//!
//! 读取每个应变态目录中的输入文件。
//!
//! ## 依赖关系
//! - 被 `commands/states.rs` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar, force_constants

pub mod force_constants;
pub mod poscar;

pub use force_constants::ForceConstants;
