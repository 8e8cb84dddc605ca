//! # 数据模型模块
//!
//! 定义晶体结构、原子质量和声子模式的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `phonon/`, `sampling/`, `gruneisen/` 使用
//! - 子模块: structure, element, phonon

pub mod element;
pub mod phonon;
pub mod structure;

pub use phonon::{ModeRecord, QPoint, QPointModes};
pub use structure::{Atom, Crystal, Lattice};
