//! # q 点采样模块
//!
//! ## 子模块
//! - `path`: 高对称路径（能带模式）
//! - `mesh`: 均匀网格（网格模式）
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`

pub mod mesh;
pub mod path;

pub use mesh::{MeshPoint, QMesh};
pub use path::{parse_band_spec, BandPath};
