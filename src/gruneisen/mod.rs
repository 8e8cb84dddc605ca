//! # Grüneisen 参数模块
//!
//! 由平衡、正应变、负应变三个态的声子模式估计模式 Grüneisen 参数。
//!
//! ## 子模块
//! - `strain`: 应变态与差分步长
//! - `matching`: 本征矢投影模式匹配
//! - `estimator`: 中心差分估计
//! - `export`: YAML / CSV 导出
//! - `plot`: 图表生成
//!
//! ## 依赖关系
//! - 被 `commands/band.rs`, `commands/mesh.rs` 使用
//! - 使用 `phonon/`, `models/`, `sampling/`

pub mod estimator;
pub mod export;
pub mod matching;
pub mod plot;
pub mod strain;

pub use estimator::{EstimatorConfig, GruneisenEstimator, GruneisenResult};
pub use export::Sampling;
pub use strain::{StrainRole, StrainSet, StrainState};
