//! # 声子数据模型
//!
//! q 点与声子模式（频率 + 本征矢）的表示。
//!
//! ## 依赖关系
//! - 被 `phonon/`, `sampling/`, `gruneisen/` 使用
//! - 使用 `num-complex` 表示复本征矢

use num_complex::Complex64;

/// 约化坐标下的 q 点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QPoint(pub [f64; 3]);

impl QPoint {
    pub const GAMMA: QPoint = QPoint([0.0, 0.0, 0.0]);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        QPoint([x, y, z])
    }

    /// 与最近的 Γ 像点之间的距离（约化坐标）
    pub fn distance_to_gamma(&self) -> f64 {
        self.0
            .iter()
            .map(|&x| {
                let wrapped = x - x.round();
                wrapped * wrapped
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl std::fmt::Display for QPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4}, {:.4})", self.0[0], self.0[1], self.0[2])
    }
}

/// 单个声子模式
#[derive(Debug, Clone, PartialEq)]
pub struct ModeRecord {
    /// 频率 (THz)，虚频以负值表示
    pub frequency: f64,

    /// 复本征矢（长度 3N，归一化）
    pub eigenvector: Vec<Complex64>,
}

impl ModeRecord {
    pub fn new(frequency: f64, eigenvector: Vec<Complex64>) -> Self {
        ModeRecord {
            frequency,
            eigenvector,
        }
    }

    /// 与另一个模式的投影 |<self|other>|²
    pub fn overlap(&self, other: &ModeRecord) -> f64 {
        overlap(&self.eigenvector, &other.eigenvector)
    }
}

/// 某 q 点上的全部声子模式（按频率升序）
#[derive(Debug, Clone, PartialEq)]
pub struct QPointModes {
    pub qpoint: QPoint,
    pub modes: Vec<ModeRecord>,
}

impl QPointModes {
    pub fn num_bands(&self) -> usize {
        self.modes.len()
    }
}

/// 复向量投影 |<a|b>|²
pub fn overlap(a: &[Complex64], b: &[Complex64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.conj() * y)
        .sum::<Complex64>()
        .norm_sqr()
}
