//! # Grüneisen 参数估计
//!
//! 由三个应变态的声子模式，通过中心差分计算模式 Grüneisen 参数：
//!
//! ```text
//! γ = −(ω₊ − ω₋) / (2·Δ·ω₀)
//! ```
//!
//! ## 流程
//! 1. 每个应变态的求解器对整批 q 点调用一次
//! 2. 校验所有 q 点的能带数与本征矢维数，任一不一致则整批失败
//! 3. 各 q 点独立地做模式匹配与差分（rayon 并行）
//!
//! |ω₀| 低于截断频率的模式，以及 Γ 附近半径内的三个声学模式，γ 记为 NaN。
//!
//! ## 依赖关系
//! - 被 `commands/band.rs`, `commands/mesh.rs` 调用
//! - 使用 `gruneisen/strain.rs`, `gruneisen/matching.rs`
//! - 使用 `rayon` 在 q 点之间并行

use crate::error::{GruneisenError, Result};
use crate::gruneisen::matching::match_modes;
use crate::gruneisen::strain::{StrainRole, StrainSet};
use crate::models::{QPoint, QPointModes};

use num_complex::Complex64;
use rayon::prelude::*;

/// 比较不同应变态 q 点坐标时的容差
const QPOINT_TOLERANCE: f64 = 1e-8;

/// 估计器配置
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// |ω₀| 低于该值 (THz) 时 γ 记为 NaN
    pub frequency_cutoff: f64,
    /// Γ 点附近（约化坐标）的半径，半径内三个声学模式的 γ 记为 NaN
    pub gamma_radius: Option<f64>,
    /// 平衡态频率低于 `-imaginary_tolerance` 视为虚频
    pub imaginary_tolerance: f64,
    /// 严格模式：平衡态存在虚频时报错
    pub strict: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            frequency_cutoff: 1e-4,
            gamma_radius: None,
            imaginary_tolerance: 1e-2,
            strict: false,
        }
    }
}

/// 单个模式的结果
#[derive(Debug, Clone)]
pub struct ModeGruneisen {
    /// 平衡态频率 (THz)
    pub frequency: f64,
    /// Grüneisen 参数，未定义时为 NaN
    pub gamma: f64,
    /// 平衡态本征矢
    pub eigenvector: Vec<Complex64>,
    /// 匹配到的正/负应变带序号
    pub plus_band: usize,
    pub minus_band: usize,
    pub plus_frequency: f64,
    pub minus_frequency: f64,
}

impl ModeGruneisen {
    pub fn is_defined(&self) -> bool {
        self.gamma.is_finite()
    }
}

/// 单个 q 点的结果（按平衡态能带序号排列）
#[derive(Debug, Clone)]
pub struct QPointGruneisen {
    pub qpoint: QPoint,
    pub bands: Vec<ModeGruneisen>,
}

/// 一次估计的完整结果
#[derive(Debug, Clone)]
pub struct GruneisenResult {
    /// 使用的差分步长
    pub delta: f64,
    pub qpoints: Vec<QPointGruneisen>,
    /// 平衡态虚频模式数
    pub imaginary_modes: usize,
}

/// 单条能带的统计
#[derive(Debug, Clone)]
pub struct BandSummary {
    pub band: usize,
    pub mean_frequency: f64,
    pub mean_gamma: f64,
    pub min_gamma: f64,
    pub max_gamma: f64,
    pub undefined: usize,
}

impl GruneisenResult {
    pub fn len(&self) -> usize {
        self.qpoints.len()
    }

    pub fn num_bands(&self) -> usize {
        self.qpoints.first().map(|q| q.bands.len()).unwrap_or(0)
    }

    /// γ 为 NaN 的模式总数
    pub fn undefined_count(&self) -> usize {
        self.qpoints
            .iter()
            .flat_map(|q| q.bands.iter())
            .filter(|m| !m.is_defined())
            .count()
    }

    /// 逐能带统计；`weights` 为网格权重，缺省时等权
    pub fn band_summary(&self, weights: Option<&[usize]>) -> Vec<BandSummary> {
        (0..self.num_bands())
            .map(|band| {
                let mut freq_sum = 0.0;
                let mut weight_sum = 0.0;
                let mut gamma_sum = 0.0;
                let mut gamma_weight = 0.0;
                let mut min_gamma = f64::INFINITY;
                let mut max_gamma = f64::NEG_INFINITY;
                let mut undefined = 0;

                for (i, q) in self.qpoints.iter().enumerate() {
                    let w = weights.and_then(|w| w.get(i)).copied().unwrap_or(1) as f64;
                    let mode = &q.bands[band];
                    freq_sum += w * mode.frequency;
                    weight_sum += w;

                    if mode.is_defined() {
                        gamma_sum += w * mode.gamma;
                        gamma_weight += w;
                        min_gamma = min_gamma.min(mode.gamma);
                        max_gamma = max_gamma.max(mode.gamma);
                    } else {
                        undefined += 1;
                    }
                }

                let nan_if_empty = |x: f64| if gamma_weight > 0.0 { x } else { f64::NAN };
                BandSummary {
                    band: band + 1,
                    mean_frequency: freq_sum / weight_sum,
                    mean_gamma: nan_if_empty(gamma_sum / gamma_weight),
                    min_gamma: nan_if_empty(min_gamma),
                    max_gamma: nan_if_empty(max_gamma),
                    undefined,
                }
            })
            .collect()
    }
}

/// Grüneisen 参数估计器
#[derive(Debug, Clone, Default)]
pub struct GruneisenEstimator {
    config: EstimatorConfig,
}

impl GruneisenEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        GruneisenEstimator { config }
    }

    /// 在给定 q 点上估计 Grüneisen 参数
    ///
    /// `delta` 为显式应变步长，缺省时由三个体积推出。
    pub fn estimate(
        &self,
        qpoints: &[QPoint],
        states: &StrainSet,
        delta: Option<f64>,
    ) -> Result<GruneisenResult> {
        if qpoints.is_empty() {
            return Err(GruneisenError::EmptyQPoints);
        }
        let delta = states.delta(delta)?;

        let equilibrium = states.get(StrainRole::Equilibrium).solver.solve(qpoints)?;
        let plus = states.get(StrainRole::Plus).solver.solve(qpoints)?;
        let minus = states.get(StrainRole::Minus).solver.solve(qpoints)?;

        self.estimate_from_modes(&equilibrium, &plus, &minus, delta)
    }

    /// 由已求解的三组模式计算（不调用求解器）
    pub fn estimate_from_modes(
        &self,
        equilibrium: &[QPointModes],
        plus: &[QPointModes],
        minus: &[QPointModes],
        delta: f64,
    ) -> Result<GruneisenResult> {
        if equilibrium.is_empty() {
            return Err(GruneisenError::EmptyQPoints);
        }
        if !delta.is_finite() || delta == 0.0 {
            return Err(GruneisenError::MissingStrainDelta(format!(
                "strain delta {} is zero or not finite",
                delta
            )));
        }

        validate_states(equilibrium, plus, minus)?;

        let imaginary_modes = equilibrium
            .iter()
            .flat_map(|qm| qm.modes.iter())
            .filter(|m| m.frequency < -self.config.imaginary_tolerance)
            .count();
        if self.config.strict && imaginary_modes > 0 {
            return Err(GruneisenError::StrictViolation(format!(
                "{} imaginary modes at the equilibrium state",
                imaginary_modes
            )));
        }

        let qpoints = equilibrium
            .par_iter()
            .zip(plus.par_iter())
            .zip(minus.par_iter())
            .map(|((eq, p), m)| self.estimate_qpoint(eq, p, m, delta))
            .collect();

        Ok(GruneisenResult {
            delta,
            qpoints,
            imaginary_modes,
        })
    }

    fn estimate_qpoint(
        &self,
        equilibrium: &QPointModes,
        plus: &QPointModes,
        minus: &QPointModes,
        delta: f64,
    ) -> QPointGruneisen {
        let plus_map = match_modes(&equilibrium.modes, &plus.modes);
        let minus_map = match_modes(&equilibrium.modes, &minus.modes);
        let suppressed = self.suppressed_acoustic(equilibrium);

        let bands = equilibrium
            .modes
            .iter()
            .enumerate()
            .map(|(b, mode)| {
                let w0 = mode.frequency;
                let wp = plus.modes[plus_map[b]].frequency;
                let wm = minus.modes[minus_map[b]].frequency;

                let gamma = if suppressed.contains(&b)
                    || w0 == 0.0
                    || !(w0.abs() >= self.config.frequency_cutoff)
                {
                    f64::NAN
                } else {
                    -(wp - wm) / (2.0 * delta * w0)
                };

                ModeGruneisen {
                    frequency: w0,
                    gamma,
                    eigenvector: mode.eigenvector.clone(),
                    plus_band: plus_map[b],
                    minus_band: minus_map[b],
                    plus_frequency: wp,
                    minus_frequency: wm,
                }
            })
            .collect();

        QPointGruneisen {
            qpoint: equilibrium.qpoint,
            bands,
        }
    }

    /// Γ 附近需要屏蔽的声学带（|ω₀| 最小的三条）
    fn suppressed_acoustic(&self, equilibrium: &QPointModes) -> Vec<usize> {
        match self.config.gamma_radius {
            Some(radius) if equilibrium.qpoint.distance_to_gamma() <= radius => {
                let mut order: Vec<usize> = (0..equilibrium.modes.len()).collect();
                order.sort_by(|&i, &j| {
                    equilibrium.modes[i]
                        .frequency
                        .abs()
                        .total_cmp(&equilibrium.modes[j].frequency.abs())
                });
                order.truncate(3);
                order
            }
            _ => Vec::new(),
        }
    }
}

/// 所有 q 点的形状校验：数目、坐标、能带数、本征矢维数
fn validate_states(
    equilibrium: &[QPointModes],
    plus: &[QPointModes],
    minus: &[QPointModes],
) -> Result<()> {
    for (role, modes) in [(StrainRole::Plus, plus), (StrainRole::Minus, minus)] {
        if modes.len() != equilibrium.len() {
            return Err(GruneisenError::QPointCountMismatch {
                state: role.to_string(),
                expected: equilibrium.len(),
                got: modes.len(),
            });
        }
        if let Some(i) = equilibrium.iter().zip(modes.iter()).position(|(a, b)| {
            (0..3).any(|k| (a.qpoint.0[k] - b.qpoint.0[k]).abs() > QPOINT_TOLERANCE)
        }) {
            return Err(GruneisenError::StructureMismatch(format!(
                "{} state q-point {} is {} but equilibrium has {}",
                role, i, modes[i].qpoint, equilibrium[i].qpoint
            )));
        }
    }

    let pairs = [
        (StrainRole::Equilibrium, equilibrium, StrainRole::Plus, plus),
        (StrainRole::Equilibrium, equilibrium, StrainRole::Minus, minus),
        (StrainRole::Plus, plus, StrainRole::Minus, minus),
    ];
    for (first_role, first, second_role, second) in pairs {
        let offending: Vec<usize> = first
            .iter()
            .zip(second.iter())
            .enumerate()
            .filter(|(_, (a, b))| mode_shape(a) != mode_shape(b))
            .map(|(i, _)| i)
            .collect();

        if !offending.is_empty() {
            return Err(GruneisenError::BandCountMismatch {
                first: first_role.to_string(),
                second: second_role.to_string(),
                qpoints: offending,
            });
        }
    }

    Ok(())
}

/// (能带数, 本征矢维数)
fn mode_shape(modes: &QPointModes) -> (usize, usize) {
    let dim = modes
        .modes
        .iter()
        .map(|m| m.eigenvector.len())
        .max()
        .unwrap_or(0);
    (modes.num_bands(), dim)
}
