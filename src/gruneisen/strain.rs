//! # 应变态
//!
//! 三个应变态（平衡、正应变、负应变）各自携带体积与声子求解器。
//! 三者的角色显式给出，不依赖位置顺序。
//!
//! ## 依赖关系
//! - 被 `gruneisen/estimator.rs` 使用
//! - 被 `commands/states.rs` 构造
//! - 使用 `phonon/solver.rs` 的 `PhononSolver` 接口

use crate::error::{GruneisenError, Result};
use crate::phonon::PhononSolver;

use std::fmt;

/// 应变态角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrainRole {
    Equilibrium,
    Plus,
    Minus,
}

impl fmt::Display for StrainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrainRole::Equilibrium => "equilibrium",
            StrainRole::Plus => "plus",
            StrainRole::Minus => "minus",
        };
        write!(f, "{}", name)
    }
}

/// 单个应变态：体积 (Å³) 与绑定该结构的求解器
pub struct StrainState {
    pub volume: f64,
    pub solver: Box<dyn PhononSolver>,
}

impl StrainState {
    pub fn new(volume: f64, solver: Box<dyn PhononSolver>) -> Self {
        StrainState { volume, solver }
    }
}

/// 经过校验的三个应变态
pub struct StrainSet {
    equilibrium: StrainState,
    plus: StrainState,
    minus: StrainState,
    warnings: Vec<String>,
}

impl StrainSet {
    /// 校验体积并组装
    ///
    /// 正负应变体积不在平衡体积两侧时给出警告，严格模式下报错。
    pub fn new(
        equilibrium: StrainState,
        plus: StrainState,
        minus: StrainState,
        strict: bool,
    ) -> Result<Self> {
        for (role, state) in [
            (StrainRole::Equilibrium, &equilibrium),
            (StrainRole::Plus, &plus),
            (StrainRole::Minus, &minus),
        ] {
            if !state.volume.is_finite() || state.volume <= 0.0 {
                return Err(GruneisenError::InvalidArgument(format!(
                    "{} state has invalid volume {}",
                    role, state.volume
                )));
            }
        }

        let mut warnings = Vec::new();
        let v0 = equilibrium.volume;
        if (plus.volume - v0) * (minus.volume - v0) >= 0.0 {
            let message = format!(
                "plus ({:.4}) and minus ({:.4}) volumes do not bracket the equilibrium volume ({:.4})",
                plus.volume, minus.volume, v0
            );
            if strict {
                return Err(GruneisenError::StrictViolation(message));
            }
            warnings.push(message);
        }

        Ok(StrainSet {
            equilibrium,
            plus,
            minus,
            warnings,
        })
    }

    pub fn get(&self, role: StrainRole) -> &StrainState {
        match role {
            StrainRole::Equilibrium => &self.equilibrium,
            StrainRole::Plus => &self.plus,
            StrainRole::Minus => &self.minus,
        }
    }

    /// 构造时收集的非致命警告
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// 有限差分步长 Δ
    ///
    /// 显式给出时直接使用，否则取 (V₊ − V₋) / (2·V₀)。
    pub fn delta(&self, explicit: Option<f64>) -> Result<f64> {
        let delta = match explicit {
            Some(d) => d,
            None => (self.plus.volume - self.minus.volume) / (2.0 * self.equilibrium.volume),
        };

        if !delta.is_finite() || delta == 0.0 {
            let reason = match explicit {
                Some(_) => format!("explicit strain {} is zero or not finite", delta),
                None => format!(
                    "plus and minus volumes are equal ({:.6}), pass --strain",
                    self.plus.volume
                ),
            };
            return Err(GruneisenError::MissingStrainDelta(reason));
        }
        Ok(delta)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ModeRecord, QPoint, QPointModes};

    /// 每个 q 点返回固定模式的求解器
    pub(crate) struct FixedSolver {
        pub modes: Vec<ModeRecord>,
    }

    impl PhononSolver for FixedSolver {
        fn num_bands(&self) -> usize {
            self.modes.len()
        }

        fn solve(&self, qpoints: &[QPoint]) -> Result<Vec<QPointModes>> {
            Ok(qpoints
                .iter()
                .map(|q| QPointModes {
                    qpoint: *q,
                    modes: self.modes.clone(),
                })
                .collect())
        }
    }

    fn state(volume: f64) -> StrainState {
        StrainState::new(volume, Box::new(FixedSolver { modes: vec![] }))
    }

    #[test]
    fn test_delta_from_volumes() {
        let set = StrainSet::new(state(100.0), state(101.0), state(99.0), false).unwrap();
        assert!((set.delta(None).unwrap() - 0.01).abs() < 1e-12);
        assert!(set.warnings().is_empty());
    }

    #[test]
    fn test_explicit_delta_overrides() {
        let set = StrainSet::new(state(100.0), state(101.0), state(99.0), false).unwrap();
        assert_eq!(set.delta(Some(-0.02)).unwrap(), -0.02);
        assert!(matches!(
            set.delta(Some(0.0)),
            Err(GruneisenError::MissingStrainDelta(_))
        ));
    }

    #[test]
    fn test_equal_volumes_need_explicit_delta() {
        let set = StrainSet::new(state(100.0), state(100.0), state(100.0), false).unwrap();
        assert!(matches!(
            set.delta(None),
            Err(GruneisenError::MissingStrainDelta(_))
        ));
        assert!((set.delta(Some(0.01)).unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_non_bracketing_volumes_warn() {
        let set = StrainSet::new(state(100.0), state(101.0), state(102.0), false).unwrap();
        assert_eq!(set.warnings().len(), 1);
    }

    #[test]
    fn test_non_bracketing_volumes_strict() {
        let result = StrainSet::new(state(100.0), state(101.0), state(102.0), true);
        assert!(matches!(result, Err(GruneisenError::StrictViolation(_))));
    }

    #[test]
    fn test_invalid_volume_rejected() {
        assert!(StrainSet::new(state(0.0), state(101.0), state(99.0), false).is_err());
        assert!(StrainSet::new(state(100.0), state(f64::NAN), state(99.0), false).is_err());
    }

    #[test]
    fn test_role_lookup() {
        let set = StrainSet::new(state(100.0), state(101.0), state(99.0), false).unwrap();
        assert_eq!(set.get(StrainRole::Plus).volume, 101.0);
        assert_eq!(StrainRole::Minus.to_string(), "minus");
    }
}
