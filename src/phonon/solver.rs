//! # 声子求解器
//!
//! `PhononSolver` 是估计器所依赖的接口：给定一批 q 点，返回每个 q 点
//! 按频率升序排列的声子模式。不同应变态之间的能带顺序不保证一致。
//!
//! `ForceConstantSolver` 是基于超胞力常数的实现。
//!
//! ## 依赖关系
//! - 被 `gruneisen/estimator.rs` 通过 trait 调用
//! - 被 `commands/states.rs` 构造
//! - 使用 `rayon` 在 q 点之间并行

use crate::error::{GruneisenError, Result};
use crate::models::{Crystal, QPoint, QPointModes};
use crate::parsers::ForceConstants;
use crate::phonon::dynmat::{self, PhaseGeometry};
use crate::phonon::supercell::Supercell;

use rayon::prelude::*;

/// VASP 单位 (eV/Å², amu) 下 √(D) 到 THz 的换算因子
pub const VASP_TO_THZ: f64 = 15.633302;

/// 声子求解器接口
pub trait PhononSolver: Send + Sync {
    /// 每个 q 点的能带数 (3 × 原胞原子数)
    fn num_bands(&self) -> usize;

    /// 批量求解；返回与 `qpoints` 一一对应的模式集合
    fn solve(&self, qpoints: &[QPoint]) -> Result<Vec<QPointModes>>;
}

/// 求解器配置
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// 频率换算因子
    pub factor: f64,
    /// 是否施加声学求和规则
    pub acoustic_sum_rule: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            factor: VASP_TO_THZ,
            acoustic_sum_rule: false,
        }
    }
}

/// 基于超胞力常数的声子求解器
pub struct ForceConstantSolver {
    crystal: Crystal,
    supercell: Supercell,
    force_constants: ForceConstants,
    geometry: PhaseGeometry,
    factor: f64,
}

impl ForceConstantSolver {
    pub fn new(
        crystal: Crystal,
        dims: [usize; 3],
        mut force_constants: ForceConstants,
        config: &SolverConfig,
    ) -> Result<Self> {
        let supercell = Supercell::new(&crystal, dims)?;

        let expected_rows = if force_constants.is_compact() {
            supercell.num_primitive_atoms()
        } else {
            supercell.num_atoms()
        };
        if force_constants.num_cols() != supercell.num_atoms()
            || force_constants.num_rows() != expected_rows
        {
            return Err(GruneisenError::StructureMismatch(format!(
                "force constants are {} x {} but supercell {:?} of '{}' has {} atoms ({} primitive)",
                force_constants.num_rows(),
                force_constants.num_cols(),
                dims,
                crystal.name,
                supercell.num_atoms(),
                supercell.num_primitive_atoms()
            )));
        }

        if config.acoustic_sum_rule {
            let compact = force_constants.is_compact();
            force_constants.impose_translational_invariance(|row| {
                if compact {
                    supercell.p2s(row)
                } else {
                    row
                }
            });
        }

        let geometry = PhaseGeometry::new(&supercell);

        Ok(ForceConstantSolver {
            crystal,
            supercell,
            force_constants,
            geometry,
            factor: config.factor,
        })
    }

    /// 单个 q 点求解
    pub fn solve_at(&self, q: &QPoint) -> Result<QPointModes> {
        let d = dynmat::dynamical_matrix(
            &self.force_constants,
            &self.supercell,
            &self.geometry,
            &self.crystal.masses(),
            q,
        );
        let modes = dynmat::diagonalize(d, self.factor)?;
        Ok(QPointModes { qpoint: *q, modes })
    }
}

impl PhononSolver for ForceConstantSolver {
    fn num_bands(&self) -> usize {
        3 * self.crystal.num_atoms()
    }

    fn solve(&self, qpoints: &[QPoint]) -> Result<Vec<QPointModes>> {
        qpoints.par_iter().map(|q| self.solve_at(q)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    /// 一维单原子链：最近邻弹簧 k，质量 m
    fn chain_solver(k: f64, mass: f64) -> ForceConstantSolver {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        let crystal = Crystal::new("chain", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0], mass)]);

        let mut fc = ForceConstants::zeros(4, 4);
        for i in 0..4 {
            fc.block_mut(i, i)[0][0] = 2.0 * k;
            fc.block_mut(i, (i + 1) % 4)[0][0] = -k;
            fc.block_mut(i, (i + 3) % 4)[0][0] = -k;
        }

        let config = SolverConfig {
            factor: 1.0,
            acoustic_sum_rule: false,
        };
        ForceConstantSolver::new(crystal, [4, 1, 1], fc, &config).unwrap()
    }

    #[test]
    fn test_chain_dispersion() {
        let solver = chain_solver(1.0, 1.0);
        assert_eq!(solver.num_bands(), 3);

        let qpoints = [QPoint::new(0.5, 0.0, 0.0), QPoint::new(0.25, 0.0, 0.0)];
        let result = solver.solve(&qpoints).unwrap();
        assert_eq!(result.len(), 2);

        // ω² = 4k/m sin²(πq)
        let top = result[0].modes[2].frequency;
        assert!((top - 2.0).abs() < 1e-10);
        let quarter = result[1].modes[2].frequency;
        assert!((quarter - 2.0f64.sqrt()).abs() < 1e-10);

        // 横向无弹簧 → 零频
        assert!(result[0].modes[0].frequency.abs() < 1e-6);
    }

    #[test]
    fn test_chain_gamma_acoustic() {
        let solver = chain_solver(1.0, 1.0);
        let result = solver.solve(&[QPoint::GAMMA]).unwrap();
        assert!(result[0].modes.iter().all(|m| m.frequency.abs() < 1e-6));
    }

    #[test]
    fn test_heavier_mass_lowers_frequency() {
        let light = chain_solver(1.0, 1.0).solve_at(&QPoint::new(0.5, 0.0, 0.0)).unwrap();
        let heavy = chain_solver(1.0, 4.0).solve_at(&QPoint::new(0.5, 0.0, 0.0)).unwrap();
        assert!((heavy.modes[2].frequency - light.modes[2].frequency / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_force_constant_shape_mismatch() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let crystal = Crystal::new("x", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0], 1.0)]);
        let fc = ForceConstants::zeros(3, 3);
        let result = ForceConstantSolver::new(crystal, [2, 1, 1], fc, &SolverConfig::default());
        assert!(matches!(result, Err(GruneisenError::StructureMismatch(_))));
    }

    #[test]
    fn test_acoustic_sum_rule_restores_zero_at_gamma() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        let crystal = Crystal::new("chain", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0], 1.0)]);

        let mut fc = ForceConstants::zeros(1, 4);
        fc.block_mut(0, 0)[0][0] = 2.5;
        fc.block_mut(0, 1)[0][0] = -1.0;
        fc.block_mut(0, 3)[0][0] = -1.0;

        let config = SolverConfig {
            factor: 1.0,
            acoustic_sum_rule: true,
        };
        let solver = ForceConstantSolver::new(crystal, [4, 1, 1], fc, &config).unwrap();
        let gamma = solver.solve_at(&QPoint::GAMMA).unwrap();
        assert!(gamma.modes.iter().all(|m| m.frequency.abs() < 1e-6));
    }
}
