//! # 动力学矩阵
//!
//! 由超胞力常数构造 q 点上的动力学矩阵并对角化。
//!
//! ## 公式
//! D(q)_{pα,p'β} = Σ_{s∈p'} Φ_{p2s(p),s}^{αβ} / √(m_p m_p') · (1/|I|) Σ_I exp(2πi q·r_I)
//!
//! 其中 r_I 为从原胞原子 p 指向超胞原子 s 的最短像向量（原胞分数坐标），
//! |I| 为最短像的重数。
//!
//! ## 依赖关系
//! - 被 `phonon/solver.rs` 调用
//! - 使用 `nalgebra` 进行厄米矩阵对角化
//! - 使用 `num-complex` 表示复数

use crate::error::{GruneisenError, Result};
use crate::models::{ModeRecord, QPoint};
use crate::parsers::ForceConstants;
use crate::phonon::supercell::Supercell;

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;
use std::f64::consts::PI;

/// 预计算的相位几何：每个 (原胞原子, 超胞原子) 对的最短像向量
pub struct PhaseGeometry {
    num_super: usize,
    vectors: Vec<Vec<[f64; 3]>>,
}

impl PhaseGeometry {
    pub fn new(supercell: &Supercell) -> Self {
        let num_prim = supercell.num_primitive_atoms();
        let num_super = supercell.num_atoms();
        let mut vectors = Vec::with_capacity(num_prim * num_super);
        for p in 0..num_prim {
            for s in 0..num_super {
                vectors.push(supercell.shortest_vectors(p, s));
            }
        }
        PhaseGeometry { num_super, vectors }
    }

    /// 平均相位因子 (1/|I|) Σ exp(2πi q·r)
    fn phase(&self, p: usize, s: usize, q: &QPoint) -> Complex64 {
        let images = &self.vectors[p * self.num_super + s];
        let sum: Complex64 = images
            .iter()
            .map(|r| {
                let arg = 2.0 * PI * (q.0[0] * r[0] + q.0[1] * r[1] + q.0[2] * r[2]);
                Complex64::from_polar(1.0, arg)
            })
            .sum();
        sum / images.len() as f64
    }
}

/// 构造 q 点动力学矩阵（已厄米化）
pub fn dynamical_matrix(
    fc: &ForceConstants,
    supercell: &Supercell,
    geometry: &PhaseGeometry,
    masses: &[f64],
    q: &QPoint,
) -> DMatrix<Complex64> {
    let num_prim = supercell.num_primitive_atoms();
    let dim = 3 * num_prim;
    let mut d = DMatrix::<Complex64>::zeros(dim, dim);

    for p in 0..num_prim {
        let row = if fc.is_compact() { p } else { supercell.p2s(p) };
        for s in 0..supercell.num_atoms() {
            let pp = supercell.s2p(s);
            let block = fc.block(row, s);
            let factor = geometry.phase(p, s, q) / (masses[p] * masses[pp]).sqrt();

            for a in 0..3 {
                for b in 0..3 {
                    d[(3 * p + a, 3 * pp + b)] += factor * block[a][b];
                }
            }
        }
    }

    let adjoint = d.adjoint();
    (d + adjoint) * Complex64::new(0.5, 0.0)
}

/// 厄米矩阵对角化，返回按本征值升序排列的声子模式
///
/// 频率 ω = sign(λ)·√|λ|·factor，负值代表虚频。
pub fn diagonalize(d: DMatrix<Complex64>, factor: f64) -> Result<Vec<ModeRecord>> {
    if d.iter().any(|z| !z.re.is_finite() || !z.im.is_finite()) {
        return Err(GruneisenError::Numerical(
            "Dynamical matrix contains non-finite entries".to_string(),
        ));
    }

    let eigen = SymmetricEigen::new(d);
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]));

    let modes = order
        .into_iter()
        .map(|i| {
            let lambda = eigen.eigenvalues[i];
            let frequency = lambda.signum() * lambda.abs().sqrt() * factor;

            let column = eigen.eigenvectors.column(i);
            let norm = column.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
            let eigenvector = column.iter().map(|z| *z / norm).collect();

            ModeRecord::new(frequency, eigenvector)
        })
        .collect();

    Ok(modes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Crystal, Lattice};

    #[test]
    fn test_diagonalize_hermitian_2x2() {
        // [[2, i], [-i, 2]] 的本征值为 1 和 3
        let d = DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(2.0, 0.0),
                Complex64::new(0.0, 1.0),
                Complex64::new(0.0, -1.0),
                Complex64::new(2.0, 0.0),
            ],
        );
        let modes = diagonalize(d, 1.0).unwrap();
        assert!((modes[0].frequency - 1.0).abs() < 1e-10);
        assert!((modes[1].frequency - 3.0f64.sqrt()).abs() < 1e-10);

        let norm: f64 = modes[0].eigenvector.iter().map(|z| z.norm_sqr()).sum();
        assert!((norm - 1.0).abs() < 1e-10);
        assert!(modes[0].overlap(&modes[1]) < 1e-10);
    }

    #[test]
    fn test_negative_eigenvalue_is_imaginary_frequency() {
        let d = DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(-4.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(9.0, 0.0),
            ],
        );
        let modes = diagonalize(d, 1.0).unwrap();
        assert!((modes[0].frequency + 2.0).abs() < 1e-10);
        assert!((modes[1].frequency - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_non_finite_matrix_rejected() {
        let d = DMatrix::from_element(1, 1, Complex64::new(f64::NAN, 0.0));
        assert!(diagonalize(d, 1.0).is_err());
    }

    #[test]
    fn test_dynamical_matrix_is_hermitian() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        let crystal = Crystal::new("chain", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0], 2.0)]);
        let sc = Supercell::new(&crystal, [4, 1, 1]).unwrap();
        let geometry = PhaseGeometry::new(&sc);

        let mut fc = ForceConstants::zeros(4, 4);
        for i in 0..4 {
            fc.block_mut(i, i)[0][0] = 2.0;
            fc.block_mut(i, (i + 1) % 4)[0][0] = -1.0;
            fc.block_mut(i, (i + 3) % 4)[0][0] = -1.0;
        }

        let d = dynamical_matrix(&fc, &sc, &geometry, &crystal.masses(), &QPoint::new(0.3, 0.0, 0.0));
        let diff = &d - d.adjoint();
        assert!(diff.iter().all(|z| z.norm() < 1e-12));

        // (2 - 2cos(2π·0.3)) / m
        let expected = (2.0 - 2.0 * (2.0 * PI * 0.3).cos()) / 2.0;
        assert!((d[(0, 0)].re - expected).abs() < 1e-12);
    }
}
