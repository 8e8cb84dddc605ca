//! # 对角超胞
//!
//! 由原胞和对角扩胞倍数构造超胞，原子顺序与 phonopy 一致：
//! 同一原胞原子的所有像连续排列，格点按 x 最快变化。
//!
//! ## 依赖关系
//! - 被 `phonon/dynmat.rs`, `phonon/solver.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{GruneisenError, Result};
use crate::models::structure::norm;
use crate::models::{Crystal, Lattice};

/// 最短像搜索的长度容差 (Å)
const IMAGE_TOLERANCE: f64 = 1e-4;

/// 超胞
#[derive(Debug, Clone)]
pub struct Supercell {
    dims: [usize; 3],
    lattice: Lattice,
    /// 超胞分数坐标
    positions: Vec<[f64; 3]>,
    /// 超胞原子 -> 原胞原子
    s2p: Vec<usize>,
    /// 原胞原子 -> 超胞中代表原子（格点 0）
    p2s: Vec<usize>,
}

impl Supercell {
    pub fn new(primitive: &Crystal, dims: [usize; 3]) -> Result<Self> {
        if dims.iter().any(|&n| n == 0) {
            return Err(GruneisenError::InvalidArgument(format!(
                "Supercell dimensions must be positive, got {:?}",
                dims
            )));
        }

        let num_cells = dims.iter().product::<usize>();
        let num_prim = primitive.num_atoms();

        let mut positions = Vec::with_capacity(num_prim * num_cells);
        let mut s2p = Vec::with_capacity(num_prim * num_cells);
        let mut p2s = Vec::with_capacity(num_prim);

        for (p, atom) in primitive.atoms.iter().enumerate() {
            p2s.push(positions.len());
            for z in 0..dims[2] {
                for y in 0..dims[1] {
                    for x in 0..dims[0] {
                        let cell = [x as f64, y as f64, z as f64];
                        positions.push([
                            (atom.position[0] + cell[0]) / dims[0] as f64,
                            (atom.position[1] + cell[1]) / dims[1] as f64,
                            (atom.position[2] + cell[2]) / dims[2] as f64,
                        ]);
                        s2p.push(p);
                    }
                }
            }
        }

        Ok(Supercell {
            dims,
            lattice: primitive.lattice.scaled(dims),
            positions,
            s2p,
            p2s,
        })
    }

    pub fn num_atoms(&self) -> usize {
        self.positions.len()
    }

    pub fn num_primitive_atoms(&self) -> usize {
        self.p2s.len()
    }

    pub fn s2p(&self, s: usize) -> usize {
        self.s2p[s]
    }

    pub fn p2s(&self, p: usize) -> usize {
        self.p2s[p]
    }

    /// 从原胞原子 `p` 指向超胞原子 `s` 的所有最短像向量（原胞分数坐标）
    ///
    /// 长度相同（容差内）的像全部返回，调用方按重数平均相位。
    pub fn shortest_vectors(&self, p: usize, s: usize) -> Vec<[f64; 3]> {
        let origin = self.positions[self.p2s[p]];
        let target = self.positions[s];

        let mut diff = [0.0; 3];
        for k in 0..3 {
            let d = target[k] - origin[k];
            diff[k] = d - d.round();
        }

        let mut candidates: Vec<([f64; 3], f64)> = Vec::with_capacity(125);
        for i in -2..=2 {
            for j in -2..=2 {
                for k in -2..=2 {
                    let v = [diff[0] + i as f64, diff[1] + j as f64, diff[2] + k as f64];
                    let length = norm(&self.lattice.frac_to_cart(&v));
                    candidates.push((v, length));
                }
            }
        }

        let min_length = candidates
            .iter()
            .map(|(_, l)| *l)
            .fold(f64::INFINITY, f64::min);

        candidates
            .into_iter()
            .filter(|(_, l)| *l < min_length + IMAGE_TOLERANCE)
            .map(|(v, _)| {
                [
                    v[0] * self.dims[0] as f64,
                    v[1] * self.dims[1] as f64,
                    v[2] * self.dims[2] as f64,
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atom;

    fn chain(a: f64) -> Crystal {
        let lattice = Lattice::from_vectors([[a, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        Crystal::new("chain", lattice, vec![Atom::new("X", [0.0, 0.0, 0.0], 1.0)])
    }

    #[test]
    fn test_supercell_ordering() {
        let lattice = Lattice::from_vectors([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]]);
        let crystal = Crystal::new(
            "AB",
            lattice,
            vec![
                Atom::new("A", [0.0, 0.0, 0.0], 1.0),
                Atom::new("B", [0.5, 0.5, 0.5], 2.0),
            ],
        );
        let sc = Supercell::new(&crystal, [2, 1, 1]).unwrap();

        assert_eq!(sc.num_atoms(), 4);
        assert_eq!(sc.p2s(0), 0);
        assert_eq!(sc.p2s(1), 2);
        assert_eq!(sc.s2p(1), 0);
        assert_eq!(sc.s2p(3), 1);
        assert!((sc.positions[1][0] - 0.5).abs() < 1e-12);
        assert!((sc.positions[3][0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_shortest_vectors_neighbours() {
        let sc = Supercell::new(&chain(1.0), [4, 1, 1]).unwrap();

        let forward = sc.shortest_vectors(0, 1);
        assert_eq!(forward.len(), 1);
        assert!((forward[0][0] - 1.0).abs() < 1e-12);

        let backward = sc.shortest_vectors(0, 3);
        assert_eq!(backward.len(), 1);
        assert!((backward[0][0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shortest_vectors_multiplicity_at_boundary() {
        let sc = Supercell::new(&chain(1.0), [4, 1, 1]).unwrap();
        let halfway = sc.shortest_vectors(0, 2);
        assert_eq!(halfway.len(), 2);
        let mut xs: Vec<f64> = halfway.iter().map(|v| v[0]).collect();
        xs.sort_by(f64::total_cmp);
        assert!((xs[0] + 2.0).abs() < 1e-12);
        assert!((xs[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dims_rejected() {
        assert!(Supercell::new(&chain(1.0), [0, 1, 1]).is_err());
    }
}
