//! # 均匀 q 点网格
//!
//! Monkhorst-Pack 网格或 Γ 中心网格，可选按时间反演 (q ≡ -q) 约化。
//!
//! ## 约定
//! - 网格地址以 1/(2n) 为单位的整数表示，避免浮点比较
//! - Γ 中心：q_i = r_i / n；MP：q_i = (2 r_i - n + 1) / (2n)
//! - 输出坐标折回 (-0.5, 0.5]，x 方向变化最快
//!
//! ## 依赖关系
//! - 被 `commands/mesh.rs` 调用

use crate::error::{GruneisenError, Result};
use crate::models::QPoint;

use std::collections::HashMap;

/// 网格上的一个不可约 q 点及其权重
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPoint {
    pub qpoint: QPoint,
    pub multiplicity: usize,
}

/// 均匀 q 点网格
#[derive(Debug, Clone, Copy)]
pub struct QMesh {
    dims: [usize; 3],
    gamma_centered: bool,
}

impl QMesh {
    pub fn new(dims: [usize; 3], gamma_centered: bool) -> Result<Self> {
        if dims.iter().any(|&n| n == 0) {
            return Err(GruneisenError::InvalidArgument(format!(
                "Mesh dimensions must be positive, got {:?}",
                dims
            )));
        }
        Ok(QMesh {
            dims,
            gamma_centered,
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn is_gamma_centered(&self) -> bool {
        self.gamma_centered
    }

    /// 网格总点数
    pub fn num_points(&self) -> usize {
        self.dims.iter().product()
    }

    /// 单方向的整数地址（单位 1/(2n)，落在 (-n, n]）
    fn address(&self, axis: usize, r: usize) -> i64 {
        let n = self.dims[axis] as i64;
        let r = r as i64;
        let k = if self.gamma_centered {
            2 * r
        } else {
            2 * r - n + 1
        };
        wrap_address(k, n)
    }

    /// 生成网格点
    ///
    /// `time_reversal` 为真时 q 与 -q 合并，保留先出现者并累计权重。
    pub fn points(&self, time_reversal: bool) -> Vec<MeshPoint> {
        let n = [
            self.dims[0] as i64,
            self.dims[1] as i64,
            self.dims[2] as i64,
        ];
        let mut points: Vec<MeshPoint> = Vec::with_capacity(self.num_points());
        let mut seen: HashMap<[i64; 3], usize> = HashMap::new();

        for z in 0..self.dims[2] {
            for y in 0..self.dims[1] {
                for x in 0..self.dims[0] {
                    let k = [self.address(0, x), self.address(1, y), self.address(2, z)];

                    if time_reversal {
                        let partner = [
                            wrap_address(-k[0], n[0]),
                            wrap_address(-k[1], n[1]),
                            wrap_address(-k[2], n[2]),
                        ];
                        if let Some(&index) = seen.get(&partner) {
                            points[index].multiplicity += 1;
                            continue;
                        }
                        seen.insert(k, points.len());
                    }

                    points.push(MeshPoint {
                        qpoint: QPoint::new(
                            k[0] as f64 / (2 * n[0]) as f64,
                            k[1] as f64 / (2 * n[1]) as f64,
                            k[2] as f64 / (2 * n[2]) as f64,
                        ),
                        multiplicity: 1,
                    });
                }
            }
        }

        points
    }
}

/// 把以 1/(2n) 为单位的地址折回 (-n, n]
fn wrap_address(k: i64, n: i64) -> i64 {
    let period = 2 * n;
    let mut k = k.rem_euclid(period);
    if k > n {
        k -= period;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monkhorst_pack_even() {
        let mesh = QMesh::new([2, 1, 1], false).unwrap();
        let points = mesh.points(false);
        assert_eq!(points.len(), 2);
        assert!((points[0].qpoint.0[0] + 0.25).abs() < 1e-12);
        assert!((points[1].qpoint.0[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_centered_contains_gamma() {
        let mesh = QMesh::new([4, 4, 4], true).unwrap();
        let points = mesh.points(false);
        assert_eq!(points.len(), 64);
        assert_eq!(points[0].qpoint, QPoint::GAMMA);
        // 0.75 折回为 -0.25，0.5 保持在边界
        assert!((points[2].qpoint.0[0] - 0.5).abs() < 1e-12);
        assert!((points[3].qpoint.0[0] + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_odd_monkhorst_pack_contains_gamma() {
        let mesh = QMesh::new([3, 3, 3], false).unwrap();
        let points = mesh.points(false);
        assert!(points.iter().any(|p| p.qpoint.distance_to_gamma() < 1e-12));
    }

    #[test]
    fn test_time_reversal_preserves_weight() {
        for gamma_centered in [true, false] {
            let mesh = QMesh::new([4, 3, 2], gamma_centered).unwrap();
            let reduced = mesh.points(true);
            let total: usize = reduced.iter().map(|p| p.multiplicity).sum();
            assert_eq!(total, mesh.num_points());
            assert!(reduced.len() < mesh.num_points());
        }
    }

    #[test]
    fn test_time_reversal_gamma_centered_2x2x2() {
        // 所有点均为自身的 -q 像
        let mesh = QMesh::new([2, 2, 2], true).unwrap();
        let reduced = mesh.points(true);
        assert_eq!(reduced.len(), 8);
        assert!(reduced.iter().all(|p| p.multiplicity == 1));
    }

    #[test]
    fn test_time_reversal_pairs() {
        let mesh = QMesh::new([4, 1, 1], false).unwrap();
        let reduced = mesh.points(true);
        // ±1/8, ±3/8 → 两个不可约点
        assert_eq!(reduced.len(), 2);
        assert!(reduced.iter().all(|p| p.multiplicity == 2));
    }

    #[test]
    fn test_zero_mesh_rejected() {
        assert!(QMesh::new([0, 1, 1], true).is_err());
    }
}
