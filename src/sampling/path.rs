//! # 能带路径采样
//!
//! 沿高对称路径均匀取点，并计算累计路径长度（笛卡尔倒空间，不含 2π）。
//!
//! ## 路径语法（与 phonopy `--band` 相同）
//! ```text
//! "0 0 0  0.5 0 0  0.5 0.5 0"          # 连续路径 Γ-X-M
//! "0 0 0  0.5 0 0, 0.5 0.5 0  0 0 0"   # 逗号分隔不连续路径
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 调用
//! - 使用 `models/structure.rs` 的倒格子

use crate::error::{GruneisenError, Result};
use crate::models::structure::norm;
use crate::models::{Lattice, QPoint};

/// 解析路径字符串为若干连续路径（每条路径为顶点列表）
pub fn parse_band_spec(spec: &str) -> Result<Vec<Vec<QPoint>>> {
    let mut paths = Vec::new();

    for (i, part) in spec.split(',').enumerate() {
        let values: Vec<f64> = part
            .split_whitespace()
            .map(|s| {
                parse_fraction(s).ok_or_else(|| {
                    GruneisenError::InvalidBandPath(format!("invalid number '{}' in path {}", s, i + 1))
                })
            })
            .collect::<Result<_>>()?;

        if values.is_empty() {
            continue;
        }
        if values.len() % 3 != 0 {
            return Err(GruneisenError::InvalidBandPath(format!(
                "path {} has {} numbers, expected a multiple of 3",
                i + 1,
                values.len()
            )));
        }

        let vertices: Vec<QPoint> = values
            .chunks(3)
            .map(|c| QPoint::new(c[0], c[1], c[2]))
            .collect();
        if vertices.len() < 2 {
            return Err(GruneisenError::InvalidBandPath(format!(
                "path {} needs at least two q-points",
                i + 1
            )));
        }
        paths.push(vertices);
    }

    if paths.is_empty() {
        return Err(GruneisenError::InvalidBandPath("empty band path".to_string()));
    }
    Ok(paths)
}

/// 解析数值，允许 "1/2" 形式的分数
fn parse_fraction(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => s.parse().ok(),
    }
}

/// 采样后的能带路径
#[derive(Debug, Clone)]
pub struct BandPath {
    /// 所有 q 点（按段依次排列，段端点在相邻段中重复出现）
    pub qpoints: Vec<QPoint>,
    /// 累计路径长度
    pub distances: Vec<f64>,
    /// 每段在 `qpoints` 中的起始索引
    pub segment_starts: Vec<usize>,
    /// 刻度位置与标签
    pub ticks: Vec<(f64, String)>,
}

impl BandPath {
    /// 由若干 (起点, 终点) 段构造，每段 `points_per_segment` 个点（含两端）
    pub fn from_segments(
        segments: &[(QPoint, QPoint)],
        points_per_segment: usize,
        reciprocal: &Lattice,
    ) -> Result<Self> {
        if segments.is_empty() {
            return Err(GruneisenError::InvalidBandPath("no segments".to_string()));
        }
        if points_per_segment < 2 {
            return Err(GruneisenError::InvalidArgument(format!(
                "band points per segment must be at least 2, got {}",
                points_per_segment
            )));
        }

        let mut qpoints = Vec::with_capacity(segments.len() * points_per_segment);
        let mut distances = Vec::with_capacity(segments.len() * points_per_segment);
        let mut segment_starts = Vec::with_capacity(segments.len());
        let mut total = 0.0;

        for (start, end) in segments {
            segment_starts.push(qpoints.len());
            let delta = [
                end.0[0] - start.0[0],
                end.0[1] - start.0[1],
                end.0[2] - start.0[2],
            ];
            let step_length =
                norm(&reciprocal.frac_to_cart(&delta)) / (points_per_segment - 1) as f64;

            for i in 0..points_per_segment {
                let t = i as f64 / (points_per_segment - 1) as f64;
                qpoints.push(QPoint::new(
                    start.0[0] + t * delta[0],
                    start.0[1] + t * delta[1],
                    start.0[2] + t * delta[2],
                ));
                if i > 0 {
                    total += step_length;
                }
                distances.push(total);
            }
        }

        Ok(BandPath {
            qpoints,
            distances,
            segment_starts,
            ticks: Vec::new(),
        })
    }

    /// 由连续路径列表构造，可选顶点标签
    ///
    /// 不连续处的两个标签合并为 "A|B"。
    pub fn from_paths(
        paths: &[Vec<QPoint>],
        points_per_segment: usize,
        reciprocal: &Lattice,
        labels: Option<&[String]>,
    ) -> Result<Self> {
        let segments: Vec<(QPoint, QPoint)> = paths
            .iter()
            .flat_map(|p| p.windows(2).map(|w| (w[0], w[1])))
            .collect();
        let mut band_path = Self::from_segments(&segments, points_per_segment, reciprocal)?;

        let num_vertices: usize = paths.iter().map(|p| p.len()).sum();
        let labels: Vec<String> = match labels {
            Some(l) if l.len() == num_vertices => l.to_vec(),
            Some(l) => {
                return Err(GruneisenError::InvalidArgument(format!(
                    "{} labels given for {} path vertices",
                    l.len(),
                    num_vertices
                )))
            }
            None => paths
                .iter()
                .flat_map(|p| p.iter().map(|q| default_label(q)))
                .collect(),
        };

        // 顶点在路径上的位置
        let mut ticks: Vec<(f64, String)> = Vec::new();
        let mut segment = 0;
        let mut label_iter = labels.into_iter();
        for (path_index, path) in paths.iter().enumerate() {
            for vertex in 0..path.len() {
                let label = label_iter.next().unwrap_or_default();
                let position = if vertex == 0 {
                    band_path.distances[band_path.segment_starts[segment]]
                } else {
                    let last = band_path.segment_starts[segment] + points_per_segment - 1;
                    band_path.distances[last]
                };

                match ticks.last_mut() {
                    Some((x, name)) if vertex == 0 && path_index > 0 && (*x - position).abs() < 1e-12 => {
                        *name = format!("{}|{}", name, label);
                    }
                    _ => ticks.push((position, label)),
                }

                if vertex > 0 && vertex < path.len() - 1 {
                    segment += 1;
                }
            }
            segment += 1;
        }

        band_path.ticks = ticks;
        Ok(band_path)
    }

    pub fn len(&self) -> usize {
        self.qpoints.len()
    }
}

/// 缺省顶点标签：Γ 点标记为 "G"，其余用坐标
fn default_label(q: &QPoint) -> String {
    if q.0.iter().all(|x| x.abs() < 1e-10) {
        "G".to_string()
    } else {
        format!("({:.3},{:.3},{:.3})", q.0[0], q.0[1], q.0[2])
            .replace(".000", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_reciprocal(a: f64) -> Lattice {
        Lattice::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
            .reciprocal()
            .unwrap()
    }

    #[test]
    fn test_parse_band_spec_continuous() {
        let paths = parse_band_spec("0 0 0  1/2 0 0  0.5 0.5 0").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 3);
        assert_eq!(paths[0][1], QPoint::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_parse_band_spec_broken() {
        let paths = parse_band_spec("0 0 0 0.5 0 0, 0.5 0.5 0 0 0 0").unwrap();
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_parse_band_spec_errors() {
        assert!(parse_band_spec("0 0 0 0.5 0").is_err());
        assert!(parse_band_spec("0 0 0").is_err());
        assert!(parse_band_spec("").is_err());
        assert!(parse_band_spec("0 0 x 0.5 0 0").is_err());
    }

    #[test]
    fn test_band_path_distances() {
        let recip = cubic_reciprocal(2.0);
        let paths = parse_band_spec("0 0 0 0.5 0 0 0.5 0.5 0").unwrap();
        let path = BandPath::from_paths(&paths, 11, &recip, None).unwrap();

        assert_eq!(path.len(), 22);
        assert_eq!(path.segment_starts, vec![0, 11]);
        // |0.5 b1| = 0.25 Å⁻¹
        assert!((path.distances[10] - 0.25).abs() < 1e-12);
        assert!((path.distances[11] - 0.25).abs() < 1e-12);
        assert!((path.distances[21] - 0.5).abs() < 1e-12);
        assert_eq!(path.qpoints[21], QPoint::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_band_path_labels_merge_at_break() {
        let recip = cubic_reciprocal(1.0);
        let paths = parse_band_spec("0 0 0 0.5 0 0, 0.5 0.5 0 0 0 0").unwrap();
        let labels: Vec<String> = ["G", "X", "M", "G"].iter().map(|s| s.to_string()).collect();
        let path = BandPath::from_paths(&paths, 5, &recip, Some(&labels)).unwrap();

        let names: Vec<&str> = path.ticks.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["G", "X|M", "G"]);
    }

    #[test]
    fn test_band_path_label_count_mismatch() {
        let recip = cubic_reciprocal(1.0);
        let paths = parse_band_spec("0 0 0 0.5 0 0").unwrap();
        let labels = vec!["G".to_string()];
        assert!(BandPath::from_paths(&paths, 5, &recip, Some(&labels)).is_err());
    }

    #[test]
    fn test_band_path_too_few_points() {
        let recip = cubic_reciprocal(1.0);
        let segments = [(QPoint::GAMMA, QPoint::new(0.5, 0.0, 0.0))];
        assert!(BandPath::from_segments(&segments, 1, &recip).is_err());
    }
}
