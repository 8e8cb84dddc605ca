//! # Grüneisen 结果导出
//!
//! ## 支持格式
//! - YAML: phonopy `gruneisen.yaml` 风格，未定义的 γ 写为 `.nan`
//! - CSV: 每个 (q 点, 能带) 一行，未定义的 γ 写为 `NaN`
//!
//! ## 依赖关系
//! - 被 `commands/band.rs`, `commands/mesh.rs` 调用
//! - 使用 `gruneisen/estimator.rs` 的结果结构
//! - 使用 `csv` + `serde` 写入 CSV 文件

use crate::error::{GruneisenError, Result};
use crate::gruneisen::GruneisenResult;
use crate::sampling::{BandPath, MeshPoint, QMesh};

use serde::Serialize;
use std::fs;
use std::path::Path;

/// 结果对应的采样方式
pub enum Sampling<'a> {
    Band(&'a BandPath),
    Mesh {
        mesh: &'a QMesh,
        points: &'a [MeshPoint],
    },
}

impl Sampling<'_> {
    /// 网格权重（能带路径无权重）
    pub fn weights(&self) -> Option<Vec<usize>> {
        match self {
            Sampling::Band(_) => None,
            Sampling::Mesh { points, .. } => Some(points.iter().map(|p| p.multiplicity).collect()),
        }
    }
}

/// YAML 浮点数（NaN 与无穷按 YAML 1.1 书写）
fn yaml_float(x: f64) -> String {
    if x.is_nan() {
        ".nan".to_string()
    } else if x == f64::INFINITY {
        ".inf".to_string()
    } else if x == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else {
        format!("{:.10}", x)
    }
}

/// 生成 YAML 文本
pub fn to_yaml(
    result: &GruneisenResult,
    sampling: &Sampling,
    natom: usize,
    eigenvectors: bool,
) -> String {
    let mut out = String::new();

    match sampling {
        Sampling::Band(path) => {
            out.push_str(&format!("npath: {}\n", path.segment_starts.len()));
            out.push_str("segment_nqpoint:\n");
            let mut bounds = path.segment_starts.clone();
            bounds.push(path.len());
            for w in bounds.windows(2) {
                out.push_str(&format!("- {}\n", w[1] - w[0]));
            }
            if !path.ticks.is_empty() {
                out.push_str("labels:\n");
                for (position, label) in &path.ticks {
                    out.push_str(&format!("- [ {}, '{}' ]\n", yaml_float(*position), label));
                }
            }
        }
        Sampling::Mesh { mesh, .. } => {
            let d = mesh.dims();
            out.push_str(&format!("mesh: [ {}, {}, {} ]\n", d[0], d[1], d[2]));
            out.push_str(&format!("gamma_center: {}\n", mesh.is_gamma_centered()));
        }
    }

    out.push_str(&format!("nqpoint: {}\n", result.len()));
    out.push_str(&format!("natom: {}\n", natom));
    out.push_str(&format!("delta: {}\n", yaml_float(result.delta)));
    out.push_str("phonon:\n");

    for (i, q) in result.qpoints.iter().enumerate() {
        let p = q.qpoint.0;
        out.push_str(&format!(
            "- q-position: [ {:13.10}, {:13.10}, {:13.10} ]\n",
            p[0], p[1], p[2]
        ));
        match sampling {
            Sampling::Band(path) => {
                if let Some(d) = path.distances.get(i) {
                    out.push_str(&format!("  distance: {}\n", yaml_float(*d)));
                }
            }
            Sampling::Mesh { points, .. } => {
                if let Some(point) = points.get(i) {
                    out.push_str(&format!("  multiplicity: {}\n", point.multiplicity));
                }
            }
        }

        out.push_str("  band:\n");
        for (b, mode) in q.bands.iter().enumerate() {
            out.push_str(&format!("  - # {}\n", b + 1));
            out.push_str(&format!("    frequency: {}\n", yaml_float(mode.frequency)));
            out.push_str(&format!("    gruneisen: {}\n", yaml_float(mode.gamma)));

            if eigenvectors && !mode.eigenvector.is_empty() {
                out.push_str("    eigenvector:\n");
                for (atom, chunk) in mode.eigenvector.chunks(3).enumerate() {
                    out.push_str(&format!("    - # atom {}\n", atom + 1));
                    for z in chunk {
                        out.push_str(&format!(
                            "      - [ {:13.10}, {:13.10} ]\n",
                            z.re, z.im
                        ));
                    }
                }
            }
        }
        out.push('\n');
    }

    out
}

/// 写入 YAML 文件
pub fn write_yaml(
    result: &GruneisenResult,
    sampling: &Sampling,
    natom: usize,
    eigenvectors: bool,
    output_path: &Path,
) -> Result<()> {
    fs::write(output_path, to_yaml(result, sampling, natom, eigenvectors)).map_err(|e| {
        GruneisenError::FileWriteError {
            path: output_path.display().to_string(),
            source: e,
        }
    })
}

/// CSV 行
#[derive(Debug, Serialize)]
struct CsvRow {
    qpoint: usize,
    qx: f64,
    qy: f64,
    qz: f64,
    distance: Option<f64>,
    multiplicity: Option<usize>,
    band: usize,
    frequency: f64,
    gruneisen: f64,
    plus_band: usize,
    minus_band: usize,
    plus_frequency: f64,
    minus_frequency: f64,
}

/// 写入 CSV 文件
pub fn write_csv(result: &GruneisenResult, sampling: &Sampling, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for (i, q) in result.qpoints.iter().enumerate() {
        let (distance, multiplicity) = match sampling {
            Sampling::Band(path) => (path.distances.get(i).copied(), None),
            Sampling::Mesh { points, .. } => (None, points.get(i).map(|p| p.multiplicity)),
        };

        for (b, mode) in q.bands.iter().enumerate() {
            wtr.serialize(CsvRow {
                qpoint: i + 1,
                qx: q.qpoint.0[0],
                qy: q.qpoint.0[1],
                qz: q.qpoint.0[2],
                distance,
                multiplicity,
                band: b + 1,
                frequency: mode.frequency,
                gruneisen: mode.gamma,
                plus_band: mode.plus_band + 1,
                minus_band: mode.minus_band + 1,
                plus_frequency: mode.plus_frequency,
                minus_frequency: mode.minus_frequency,
            })?;
        }
    }

    wtr.flush().map_err(|e| GruneisenError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gruneisen::estimator::{ModeGruneisen, QPointGruneisen};
    use crate::models::{Lattice, QPoint};
    use num_complex::Complex64;

    fn mode(frequency: f64, gamma: f64) -> ModeGruneisen {
        ModeGruneisen {
            frequency,
            gamma,
            eigenvector: vec![
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
            ],
            plus_band: 0,
            minus_band: 0,
            plus_frequency: frequency,
            minus_frequency: frequency,
        }
    }

    fn result(qpoints: &[QPoint]) -> GruneisenResult {
        GruneisenResult {
            delta: 0.01,
            qpoints: qpoints
                .iter()
                .map(|q| QPointGruneisen {
                    qpoint: *q,
                    bands: vec![mode(0.0, f64::NAN), mode(3.5, 1.25)],
                })
                .collect(),
            imaginary_modes: 0,
        }
    }

    #[test]
    fn test_yaml_mesh_layout() {
        let mesh = QMesh::new([2, 1, 1], false).unwrap();
        let points = mesh.points(false);
        let qpoints: Vec<QPoint> = points.iter().map(|p| p.qpoint).collect();
        let res = result(&qpoints);

        let yaml = to_yaml(&res, &Sampling::Mesh { mesh: &mesh, points: &points }, 1, false);
        assert!(yaml.starts_with("mesh: [ 2, 1, 1 ]\n"));
        assert!(yaml.contains("nqpoint: 2\n"));
        assert!(yaml.contains("natom: 1\n"));
        assert!(yaml.contains("  multiplicity: 1\n"));
        assert!(yaml.contains("    gruneisen: .nan\n"));
        assert!(yaml.contains("    gruneisen: 1.2500000000\n"));
        assert!(!yaml.contains("eigenvector"));
    }

    #[test]
    fn test_yaml_band_with_eigenvectors() {
        let recip = Lattice::from_vectors([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            .reciprocal()
            .unwrap();
        let path = BandPath::from_segments(&[(QPoint::GAMMA, QPoint::new(0.5, 0.0, 0.0))], 3, &recip)
            .unwrap();
        let res = result(&path.qpoints);

        let yaml = to_yaml(&res, &Sampling::Band(&path), 1, true);
        assert!(yaml.contains("npath: 1\n"));
        assert!(yaml.contains("segment_nqpoint:\n- 3\n"));
        assert!(yaml.contains("  distance: 0.5000000000\n"));
        assert!(yaml.contains("    eigenvector:\n    - # atom 1\n"));
        assert_eq!(yaml.matches("- q-position").count(), 3);
    }

    #[test]
    fn test_yaml_float_special_values() {
        assert_eq!(yaml_float(f64::NAN), ".nan");
        assert_eq!(yaml_float(f64::NEG_INFINITY), "-.inf");
        assert_eq!(yaml_float(0.5), "0.5000000000");
    }

    #[test]
    fn test_sampling_weights() {
        let mesh = QMesh::new([4, 1, 1], false).unwrap();
        let points = mesh.points(true);
        let sampling = Sampling::Mesh { mesh: &mesh, points: &points };
        assert_eq!(sampling.weights(), Some(vec![2, 2]));
    }
}
