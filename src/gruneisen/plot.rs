//! # Grüneisen 参数图表
//!
//! 使用 `plotters` 绘制：
//! - 能带模式：γ 随路径长度变化，每条能带一条曲线，高对称点处竖线标注
//! - 网格模式：γ 对频率的散点图
//!
//! 未定义 (NaN) 的 γ 不绘制，曲线在该处断开。输出格式由文件扩展名决定
//! （`.svg` 为 SVG，其余为 PNG）。
//!
//! ## 依赖关系
//! - 被 `commands/band.rs`, `commands/mesh.rs` 调用
//! - 使用 `gruneisen/estimator.rs` 的结果结构
//! - 使用 `plotters` 渲染图表

use crate::error::{GruneisenError, Result};
use crate::gruneisen::GruneisenResult;
use crate::sampling::BandPath;

use plotters::prelude::*;
use std::path::Path;

fn plot_err<E: std::fmt::Debug>(e: E) -> GruneisenError {
    GruneisenError::PlotError(format!("{:?}", e))
}

fn is_svg(output_path: &Path) -> bool {
    output_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// 有限 γ 的范围，两端各留 5% 余量
fn gamma_range(result: &GruneisenResult) -> (f64, f64) {
    let (lo, hi) = result
        .qpoints
        .iter()
        .flat_map(|q| q.bands.iter())
        .filter(|m| m.is_defined())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
            (lo.min(m.gamma), hi.max(m.gamma))
        });

    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(0.1);
    (lo - pad, hi + pad)
}

/// 把一条能带按 NaN 拆成若干连续折线
fn band_polylines(result: &GruneisenResult, path: &BandPath, band: usize) -> Vec<Vec<(f64, f64)>> {
    let mut lines = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for (i, q) in result.qpoints.iter().enumerate() {
        let x = path.distances.get(i).copied().unwrap_or(i as f64);
        let gamma = q.bands.get(band).map(|m| m.gamma).unwrap_or(f64::NAN);
        let segment_start = i > 0 && path.segment_starts.contains(&i);

        if !gamma.is_finite() || segment_start {
            if current.len() > 1 {
                lines.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
        if gamma.is_finite() {
            current.push((x, gamma));
        }
    }
    if current.len() > 1 {
        lines.push(current);
    }
    lines
}

/// 生成能带模式图 (γ vs 路径长度)
pub fn generate_band_plot(
    result: &GruneisenResult,
    path: &BandPath,
    output_path: &Path,
    title: &str,
    width: u32,
    height: u32,
) -> Result<()> {
    if is_svg(output_path) {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_band_chart(&root, result, path, title)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_band_chart(&root, result, path, title)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

fn draw_band_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    result: &GruneisenResult,
    path: &BandPath,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let x_max = path
        .distances
        .last()
        .copied()
        .filter(|d| *d > 0.0)
        .unwrap_or(1.0);
    let (y_min, y_max) = gamma_range(result);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .x_desc("Wave vector")
        .y_desc("Grüneisen parameter γ")
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    // 高对称点
    for (x, label) in &path.ticks {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(*x, y_min), (*x, y_max)],
                BLACK.mix(0.4).stroke_width(1),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Text::new(
                label.clone(),
                (*x, y_min + 0.02 * (y_max - y_min)),
                ("sans-serif", 16).into_font().color(&BLACK),
            )))
            .map_err(plot_err)?;
    }

    // 零线
    if y_min < 0.0 && y_max > 0.0 {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, 0.0), (x_max, 0.0)],
                BLACK.mix(0.3).stroke_width(1),
            )))
            .map_err(plot_err)?;
    }

    for band in 0..result.num_bands() {
        let color = Palette99::pick(band);
        for line in band_polylines(result, path, band) {
            chart
                .draw_series(LineSeries::new(line, color.stroke_width(2)))
                .map_err(plot_err)?;
        }
    }

    Ok(())
}

/// 生成网格模式图 (γ vs 频率散点)
pub fn generate_mesh_plot(
    result: &GruneisenResult,
    output_path: &Path,
    title: &str,
    width: u32,
    height: u32,
) -> Result<()> {
    if is_svg(output_path) {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_mesh_chart(&root, result, title)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_mesh_chart(&root, result, title)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

fn draw_mesh_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    result: &GruneisenResult,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let points: Vec<(usize, f64, f64)> = result
        .qpoints
        .iter()
        .flat_map(|q| q.bands.iter().enumerate())
        .filter(|(_, m)| m.is_defined())
        .map(|(b, m)| (b, m.frequency, m.gamma))
        .collect();

    let (f_min, f_max) = points
        .iter()
        .fold((0.0f64, f64::NEG_INFINITY), |(lo, hi), (_, f, _)| {
            (lo.min(*f), hi.max(*f))
        });
    let f_max = if f_max.is_finite() && f_max > f_min { f_max * 1.05 } else { f_min + 1.0 };
    let (y_min, y_max) = gamma_range(result);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(f_min..f_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Frequency (THz)")
        .y_desc("Grüneisen parameter γ")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|(b, f, g)| Circle::new((*f, *g), 3, Palette99::pick(*b).filled())),
        )
        .map_err(plot_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gruneisen::estimator::{ModeGruneisen, QPointGruneisen};
    use crate::models::{Lattice, QPoint};

    fn result_with(gammas: &[f64]) -> GruneisenResult {
        GruneisenResult {
            delta: 0.01,
            qpoints: gammas
                .iter()
                .map(|g| QPointGruneisen {
                    qpoint: QPoint::GAMMA,
                    bands: vec![ModeGruneisen {
                        frequency: 1.0,
                        gamma: *g,
                        eigenvector: vec![],
                        plus_band: 0,
                        minus_band: 0,
                        plus_frequency: 1.0,
                        minus_frequency: 1.0,
                    }],
                })
                .collect(),
            imaginary_modes: 0,
        }
    }

    #[test]
    fn test_gamma_range_ignores_nan() {
        let (lo, hi) = gamma_range(&result_with(&[f64::NAN, 1.0, 3.0]));
        assert!(lo < 1.0 && lo > 0.8);
        assert!(hi > 3.0 && hi < 3.2);

        assert_eq!(gamma_range(&result_with(&[f64::NAN])), (-1.0, 1.0));
    }

    #[test]
    fn test_band_polylines_split_at_nan_and_segments() {
        let recip = Lattice::from_vectors([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            .reciprocal()
            .unwrap();
        let segments = [
            (QPoint::GAMMA, QPoint::new(0.5, 0.0, 0.0)),
            (QPoint::new(0.5, 0.0, 0.0), QPoint::new(0.5, 0.5, 0.0)),
        ];
        let path = BandPath::from_segments(&segments, 3, &recip).unwrap();
        let result = result_with(&[f64::NAN, 1.0, 1.1, 1.2, 1.3, 1.4]);

        let lines = band_polylines(&result, &path, 0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[1].len(), 3);
    }

    #[test]
    fn test_svg_detection() {
        assert!(is_svg(Path::new("gamma.SVG")));
        assert!(!is_svg(Path::new("gamma.png")));
        assert!(!is_svg(Path::new("gamma")));
    }
}
