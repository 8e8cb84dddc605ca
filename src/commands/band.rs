//! # band 子命令实现
//!
//! 沿高对称路径计算 Grüneisen 参数，写出 YAML/CSV 与可选图表。
//!
//! ## 依赖关系
//! - 使用 `cli/band.rs` 定义的 BandArgs
//! - 使用 `commands/states.rs` 加载应变态
//! - 使用 `sampling/path.rs`, `gruneisen/`

use crate::cli::band::BandArgs;
use crate::cli::OutputFormat;
use crate::commands::states;
use crate::error::{GruneisenError, Result};
use crate::gruneisen::{export, plot, Sampling};
use crate::sampling::{parse_band_spec, BandPath};
use crate::utils::output;

/// 执行 band 子命令
pub fn execute(args: BandArgs) -> Result<()> {
    output::print_header("Mode Grüneisen Parameters: Band Path");

    states::configure_threads(args.common.jobs);
    let estimator = states::build_estimator(&args.common)?;

    // 先解析路径，避免读取力常数后才发现参数错误
    let paths = parse_band_spec(&args.band)?;

    let loaded = states::load_states(&args.common)?;
    let reciprocal = loaded.equilibrium.lattice.reciprocal().ok_or_else(|| {
        GruneisenError::StructureMismatch(format!(
            "equilibrium lattice of '{}' is singular",
            loaded.equilibrium.name
        ))
    })?;

    let band_path = BandPath::from_paths(
        &paths,
        args.band_points,
        &reciprocal,
        args.labels.as_deref(),
    )?;
    output::print_info(&format!(
        "Band path: {} segments, {} q-points",
        band_path.segment_starts.len(),
        band_path.len()
    ));

    let result = states::run_estimate(
        &estimator,
        &band_path.qpoints,
        &loaded.set,
        args.common.strain,
    )?;
    states::print_band_table(&result, None);

    let sampling = Sampling::Band(&band_path);
    let (format, output_path) = args.common.resolve_output("gruneisen_band");
    match format {
        OutputFormat::Yaml => export::write_yaml(
            &result,
            &sampling,
            loaded.equilibrium.num_atoms(),
            args.common.eigenvectors,
            &output_path,
        )?,
        OutputFormat::Csv => export::write_csv(&result, &sampling, &output_path)?,
    }
    output::print_success(&format!("Results saved to '{}'", output_path.display()));

    if let Some(plot_path) = &args.common.plot {
        let title = args
            .common
            .title
            .clone()
            .unwrap_or_else(|| format!("{} Grüneisen parameters", loaded.equilibrium.formula()));
        plot::generate_band_plot(
            &result,
            &band_path,
            plot_path,
            &title,
            args.common.width,
            args.common.height,
        )?;
        output::print_success(&format!("Plot saved to '{}'", plot_path.display()));
    }

    Ok(())
}
