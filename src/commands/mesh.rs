//! # mesh 子命令实现
//!
//! 在均匀 q 点网格上计算 Grüneisen 参数，并给出按权重平均的逐能带统计。
//!
//! ## 依赖关系
//! - 使用 `cli/mesh.rs` 定义的 MeshArgs
//! - 使用 `commands/states.rs` 加载应变态
//! - 使用 `sampling/mesh.rs`, `gruneisen/`

use crate::cli::mesh::MeshArgs;
use crate::cli::OutputFormat;
use crate::commands::states;
use crate::error::Result;
use crate::gruneisen::{export, plot, Sampling};
use crate::models::QPoint;
use crate::sampling::QMesh;
use crate::utils::output;

/// 执行 mesh 子命令
pub fn execute(args: MeshArgs) -> Result<()> {
    output::print_header("Mode Grüneisen Parameters: q-Point Mesh");

    states::configure_threads(args.common.jobs);
    let estimator = states::build_estimator(&args.common)?;

    let mesh = QMesh::new(args.mesh_dims(), args.gamma_center)?;
    let points = mesh.points(!args.no_sym);
    let qpoints: Vec<QPoint> = points.iter().map(|p| p.qpoint).collect();
    let dims = mesh.dims();
    output::print_info(&format!(
        "{} mesh {}x{}x{}: {} of {} q-points{}",
        if mesh.is_gamma_centered() { "Γ-centered" } else { "Monkhorst-Pack" },
        dims[0],
        dims[1],
        dims[2],
        points.len(),
        mesh.num_points(),
        if args.no_sym { "" } else { " after q ≡ -q reduction" }
    ));

    let loaded = states::load_states(&args.common)?;

    let result = states::run_estimate(&estimator, &qpoints, &loaded.set, args.common.strain)?;

    let sampling = Sampling::Mesh {
        mesh: &mesh,
        points: &points,
    };
    let weights = sampling.weights();
    states::print_band_table(&result, weights.as_deref());

    let (format, output_path) = args.common.resolve_output("gruneisen_mesh");
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
        plot::generate_mesh_plot(
            &result,
            plot_path,
            &title,
            args.common.width,
            args.common.height,
        )?;
        output::print_success(&format!("Plot saved to '{}'", plot_path.display()));
    }

    Ok(())
}
