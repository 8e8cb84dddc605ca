//! # 应变态加载
//!
//! 从三个目录读取 POSCAR 与 FORCE_CONSTANTS，构造求解器并组装 `StrainSet`。
//! band 与 mesh 子命令共用。
//!
//! ## 依赖关系
//! - 被 `commands/band.rs`, `commands/mesh.rs` 调用
//! - 使用 `parsers/`, `phonon/`, `gruneisen/strain.rs`

use crate::cli::CommonArgs;
use crate::error::{GruneisenError, Result};
use crate::gruneisen::{
    EstimatorConfig, GruneisenEstimator, GruneisenResult, StrainRole, StrainSet, StrainState,
};
use crate::models::{Crystal, QPoint};
use crate::parsers::{force_constants, poscar};
use crate::phonon::{ForceConstantSolver, SolverConfig};
use crate::utils::{output, progress};

use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 力常数行和超过该值时提示使用 --asr
const ASR_WARNING_THRESHOLD: f64 = 1e-3;

/// 加载完成的三个应变态
pub struct LoadedStates {
    pub set: StrainSet,
    /// 平衡态原胞（用于倒格子与输出）
    pub equilibrium: Crystal,
}

/// 读取单个应变态
fn load_state(role: StrainRole, dir: &Path, args: &CommonArgs) -> Result<(StrainState, Crystal)> {
    if !dir.is_dir() {
        return Err(GruneisenError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let poscar_path = dir.join(&args.poscar_name);
    let fc_path = dir.join(&args.fc_name);
    for path in [&poscar_path, &fc_path] {
        if !path.is_file() {
            return Err(GruneisenError::FileNotFound {
                path: path.display().to_string(),
            });
        }
    }

    let crystal = poscar::parse_poscar_file(&poscar_path, args.mass.as_deref())?;
    let fc = force_constants::parse_force_constants_file(&fc_path)?;

    let residual = fc.max_row_sum();
    if !args.asr && residual > ASR_WARNING_THRESHOLD {
        output::print_warning(&format!(
            "{} force constants violate the acoustic sum rule by {:.2e} (consider --asr)",
            role, residual
        ));
    }

    let config = SolverConfig {
        factor: args.factor,
        acoustic_sum_rule: args.asr,
    };
    let dims = args.supercell_dims();
    let solver = ForceConstantSolver::new(crystal.clone(), dims, fc, &config)?;

    Ok((StrainState::new(crystal.volume(), Box::new(solver)), crystal))
}

/// 读取三个应变态并打印摘要
pub fn load_states(args: &CommonArgs) -> Result<LoadedStates> {
    print_settings(args);

    let (eq_state, eq_crystal) = load_state(StrainRole::Equilibrium, &args.equilibrium, args)?;
    let (plus_state, plus_crystal) = load_state(StrainRole::Plus, &args.plus, args)?;
    let (minus_state, minus_crystal) = load_state(StrainRole::Minus, &args.minus, args)?;

    for (role, crystal) in [(StrainRole::Plus, &plus_crystal), (StrainRole::Minus, &minus_crystal)] {
        if !eq_crystal.same_species(crystal) {
            return Err(GruneisenError::StructureMismatch(format!(
                "{} structure '{}' ({}) has different atoms than equilibrium '{}' ({})",
                role,
                crystal.name,
                crystal.formula(),
                eq_crystal.name,
                eq_crystal.formula()
            )));
        }
    }

    print_state_table(&[
        (StrainRole::Equilibrium, &args.equilibrium, &eq_crystal),
        (StrainRole::Plus, &args.plus, &plus_crystal),
        (StrainRole::Minus, &args.minus, &minus_crystal),
    ]);

    let set = StrainSet::new(eq_state, plus_state, minus_state, args.strict)?;
    for warning in set.warnings() {
        output::print_warning(warning);
    }

    Ok(LoadedStates {
        set,
        equilibrium: eq_crystal,
    })
}

/// 打印求解参数
fn print_settings(args: &CommonArgs) {
    let dims = args.supercell_dims();
    let on_off = |flag: bool| if flag { "on" } else { "off" };

    output::print_info("Settings");
    output::print_field("Supercell", &format!("{} x {} x {}", dims[0], dims[1], dims[2]));
    output::print_field("Frequency factor", &format!("{}", args.factor));
    output::print_field("Acoustic sum rule", on_off(args.asr));
    output::print_field("Frequency cutoff", &format!("{} THz", args.cutoff_freq));
    if let Some(r) = args.gamma_radius {
        output::print_field("Γ radius", &format!("{}", r));
    }
    output::print_field("Strict mode", on_off(args.strict));
}

/// 打印三个应变态的体积表
fn print_state_table(states: &[(StrainRole, &PathBuf, &Crystal)]) {
    #[derive(Tabled)]
    struct StateRow {
        #[tabled(rename = "State")]
        role: String,
        #[tabled(rename = "Directory")]
        dir: String,
        #[tabled(rename = "Formula")]
        formula: String,
        #[tabled(rename = "Volume (Å³)")]
        volume: String,
        #[tabled(rename = "V/V0")]
        ratio: String,
    }

    let v0 = states
        .iter()
        .find(|(role, _, _)| *role == StrainRole::Equilibrium)
        .map(|(_, _, c)| c.volume())
        .unwrap_or(1.0);

    let rows: Vec<StateRow> = states
        .iter()
        .map(|(role, dir, crystal)| StateRow {
            role: role.to_string(),
            dir: dir.display().to_string(),
            formula: crystal.formula(),
            volume: format!("{:.4}", crystal.volume()),
            ratio: format!("{:.5}", crystal.volume() / v0),
        })
        .collect();

    output::print_header("Strain States");
    println!("{}", Table::new(&rows));
}

/// 设置 rayon 全局线程数
pub fn configure_threads(jobs: usize) {
    let num_threads = if jobs == 0 { num_cpus::get() } else { jobs };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok();
}

/// 由 CLI 参数构造估计器
pub fn build_estimator(args: &CommonArgs) -> Result<GruneisenEstimator> {
    if !(args.cutoff_freq >= 0.0) {
        return Err(GruneisenError::InvalidArgument(format!(
            "--cutoff-freq must be non-negative, got {}",
            args.cutoff_freq
        )));
    }
    if let Some(r) = args.gamma_radius {
        if !(r >= 0.0) {
            return Err(GruneisenError::InvalidArgument(format!(
                "--gamma-radius must be non-negative, got {}",
                r
            )));
        }
    }

    Ok(GruneisenEstimator::new(EstimatorConfig {
        frequency_cutoff: args.cutoff_freq,
        gamma_radius: args.gamma_radius,
        strict: args.strict,
        ..Default::default()
    }))
}

/// 执行估计（带 spinner），并报告 Δ 与虚频
pub fn run_estimate(
    estimator: &GruneisenEstimator,
    qpoints: &[QPoint],
    states: &StrainSet,
    strain: Option<f64>,
) -> Result<GruneisenResult> {
    let delta = states.delta(strain)?;
    match strain {
        Some(_) => output::print_info(&format!("Strain step Δ = {:.6} (explicit)", delta)),
        None => output::print_info(&format!("Strain step Δ = (V+ - V-) / 2V0 = {:.6}", delta)),
    }

    let num_bands = states.get(StrainRole::Equilibrium).solver.num_bands();
    let spinner = progress::create_spinner(&format!(
        "Solving {} bands at {} q-points for 3 states...",
        num_bands,
        qpoints.len()
    ));
    let result = estimator.estimate(qpoints, states, strain);
    spinner.finish_and_clear();
    let result = result?;

    if result.imaginary_modes > 0 {
        output::print_warning(&format!(
            "{} imaginary modes at the equilibrium state",
            result.imaginary_modes
        ));
    }
    let undefined = result.undefined_count();
    if undefined > 0 {
        output::print_info(&format!(
            "{} modes have undefined γ (below cutoff or acoustic near Γ)",
            undefined
        ));
    }

    Ok(result)
}

/// 打印逐能带统计表
pub fn print_band_table(result: &GruneisenResult, weights: Option<&[usize]>) {
    #[derive(Tabled)]
    struct BandRow {
        #[tabled(rename = "Band")]
        band: usize,
        #[tabled(rename = "<ω> (THz)")]
        frequency: String,
        #[tabled(rename = "<γ>")]
        mean: String,
        #[tabled(rename = "γ min")]
        min: String,
        #[tabled(rename = "γ max")]
        max: String,
        #[tabled(rename = "Undefined")]
        undefined: usize,
    }

    let rows: Vec<BandRow> = result
        .band_summary(weights)
        .into_iter()
        .map(|s| BandRow {
            band: s.band,
            frequency: format!("{:.4}", s.mean_frequency),
            mean: format!("{:.4}", s.mean_gamma),
            min: format!("{:.4}", s.min_gamma),
            max: format!("{:.4}", s.max_gamma),
            undefined: s.undefined,
        })
        .collect();

    if !rows.is_empty() {
        output::print_header("Mode Grüneisen Parameters by Band");
        println!("{}", Table::new(&rows));
    }
}
