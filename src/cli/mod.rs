//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `band`: 沿高对称路径计算 Grüneisen 参数
//! - `mesh`: 在均匀 q 点网格上计算 Grüneisen 参数
//!
//! 两个子命令共享 `CommonArgs`（三个应变态目录、超胞、输出等）。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: band, mesh

pub mod band;
pub mod mesh;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// gruneisen - 由三个应变态的力常数计算模式 Grüneisen 参数
#[derive(Parser)]
#[command(name = "gruneisen")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Mode Grüneisen parameters from phonon calculations at three volumes", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Grüneisen parameters along a band path
    Band(band::BandArgs),

    /// Grüneisen parameters on a uniform q-point mesh
    Mesh(mesh::MeshArgs),
}

/// 结果输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// phonopy-style gruneisen.yaml
    Yaml,
    /// One row per (q-point, band)
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Csv => "csv",
        }
    }

    /// 由文件扩展名推断
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Some(OutputFormat::Yaml),
            Some("csv") => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// band 与 mesh 共享的参数
#[derive(Args, Debug)]
pub struct CommonArgs {
    // ─────────────────────────────────────────────────────────────
    // 输入
    // ─────────────────────────────────────────────────────────────
    /// Directory of the equilibrium-volume calculation
    #[arg(long)]
    pub equilibrium: PathBuf,

    /// Directory of the expanded (plus) calculation
    #[arg(long)]
    pub plus: PathBuf,

    /// Directory of the compressed (minus) calculation
    #[arg(long)]
    pub minus: PathBuf,

    /// Supercell dimensions used for the force constants
    #[arg(long, num_args = 3, value_names = ["N1", "N2", "N3"], required = true)]
    pub dim: Vec<usize>,

    /// Structure file name inside each directory
    #[arg(long, default_value = "POSCAR")]
    pub poscar_name: String,

    /// Force constants file name inside each directory
    #[arg(long, default_value = "FORCE_CONSTANTS")]
    pub fc_name: String,

    /// Atomic masses (amu), one per atom, overriding the built-in table
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub mass: Option<Vec<f64>>,

    // ─────────────────────────────────────────────────────────────
    // 物理参数
    // ─────────────────────────────────────────────────────────────
    /// Frequency conversion factor (default: eV/Å²·amu to THz)
    #[arg(long, default_value_t = 15.633302)]
    pub factor: f64,

    /// Impose the acoustic sum rule on the force constants
    #[arg(long, default_value_t = false)]
    pub asr: bool,

    /// Explicit strain step Δ (default: (V+ - V-) / 2V0)
    #[arg(long, allow_hyphen_values = true)]
    pub strain: Option<f64>,

    /// Frequencies below this magnitude (THz) get an undefined γ
    #[arg(long, default_value_t = 1e-4)]
    pub cutoff_freq: f64,

    /// Radius around Γ (reduced units) where acoustic γ is suppressed
    #[arg(long)]
    pub gamma_radius: Option<f64>,

    /// Treat warnings (non-bracketing volumes, imaginary modes) as errors
    #[arg(long, default_value_t = false, env = "GRUNEISEN_STRICT")]
    pub strict: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0, env = "GRUNEISEN_JOBS")]
    pub jobs: usize,

    // ─────────────────────────────────────────────────────────────
    // 输出
    // ─────────────────────────────────────────────────────────────
    /// Output file (format auto-detected from extension if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Include eigenvectors in the YAML output
    #[arg(long, default_value_t = false)]
    pub eigenvectors: bool,

    /// Save a plot (PNG, or SVG if the extension is .svg)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Title for the plot
    #[arg(long)]
    pub title: Option<String>,
}

impl CommonArgs {
    /// 超胞倍数
    pub fn supercell_dims(&self) -> [usize; 3] {
        let mut dims = [1; 3];
        for (d, v) in dims.iter_mut().zip(&self.dim) {
            *d = *v;
        }
        dims
    }

    /// 输出格式与路径：显式格式优先，其次扩展名，缺省 YAML
    pub fn resolve_output(&self, default_stem: &str) -> (OutputFormat, PathBuf) {
        let format = self
            .format
            .or_else(|| self.output.as_deref().and_then(OutputFormat::from_path))
            .unwrap_or(OutputFormat::Yaml);
        let path = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.{}", default_stem, format.extension())));
        (format, path)
    }
}
