//! # gruneisen - 模式 Grüneisen 参数计算工具
//!
//! 读取平衡、正应变、负应变三个体积下的 POSCAR 与 FORCE_CONSTANTS，
//! 计算 q 点上的声子并用中心差分估计每个模式的 Grüneisen 参数。
//!
//! ## 子命令
//! - `band` - 沿高对称路径
//! - `mesh` - 均匀 q 点网格
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── sampling/  (q 点路径与网格)
//!   │     ├── gruneisen/ (估计、导出、绘图)
//!   │     ├── phonon/    (动力学矩阵与求解器)
//!   │     ├── parsers/   (POSCAR, FORCE_CONSTANTS)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出与进度)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod gruneisen;
mod models;
mod parsers;
mod phonon;
mod sampling;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
