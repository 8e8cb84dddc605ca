//! # band 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/band.rs`

use super::CommonArgs;

use clap::Args;

/// band 子命令参数
#[derive(Args, Debug)]
pub struct BandArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Band path in reduced coordinates, e.g. "0 0 0  0.5 0 0  0.5 0.5 0";
    /// commas separate disconnected paths
    #[arg(long, allow_hyphen_values = true)]
    pub band: String,

    /// Number of q-points per segment, including both ends
    #[arg(long, default_value_t = 51)]
    pub band_points: usize,

    /// Labels of the path vertices, e.g. "G X M G"
    #[arg(long, num_args = 1..)]
    pub labels: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_band_args() {
        let cli = Cli::try_parse_from([
            "gruneisen",
            "band",
            "--equilibrium",
            "eq",
            "--plus",
            "plus",
            "--minus",
            "minus",
            "--dim",
            "3",
            "3",
            "3",
            "--band",
            "0 0 0 0.5 0 0",
            "--labels",
            "G",
            "X",
        ])
        .unwrap();

        match cli.command {
            Commands::Band(args) => {
                assert_eq!(args.band, "0 0 0 0.5 0 0");
                assert_eq!(args.band_points, 51);
                assert_eq!(args.labels, Some(vec!["G".to_string(), "X".to_string()]));
            }
            Commands::Mesh(_) => panic!("expected band"),
        }
    }
}
