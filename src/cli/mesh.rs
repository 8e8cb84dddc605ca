//! # mesh 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/mesh.rs`

use super::CommonArgs;

use clap::Args;

/// mesh 子命令参数
#[derive(Args, Debug)]
pub struct MeshArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// q-point mesh divisions
    #[arg(long, num_args = 3, value_names = ["M1", "M2", "M3"], required = true)]
    pub mesh: Vec<usize>,

    /// Use a Γ-centered mesh instead of Monkhorst-Pack
    #[arg(long, default_value_t = false)]
    pub gamma_center: bool,

    /// Keep all mesh points (no q ≡ -q reduction)
    #[arg(long, default_value_t = false)]
    pub no_sym: bool,
}

impl MeshArgs {
    pub fn mesh_dims(&self) -> [usize; 3] {
        let mut dims = [1; 3];
        for (d, v) in dims.iter_mut().zip(&self.mesh) {
            *d = *v;
        }
        dims
    }
}
