//! # 晶体结构数据模型
//!
//! 定义声子计算所需的晶体结构表示：晶格、带质量的原子、以及倒格子。
//!
//! ## 约定
//! - 晶格向量按行存储: [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
//! - 原子位置为分数坐标
//! - 倒格子不含 2π 因子 (a_i · b_j = δ_ij)，与 phonopy 的 q 点距离约定一致
//!
//! ## 依赖关系
//! - 被 `parsers/poscar.rs`, `phonon/`, `sampling/` 使用
//! - 无外部模块依赖


/// 3x3 矩阵（行优先）
pub type Matrix3 = [[f64; 3]; 3];

/// 晶格
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    pub matrix: Matrix3,
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: Matrix3) -> Self {
        Lattice { matrix }
    }

    /// 晶格体积（带符号，右手系为正）
    pub fn signed_volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        dot(&a, &cross(&b, &c))
    }

    /// 晶格体积 (Å³)
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// 倒格子（行向量 b1, b2, b3，不含 2π）
    ///
    /// 体积为零的退化晶格返回 `None`。
    pub fn reciprocal(&self) -> Option<Lattice> {
        let [a, b, c] = self.matrix;
        let volume = self.signed_volume();
        if volume.abs() < 1e-10 {
            return None;
        }

        let scale = |v: [f64; 3]| [v[0] / volume, v[1] / volume, v[2] / volume];
        Some(Lattice {
            matrix: [scale(cross(&b, &c)), scale(cross(&c, &a)), scale(cross(&a, &b))],
        })
    }

    /// 沿各轴放大（对角超胞）
    pub fn scaled(&self, dims: [usize; 3]) -> Lattice {
        let mut matrix = self.matrix;
        for (row, &n) in matrix.iter_mut().zip(dims.iter()) {
            for x in row.iter_mut() {
                *x *= n as f64;
            }
        }
        Lattice { matrix }
    }

    /// 按给定因子各向同性缩放晶格向量
    pub fn scaled_uniform(&self, factor: f64) -> Lattice {
        let mut matrix = self.matrix;
        for row in matrix.iter_mut() {
            for x in row.iter_mut() {
                *x *= factor;
            }
        }
        Lattice { matrix }
    }

    /// 分数坐标转笛卡尔坐标
    pub fn frac_to_cart(&self, frac: &[f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// 笛卡尔坐标转分数坐标
    ///
    /// 利用 frac_i = cart · b_i（倒格子行向量）。
    pub fn cart_to_frac(&self, cart: &[f64; 3]) -> Option<[f64; 3]> {
        let recip = self.reciprocal()?;
        let [b1, b2, b3] = recip.matrix;
        Some([dot(cart, &b1), dot(cart, &b2), dot(cart, &b3)])
    }
}

/// 原子信息
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],

    /// 原子质量 (amu)
    pub mass: f64,
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3], mass: f64) -> Self {
        Atom {
            element: element.into(),
            position,
            mass,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, PartialEq)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
        }
    }

    /// 原子数
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// 体积 (Å³)
    pub fn volume(&self) -> f64 {
        self.lattice.volume()
    }

    /// 原子质量列表
    pub fn masses(&self) -> Vec<f64> {
        self.atoms.iter().map(|a| a.mass).collect()
    }

    /// 化学式（按元素出现顺序）
    pub fn formula(&self) -> String {
        let mut order: Vec<(&str, usize)> = Vec::new();
        for atom in &self.atoms {
            match order.iter_mut().find(|(e, _)| *e == atom.element) {
                Some((_, n)) => *n += 1,
                None => order.push((&atom.element, 1)),
            }
        }

        order
            .iter()
            .map(|(e, n)| if *n == 1 { e.to_string() } else { format!("{}{}", e, n) })
            .collect()
    }

    /// 检查另一个结构是否与本结构具有相同的原子种类与顺序
    pub fn same_species(&self, other: &Crystal) -> bool {
        self.atoms.len() == other.atoms.len()
            && self
                .atoms
                .iter()
                .zip(other.atoms.iter())
                .all(|(a, b)| a.element == b.element)
    }
}

/// 向量叉积
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// 向量点积
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// 向量模长
pub fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(a: f64) -> Lattice {
        Lattice::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    #[test]
    fn test_lattice_volume_cubic() {
        assert!((cubic(5.0).volume() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_reciprocal_is_dual_basis() {
        let lattice = Lattice::from_vectors([[3.0, 0.0, 0.0], [-1.5, 2.598, 0.0], [0.0, 0.0, 5.0]]);
        let recip = lattice.reciprocal().unwrap();

        for i in 0..3 {
            for j in 0..3 {
                let d = dot(&lattice.matrix[i], &recip.matrix[j]);
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((d - expected).abs() < 1e-9, "a{} . b{} = {}", i, j, d);
            }
        }
    }

    #[test]
    fn test_degenerate_lattice_has_no_reciprocal() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(lattice.reciprocal().is_none());
    }

    #[test]
    fn test_frac_cart_round_trip() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [1.0, 3.0, 0.0], [0.5, 0.5, 6.0]]);
        let frac = [0.25, 0.5, 0.75];
        let cart = lattice.frac_to_cart(&frac);
        let back = lattice.cart_to_frac(&cart).unwrap();
        for i in 0..3 {
            assert!((back[i] - frac[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scaled_supercell_volume() {
        let lattice = cubic(2.0).scaled([2, 3, 1]);
        assert!((lattice.volume() - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_crystal_formula() {
        let atoms = vec![
            Atom::new("Mg", [0.0, 0.0, 0.0], 24.305),
            Atom::new("O", [0.5, 0.5, 0.5], 15.9994),
            Atom::new("O", [0.0, 0.5, 0.5], 15.9994),
        ];
        let crystal = Crystal::new("MgO2", cubic(4.2), atoms);
        assert_eq!(crystal.formula(), "MgO2");
        assert_eq!(crystal.num_atoms(), 3);
    }
}
