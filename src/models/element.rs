//! # 原子质量数据库
//!
//! 标准原子量 (amu)，用于构造动力学矩阵时的质量归一化。
//!
//! ## 数据来源
//! IUPAC 标准原子量（与 phonopy 内置质量表一致）
//!
//! ## 依赖关系
//! - 被 `parsers/poscar.rs` 调用
//! - 纯静态数据，无外部依赖

use std::collections::HashMap;
use std::sync::LazyLock;

const ATOMIC_MASSES: &[(&str, f64)] = &[
    ("H", 1.00794),
    ("He", 4.002602),
    ("Li", 6.941),
    ("Be", 9.012182),
    ("B", 10.811),
    ("C", 12.0107),
    ("N", 14.0067),
    ("O", 15.9994),
    ("F", 18.9984032),
    ("Ne", 20.1797),
    ("Na", 22.98976928),
    ("Mg", 24.305),
    ("Al", 26.9815386),
    ("Si", 28.0855),
    ("P", 30.973762),
    ("S", 32.065),
    ("Cl", 35.453),
    ("Ar", 39.948),
    ("K", 39.0983),
    ("Ca", 40.078),
    ("Sc", 44.955912),
    ("Ti", 47.867),
    ("V", 50.9415),
    ("Cr", 51.9961),
    ("Mn", 54.938045),
    ("Fe", 55.845),
    ("Co", 58.933195),
    ("Ni", 58.6934),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("Ga", 69.723),
    ("Ge", 72.64),
    ("As", 74.9216),
    ("Se", 78.96),
    ("Br", 79.904),
    ("Kr", 83.798),
    ("Rb", 85.4678),
    ("Sr", 87.62),
    ("Y", 88.90585),
    ("Zr", 91.224),
    ("Nb", 92.90638),
    ("Mo", 95.96),
    ("Tc", 98.0),
    ("Ru", 101.07),
    ("Rh", 102.9055),
    ("Pd", 106.42),
    ("Ag", 107.8682),
    ("Cd", 112.411),
    ("In", 114.818),
    ("Sn", 118.71),
    ("Sb", 121.76),
    ("Te", 127.6),
    ("I", 126.90447),
    ("Xe", 131.293),
    ("Cs", 132.9054519),
    ("Ba", 137.327),
    ("La", 138.90547),
    ("Ce", 140.116),
    ("Pr", 140.90765),
    ("Nd", 144.242),
    ("Pm", 145.0),
    ("Sm", 150.36),
    ("Eu", 151.964),
    ("Gd", 157.25),
    ("Tb", 158.92535),
    ("Dy", 162.5),
    ("Ho", 164.93032),
    ("Er", 167.259),
    ("Tm", 168.93421),
    ("Yb", 173.054),
    ("Lu", 174.9668),
    ("Hf", 178.49),
    ("Ta", 180.94788),
    ("W", 183.84),
    ("Re", 186.207),
    ("Os", 190.23),
    ("Ir", 192.217),
    ("Pt", 195.084),
    ("Au", 196.966569),
    ("Hg", 200.59),
    ("Tl", 204.3833),
    ("Pb", 207.2),
    ("Bi", 208.9804),
];

/// 元素符号 -> 原子质量
pub static MASSES: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| ATOMIC_MASSES.iter().copied().collect());

/// 获取元素的原子质量
///
/// 接受带编号后缀的标签（如 "Fe1"、"O_2"），只取字母部分匹配。
pub fn atomic_mass(element: &str) -> Option<f64> {
    if let Some(&mass) = MASSES.get(element) {
        return Some(mass);
    }

    let symbol: String = element
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect();
    MASSES.get(symbol.as_str()).copied().or_else(|| {
        let first: String = symbol.chars().take(1).collect();
        MASSES.get(first.as_str()).copied()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_mass_si() {
        let m = atomic_mass("Si").unwrap();
        assert!((m - 28.0855).abs() < 1e-6);
    }

    #[test]
    fn test_atomic_mass_with_label() {
        assert_eq!(atomic_mass("Fe1"), atomic_mass("Fe"));
        assert_eq!(atomic_mass("O_2"), atomic_mass("O"));
    }

    #[test]
    fn test_atomic_mass_unknown() {
        assert!(atomic_mass("Xx").is_none());
        assert!(atomic_mass("").is_none());
    }
}
