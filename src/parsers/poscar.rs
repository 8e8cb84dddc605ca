//! # VASP POSCAR 格式解析器
//!
//! 解析三个应变态目录中的 POSCAR（原胞结构），并为每个原子分配质量。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor (负值表示目标体积)
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`, `models/element.rs`

use crate::error::{GruneisenError, Result};
use crate::models::element::atomic_mass;
use crate::models::{Atom, Crystal, Lattice};
use std::fs;
use std::path::Path;

/// 解析 POSCAR 文件
pub fn parse_poscar_file(path: &Path, masses: Option<&[f64]>) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| GruneisenError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(&content, &path.display().to_string(), masses)
}

/// 从字符串内容解析 POSCAR
///
/// `masses` 为逐原子质量覆盖；缺省时按元素符号查表。
pub fn parse_poscar_content(content: &str, source: &str, masses: Option<&[f64]>) -> Result<Crystal> {
    let err = |reason: String| GruneisenError::ParseError {
        format: "POSCAR".to_string(),
        path: source.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 8 {
        return Err(err("File too short".to_string()));
    }

    let name = match lines[0].trim() {
        "" => "unknown".to_string(),
        s => s.to_string(),
    };

    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| err("Invalid scaling factor at line 2".to_string()))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .take(3)
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(err(format!("Invalid lattice vector at line {}", 3 + i)));
        }
        *row = [parts[0], parts[1], parts[2]];
    }

    // 负的缩放因子表示目标体积
    let raw_lattice = Lattice::from_vectors(matrix);
    let factor = if scale < 0.0 {
        let raw_volume = raw_lattice.volume();
        if raw_volume < 1e-10 {
            return Err(err("Degenerate lattice".to_string()));
        }
        (-scale / raw_volume).cbrt()
    } else {
        scale
    };
    let lattice = raw_lattice.scaled_uniform(factor);
    if lattice.reciprocal().is_none() {
        return Err(err("Degenerate lattice".to_string()));
    }

    // VASP 4 没有元素行
    let line5: Vec<&str> = lines[5].split_whitespace().collect();
    if line5.is_empty() {
        return Err(err("Missing element/count line".to_string()));
    }
    let (elements, counts, mut cursor) = if line5[0].parse::<usize>().is_ok() {
        let counts: Vec<usize> = line5.iter().filter_map(|s| s.parse().ok()).collect();
        let elements: Vec<String> = (0..counts.len()).map(|i| format!("X{}", i + 1)).collect();
        (elements, counts, 6)
    } else {
        let elements: Vec<String> = line5.iter().map(|s| s.to_string()).collect();
        let counts: Vec<usize> = lines[6]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        (elements, counts, 7)
    };

    if counts.len() != elements.len() || counts.is_empty() {
        return Err(err("Element symbols and atom counts do not match".to_string()));
    }
    let total: usize = counts.iter().sum();

    if let Some(m) = masses {
        if m.len() != total {
            return Err(GruneisenError::InvalidArgument(format!(
                "{} masses given but {} has {} atoms",
                m.len(),
                source,
                total
            )));
        }
    }

    if lines.len() > cursor && lines[cursor].trim().to_lowercase().starts_with('s') {
        cursor += 1;
    }
    if lines.len() <= cursor {
        return Err(err("Missing coordinate type line".to_string()));
    }
    let coord_type = lines[cursor].trim().to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');
    cursor += 1;

    let mut atoms = Vec::with_capacity(total);
    for (element, &count) in elements.iter().zip(counts.iter()) {
        for _ in 0..count {
            let index = atoms.len();
            let line = lines
                .get(cursor)
                .ok_or_else(|| err(format!("Expected {} atom positions, found {}", total, index)))?;
            let parts: Vec<f64> = line
                .split_whitespace()
                .take(3)
                .filter_map(|s| s.parse().ok())
                .collect();
            if parts.len() < 3 {
                return Err(err(format!("Invalid atom position at line {}", cursor + 1)));
            }

            let raw = [parts[0], parts[1], parts[2]];
            let position = if is_cartesian {
                let cart = [raw[0] * factor, raw[1] * factor, raw[2] * factor];
                lattice
                    .cart_to_frac(&cart)
                    .ok_or_else(|| err("Degenerate lattice".to_string()))?
            } else {
                raw
            };

            let mass = match masses {
                Some(m) => m[index],
                None => atomic_mass(element)
                    .ok_or_else(|| GruneisenError::UnknownElement(element.clone()))?,
            };

            atoms.push(Atom::new(element.clone(), position, mass));
            cursor += 1;
        }
    }

    Ok(Crystal::new(name, lattice, atoms))
}
