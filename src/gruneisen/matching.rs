//! # 模式匹配
//!
//! 不同应变态下求解器返回的能带顺序不一定相同（简并带在数值上会交换），
//! 因此按本征矢投影 |<v|v'>|² 建立一一对应。
//!
//! ## 规则
//! - 平衡态能带按序号升序依次匹配
//! - 每条平衡带取尚未使用、投影最大的应变带
//! - 投影与最大值相差不超过 `TIE_TOLERANCE` 时取序号最小者
//! - 非有限投影视为最小
//!
//! ## 依赖关系
//! - 被 `gruneisen/estimator.rs` 调用
//! - 使用 `models/phonon.rs` 的投影

use crate::models::ModeRecord;

/// 近简并判定容差
pub const TIE_TOLERANCE: f64 = 1e-6;

/// 返回 `mapping`，其中 `mapping[b]` 为与平衡带 b 对应的应变带序号
///
/// 调用方保证两组能带数目相同。非有限的投影排在最后，
/// 全部非有限时取序号最小的未用带，因此结果长度总是 `reference.len()`。
pub fn match_modes(reference: &[ModeRecord], strained: &[ModeRecord]) -> Vec<usize> {
    let mut used = vec![false; strained.len()];
    let mut mapping = Vec::with_capacity(reference.len());

    for mode in reference {
        let overlaps: Vec<(usize, f64)> = strained
            .iter()
            .enumerate()
            .filter(|(j, _)| !used[*j])
            .map(|(j, other)| {
                let o = mode.overlap(other);
                (j, if o.is_finite() { o } else { f64::NEG_INFINITY })
            })
            .collect();

        let best = overlaps
            .iter()
            .map(|(_, o)| *o)
            .fold(f64::NEG_INFINITY, f64::max);

        let chosen = overlaps
            .iter()
            .find(|(_, o)| *o >= best - TIE_TOLERANCE)
            .map(|(j, _)| *j);

        if let Some(j) = chosen {
            used[j] = true;
            mapping.push(j);
        }
    }

    mapping
}
