//! キーワード組み合わせの展開
//!
//! 「すべて」を選んだ枠をカテゴリの全キーワードに展開し、
//! 枠ごとの候補の直積を取る。並びは辞書式（最後の枠が最も速く変化する）。

use crate::keywords::KeywordStore;
use crate::types::{Combination, KeywordChoice, KeywordSlot, Selection, SelectionSlot};

/// 枠ごとの候補キーワード一覧
///
/// 「すべて」はカテゴリ表の1列目を表の順で並べる。
/// 表が無い・空のカテゴリは候補0件になる
pub fn slot_values(slot: &SelectionSlot, store: &KeywordStore) -> Vec<KeywordSlot> {
    match &slot.choice {
        KeywordChoice::Named(keyword) => {
            vec![KeywordSlot::new(&slot.category, keyword, slot.target)]
        }
        KeywordChoice::All => store
            .get(&slot.category)
            .map(|table| {
                table
                    .keyword_names()
                    .into_iter()
                    .map(|name| KeywordSlot::new(&slot.category, name, slot.target))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// 候補リストの直積
///
/// いずれかの候補が空、または枠が0個なら結果も空
pub fn cartesian_product(lists: &[Vec<KeywordSlot>]) -> Vec<Combination> {
    if lists.is_empty() || lists.iter().any(|list| list.is_empty()) {
        return Vec::new();
    }

    let mut combos: Vec<Vec<KeywordSlot>> = vec![Vec::new()];
    for list in lists {
        let mut next = Vec::with_capacity(combos.len() * list.len());
        for prefix in &combos {
            for value in list {
                let mut combo = prefix.clone();
                combo.push(value.clone());
                next.push(combo);
            }
        }
        combos = next;
    }

    combos.into_iter().map(Combination::new).collect()
}

/// 枠の並びを組み合わせに展開
pub fn expand_slots(slots: &[SelectionSlot], store: &KeywordStore) -> Vec<Combination> {
    let lists: Vec<Vec<KeywordSlot>> = slots
        .iter()
        .map(|slot| slot_values(slot, store))
        .collect();
    cartesian_product(&lists)
}

/// 画面の選択を組み合わせに展開
pub fn expand_selection(selection: &Selection, store: &KeywordStore) -> Vec<Combination> {
    expand_slots(selection.slots(), store)
}
