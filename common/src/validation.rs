//! キーワード指定の検証
//!
//! 質問CSVの行ごとのキーワード指定と、画面（CLI）の選択を
//! 読み込み済みキーワード表と突き合わせる。
//!
//! 表記の正規化は全カテゴリ共通:
//! 1. 全角英数記号を半角に寄せて比較（表側も同じ処理）
//! 2. 「すべて」/「all」は全展開
//! 3. 数字だけの指定は表のn番目（1始まり）。範囲外は無効

use crate::keywords::{KeywordStore, KeywordTable};
use crate::types::{is_all_label, KeywordChoice, QuestionRecord, Selection, SelectionSlot};
use std::fmt;

/// 全角英数記号・全角スペースを半角に変換し、前後の空白を除去
pub fn fold_width(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// カテゴリ名を解決
///
/// 完全一致 → 大文字小文字を無視した部分一致（どちら向きでも可）の順。
/// 複数該当する場合は読み込み順で最初の表
pub fn resolve_category<'a>(store: &'a KeywordStore, name: &str) -> Option<&'a KeywordTable> {
    if let Some(table) = store.get(name) {
        return Some(table);
    }

    let needle = fold_width(name).to_lowercase();
    if needle.is_empty() {
        return None;
    }

    store.tables().iter().find(|table| {
        let category = fold_width(table.category()).to_lowercase();
        category.contains(&needle) || needle.contains(&category)
    })
}

/// キーワードを解決し、表の正式表記を返す
pub fn resolve_keyword(table: &KeywordTable, keyword: &str) -> Result<KeywordChoice, String> {
    let folded = fold_width(keyword);

    if let Some(name) = table
        .keyword_names()
        .into_iter()
        .find(|name| fold_width(name) == folded)
    {
        return Ok(KeywordChoice::Named(name.to_string()));
    }

    if is_all_label(&folded) {
        return Ok(KeywordChoice::All);
    }

    if !folded.is_empty() && folded.chars().all(|c| c.is_ascii_digit()) {
        let names = table.keyword_names();
        return match folded.parse::<usize>() {
            Ok(n) if (1..=names.len()).contains(&n) => {
                Ok(KeywordChoice::Named(names[n - 1].to_string()))
            }
            _ => Err(format!(
                "番号{}は範囲外です（1〜{}）",
                folded,
                names.len()
            )),
        };
    }

    Err(format!(
        "キーワードがカテゴリ「{}」に存在しません",
        table.category()
    ))
}

/// 検証エラー1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// 質問ID（画面の選択は「画面設定」）
    pub row_id: String,
    /// 指定内容 `カテゴリ:キーワード`
    pub entry: String,
    pub reason: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID: {} - {} ({})", self.row_id, self.entry, self.reason)
    }
}

/// 検証エラーの一覧
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    fn push(&mut self, row_id: &str, entry: String, reason: String) {
        self.issues.push(ValidationIssue {
            row_id: row_id.to_string(),
            entry,
            reason,
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// 画面の選択の行ID表記
pub const SCREEN_SELECTION_ID: &str = "画面設定";

/// 画面（CLI）の選択を検証
///
/// カテゴリ・キーワードとも完全一致のみ受け付ける
pub fn validate_selection(selection: &Selection, store: &KeywordStore) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::default();

    for slot in selection.slots() {
        let entry = format!("{}:{}", slot.category, slot.choice);
        let Some(table) = store.get(&slot.category) else {
            report.push(SCREEN_SELECTION_ID, entry, "カテゴリが読み込まれていません".into());
            continue;
        };
        if let KeywordChoice::Named(keyword) = &slot.choice {
            if !table.contains(keyword) {
                report.push(
                    SCREEN_SELECTION_ID,
                    entry,
                    format!("キーワードがカテゴリ「{}」に存在しません", table.category()),
                );
            }
        }
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}

/// 質問ごとのキーワード指定を検証
///
/// 戻り値は質問と同じ並びで、指定なしの質問は None（画面の選択を使う）。
/// 無効な指定が1つでもあれば全件をまとめて返し、処理は始めない
pub fn validate_overrides(
    questions: &[QuestionRecord],
    store: &KeywordStore,
) -> Result<Vec<Option<Vec<SelectionSlot>>>, ValidationReport> {
    let mut report = ValidationReport::default();
    let mut resolved = Vec::with_capacity(questions.len());

    for question in questions {
        if !question.has_overrides() {
            resolved.push(None);
            continue;
        }

        let mut slots = Vec::with_capacity(question.overrides.len());
        for item in &question.overrides {
            let Some(table) = resolve_category(store, &item.category) else {
                report.push(&question.id, item.to_string(), "カテゴリが見つかりません".into());
                continue;
            };
            match resolve_keyword(table, &item.keyword) {
                Ok(choice) => slots.push(SelectionSlot::new(table.category(), choice, item.target)),
                Err(reason) => report.push(&question.id, item.to_string(), reason),
            }
        }
        resolved.push(Some(slots));
    }

    if report.is_empty() {
        Ok(resolved)
    } else {
        Err(report)
    }
}
