//! 質問入力
//!
//! - 手入力: ID（省略可）と質問1件
//! - 表形式: A列ID、B列質問、C列以降は（カテゴリ, キーワード, 対象）の3列セットを最大4組

use crate::error::{Error, Result};
use crate::rows::cell;
use crate::types::{KeywordOverride, QuestionRecord, Target, MAX_SLOTS};

/// 手入力でIDが無いときのID
pub const MANUAL_DEFAULT_ID: &str = "manual_1";

/// キーワード指定の開始列（C列）
const OVERRIDE_START_COLUMN: usize = 2;
/// 1組あたりの列数
const OVERRIDE_GROUP_WIDTH: usize = 3;

/// 手入力の質問。本文が空なら None
pub fn manual_question(id: Option<&str>, text: &str) -> Option<QuestionRecord> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let id = id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(MANUAL_DEFAULT_ID);

    Some(QuestionRecord::new(id, text))
}

/// ヘッダー行つきの質問表をパース
///
/// - 質問が空の行はスキップ（プレースホルダーは作らない）
/// - IDが空の行は `row_{n}`（データ行の1始まり番号）
/// - カテゴリかキーワードが空の組は捨てる
/// - 対象が空・不明なら「あなた」
pub fn parse_question_rows(rows: &[Vec<String>]) -> Result<Vec<QuestionRecord>> {
    let Some((header, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let column_count = header.len();
    if column_count < 2 {
        return Err(Error::Validation(
            "質問ファイルには2列以上必要です（A列: ID, B列: 質問）".into(),
        ));
    }

    let mut questions = Vec::new();
    for (index, row) in body.iter().enumerate() {
        let text = cell(row, 1);
        if text.is_empty() {
            continue;
        }

        let id = match cell(row, 0) {
            "" => format!("row_{}", index + 1),
            id => id.to_string(),
        };

        let mut record = QuestionRecord::new(id, text);
        record.overrides = parse_overrides(row, column_count);
        questions.push(record);
    }

    Ok(questions)
}

fn parse_overrides(row: &[String], column_count: usize) -> Vec<KeywordOverride> {
    (0..MAX_SLOTS)
        .filter_map(|group| {
            let category_col = OVERRIDE_START_COLUMN + group * OVERRIDE_GROUP_WIDTH;
            let keyword_col = category_col + 1;
            let target_col = category_col + 2;

            if keyword_col >= column_count {
                return None;
            }

            let category = cell(row, category_col);
            let keyword = cell(row, keyword_col);
            if category.is_empty() || keyword.is_empty() {
                return None;
            }

            let target = if target_col < column_count {
                Target::parse_lenient(cell(row, target_col))
            } else {
                Target::SelfPerson
            };

            Some(KeywordOverride {
                category: category.to_string(),
                keyword: keyword.to_string(),
                target,
            })
        })
        .collect()
}
