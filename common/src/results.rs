//! 結果テーブル
//!
//! 処理順に行を保持し、CSV（BOM付きUTF-8）とExcelで書き出す。
//! 列: id, 質問, キーワード列（`{対象}の{カテゴリ}{番号}`）, 回答, サマリ,
//! 元キーワード, アレンジキーワード（連続質問モードでは続けて 関連性）

use crate::error::Result;
use crate::types::{
    Combination, ParsedReply, QuestionRecord, FIELD_ANSWER, FIELD_ARRANGED_KEYWORD,
    FIELD_ORIGINAL_KEYWORD, FIELD_RELATION, FIELD_SUMMARY,
};

pub const COLUMN_ID: &str = "id";
pub const COLUMN_QUESTION: &str = "質問";

/// 出力ファイル名の既定の接頭辞
pub const DEFAULT_OUTPUT_STEM: &str = "占い結果";

/// 結果1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: String,
    pub question: String,
    /// (列名, キーワード) を枠順に
    pub keywords: Vec<(String, String)>,
    pub reply: ParsedReply,
    /// 連続質問モードのみ
    pub relation: Option<String>,
}

impl ResultRow {
    pub fn new(question: &QuestionRecord, combination: &Combination, reply: ParsedReply) -> Self {
        Self {
            id: question.id.clone(),
            question: question.text.clone(),
            keywords: keyword_columns(combination),
            reply,
            relation: None,
        }
    }

    /// API呼び出しに失敗した単位の行
    pub fn failed(question: &QuestionRecord, combination: &Combination, message: &str) -> Self {
        Self::new(
            question,
            combination,
            ParsedReply::answer_only(format!("エラー: {}", message)),
        )
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    fn keyword_value(&self, column: &str) -> &str {
        self.keywords
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }
}

fn keyword_columns(combination: &Combination) -> Vec<(String, String)> {
    combination
        .slots
        .iter()
        .enumerate()
        .map(|(index, slot)| (slot.column_name(index), slot.keyword.clone()))
        .collect()
}

/// 結果テーブル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
    sequential: bool,
}

impl ResultTable {
    pub fn new(sequential: bool) -> Self {
        Self {
            rows: Vec::new(),
            sequential,
        }
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_sequential(&self) -> bool {
        self.sequential
    }

    /// キーワード列名（全行の和集合、初出順）
    pub fn keyword_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for (name, _) in &row.keywords {
                if !columns.contains(&name.as_str()) {
                    columns.push(name.as_str());
                }
            }
        }
        columns
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec![COLUMN_ID.to_string(), COLUMN_QUESTION.to_string()];
        header.extend(self.keyword_columns().into_iter().map(str::to_string));
        header.extend(
            [
                FIELD_ANSWER,
                FIELD_SUMMARY,
                FIELD_ORIGINAL_KEYWORD,
                FIELD_ARRANGED_KEYWORD,
            ]
            .map(str::to_string),
        );
        if self.sequential {
            header.push(FIELD_RELATION.to_string());
        }
        header
    }

    /// ヘッダーと同じ並びの値（該当列の無い行は空欄）
    pub fn records(&self) -> Vec<Vec<String>> {
        let columns = self.keyword_columns();
        self.rows
            .iter()
            .map(|row| {
                let mut record = vec![row.id.clone(), row.question.clone()];
                record.extend(columns.iter().map(|c| row.keyword_value(c).to_string()));
                record.push(row.reply.answer.clone());
                record.push(row.reply.summary.clone());
                record.push(row.reply.original_keyword.clone());
                record.push(row.reply.arranged_keyword.clone());
                if self.sequential {
                    record.push(row.relation.clone().unwrap_or_default());
                }
                record
            })
            .collect()
    }

    /// BOM付きUTF-8のCSV
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = "\u{feff}".as_bytes().to_vec();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            writer.write_record(self.header())?;
            for record in self.records() {
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
        Ok(buffer)
    }
}

/// `{接頭辞}_{タイムスタンプ}.{拡張子}`
///
/// 接頭辞が空なら「占い結果」
pub fn output_file_name(stem: &str, timestamp: &str, extension: &str) -> String {
    let stem = match stem.trim() {
        "" => DEFAULT_OUTPUT_STEM,
        s => s,
    };
    format!("{}_{}.{}", stem, timestamp, extension)
}
