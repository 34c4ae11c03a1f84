//! キーワードマスタモジュール
//!
//! カテゴリ（ハウス・サイン・天体など）ごとのキーワード表を管理する。
//! 1列目がキーワード名、2列目以降が属性（自由記述）。

use crate::error::{Error, Result};
use crate::rows::{cell, parse_csv_rows};

/// ファイル名からカテゴリ名を取り除く接尾辞
const CATEGORY_FILE_SUFFIX: &str = "キーワード";

/// キーワード表の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRecord {
    /// キーワード名（1列目）
    pub name: String,
    /// 2列目以降の値（列順、空欄も保持）
    pub values: Vec<String>,
}

/// カテゴリ1つ分のキーワード表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    category: String,
    /// 全列名（0番目がキーワード名の列）
    columns: Vec<String>,
    records: Vec<KeywordRecord>,
}

impl KeywordTable {
    /// ヘッダー行つきの行データから構築
    ///
    /// 1列目が空の行はスキップする
    pub fn from_rows(category: impl Into<String>, rows: &[Vec<String>]) -> Result<Self> {
        let category = category.into();
        let Some((header, body)) = rows.split_first() else {
            return Err(Error::Validation(format!(
                "キーワード表「{}」にヘッダー行がありません",
                category
            )));
        };

        let columns: Vec<String> = header
            .iter()
            .map(|c| crate::rows::strip_bom(c.trim()).to_string())
            .collect();
        if columns.is_empty() {
            return Err(Error::Validation(format!(
                "キーワード表「{}」に列がありません",
                category
            )));
        }

        let records = body
            .iter()
            .filter(|row| !cell(row, 0).is_empty())
            .map(|row| KeywordRecord {
                name: cell(row, 0).to_string(),
                values: (1..columns.len())
                    .map(|i| cell(row, i).to_string())
                    .collect(),
            })
            .collect();

        Ok(Self {
            category,
            columns,
            records,
        })
    }

    /// CSV文字列から読み込み
    pub fn from_csv_str(category: impl Into<String>, content: &str) -> Result<Self> {
        let rows = parse_csv_rows(content)?;
        Self::from_rows(category, &rows)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[KeywordRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// キーワード名一覧（表の順序のまま）
    pub fn keyword_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    /// キーワード名で検索（最初に一致した行）
    pub fn find(&self, keyword: &str) -> Option<&KeywordRecord> {
        self.records.iter().find(|r| r.name == keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.find(keyword).is_some()
    }

    /// キーワードの属性（列名, 値）。空欄の列は含めない
    pub fn attributes(&self, keyword: &str) -> Vec<(&str, &str)> {
        let Some(record) = self.find(keyword) else {
            return Vec::new();
        };

        self.columns
            .iter()
            .skip(1)
            .zip(record.values.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| (column.as_str(), value.as_str()))
            .collect()
    }

    /// 2回以上出現するキーワード名
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for record in &self.records {
            if !seen.insert(record.name.as_str()) && !duplicates.contains(&record.name.as_str()) {
                duplicates.push(record.name.as_str());
            }
        }
        duplicates
    }
}

/// ファイル名（拡張子なし）からカテゴリ名を決める
///
/// `ハウスキーワード` → `ハウス`。取り除いて空になる場合は元の名前のまま
pub fn category_from_file_stem(stem: &str) -> String {
    let category = stem.replace(CATEGORY_FILE_SUFFIX, "");
    let category = category.trim();
    if category.is_empty() {
        stem.trim().to_string()
    } else {
        category.to_string()
    }
}

/// 読み込み済みキーワード表の集合（読み込み順を保持）
#[derive(Debug, Clone, Default)]
pub struct KeywordStore {
    tables: Vec<KeywordTable>,
}

impl KeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 表を追加。同じカテゴリが既にあれば丸ごと置き換える
    pub fn insert(&mut self, table: KeywordTable) {
        match self
            .tables
            .iter_mut()
            .find(|t| t.category == table.category)
        {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn get(&self, category: &str) -> Option<&KeywordTable> {
        self.tables.iter().find(|t| t.category == category)
    }

    pub fn tables(&self) -> &[KeywordTable] {
        &self.tables
    }

    pub fn categories(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.category.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// カテゴリとキーワードから属性を取得（見つからなければ空）
    pub fn attributes(&self, category: &str, keyword: &str) -> Vec<(&str, &str)> {
        self.get(category)
            .map(|table| table.attributes(keyword))
            .unwrap_or_default()
    }
}
