//! 表ファイルの読み込み（CSV / Excel）
//!
//! 先頭シート（CSVはファイル全体）を行×列の文字列で返す

use crate::error::{FortuneAiError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use fortune_ai_common::parse_csv_rows;
use std::path::Path;

pub const TABLE_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// 対応する拡張子か（大文字小文字無視）
pub fn is_table_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| TABLE_EXTENSIONS.contains(&ext.as_str()))
}

pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(FortuneAiError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => {
            let content = std::fs::read_to_string(path)?;
            Ok(parse_csv_rows(&content)?)
        }
        "xlsx" | "xls" => read_workbook_rows(path),
        _ => Err(FortuneAiError::Input(format!(
            "未対応のファイル形式です（csv/xlsx/xls）: {}",
            path.display()
        ))),
    }
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| FortuneAiError::Input(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FortuneAiError::Input(format!("シートがありません: {}", path.display())))?
        .map_err(|e| FortuneAiError::Input(format!("{}: {}", path.display(), e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        _ => cell.to_string().trim().to_string(),
    }
}
