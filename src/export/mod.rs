//! 結果の書き出し（CSV / Excel）

use crate::error::Result;
use fortune_ai_common::export::excel_core::generate_excel_buffer;
use fortune_ai_common::{output_file_name, ResultTable};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use csv, excel, or both", s)),
        }
    }
}

/// 結果を出力フォルダに書き出し、作成したファイルを返す
///
/// # Arguments
/// * `stem` - ファイル名の接頭辞（空なら「占い結果」）
/// * `timestamp` - `YYYYMMDD_HHMMSS`
pub fn export_results(
    table: &ResultTable,
    format: &ExportFormat,
    output_dir: &Path,
    stem: &str,
    timestamp: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();

    if matches!(format, ExportFormat::Csv | ExportFormat::Both) {
        let path = output_dir.join(output_file_name(stem, timestamp, "csv"));
        println!("- CSVを生成中...");
        std::fs::write(&path, table.to_csv_bytes()?)?;
        println!("✔ CSV出力: {}", path.display());
        written.push(path);
    }

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_dir.join(output_file_name(stem, timestamp, "xlsx"));
        println!("- Excelを生成中...");
        let buffer = generate_excel_buffer(table)?;
        std::fs::write(&path, buffer)?;
        println!("✔ Excel出力: {}", path.display());
        written.push(path);
    }

    Ok(written)
}
