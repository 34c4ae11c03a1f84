//! 表形式データ（CSV）の行読み込み
//!
//! キーワード表・質問表ともにヘッダー行つきの二次元文字列として扱う。

use crate::error::Result;

/// CSV文字列を行×列の文字列に変換
///
/// 行ごとの列数は揃っていなくてもよい。先頭のBOMは除去する。
pub fn parse_csv_rows(content: &str) -> Result<Vec<Vec<String>>> {
    let content = strip_bom(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// 先頭のUTF-8 BOMを除去
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// 行の指定列を取得（列が無ければ空文字、前後空白は除去）
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|value| value.trim()).unwrap_or("")
}
