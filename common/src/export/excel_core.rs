//! Excel生成（共通ライブラリ）
//!
//! ResultTable をヘッダー太字の1シートに書き出す

use crate::error::{Error, Result};
use crate::results::ResultTable;
use rust_xlsxwriter::*;

/// シート名
pub const SHEET_NAME: &str = "占い結果";

/// 長文列（回答）の列幅
const ANSWER_COL_WIDTH: f64 = 60.0;
const DEFAULT_COL_WIDTH: f64 = 16.0;

/// Excelをバッファに生成
pub fn generate_excel_buffer(table: &ResultTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let value_format = Format::new()
        .set_align(FormatAlign::Top)
        .set_text_wrap();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| Error::Excel(format!("シート名設定エラー: {}", e)))?;

    let header = table.header();
    for (col, name) in header.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, name, &header_format)
            .map_err(|e| Error::Excel(format!("ヘッダー書き込みエラー: {}", e)))?;

        let width = if name == crate::types::FIELD_ANSWER {
            ANSWER_COL_WIDTH
        } else {
            DEFAULT_COL_WIDTH
        };
        worksheet
            .set_column_width(col, width)
            .map_err(|e| Error::Excel(format!("列幅設定エラー: {}", e)))?;
    }

    for (row, record) in table.records().iter().enumerate() {
        let row = row as u32 + 1;
        for (col, value) in record.iter().enumerate() {
            worksheet
                .write_string_with_format(row, col as u16, value, &value_format)
                .map_err(|e| Error::Excel(format!("値書き込みエラー: {}", e)))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| Error::Excel(format!("ウィンドウ枠固定エラー: {}", e)))?;

    workbook
        .save_to_buffer()
        .map_err(|e| Error::Excel(format!("Excel保存エラー: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ResultRow;
    use crate::types::{Combination, KeywordSlot, ParsedReply, QuestionRecord, Target};

    #[test]
    fn test_generate_excel_buffer_is_zip() {
        let mut table = ResultTable::new(false);
        table.push(ResultRow::new(
            &QuestionRecord::new("Q1", "質問"),
            &Combination::new(vec![KeywordSlot::new("天体", "太陽", Target::SelfPerson)]),
            ParsedReply::answer_only("回答"),
        ));

        let bytes = generate_excel_buffer(&table).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_excel_buffer_empty_table() {
        let bytes = generate_excel_buffer(&ResultTable::new(true)).unwrap();
        assert!(!bytes.is_empty());
    }
}
