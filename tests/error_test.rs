//! エラーケーステスト
//!
//! 入力ファイル・選択・設定の各種エラー条件を検証

use fortune_ai_rust::error::FortuneAiError;
use fortune_ai_rust::{pipeline, scanner};
use fortune_ai_common::{KeywordStore, KeywordTable, QuestionRecord, SelectionSlot};
use std::path::Path;
use tempfile::tempdir;

fn store() -> KeywordStore {
    let mut store = KeywordStore::new();
    store.insert(KeywordTable::from_csv_str("天体", "name\n太陽\n月\n").unwrap());
    store
}

/// 存在しないフォルダを読み込んだ場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_keyword_dir(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result, Err(FortuneAiError::FolderNotFound(_))));
}

/// 表ファイルのないフォルダ
#[test]
fn test_keyword_folder_without_tables() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("memo.txt"), "hello").unwrap();

    let result = scanner::load_keyword_store(Some(dir.path()), &[]);
    assert!(matches!(result, Err(FortuneAiError::NoKeywordFiles(_))));
}

/// 見出し行しかない質問ファイル
#[test]
fn test_question_file_without_rows() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("questions.csv");
    std::fs::write(&path, "ID,質問\n").unwrap();

    let result = scanner::load_questions(&path);
    assert!(matches!(result, Err(FortuneAiError::NoQuestions(_))));
}

/// 存在しないカテゴリとキーワードはまとめて報告される
#[test]
fn test_selection_reports_every_issue() {
    let slots: Vec<SelectionSlot> = ["天体:冥王星", "サイン:牡羊座"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    let questions = vec![QuestionRecord::new("Q1", "今年の運勢は？")];

    let err = pipeline::prepare_batch(&store(), slots, &questions).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("冥王星"), "{}", message);
    assert!(message.contains("サイン"), "{}", message);
}

/// FortuneAiErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        FortuneAiError::Config("テスト設定エラー".to_string()),
        FortuneAiError::FileNotFound("keywords.csv".to_string()),
        FortuneAiError::NoQuestions("questions.csv".to_string()),
        FortuneAiError::InvalidSelection("枠が5個".to_string()),
        FortuneAiError::ApiCall("HTTP 500".to_string()),
        FortuneAiError::MissingApiKey,
        FortuneAiError::MissingSystemPrompt,
        FortuneAiError::AuthFailed,
    ];

    for err in errors {
        let msg = err.to_string();
        assert!(!msg.is_empty(), "Error message should not be empty");
    }
}

/// 共通ライブラリのエラーが透過的に変換される
#[test]
fn test_common_error_conversion() {
    let common = fortune_ai_common::Error::Excel("シート名設定エラー".to_string());
    let expected = common.to_string();
    let err: FortuneAiError = common.into();
    assert!(matches!(err, FortuneAiError::Common(_)));
    assert_eq!(err.to_string(), expected);
}

/// IOエラーの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: FortuneAiError = io_err.into();
    assert!(matches!(err, FortuneAiError::Io(_)));
}

/// JSONエラーの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    let err: FortuneAiError = json_err.into();
    assert!(matches!(err, FortuneAiError::JsonParse(_)));
}
