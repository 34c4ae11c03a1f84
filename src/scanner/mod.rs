//! 入力ファイルの検出と読み込み
//!
//! - キーワード表: フォルダ直下の csv/xlsx/xls、または個別指定
//! - 質問表: csv/xlsx/xls 1ファイル

use crate::error::{FortuneAiError, Result};
use crate::sheet::{is_table_file, read_rows};
use fortune_ai_common::{category_from_file_stem, parse_question_rows, KeywordStore, KeywordTable, QuestionRecord};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// フォルダ直下のキーワード表ファイル（ファイル名順）
pub fn scan_keyword_dir(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(FortuneAiError::FolderNotFound(folder.display().to_string()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && is_table_file(path))
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// キーワード表1ファイルを読み込む（カテゴリ名はファイル名から）
pub fn load_keyword_file(path: &Path) -> Result<KeywordTable> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let category = category_from_file_stem(&stem);

    let rows = read_rows(path)?;
    let table = KeywordTable::from_rows(category, &rows)?;

    let duplicates = table.duplicate_names();
    if !duplicates.is_empty() {
        tracing::warn!(
            category = table.category(),
            "キーワード名が重複しています（最初の行を使用）: {}",
            duplicates.join(", ")
        );
    }

    Ok(table)
}

/// フォルダと個別ファイルからキーワード表を集める
///
/// 個別ファイルはフォルダの後に読み込み、同じカテゴリを置き換える
pub fn load_keyword_store(folder: Option<&Path>, files: &[PathBuf]) -> Result<KeywordStore> {
    let mut paths = match folder {
        Some(folder) => scan_keyword_dir(folder)?,
        None => Vec::new(),
    };
    paths.extend(files.iter().cloned());

    if paths.is_empty() {
        let source = folder
            .map(|f| f.display().to_string())
            .unwrap_or_else(|| "--keywords-dir か --keywords を指定してください".into());
        return Err(FortuneAiError::NoKeywordFiles(source));
    }

    let mut store = KeywordStore::new();
    for path in &paths {
        let table = load_keyword_file(path)?;
        tracing::debug!(
            category = table.category(),
            count = table.len(),
            "キーワード表を読み込み: {}",
            path.display()
        );
        store.insert(table);
    }

    Ok(store)
}

/// 質問表を読み込む
pub fn load_questions(path: &Path) -> Result<Vec<QuestionRecord>> {
    let rows = read_rows(path)?;
    let questions = parse_question_rows(&rows)?;
    if questions.is_empty() {
        return Err(FortuneAiError::NoQuestions(path.display().to_string()));
    }
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_keyword_dir_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("天体キーワード.csv"), "name\n太陽\n").unwrap();
        fs::write(dir.path().join("ハウスキーワード.csv"), "name\n第1ハウス\n").unwrap();
        fs::write(dir.path().join("memo.txt"), "ignore").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("nested.csv"), "name\nx\n").unwrap();

        let files = scan_keyword_dir(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["ハウスキーワード.csv", "天体キーワード.csv"]);
    }

    #[test]
    fn test_scan_keyword_dir_missing() {
        let result = scan_keyword_dir(Path::new("/nonexistent/keywords"));
        assert!(matches!(result, Err(FortuneAiError::FolderNotFound(_))));
    }

    #[test]
    fn test_load_keyword_store_explicit_file_replaces() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("天体キーワード.csv"), "name\n太陽\n").unwrap();
        let extra_dir = tempfile::tempdir().unwrap();
        let extra = extra_dir.path().join("天体.csv");
        fs::write(&extra, "name,意味\n月,感情\n").unwrap();

        let store = load_keyword_store(Some(dir.path()), &[extra]).unwrap();
        assert_eq!(store.categories(), vec!["天体"]);
        assert_eq!(store.get("天体").unwrap().keyword_names(), vec!["月"]);
    }

    #[test]
    fn test_load_keyword_store_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_keyword_store(Some(dir.path()), &[]);
        assert!(matches!(result, Err(FortuneAiError::NoKeywordFiles(_))));
    }

    #[test]
    fn test_load_questions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.csv");
        fs::write(&path, "id,question,cat1,kw1,who1\nQ1,仕事運は？,天体,太陽,あの人\n").unwrap();

        let questions = load_questions(&path).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].overrides[0].keyword, "太陽");
    }

    #[test]
    fn test_load_questions_all_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.csv");
        fs::write(&path, "id,question\nQ1,\n").unwrap();
        assert!(matches!(load_questions(&path), Err(FortuneAiError::NoQuestions(_))));
    }
}
