//! 実行前の準備
//!
//! 選択の検証 → 質問ごとの指定の検証 → 組み合わせ展開 → 実行計画。
//! 無効な指定が1つでもあればAPIを呼ぶ前に止める。

use crate::error::{FortuneAiError, Result};
use crate::runner::{plan_units, BatchPlan};
use fortune_ai_common::{
    expand_selection, validate_overrides, validate_selection, Combination, KeywordStore,
    QuestionRecord, Selection, SelectionSlot,
};
use std::path::Path;

/// 準備済みのバッチ
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub selection: Selection,
    /// 画面の選択から展開した組み合わせ
    pub combinations: Vec<Combination>,
    pub plan: BatchPlan,
}

impl PreparedBatch {
    /// 質問ごとの指定を持つ質問数
    pub fn override_count(&self) -> usize {
        let mut ids: Vec<&str> = self
            .plan
            .units
            .iter()
            .filter(|u| u.question.has_overrides())
            .map(|u| u.question.id.as_str())
            .collect();
        ids.dedup();
        ids.len()
    }

    /// 生成数の内訳
    ///
    /// 質問ごとの指定がある場合は画面設定分と個別指定分に分ける
    pub fn summary_line(&self, questions: &[QuestionRecord]) -> String {
        let overridden = questions.iter().filter(|q| q.has_overrides()).count();
        if overridden == 0 {
            return format!(
                "質問数: {} × キーワード組み合わせ数: {} = 合計生成数: {}",
                questions.len(),
                self.combinations.len(),
                self.plan.len()
            );
        }

        let override_units = self
            .plan
            .units
            .iter()
            .filter(|u| u.question.has_overrides())
            .count();
        format!(
            "質問数: {} (うち個別指定 {}) / 画面設定分: {} × {} = {} / 個別指定分: {} / 合計生成数: {}",
            questions.len(),
            overridden,
            questions.len() - overridden,
            self.combinations.len(),
            self.plan.len() - override_units,
            override_units,
            self.plan.len()
        )
    }
}

pub fn build_selection(slots: Vec<SelectionSlot>) -> Result<Selection> {
    Selection::new(slots).map_err(FortuneAiError::InvalidSelection)
}

pub fn prepare_batch(
    store: &KeywordStore,
    slots: Vec<SelectionSlot>,
    questions: &[QuestionRecord],
) -> Result<PreparedBatch> {
    if questions.is_empty() {
        return Err(FortuneAiError::NoQuestions("質問を入力してください".into()));
    }

    let selection = build_selection(slots)?;
    validate_selection(&selection, store)
        .map_err(|report| FortuneAiError::InvalidSelection(report.to_string()))?;

    let overrides =
        validate_overrides(questions, store).map_err(FortuneAiError::OverrideValidation)?;

    let combinations = expand_selection(&selection, store);
    let plan = plan_units(questions, &combinations, &overrides, store);

    Ok(PreparedBatch {
        selection,
        combinations,
        plan,
    })
}

/// 文字列指定かファイル指定のどちらか（空白のみは未指定扱い）
pub fn read_optional_text(text: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    let value = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            if !path.exists() {
                return Err(FortuneAiError::FileNotFound(path.display().to_string()));
            }
            std::fs::read_to_string(path)?
        }
        (None, None) => return Ok(None),
    };

    let trimmed = value.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortune_ai_common::{KeywordOverride, KeywordTable, Target};

    fn store() -> KeywordStore {
        let mut house = String::from("name\n");
        for i in 1..=12 {
            house.push_str(&format!("第{}ハウス\n", i));
        }
        let mut store = KeywordStore::new();
        store.insert(KeywordTable::from_csv_str("ハウス", &house).unwrap());
        store.insert(KeywordTable::from_csv_str("天体", "name\n太陽\n月\n").unwrap());
        store
    }

    fn slots(specs: &[&str]) -> Vec<SelectionSlot> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_prepare_batch_counts() {
        let questions = vec![QuestionRecord::new("Q1", "a"), QuestionRecord::new("Q2", "b")];
        let batch = prepare_batch(&store(), slots(&["ハウス:すべて", "天体:月:あの人"]), &questions).unwrap();

        assert_eq!(batch.combinations.len(), 12);
        assert_eq!(batch.plan.len(), 24);
        assert_eq!(batch.override_count(), 0);
    }

    #[test]
    fn test_summary_line_without_overrides() {
        let questions = vec![QuestionRecord::new("Q1", "a"), QuestionRecord::new("Q2", "b")];
        let batch = prepare_batch(&store(), slots(&["天体:すべて"]), &questions).unwrap();
        assert_eq!(
            batch.summary_line(&questions),
            "質問数: 2 × キーワード組み合わせ数: 2 = 合計生成数: 4"
        );
    }

    #[test]
    fn test_summary_line_with_overrides() {
        let mut questions = vec![QuestionRecord::new("Q1", "a"), QuestionRecord::new("Q2", "b")];
        questions[1].overrides.push(KeywordOverride {
            category: "ハウス".into(),
            keyword: "すべて".into(),
            target: Target::Partner,
        });

        let batch = prepare_batch(&store(), slots(&["天体:太陽"]), &questions).unwrap();
        assert_eq!(batch.plan.len(), 13);
        assert_eq!(
            batch.summary_line(&questions),
            "質問数: 2 (うち個別指定 1) / 画面設定分: 1 × 1 = 1 / 個別指定分: 12 / 合計生成数: 13"
        );
    }

    #[test]
    fn test_prepare_batch_rejects_unknown_selection() {
        let questions = vec![QuestionRecord::new("Q1", "a")];
        let result = prepare_batch(&store(), slots(&["サイン:牡羊座"]), &questions);
        assert!(matches!(result, Err(FortuneAiError::InvalidSelection(_))));
    }

    #[test]
    fn test_prepare_batch_rejects_too_many_slots() {
        let questions = vec![QuestionRecord::new("Q1", "a")];
        let result = prepare_batch(&store(), slots(&["天体:太陽"; 5]), &questions);
        assert!(matches!(result, Err(FortuneAiError::InvalidSelection(_))));
    }

    #[test]
    fn test_prepare_batch_halts_on_invalid_override() {
        let mut q = QuestionRecord::new("Q7", "a");
        q.overrides.push(KeywordOverride {
            category: "ハウス".into(),
            keyword: "13".into(),
            target: Target::SelfPerson,
        });

        let result = prepare_batch(&store(), slots(&["天体:太陽"]), &[q]);
        match result {
            Err(FortuneAiError::OverrideValidation(report)) => {
                assert_eq!(report.issues[0].row_id, "Q7");
            }
            other => panic!("unexpected: {:?}", other.map(|b| b.plan.len())),
        }
    }

    #[test]
    fn test_prepare_batch_no_questions() {
        let result = prepare_batch(&store(), slots(&["天体:太陽"]), &[]);
        assert!(matches!(result, Err(FortuneAiError::NoQuestions(_))));
    }

    #[test]
    fn test_read_optional_text() {
        assert_eq!(read_optional_text(None, None).unwrap(), None);
        assert_eq!(read_optional_text(Some("  ".into()), None).unwrap(), None);
        assert_eq!(
            read_optional_text(Some(" 丁寧に ".into()), None).unwrap().as_deref(),
            Some("丁寧に")
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.txt");
        std::fs::write(&path, "ルール1\nルール2\n").unwrap();
        assert_eq!(
            read_optional_text(None, Some(&path)).unwrap().as_deref(),
            Some("ルール1\nルール2")
        );
    }
}
