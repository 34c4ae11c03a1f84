//! バッチ実行
//!
//! 質問 × 組み合わせの実行単位を組み立て、1件ずつ順番にAPIを呼ぶ。
//! 1件の失敗は「エラー: ...」行に置き換えて続行する。

use crate::llm::{TextGenerator, TokenUsage};
use fortune_ai_common::{
    build_prompt, build_sequential_prompt, expand_slots, keyword_contexts, parse_reply,
    parse_sequential_reply, Combination, KeywordStore, PromptOptions, QuestionRecord, ResultRow,
    ResultTable, SelectionSlot,
};
use indicatif::ProgressBar;
use std::collections::HashMap;

/// 質問プレビューの文字数
const PREVIEW_CHARS: usize = 30;

/// 実行設定
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub prompt: PromptOptions,
    /// 同じ組み合わせの質問をまとめて1回で聞く
    pub sequential: bool,
    /// API呼び出し回数の上限
    pub limit: Option<usize>,
}

/// 実行単位（質問1件 × 組み合わせ1件）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub question: QuestionRecord,
    pub combination: Combination,
}

/// 実行計画
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub units: Vec<WorkUnit>,
}

/// 質問ごとの組み合わせを決めて実行単位を並べる
///
/// `overrides` は質問と同じ並び。None の質問は画面の選択の組み合わせを使う
pub fn plan_units(
    questions: &[QuestionRecord],
    global: &[Combination],
    overrides: &[Option<Vec<SelectionSlot>>],
    store: &KeywordStore,
) -> BatchPlan {
    let mut units = Vec::new();

    for (index, question) in questions.iter().enumerate() {
        let combinations = match overrides.get(index) {
            Some(Some(slots)) => expand_slots(slots, store),
            _ => global.to_vec(),
        };
        units.extend(combinations.into_iter().map(|combination| WorkUnit {
            question: question.clone(),
            combination,
        }));
    }

    BatchPlan { units }
}

/// API呼び出し1回分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCall<'a> {
    Single(&'a WorkUnit),
    /// 連続質問（同じ組み合わせの質問を入力順に）
    Sequential {
        combination: &'a Combination,
        questions: Vec<&'a QuestionRecord>,
    },
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// API呼び出しの並び
    ///
    /// 連続質問モードでは組み合わせの初出順にまとめる
    pub fn calls(&self, sequential: bool) -> Vec<BatchCall<'_>> {
        if !sequential {
            return self.units.iter().map(BatchCall::Single).collect();
        }

        let mut groups: Vec<(&Combination, Vec<&QuestionRecord>)> = Vec::new();
        let mut index: HashMap<&Combination, usize> = HashMap::new();
        for unit in &self.units {
            match index.get(&unit.combination) {
                Some(&i) => groups[i].1.push(&unit.question),
                None => {
                    index.insert(&unit.combination, groups.len());
                    groups.push((&unit.combination, vec![&unit.question]));
                }
            }
        }

        groups
            .into_iter()
            .map(|(combination, questions)| BatchCall::Sequential {
                combination,
                questions,
            })
            .collect()
    }
}

impl BatchCall<'_> {
    pub fn combination(&self) -> &Combination {
        match self {
            BatchCall::Single(unit) => &unit.combination,
            BatchCall::Sequential { combination, .. } => combination,
        }
    }

    pub fn prompt(&self, store: &KeywordStore, options: &PromptOptions) -> String {
        let contexts = keyword_contexts(self.combination(), store);
        match self {
            BatchCall::Single(unit) => build_prompt(&unit.question.text, &contexts, options),
            BatchCall::Sequential { questions, .. } => {
                let items: Vec<(&str, &str)> = questions
                    .iter()
                    .map(|q| (q.id.as_str(), q.text.as_str()))
                    .collect();
                build_sequential_prompt(&items, &contexts, options)
            }
        }
    }

    /// 進捗表示用 `質問: {先頭30文字}... | {組み合わせ}`
    pub fn label(&self) -> String {
        let question = match self {
            BatchCall::Single(unit) => question_preview(&unit.question.text),
            BatchCall::Sequential { questions, .. } => format!("{}件の連続質問", questions.len()),
        };
        format!("質問: {} | {}", question, self.combination().label())
    }
}

/// 先頭30文字（超える場合は「...」付き）
pub fn question_preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// 実行結果
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub table: ResultTable,
    pub usage: TokenUsage,
    /// 実行したAPI呼び出し数
    pub calls: usize,
    /// 失敗した呼び出し数
    pub failures: usize,
}

/// 計画を上限まで順番に実行
pub async fn run_batch<G: TextGenerator>(
    generator: &G,
    plan: &BatchPlan,
    store: &KeywordStore,
    settings: &RunSettings,
    progress: &ProgressBar,
) -> BatchOutcome {
    let mut calls = plan.calls(settings.sequential);
    if let Some(limit) = settings.limit {
        calls.truncate(limit);
    }

    let total = calls.len();
    progress.set_length(total as u64);

    let mut outcome = BatchOutcome {
        table: ResultTable::new(settings.sequential),
        ..Default::default()
    };

    for (index, call) in calls.iter().enumerate() {
        progress.set_message(format!("進行状況: {}/{} - {}", index + 1, total, call.label()));

        let prompt = call.prompt(store, &settings.prompt);
        tracing::debug!(call = index + 1, chars = prompt.chars().count(), "プロンプト生成");

        match generator.generate(&prompt).await {
            Ok(reply) => {
                outcome.usage += reply.usage;
                push_rows(&mut outcome.table, call, &reply.text);
            }
            Err(e) => {
                tracing::warn!(call = index + 1, "生成エラー: {}", e);
                outcome.failures += 1;
                push_failed_rows(&mut outcome.table, call, &e.to_string());
            }
        }

        outcome.calls += 1;
        progress.inc(1);
        progress.set_message(format!(
            "進行状況: {}/{} - 入力: {} / 出力: {} / 思考: {}",
            index + 1,
            total,
            outcome.usage.input,
            outcome.usage.output,
            outcome.usage.thinking
        ));
    }

    progress.finish_and_clear();
    outcome
}

fn push_rows(table: &mut ResultTable, call: &BatchCall, text: &str) {
    match call {
        BatchCall::Single(unit) => {
            table.push(ResultRow::new(&unit.question, &unit.combination, parse_reply(text)));
        }
        BatchCall::Sequential {
            combination,
            questions,
        } => {
            let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
            let reply = parse_sequential_reply(text, &ids);
            for (question, parsed) in questions.iter().zip(reply.answers) {
                table.push(
                    ResultRow::new(question, combination, parsed).with_relation(&reply.relation),
                );
            }
        }
    }
}

fn push_failed_rows(table: &mut ResultTable, call: &BatchCall, message: &str) {
    match call {
        BatchCall::Single(unit) => {
            table.push(ResultRow::failed(&unit.question, &unit.combination, message));
        }
        BatchCall::Sequential {
            combination,
            questions,
        } => {
            for question in questions {
                table.push(ResultRow::failed(question, combination, message).with_relation(""));
            }
        }
    }
}
