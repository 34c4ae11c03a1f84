//! プロンプト生成モジュール
//!
//! - build_prompt: 質問1件 × 組み合わせ1件
//! - build_sequential_prompt: 連続質問（同じ組み合わせの複数質問を1回で）
//!
//! 構成（固定順）:
//! システムプロンプト → <rules> → <tone_and_style> → 質問（枠ごとの注記つき）
//! → 枠ごとのキーワード属性 → 出力形式の指示

use crate::keywords::KeywordStore;
use crate::types::{
    Combination, KeywordSlot, FIELD_ANSWER, FIELD_ARRANGED_KEYWORD, FIELD_ORIGINAL_KEYWORD,
    FIELD_RELATION, FIELD_SUMMARY,
};

pub const DEFAULT_ANSWER_LENGTH: u32 = 300;
pub const DEFAULT_SUMMARY_LENGTH: u32 = 20;

/// プロンプトの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub system_prompt: String,
    /// 追加ルール（空なら省略）
    pub rules: Option<String>,
    /// トーン&マナー（空なら省略）
    pub tone: Option<String>,
    /// 回答の目安文字数（AIへの指示のみ）
    pub answer_length: u32,
    /// サマリの目安文字数（AIへの指示のみ）
    pub summary_length: u32,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            rules: None,
            tone: None,
            answer_length: DEFAULT_ANSWER_LENGTH,
            summary_length: DEFAULT_SUMMARY_LENGTH,
        }
    }
}

/// 枠1つ分のキーワードと属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordContext<'a> {
    pub slot: &'a KeywordSlot,
    pub attributes: Vec<(&'a str, &'a str)>,
}

/// 組み合わせの各枠に属性を引き当てる
pub fn keyword_contexts<'a>(
    combination: &'a Combination,
    store: &'a KeywordStore,
) -> Vec<KeywordContext<'a>> {
    combination
        .slots
        .iter()
        .map(|slot| KeywordContext {
            slot,
            attributes: store.attributes(&slot.category, &slot.keyword),
        })
        .collect()
}

/// 質問1件のプロンプト
pub fn build_prompt(question: &str, keywords: &[KeywordContext], options: &PromptOptions) -> String {
    let mut prompt = String::new();
    push_preamble(&mut prompt, options);

    prompt.push_str(&format!("質問: {}\n\n", annotate_question(question, keywords)));
    push_keyword_blocks(&mut prompt, keywords);

    let answer_length = options.answer_length;
    let summary_length = options.summary_length;
    prompt.push_str(&format!(
        r#"
【出力形式】
必ず以下の正確なJSON形式のみを出力してください。前後に説明文を入れないでください：
{{
  "{FIELD_ANSWER}": "{answer_length}文字程度で詳細な占い結果(ここには使用キーワードは記載しない)",
  "{FIELD_SUMMARY}": "{summary_length}文字程度で要点をまとめた内容",
  "{FIELD_ORIGINAL_KEYWORD}": "使用したキーワードを記載（なければ空文字）",
  "{FIELD_ARRANGED_KEYWORD}": "アレンジしたキーワードを記載（なければ空文字）"
}}
注意事項：
- JSONのみを出力（マークダウンのコードブロック```は使用しない）
- 回答内で改行する場合は<br>タグを使用可能
- 前後に説明文を含めない"#
    ));

    prompt
}

/// 連続質問のプロンプト
///
/// # Arguments
/// * `questions` - (ID, 質問) の並び。この順で関連する一連の質問として扱う
/// * `keywords` - 全質問で共通の組み合わせ
pub fn build_sequential_prompt(
    questions: &[(&str, &str)],
    keywords: &[KeywordContext],
    options: &PromptOptions,
) -> String {
    let mut prompt = String::new();
    push_preamble(&mut prompt, options);

    prompt.push_str(&format!(
        "以下の{}個の質問は一連の流れを持つ関連した質問です。同じキーワードの組み合わせで、順番に答えてください。\n\n",
        questions.len()
    ));
    for (index, (id, text)) in questions.iter().enumerate() {
        prompt.push_str(&format!(
            "【質問{}】(ID: {}) {}\n\n",
            index + 1,
            id,
            annotate_question(text, keywords)
        ));
    }
    push_keyword_blocks(&mut prompt, keywords);

    let answer_length = options.answer_length;
    let summary_length = options.summary_length;
    prompt.push_str(&format!(
        r#"
【出力形式】
必ず以下の正確なJSON形式のみを出力してください。前後に説明文を入れないでください：
{{
  "{FIELD_ANSWER}": [
    {{
      "id": "質問のID",
      "{FIELD_ANSWER}": "{answer_length}文字程度で詳細な占い結果(ここには使用キーワードは記載しない)",
      "{FIELD_SUMMARY}": "{summary_length}文字程度で要点をまとめた内容",
      "{FIELD_ORIGINAL_KEYWORD}": "使用したキーワードを記載（なければ空文字）",
      "{FIELD_ARRANGED_KEYWORD}": "アレンジしたキーワードを記載（なければ空文字）"
    }}
  ],
  "{FIELD_RELATION}": "質問同士のつながりを踏まえた全体の流れ"
}}
注意事項：
- "{FIELD_ANSWER}" の配列には質問と同じ順番・同じ数の要素を入れ、各要素の "id" には質問のIDをそのまま記載
- JSONのみを出力（マークダウンのコードブロック```は使用しない）
- 回答内で改行する場合は<br>タグを使用可能
- 前後に説明文を含めない"#
    ));

    prompt
}

fn push_preamble(prompt: &mut String, options: &PromptOptions) {
    prompt.push_str(&options.system_prompt);
    prompt.push_str("\n\n");

    if let Some(rules) = non_blank(options.rules.as_deref()) {
        prompt.push_str(&format!("<rules>\n{}\n</rules>\n\n", rules));
    }
    if let Some(tone) = non_blank(options.tone.as_deref()) {
        prompt.push_str(&format!("<tone_and_style>\n{}\n</tone_and_style>\n\n", tone));
    }
}

/// 質問文の後ろに `【{対象}の{カテゴリ}】{キーワード}` を枠順に付ける
fn annotate_question(question: &str, keywords: &[KeywordContext]) -> String {
    let mut annotated = question.to_string();
    for context in keywords {
        annotated.push_str(&format!(
            "\n【{}の{}】{}",
            context.slot.target, context.slot.category, context.slot.keyword
        ));
    }
    annotated
}

fn push_keyword_blocks(prompt: &mut String, keywords: &[KeywordContext]) {
    for context in keywords.iter().filter(|c| !c.attributes.is_empty()) {
        prompt.push_str(&format!(
            "【{}の{}キーワード】{}\n",
            context.slot.target, context.slot.category, context.slot.keyword
        ));
        for (column, value) in &context.attributes {
            prompt.push_str(&format!("・{}: {}\n", column, value));
        }
        prompt.push('\n');
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
