//! 占い生成パイプラインの型定義
//!
//! CLIと将来のフロントエンドで共有される型:
//! - Target: キーワードの対象（あなた / あの人 / 相性）
//! - KeywordChoice: キーワード選択（個別 or すべて）
//! - SelectionSlot / Selection: 画面（CLI）で選ばれたカテゴリ枠
//! - KeywordSlot / Combination: 「すべて」展開後の組み合わせ
//! - QuestionRecord: 質問とCSV行ごとのキーワード指定
//! - ParsedReply: AI回答のパース結果

use std::fmt;
use std::str::FromStr;

/// 同時に選択できるカテゴリ数の上限
pub const MAX_SLOTS: usize = 4;

/// 「すべて」選択の表示ラベル
pub const ALL_KEYWORD_LABEL: &str = "すべて";

/// 回答JSONのフィールド名
pub const FIELD_ANSWER: &str = "回答";
pub const FIELD_SUMMARY: &str = "サマリ";
pub const FIELD_ORIGINAL_KEYWORD: &str = "元キーワード";
pub const FIELD_ARRANGED_KEYWORD: &str = "アレンジキーワード";
/// 連続質問モードの関連性フィールド
pub const FIELD_RELATION: &str = "関連性";

/// キーワードの対象
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Target {
    /// あなた
    #[default]
    SelfPerson,
    /// あの人
    Partner,
    /// 相性
    Compatibility,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::SelfPerson, Target::Partner, Target::Compatibility];

    /// プロンプト・列名に使う表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Target::SelfPerson => "あなた",
            Target::Partner => "あの人",
            Target::Compatibility => "相性",
        }
    }

    /// アップロードされたCSVの対象列を解釈する
    ///
    /// 認識できない値（空欄含む）は「あなた」に寄せる
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "あなた" | "self" => Ok(Target::SelfPerson),
            "あの人" | "other" | "partner" => Ok(Target::Partner),
            "相性" | "compatibility" => Ok(Target::Compatibility),
            _ => Err(format!(
                "Unknown target: {}. Use あなた, あの人, or 相性",
                trimmed
            )),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// カテゴリ枠のキーワード選択
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeywordChoice {
    /// カテゴリ内の全キーワードに展開
    All,
    /// 個別キーワード
    Named(String),
}

impl KeywordChoice {
    /// 「すべて」/「all」（大文字小文字無視）は All、それ以外は個別キーワード
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if is_all_label(trimmed) {
            KeywordChoice::All
        } else {
            KeywordChoice::Named(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, KeywordChoice::All)
    }
}

impl fmt::Display for KeywordChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordChoice::All => write!(f, "{}", ALL_KEYWORD_LABEL),
            KeywordChoice::Named(name) => write!(f, "{}", name),
        }
    }
}

pub(crate) fn is_all_label(value: &str) -> bool {
    value == ALL_KEYWORD_LABEL || value.eq_ignore_ascii_case("all")
}

/// 選択されたカテゴリ枠（カテゴリ・キーワード・対象）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionSlot {
    pub category: String,
    pub choice: KeywordChoice,
    pub target: Target,
}

impl SelectionSlot {
    pub fn new(category: impl Into<String>, choice: KeywordChoice, target: Target) -> Self {
        Self {
            category: category.into(),
            choice,
            target,
        }
    }
}

/// `カテゴリ:キーワード[:対象]` 形式（全角コロン可）
impl FromStr for SelectionSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('：', ":");
        let parts: Vec<&str> = normalized.split(':').map(str::trim).collect();

        let (category, keyword, target) = match parts.as_slice() {
            [category, keyword] => (*category, *keyword, Target::SelfPerson),
            [category, keyword, target] => (*category, *keyword, target.parse()?),
            _ => {
                return Err(format!(
                    "Invalid slot: {}. Use カテゴリ:キーワード[:対象]",
                    s
                ))
            }
        };

        if category.is_empty() || keyword.is_empty() {
            return Err(format!("Invalid slot: {}. カテゴリとキーワードは必須です", s));
        }

        Ok(Self::new(category, KeywordChoice::parse(keyword), target))
    }
}

/// 画面（CLI）で選ばれたカテゴリ枠の並び（1〜4枠）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    slots: Vec<SelectionSlot>,
}

impl Selection {
    pub fn new(slots: Vec<SelectionSlot>) -> Result<Self, String> {
        if slots.is_empty() {
            return Err("カテゴリを1つ以上選択してください".into());
        }
        if slots.len() > MAX_SLOTS {
            return Err(format!(
                "カテゴリは最大{}つまでです（指定: {}）",
                MAX_SLOTS,
                slots.len()
            ));
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[SelectionSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// 展開済みの1枠（キーワードは必ず具体値）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeywordSlot {
    pub category: String,
    pub keyword: String,
    pub target: Target,
}

impl KeywordSlot {
    pub fn new(category: impl Into<String>, keyword: impl Into<String>, target: Target) -> Self {
        Self {
            category: category.into(),
            keyword: keyword.into(),
            target,
        }
    }

    /// 結果表の列名 `{対象}の{カテゴリ}{番号}`（番号は1始まり）
    pub fn column_name(&self, index: usize) -> String {
        format!("{}の{}{}", self.target, self.category, index + 1)
    }

    /// 進捗表示用 `{対象}の{キーワード}`
    pub fn label(&self) -> String {
        format!("{}の{}", self.target, self.keyword)
    }
}

/// キーワードの組み合わせ
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Combination {
    pub slots: Vec<KeywordSlot>,
}

impl Combination {
    pub fn new(slots: Vec<KeywordSlot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `あなたの太陽 × あの人の第1ハウス`
    pub fn label(&self) -> String {
        self.slots
            .iter()
            .map(KeywordSlot::label)
            .collect::<Vec<_>>()
            .join(" × ")
    }
}

/// 質問CSVの1行に書かれたキーワード指定（未検証）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordOverride {
    pub category: String,
    pub keyword: String,
    pub target: Target,
}

impl fmt::Display for KeywordOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.keyword)
    }
}

/// 質問1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: String,
    pub text: String,
    /// 行ごとのキーワード指定（空なら画面の選択を使う）
    pub overrides: Vec<KeywordOverride>,
}

impl QuestionRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            overrides: Vec::new(),
        }
    }

    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }
}

/// AI回答のパース結果
///
/// フィールドは返答JSONの `回答` `サマリ` `元キーワード` `アレンジキーワード` に対応
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub answer: String,
    pub summary: String,
    pub original_keyword: String,
    pub arranged_keyword: String,
}

impl ParsedReply {
    /// 回答だけを持つ結果
    pub fn answer_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }
}
