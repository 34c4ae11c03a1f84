//! Fortune AI Common Library
//!
//! CLIと将来のフロントエンドで共有される占い生成パイプライン
//! （キーワード表・組み合わせ展開・質問入力・検証・プロンプト・回答パース・結果表）

pub mod types;
pub mod error;
pub mod rows;
pub mod keywords;
pub mod combination;
pub mod question;
pub mod validation;
pub mod prompts;
pub mod parser;
pub mod results;
pub mod export;

pub use types::{
    Combination, KeywordChoice, KeywordOverride, KeywordSlot, ParsedReply, QuestionRecord,
    Selection, SelectionSlot, Target, MAX_SLOTS,
};
pub use error::{Error, Result};
pub use rows::parse_csv_rows;
pub use keywords::{category_from_file_stem, KeywordRecord, KeywordStore, KeywordTable};
pub use combination::{expand_selection, expand_slots};
pub use question::{manual_question, parse_question_rows};
pub use validation::{validate_overrides, validate_selection, ValidationIssue, ValidationReport};
pub use prompts::{build_prompt, build_sequential_prompt, keyword_contexts, KeywordContext, PromptOptions};
pub use parser::{parse_reply, parse_sequential_reply, SequentialReply};
pub use results::{output_file_name, ResultRow, ResultTable};
