use clap::{Args, Parser, Subcommand};
use crate::ai_provider::AiProvider;
use crate::export::ExportFormat;
use fortune_ai_common::SelectionSlot;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fortune-ai")]
#[command(about = "キーワード組み合わせ占い文章の一括生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// キーワード表の指定
#[derive(Args, Clone, Debug)]
pub struct KeywordSource {
    /// キーワード表フォルダ（直下の csv/xlsx/xls を読み込む）
    #[arg(short = 'k', long)]
    pub keywords_dir: Option<PathBuf>,

    /// キーワード表ファイル（複数可、フォルダより後に読み込み同じカテゴリを置き換える）
    #[arg(long = "keywords")]
    pub keyword_files: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 占い文章を一括生成してCSV/Excelに出力
    Run(RunArgs),

    /// 読み込んだキーワード表を表示
    Keywords {
        #[command(flatten)]
        source: KeywordSource,

        /// カテゴリを指定するとキーワードと属性を表示
        #[arg(short, long)]
        category: Option<String>,
    },

    /// 選択から展開される組み合わせを表示
    Combos {
        #[command(flatten)]
        source: KeywordSource,

        /// カテゴリ枠 `カテゴリ:キーワード[:対象]`（1〜4個、キーワードは「すべて」可）
        #[arg(short, long = "slot", required = true)]
        slots: Vec<SelectionSlot>,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// Vertex AIのプロジェクトIDを設定
        #[arg(long)]
        set_project: Option<String>,

        /// Vertex AIのリージョンを設定
        #[arg(long)]
        set_location: Option<String>,

        /// 既定のモデルを設定
        #[arg(long)]
        set_model: Option<String>,

        /// Vertex AIを既定にする (true/false)
        #[arg(long)]
        use_vertex: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: KeywordSource,

    /// カテゴリ枠 `カテゴリ:キーワード[:対象]`（1〜4個、キーワードは「すべて」可）
    #[arg(short, long = "slot", required = true)]
    pub slots: Vec<SelectionSlot>,

    /// 質問（手入力）
    #[arg(short, long, conflicts_with = "questions")]
    pub question: Option<String>,

    /// 手入力の質問ID（省略時 manual_1）
    #[arg(long, requires = "question")]
    pub id: Option<String>,

    /// 質問ファイル（A列ID, B列質問, C列以降キーワード指定）
    #[arg(long, required_unless_present = "question")]
    pub questions: Option<PathBuf>,

    /// 同じ組み合わせの質問を連続質問として1回で生成
    #[arg(long)]
    pub sequential: bool,

    /// システムプロンプト（省略時は設定ファイル）
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// 追加ルール
    #[arg(long, conflicts_with = "rules_file")]
    pub rules: Option<String>,

    /// 追加ルール（ファイル）
    #[arg(long)]
    pub rules_file: Option<PathBuf>,

    /// トーン&マナー
    #[arg(long, conflicts_with = "tone_file")]
    pub tone: Option<String>,

    /// トーン&マナー（ファイル）
    #[arg(long)]
    pub tone_file: Option<PathBuf>,

    /// 回答の目安文字数
    #[arg(long, default_value = "300")]
    pub answer_length: u32,

    /// サマリの目安文字数
    #[arg(long, default_value = "20")]
    pub summary_length: u32,

    /// モデル（省略時は設定ファイル）
    #[arg(short, long)]
    pub model: Option<String>,

    /// AIプロバイダ (gemini/vertex)
    #[arg(long)]
    pub provider: Option<AiProvider>,

    /// 思考予算（2.5 Flash系のみ、0で無効）
    #[arg(long)]
    pub thinking_budget: Option<u32>,

    /// タイムアウト秒数
    #[arg(long)]
    pub timeout: Option<u64>,

    /// 出力形式 (csv/excel/both)
    #[arg(short, long, default_value = "csv")]
    pub format: ExportFormat,

    /// 出力フォルダ
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// 出力ファイル名の接頭辞
    #[arg(long, default_value = "占い結果")]
    pub name: String,

    /// API呼び出し回数の上限
    #[arg(long)]
    pub limit: Option<usize>,

    /// APIを呼ばずに計画とプロンプトを表示
    #[arg(long)]
    pub dry_run: bool,

    /// ログインユーザー名
    #[arg(long)]
    pub user: Option<String>,

    /// ログインパスワード（省略時は入力を求める）
    #[arg(long)]
    pub password: Option<String>,
}
