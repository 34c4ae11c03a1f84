use fortune_ai_common::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FortuneAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`fortune-ai config --set-api-key YOUR_KEY` か環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("Vertex AIのプロジェクトが設定されていません。`fortune-ai config --set-project PROJECT_ID` か環境変数 VERTEX_PROJECT で設定してください")]
    MissingVertexProject,

    #[error("システムプロンプトが空です。--system-prompt か設定ファイルで指定してください")]
    MissingSystemPrompt,

    #[error("認証に失敗しました: ユーザー名またはパスワードが違います")]
    AuthFailed,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("キーワードファイルが見つかりません: {0}")]
    NoKeywordFiles(String),

    #[error("質問がありません: {0}")]
    NoQuestions(String),

    #[error("カテゴリ選択が不正です: {0}")]
    InvalidSelection(String),

    #[error("以下のキーワード指定が無効です。修正してから再実行してください\n{0}")]
    OverrideValidation(ValidationReport),

    #[error("入力ファイルの形式が不正: {0}")]
    Input(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] fortune_ai_common::Error),
}

impl From<reqwest::Error> for FortuneAiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FortuneAiError::ApiCall(format!("タイムアウトしました: {}", e))
        } else if e.is_decode() {
            FortuneAiError::ApiParse(e.to_string())
        } else {
            FortuneAiError::ApiCall(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, FortuneAiError>;
