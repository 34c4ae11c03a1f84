use crate::error::{FortuneAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub use_vertex_ai: bool,
    pub vertex_project: Option<String>,
    pub vertex_location: String,
    pub timeout_seconds: u64,
    /// 2.5 Flash系のみ送信。0で思考を無効化
    pub thinking_budget: u32,
    pub default_system_prompt: Option<String>,
    pub auth: AuthConfig,
}

/// ログイン情報。パスワードが1つも無ければ認証なし
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub user_username: String,
    pub user_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".into(),
            admin_password: None,
            user_username: "user".into(),
            user_password: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// 設定ファイルを読み、環境変数で上書き
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FortuneAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("fortune-ai").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            use_vertex_ai: false,
            vertex_project: None,
            vertex_location: DEFAULT_VERTEX_LOCATION.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            thinking_budget: 0,
            default_system_prompt: None,
            auth: AuthConfig::default(),
        }
    }

    /// 環境変数の上書き（空文字は無視）
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(flag) = var("USE_VERTEX_AI") {
            match flag.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => self.use_vertex_ai = true,
                "false" | "0" | "no" => self.use_vertex_ai = false,
                other => tracing::warn!("USE_VERTEX_AI の値を解釈できません: {}", other),
            }
        }
        if let Some(project) = var("VERTEX_PROJECT") {
            self.vertex_project = Some(project);
        }
        if let Some(location) = var("VERTEX_LOCATION") {
            self.vertex_location = location;
        }
        if let Some(password) = var("ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }
        if let Some(password) = var("USER_PASSWORD") {
            self.auth.user_password = Some(password);
        }
        if let Some(prompt) = var("FORTUNE_AI_SYSTEM_PROMPT") {
            self.default_system_prompt = Some(prompt);
        }
    }

    pub fn get_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(FortuneAiError::MissingApiKey)
    }

    pub fn get_vertex_project(&self) -> Result<String> {
        self.vertex_project
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or(FortuneAiError::MissingVertexProject)
    }

    pub fn has_vertex_project(&self) -> bool {
        self.get_vertex_project().is_ok()
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    /// 表示用（先頭4文字以外を伏せる）
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            Some(key) if !key.is_empty() => {
                let head: String = key.chars().take(4).collect();
                format!("{}****", head)
            }
            _ => "未設定".into(),
        }
    }
}
