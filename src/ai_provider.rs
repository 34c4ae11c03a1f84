use crate::config::Config;
use clap::ValueEnum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AiProvider {
    /// Gemini API（APIキー）
    Gemini,
    /// Vertex AI（プロジェクト・リージョン）
    Vertex,
}

impl AiProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "Gemini API",
            AiProvider::Vertex => "Vertex AI",
        }
    }

    /// 使用するプロバイダを決める
    ///
    /// 1. 明示指定
    /// 2. 設定の use_vertex_ai
    /// 3. Pro系モデルはプロジェクト設定があれば Vertex AI
    /// 4. それ以外は Gemini API
    pub fn resolve(explicit: Option<AiProvider>, config: &Config, model: &str) -> AiProvider {
        if let Some(provider) = explicit {
            return provider;
        }
        if config.use_vertex_ai {
            return AiProvider::Vertex;
        }
        if model.to_lowercase().contains("pro") && config.has_vertex_project() {
            return AiProvider::Vertex;
        }
        AiProvider::Gemini
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_provider_wins() {
        let config = Config {
            use_vertex_ai: true,
            ..Config::default()
        };
        assert_eq!(
            AiProvider::resolve(Some(AiProvider::Gemini), &config, "gemini-2.5-pro"),
            AiProvider::Gemini
        );
    }

    #[test]
    fn test_config_flag_selects_vertex() {
        let config = Config {
            use_vertex_ai: true,
            ..Config::default()
        };
        assert_eq!(
            AiProvider::resolve(None, &config, "gemini-2.5-flash"),
            AiProvider::Vertex
        );
    }

    #[test]
    fn test_pro_model_routing() {
        let mut config = Config::default();
        assert_eq!(
            AiProvider::resolve(None, &config, "gemini-2.5-pro"),
            AiProvider::Gemini
        );

        config.vertex_project = Some("proj".into());
        assert_eq!(
            AiProvider::resolve(None, &config, "gemini-2.5-pro"),
            AiProvider::Vertex
        );
        assert_eq!(
            AiProvider::resolve(None, &config, "gemini-2.5-flash"),
            AiProvider::Gemini
        );
    }
}
