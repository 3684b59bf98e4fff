use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::groq::GroqClient;
use crate::logging;
use crate::xai::XaiClient;
use std::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    Gemini,
    Xai,
    /// Unrecognized model strings fall through to Groq.
    GroqDefault,
}

impl Provider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq Llama",
            Provider::Gemini => "Google Gemini",
            Provider::Xai => "xAI Grok",
            Provider::GroqDefault => "Groq Llama (افتراضي)",
        }
    }
}

/// Substring dispatch on the requested model string.
pub fn resolve_provider(model: &str) -> Provider {
    if model.contains("groq") {
        Provider::Groq
    } else if model.contains("gemini") {
        Provider::Gemini
    } else if model.contains("xai") {
        Provider::Xai
    } else {
        Provider::GroqDefault
    }
}

/// Holds one client per provider with a configured key. Providers without a
/// key stay unset and fail per-request with the user-facing message.
pub struct ChatRouter {
    groq: Option<GroqClient>,
    gemini: Option<GeminiClient>,
    xai: Option<XaiClient>,
}

impl ChatRouter {
    pub fn from_config(config: &Config) -> Self {
        ChatRouter {
            groq: config.groq_api_key.as_deref().map(GroqClient::new),
            gemini: config.gemini_api_key.as_deref().map(GeminiClient::new),
            xai: config.xai_api_key.as_deref().map(XaiClient::new),
        }
    }

    /// Forward a message to the provider selected by the model string.
    /// Returns the response text and the display name of the model used.
    /// No retry; failures surface as error strings.
    pub async fn generate(
        &self,
        message: &str,
        system_prompt: Option<&str>,
        model: &str,
    ) -> Result<(String, &'static str), Box<dyn Error + Send + Sync>> {
        let provider = resolve_provider(model);
        logging::log_chat(&format!("Dispatching model '{}' to {}", model, provider.display_name()));

        let response = match provider {
            Provider::Groq | Provider::GroqDefault => {
                let client = self.groq.as_ref().ok_or(
                    "مفتاح Groq API غير موجود. يرجى إضافته في متغيرات البيئة.",
                )?;
                client.generate(message, system_prompt).await?
            }
            Provider::Gemini => {
                let client = self.gemini.as_ref().ok_or(
                    "مفتاح Gemini API غير موجود. يرجى إضافته في متغيرات البيئة.",
                )?;
                client.generate(message, system_prompt).await?
            }
            Provider::Xai => {
                let client = self.xai.as_ref().ok_or(
                    "مفتاح xAI API غير موجود. يرجى إضافته في متغيرات البيئة.",
                )?;
                client.generate(message, system_prompt).await?
            }
        };

        Ok((response, provider.display_name()))
    }

    pub fn has_groq(&self) -> bool {
        self.groq.is_some()
    }

    pub fn has_gemini(&self) -> bool {
        self.gemini.is_some()
    }

    pub fn has_xai(&self) -> bool {
        self.xai.is_some()
    }

    /// Live connection check against every configured provider. Providers
    /// without a key are reported as unconfigured, not as failures.
    pub async fn validate_keys(&self) -> Vec<KeyValidation> {
        let mut results = Vec::new();

        match &self.groq {
            Some(client) => results.push(KeyValidation::from_result(
                "groq",
                client.validate_api_key().await,
            )),
            None => results.push(KeyValidation::unconfigured("groq")),
        }

        match &self.gemini {
            Some(client) => results.push(KeyValidation::from_result(
                "gemini",
                client.validate_api_key().await,
            )),
            None => results.push(KeyValidation::unconfigured("gemini")),
        }

        match &self.xai {
            Some(client) => results.push(KeyValidation::from_result(
                "xai",
                client.validate_api_key().await,
            )),
            None => results.push(KeyValidation::unconfigured("xai")),
        }

        results
    }
}

#[derive(Debug, serde::Serialize)]
pub struct KeyValidation {
    pub provider: &'static str,
    pub configured: bool,
    pub valid: Option<bool>,
    pub error: Option<String>,
}

impl KeyValidation {
    fn unconfigured(provider: &'static str) -> Self {
        KeyValidation { provider, configured: false, valid: None, error: None }
    }

    fn from_result(
        provider: &'static str,
        result: Result<bool, Box<dyn Error + Send + Sync>>,
    ) -> Self {
        match result {
            Ok(valid) => KeyValidation { provider, configured: true, valid: Some(valid), error: None },
            Err(e) => KeyValidation {
                provider,
                configured: true,
                valid: Some(false),
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federation::FederationConfig;
    use std::path::PathBuf;

    fn empty_config() -> Config {
        Config {
            groq_api_key: None,
            gemini_api_key: None,
            xai_api_key: None,
            port: 0,
            data_dir: PathBuf::new(),
            log_dir: PathBuf::new(),
            federation: FederationConfig::default(),
        }
    }

    #[test]
    fn test_resolve_provider_by_substring() {
        assert_eq!(resolve_provider("groq-llama"), Provider::Groq);
        assert_eq!(resolve_provider("gemini-pro"), Provider::Gemini);
        assert_eq!(resolve_provider("xai-grok"), Provider::Xai);
    }

    #[test]
    fn test_unknown_model_falls_through_to_groq() {
        // "grok-beta" has no "xai" substring, so it rides the default path.
        assert_eq!(resolve_provider("grok-beta"), Provider::GroqDefault);
        assert_eq!(resolve_provider("gpt-4"), Provider::GroqDefault);
        assert_eq!(resolve_provider(""), Provider::GroqDefault);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Provider::Groq.display_name(), "Groq Llama");
        assert_eq!(Provider::Gemini.display_name(), "Google Gemini");
        assert_eq!(Provider::Xai.display_name(), "xAI Grok");
        assert!(Provider::GroqDefault.display_name().starts_with("Groq Llama"));
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_user_facing_error() {
        let router = ChatRouter::from_config(&empty_config());
        let err = router.generate("مرحبا", None, "gemini-pro").await.unwrap_err();
        assert!(err.to_string().contains("Gemini API"));
    }
}
