//! Category suggestions for vendors the rule set has never seen.
//!
//! The provider is an injected capability: anything that turns a prompt into
//! a reply. Whatever goes wrong inside it, callers get a category back.

use anyhow::bail;

use crate::models::Category;
use crate::settings::BusinessProfile;

pub trait SuggestionProvider {
    fn suggest(&self, prompt: &str) -> anyhow::Result<String>;

    /// Disabled providers are never asked and produce no suggestion at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

impl<F> SuggestionProvider for F
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    fn suggest(&self, prompt: &str) -> anyhow::Result<String> {
        self(prompt)
    }
}

pub struct NoSuggestions;

impl SuggestionProvider for NoSuggestions {
    fn suggest(&self, _prompt: &str) -> anyhow::Result<String> {
        bail!("suggestions are disabled")
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

pub fn build_prompt(profile: &BusinessProfile, vendor: &str) -> String {
    let choices: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    format!(
        "The user runs a {} business. {}\n\n\
         Suggest the most likely expense category for the vendor: '{vendor}'. \
         Choose from: {}. Reply with only the category.",
        profile.business_type,
        profile.additional_context,
        choices.join(", "),
    )
}

/// Ask `provider` for a category. `None` only when the provider is disabled;
/// failures and replies outside the category list become `Uncategorized`.
pub fn suggest_category(
    provider: &dyn SuggestionProvider,
    profile: &BusinessProfile,
    vendor: &str,
) -> Option<Category> {
    if !provider.is_enabled() {
        return None;
    }
    let prompt = build_prompt(profile, vendor);
    let category = match provider.suggest(&prompt) {
        Ok(reply) => reply.trim().parse::<Category>().unwrap_or_else(|_| {
            tracing::debug!(vendor, reply = reply.trim(), "suggestion outside category list");
            Category::Uncategorized
        }),
        Err(e) => {
            tracing::warn!(vendor, "category suggestion failed: {e:#}");
            Category::Uncategorized
        }
    };
    Some(category)
}

/// The provider for this build: an OpenAI-compatible chat endpoint when the
/// `suggest` feature is on and `OPENAI_API_KEY` is set, otherwise none.
#[cfg(feature = "suggest")]
pub fn default_provider() -> Box<dyn SuggestionProvider> {
    match openai::OpenAiSuggester::from_env() {
        Ok(Some(p)) => Box::new(p),
        Ok(None) => Box::new(NoSuggestions),
        Err(e) => {
            tracing::warn!("cannot set up suggestion provider: {e:#}");
            Box::new(NoSuggestions)
        }
    }
}

#[cfg(not(feature = "suggest"))]
pub fn default_provider() -> Box<dyn SuggestionProvider> {
    Box::new(NoSuggestions)
}

#[cfg(feature = "suggest")]
pub mod openai {
    use std::time::Duration;

    use anyhow::{Context, Result};
    use serde::{Deserialize, Serialize};

    use super::SuggestionProvider;

    pub struct OpenAiSuggester {
        client: reqwest::blocking::Client,
        api_key: String,
        model: String,
        endpoint: String,
    }

    impl OpenAiSuggester {
        pub fn from_env() -> Result<Option<Self>> {
            let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
                return Ok(None);
            };
            let base = std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
            let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .context("build HTTP client")?;
            Ok(Some(Self {
                client,
                api_key,
                model,
                endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            }))
        }
    }

    #[derive(Serialize)]
    struct Msg<'a> {
        role: &'a str,
        content: &'a str,
    }

    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        messages: Vec<Msg<'a>>,
    }

    #[derive(Deserialize)]
    struct Resp {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: RespMsg,
    }

    #[derive(Deserialize)]
    struct RespMsg {
        content: Option<String>,
    }

    impl SuggestionProvider for OpenAiSuggester {
        fn suggest(&self, prompt: &str) -> Result<String> {
            let body = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: prompt,
                }],
            };
            let resp: Resp = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .context("send completion request")?
                .error_for_status()
                .context("completion request rejected")?
                .json()
                .context("decode completion response")?;
            resp.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .context("completion response had no content")
        }
    }
}
