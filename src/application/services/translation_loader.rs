//! Language file loading with local and published fallbacks.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::ports::JsonFetchPort;

/// Key of the picker title.
pub const TITLE_KEY: &str = "title";
/// Key of the "every category" option label.
pub const DEFAULT_OPTION_KEY: &str = "default-option";

/// Loaded UI strings. Empty when no language file could be fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations {
    language: Option<String>,
    strings: HashMap<String, String>,
}

impl Translations {
    #[must_use]
    pub fn new(language: impl Into<String>, strings: HashMap<String, String>) -> Self {
        Self {
            language: Some(language.into()),
            strings,
        }
    }

    /// Language the strings were loaded for.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.strings
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get(TITLE_KEY)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Fetches `{base}/{lang}.json` from the local base, then the fallback base.
pub struct TranslationLoader {
    fetcher: Arc<dyn JsonFetchPort>,
    local_base: String,
    fallback_base: String,
    default_language: String,
}

impl TranslationLoader {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn JsonFetchPort>,
        local_base: impl Into<String>,
        fallback_base: impl Into<String>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            local_base: local_base.into(),
            fallback_base: fallback_base.into(),
            default_language: default_language.into(),
        }
    }

    /// Loads strings for `language`, falling back to the default language.
    ///
    /// Only the primary subtag is used: `fr-FR` and `fr_FR.UTF-8` load `fr`.
    pub async fn load(&self, language: &str) -> Translations {
        let language = primary_subtag(language);

        if let Some(translations) = self.load_language(&language).await {
            return translations;
        }

        let default = primary_subtag(&self.default_language);
        if default != language
            && let Some(translations) = self.load_language(&default).await
        {
            info!(requested = %language, language = %default, "Using default language");
            return translations;
        }

        warn!(language = %language, "Unable to load language files");
        Translations::default()
    }

    async fn load_language(&self, language: &str) -> Option<Translations> {
        for base in [&self.local_base, &self.fallback_base] {
            let url = format!("{}/{language}.json", base.trim_end_matches('/'));
            match self.fetcher.fetch_json(&url).await {
                Ok(Value::Object(map)) => {
                    let strings = map
                        .into_iter()
                        .filter_map(|(k, v)| match v {
                            Value::String(s) => Some((k, s)),
                            _ => None,
                        })
                        .collect();
                    debug!(url = %url, "Loaded language file");
                    return Some(Translations::new(language, strings));
                }
                Ok(_) => debug!(url = %url, "Language file is not an object"),
                Err(e) => debug!(error = %e, "Language file unavailable"),
            }
        }
        None
    }
}

/// Lower-cased primary language subtag.
#[must_use]
pub fn primary_subtag(language: &str) -> String {
    language
        .split(['-', '_', '.'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}
