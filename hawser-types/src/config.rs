//! Session configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{BoundaryEnum, HawserError, Language};

/// Default HTTP endpoint.
pub const DEFAULT_HTTP_URL: &str = "https://openapi.longportapp.com";
/// Default trade stream endpoint.
pub const DEFAULT_TRADE_WS_URL: &str = "wss://openapi-trade.longportapp.com";

const ENV_APP_KEY: &str = "HAWSER_APP_KEY";
const ENV_APP_SECRET: &str = "HAWSER_APP_SECRET";
const ENV_ACCESS_TOKEN: &str = "HAWSER_ACCESS_TOKEN";
const ENV_HTTP_URL: &str = "HAWSER_HTTP_URL";
const ENV_TRADE_WS_URL: &str = "HAWSER_TRADE_WS_URL";
const ENV_LANGUAGE: &str = "HAWSER_LANGUAGE";

/// Credentials, endpoints and language preference for one session.
///
/// A `Config` is built once and never mutated afterwards; sessions hold it behind an `Arc`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    app_key: String,
    app_secret: String,
    access_token: String,
    http_url: String,
    trade_ws_url: String,
    #[serde(default)]
    language: Language,
}

impl Config {
    /// Create a new `Config` with default endpoints and `Language::EN`.
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            access_token: access_token.into(),
            http_url: DEFAULT_HTTP_URL.to_string(),
            trade_ws_url: DEFAULT_TRADE_WS_URL.to_string(),
            language: Language::default(),
        }
    }

    /// Create a new `Config` where every optional field may be omitted.
    ///
    /// This is the shape of the boundary constructor: absent values take their defaults.
    pub fn with_options(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        access_token: impl Into<String>,
        http_url: Option<&str>,
        trade_ws_url: Option<&str>,
        language: Option<Language>,
    ) -> Self {
        let mut config = Self::new(app_key, app_secret, access_token);
        if let Some(url) = http_url {
            config = config.http_url(url);
        }
        if let Some(url) = trade_ws_url {
            config = config.trade_ws_url(url);
        }
        if let Some(language) = language {
            config = config.language(language);
        }
        config
    }

    /// Create a new `Config` from the process environment.
    ///
    /// A `.env` file in the current directory is loaded first, if present.
    ///
    /// # Variables
    ///
    /// - `HAWSER_APP_KEY` - App key (required)
    /// - `HAWSER_APP_SECRET` - App secret (required)
    /// - `HAWSER_ACCESS_TOKEN` - Access token (required)
    /// - `HAWSER_HTTP_URL` - HTTP endpoint url (Default: `https://openapi.longportapp.com`)
    /// - `HAWSER_TRADE_WS_URL` - Trade websocket endpoint url (Default:
    ///   `wss://openapi-trade.longportapp.com`)
    /// - `HAWSER_LANGUAGE` - `zh-CN`, `zh-HK` or `en` (Default: `en`)
    ///
    /// # Errors
    /// `MissingCredential` if a required variable is absent or empty, `InvalidConfig` if the
    /// language or an URL is malformed, or if a `.env` file exists but cannot be read.
    pub fn from_env() -> Result<Self, HawserError> {
        check_dotenv(dotenvy::dotenv().map(drop))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup` instead of the environment.
    ///
    /// # Errors
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HawserError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| HawserError::missing_credential(key))
        };

        let mut config = Self::new(
            required(ENV_APP_KEY)?,
            required(ENV_APP_SECRET)?,
            required(ENV_ACCESS_TOKEN)?,
        );
        if let Some(url) = lookup(ENV_HTTP_URL) {
            config = config.http_url(url);
        }
        if let Some(url) = lookup(ENV_TRADE_WS_URL) {
            config = config.trade_ws_url(url);
        }
        if let Some(language) = lookup(ENV_LANGUAGE) {
            let language = Language::from_name(language.trim()).map_err(|_| {
                HawserError::invalid_config(format!("{ENV_LANGUAGE}: unsupported language `{language}`"))
            })?;
            config = config.language(language);
        }

        config.validate()?;
        Ok(config)
    }

    /// Specifies the url of the OpenAPI server.
    ///
    /// Default: `https://openapi.longportapp.com`
    #[must_use]
    pub fn http_url(self, url: impl Into<String>) -> Self {
        Self {
            http_url: url.into(),
            ..self
        }
    }

    /// Specifies the url of the trade websocket server.
    ///
    /// Default: `wss://openapi-trade.longportapp.com`
    #[must_use]
    pub fn trade_ws_url(self, url: impl Into<String>) -> Self {
        Self {
            trade_ws_url: url.into(),
            ..self
        }
    }

    /// Specifies the language
    ///
    /// Default: `Language::EN`
    #[must_use]
    pub fn language(self, language: Language) -> Self {
        Self { language, ..self }
    }

    /// Check that credentials are present and both endpoints are usable URLs.
    ///
    /// # Errors
    /// `MissingCredential` for an empty credential, `InvalidConfig` for a bad endpoint.
    pub fn validate(&self) -> Result<(), HawserError> {
        for (field, value) in [
            ("app_key", &self.app_key),
            ("app_secret", &self.app_secret),
            ("access_token", &self.access_token),
        ] {
            if value.trim().is_empty() {
                return Err(HawserError::missing_credential(field));
            }
        }
        check_url("http_url", &self.http_url, &["http", "https"])?;
        check_url("trade_ws_url", &self.trade_ws_url, &["ws", "wss"])?;
        Ok(())
    }

    /// App key.
    #[must_use]
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// App secret.
    #[must_use]
    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    /// Access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// HTTP endpoint.
    #[must_use]
    pub fn http_endpoint(&self) -> &str {
        &self.http_url
    }

    /// Trade stream endpoint.
    #[must_use]
    pub fn trade_ws_endpoint(&self) -> &str {
        &self.trade_ws_url
    }

    /// Language preference.
    #[must_use]
    pub const fn preferred_language(&self) -> Language {
        self.language
    }

    /// Value for the `Accept-Language` header.
    #[must_use]
    pub fn accept_language(&self) -> &'static str {
        self.language.as_str()
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn check_dotenv(loaded: Result<(), dotenvy::Error>) -> Result<(), HawserError> {
    match loaded {
        Err(e) if !e.not_found() => Err(HawserError::invalid_config(format!(".env: {e}"))),
        _ => Ok(()),
    }
}

fn check_url(field: &str, raw: &str, schemes: &[&str]) -> Result<(), HawserError> {
    let url = Url::parse(raw)
        .map_err(|e| HawserError::invalid_config(format!("{field}: `{raw}` is not a valid url: {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(HawserError::invalid_config(format!(
            "{field}: scheme `{}` not allowed, expected one of {schemes:?}",
            url.scheme()
        )));
    }
    Ok(())
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("http_url", &self.http_url)
            .field("trade_ws_url", &self.trade_ws_url)
            .field("language", &self.language)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dotenv_is_ignored_but_malformed_is_reported() {
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(check_dotenv(Err(dotenvy::Error::Io(missing))), Ok(()));
        assert_eq!(check_dotenv(Ok(())), Ok(()));

        let err = check_dotenv(Err(dotenvy::Error::LineParse("KEY VALUE".into(), 3))).unwrap_err();
        assert!(matches!(err, HawserError::InvalidConfig(_)));

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(check_dotenv(Err(dotenvy::Error::Io(denied))).is_err());
    }
}
