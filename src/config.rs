//! Environment-driven configuration
//!
//! Read once at startup (after `.env` is loaded) and handed to the stores
//! and the chat client.

use std::env;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://mobility-coach.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CHAT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_CHAT_MAX_TOKENS: u32 = 500;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {value}")]
  InvalidValue { name: &'static str, value: String },
}

/// Settings for the upstream chat-completion service
#[derive(Debug, Clone)]
pub struct ChatConfig {
  /// `None` is allowed here; requests fail with `MissingApiKey`
  pub api_key: Option<String>,
  /// Always ends with '/' so relative joins keep the path
  pub api_base: Url,
  pub model: String,
  pub max_tokens: u32,
}

impl ChatConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let base = env::var("CHAT_API_BASE").unwrap_or_else(|_| DEFAULT_CHAT_API_BASE.to_string());

    Ok(Self {
      api_key,
      api_base: parse_base_url(&base)?,
      model: env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
      max_tokens: parse_var("CHAT_MAX_TOKENS", DEFAULT_CHAT_MAX_TOKENS)?,
    })
  }

  /// Config pointed at an arbitrary base url (mock servers, proxies)
  pub fn with_base(api_key: Option<String>, base: &str) -> Result<Self, ConfigError> {
    Ok(Self {
      api_key,
      api_base: parse_base_url(base)?,
      model: DEFAULT_CHAT_MODEL.to_string(),
      max_tokens: DEFAULT_CHAT_MAX_TOKENS,
    })
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub max_connections: u32,
  pub chat: ChatConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Ok(Self {
      database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
      max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
      chat: ChatConfig::from_env()?,
    })
  }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
  match env::var(name) {
    Ok(value) => value
      .trim()
      .parse()
      .map_err(|_| ConfigError::InvalidValue { name, value }),
    Err(_) => Ok(default),
  }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
  let mut base = raw.trim().to_string();
  if !base.ends_with('/') {
    base.push('/');
  }
  Url::parse(&base).map_err(|_| ConfigError::InvalidValue {
    name: "CHAT_API_BASE",
    value: raw.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const VARS: [&str; 6] = [
    "DATABASE_URL",
    "DB_MAX_CONNECTIONS",
    "OPENAI_API_KEY",
    "CHAT_API_BASE",
    "CHAT_MODEL",
    "CHAT_MAX_TOKENS",
  ];

  fn unset_all() -> Vec<(&'static str, Option<&'static str>)> {
    VARS.iter().map(|name| (*name, None)).collect()
  }

  #[test]
  #[serial]
  fn test_defaults_when_unset() {
    temp_env::with_vars(unset_all(), || {
      let config = AppConfig::from_env().unwrap();
      assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
      assert_eq!(config.max_connections, 5);
      assert!(config.chat.api_key.is_none());
      assert_eq!(config.chat.api_base.as_str(), "https://api.openai.com/v1/");
      assert_eq!(config.chat.model, "gpt-3.5-turbo");
      assert_eq!(config.chat.max_tokens, 500);
    });
  }

  #[test]
  #[serial]
  fn test_overrides_from_env() {
    temp_env::with_vars(
      [
        ("DATABASE_URL", Some("sqlite::memory:")),
        ("DB_MAX_CONNECTIONS", Some("2")),
        ("OPENAI_API_KEY", Some("sk-test")),
        ("CHAT_API_BASE", Some("http://localhost:9999/v1/")),
        ("CHAT_MODEL", Some("gpt-4o-mini")),
        ("CHAT_MAX_TOKENS", Some("800")),
      ],
      || {
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.chat.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.chat.api_base.as_str(), "http://localhost:9999/v1/");
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert_eq!(config.chat.max_tokens, 800);
      },
    );
  }

  #[test]
  #[serial]
  fn test_blank_api_key_is_missing() {
    temp_env::with_vars([("OPENAI_API_KEY", Some("  "))], || {
      assert!(ChatConfig::from_env().unwrap().api_key.is_none());
    });
  }

  #[test]
  #[serial]
  fn test_invalid_number_is_rejected() {
    temp_env::with_vars([("DB_MAX_CONNECTIONS", Some("lots"))], || {
      let err = AppConfig::from_env().unwrap_err();
      assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    });
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let chat = ChatConfig::with_base(None, "http://127.0.0.1:1234").unwrap();
    assert_eq!(chat.api_base.join("chat/completions").unwrap().as_str(), "http://127.0.0.1:1234/chat/completions");
    assert!(ChatConfig::with_base(None, "not a url").is_err());
  }
}
