//! Configuration for the evidence pipeline and its collaborators.
//!
//! Configuration is constructed explicitly and passed in; there is no
//! global singleton. Backend selection is an exhaustive enum, and the
//! required variables for the selected backends are validated once at
//! startup. Validation reports *every* missing variable, not just the
//! first one found.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::{Error, Result};

/// Default result-cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default similarity threshold for the ticket adapter.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.2;

/// Default maximum number of similar incidents returned.
pub const DEFAULT_MAX_SIMILAR_INCIDENTS: usize = 5;

/// Incident-management backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    Mock,
    ServiceNow,
    Jira,
}

impl FromStr for ConnectorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(ConnectorType::Mock),
            "servicenow" => Ok(ConnectorType::ServiceNow),
            "jira" => Ok(ConnectorType::Jira),
            other => Err(Error::config(format!(
                "unknown connector type '{other}' (expected mock, servicenow or jira)"
            ))),
        }
    }
}

/// ServiceNow backend credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceNowCredentials {
    pub instance_url: String,
    pub username: String,
    pub api_token: String,
}

/// Jira Service Management backend credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraCredentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

/// Incident-management connector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Selected backend.
    pub connector_type: ConnectorType,
    /// Required when `connector_type` is `ServiceNow`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servicenow: Option<ServiceNowCredentials>,
    /// Required when `connector_type` is `Jira`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraCredentials>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connector_type: ConnectorType::Mock,
            servicenow: None,
            jira: None,
        }
    }
}

/// Knowledge-base backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSourceKind {
    Mock,
    Wiki,
}

impl FromStr for KnowledgeSourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(KnowledgeSourceKind::Mock),
            "wiki" => Ok(KnowledgeSourceKind::Wiki),
            other => Err(Error::config(format!(
                "unknown knowledge source '{other}' (expected mock or wiki)"
            ))),
        }
    }
}

/// Remote wiki knowledge-base credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiCredentials {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
}

/// Knowledge-base configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Selected knowledge source.
    pub source: KnowledgeSourceKind,
    /// Required when `source` is `Wiki`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki: Option<WikiCredentials>,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            source: KnowledgeSourceKind::Mock,
            wiki: None,
        }
    }
}

/// LLM collaborator provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Mock,
    OpenAi,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(LlmProvider::Mock),
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(Error::config(format!(
                "unknown llm provider '{other}' (expected mock, openai or ollama)"
            ))),
        }
    }
}

/// LLM collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Selected provider.
    pub provider: LlmProvider,
    /// Model name.
    pub model: String,
    /// Base URL for self-hosted providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API key, when the provider requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Mock,
            model: "gpt-3.5-turbo".to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.7,
        }
    }
}

/// Result-cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Time-to-live for cached evidence, in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Similarity-engine settings for the ticket adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilaritySettings {
    /// Minimum similarity score to count as a match.
    pub threshold: f64,
    /// Maximum number of similar incidents to return.
    pub max_results: usize,
}

impl Default for SimilaritySettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_results: DEFAULT_MAX_SIMILAR_INCIDENTS,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub similarity: SimilaritySettings,
}

impl Config {
    /// Load configuration from environment variables, validating the
    /// required variables for every selected backend.
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|name| std::env::var(name).ok())?;
        info!(
            connector = ?config.connector.connector_type,
            knowledge_source = ?config.knowledge_base.source,
            llm_provider = ?config.llm.provider,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Collects all missing required variables and reports them in a
    /// single configuration error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut missing: Vec<&'static str> = Vec::new();

        let mut require = |vars: &[&'static str], lookup: &dyn Fn(&str) -> Option<String>| {
            let mut values = Vec::with_capacity(vars.len());
            for var in vars {
                match lookup(var) {
                    Some(v) if !v.is_empty() => values.push(v),
                    _ => missing.push(var),
                }
            }
            values
        };

        let connector_type: ConnectorType = lookup("TRIAGE_CONNECTOR")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(ConnectorType::Mock);

        let connector = match connector_type {
            ConnectorType::Mock => ConnectorConfig::default(),
            ConnectorType::ServiceNow => {
                let values = require(
                    &[
                        "SERVICENOW_INSTANCE_URL",
                        "SERVICENOW_USERNAME",
                        "SERVICENOW_API_TOKEN",
                    ],
                    &lookup,
                );
                ConnectorConfig {
                    connector_type,
                    servicenow: values.try_into().ok().map(
                        |[instance_url, username, api_token]: [String; 3]| ServiceNowCredentials {
                            instance_url,
                            username,
                            api_token,
                        },
                    ),
                    jira: None,
                }
            }
            ConnectorType::Jira => {
                let values = require(&["JIRA_BASE_URL", "JIRA_EMAIL", "JIRA_API_TOKEN"], &lookup);
                ConnectorConfig {
                    connector_type,
                    servicenow: None,
                    jira: values.try_into().ok().map(
                        |[base_url, email, api_token]: [String; 3]| JiraCredentials {
                            base_url,
                            email,
                            api_token,
                        },
                    ),
                }
            }
        };

        let source: KnowledgeSourceKind = lookup("TRIAGE_KB_SOURCE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(KnowledgeSourceKind::Mock);

        let knowledge_base = match source {
            KnowledgeSourceKind::Mock => KnowledgeBaseConfig::default(),
            KnowledgeSourceKind::Wiki => {
                let values = require(
                    &["WIKI_BASE_URL", "WIKI_USERNAME", "WIKI_API_TOKEN"],
                    &lookup,
                );
                KnowledgeBaseConfig {
                    source,
                    wiki: values.try_into().ok().map(
                        |[base_url, username, api_token]: [String; 3]| WikiCredentials {
                            base_url,
                            username,
                            api_token,
                        },
                    ),
                }
            }
        };

        let provider: LlmProvider = lookup("TRIAGE_LLM_PROVIDER")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(LlmProvider::Mock);

        let llm = match provider {
            LlmProvider::Mock => LlmSettings::default(),
            LlmProvider::OpenAi => {
                let values = require(&["OPENAI_API_KEY"], &lookup);
                LlmSettings {
                    provider,
                    model: lookup("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                    base_url: None,
                    api_key: values.into_iter().next(),
                    temperature: 0.7,
                }
            }
            LlmProvider::Ollama => LlmSettings {
                provider,
                model: lookup("OLLAMA_MODEL").unwrap_or_else(|| "llama2".to_string()),
                base_url: Some(
                    lookup("OLLAMA_BASE_URL")
                        .unwrap_or_else(|| "http://localhost:11434".to_string()),
                ),
                api_key: None,
                temperature: 0.7,
            },
        };

        if !missing.is_empty() {
            return Err(Error::config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let ttl_secs = match lookup("TRIAGE_CACHE_TTL_SECS") {
            Some(v) => v
                .parse()
                .map_err(|_| Error::config(format!("TRIAGE_CACHE_TTL_SECS is not a number: {v}")))?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        Ok(Self {
            connector,
            knowledge_base,
            llm,
            cache: CacheSettings { ttl_secs },
            similarity: SimilaritySettings::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_to_mock_everywhere() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.connector.connector_type, ConnectorType::Mock);
        assert_eq!(config.knowledge_base.source, KnowledgeSourceKind::Mock);
        assert_eq!(config.llm.provider, LlmProvider::Mock);
        assert_eq!(config.cache.ttl_secs, DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn servicenow_reports_every_missing_variable() {
        let err = Config::from_lookup(lookup_from(&[("TRIAGE_CONNECTOR", "servicenow")]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SERVICENOW_INSTANCE_URL"));
        assert!(message.contains("SERVICENOW_USERNAME"));
        assert!(message.contains("SERVICENOW_API_TOKEN"));
    }

    #[test]
    fn partial_credentials_still_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("TRIAGE_CONNECTOR", "jira"),
            ("JIRA_BASE_URL", "https://example.atlassian.net"),
        ]))
        .unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("JIRA_BASE_URL"));
        assert!(message.contains("JIRA_EMAIL"));
        assert!(message.contains("JIRA_API_TOKEN"));
    }

    #[test]
    fn missing_variables_collected_across_backends() {
        let err = Config::from_lookup(lookup_from(&[
            ("TRIAGE_CONNECTOR", "servicenow"),
            ("TRIAGE_KB_SOURCE", "wiki"),
        ]))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SERVICENOW_INSTANCE_URL"));
        assert!(message.contains("WIKI_BASE_URL"));
    }

    #[test]
    fn valid_servicenow_config_loads() {
        let config = Config::from_lookup(lookup_from(&[
            ("TRIAGE_CONNECTOR", "servicenow"),
            ("SERVICENOW_INSTANCE_URL", "https://dev.service-now.com"),
            ("SERVICENOW_USERNAME", "triage"),
            ("SERVICENOW_API_TOKEN", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.connector.connector_type, ConnectorType::ServiceNow);
        let creds = config.connector.servicenow.unwrap();
        assert_eq!(creds.username, "triage");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err =
            Config::from_lookup(lookup_from(&[("TRIAGE_CONNECTOR", "bugzilla")])).unwrap_err();
        assert!(err.to_string().contains("unknown connector type"));
    }

    #[test]
    fn ollama_defaults_base_url() {
        let config =
            Config::from_lookup(lookup_from(&[("TRIAGE_LLM_PROVIDER", "ollama")])).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.llm.model, "llama2");
    }
}
