//! Unit tests for [`RunConfig`](crate::config::RunConfig) and its helpers.
//!
//! Scenarios: from_lookup with/without keys, Azure selection, MCP target selection,
//! numeric overrides, apply_options, header parsing. Variables come from a map so tests
//! never touch the process environment.

use std::collections::HashMap;
use std::time::Duration;

use mcpbridge::{McpTarget, ToolChoiceMode};

use crate::config::{parse_headers, LlmConfig, RunConfig, RunOptions, ToolSourceConfig};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

/// **Scenario**: Without any LLM key, loading fails and names OPENAI_API_KEY.
#[test]
fn from_lookup_fails_when_api_key_is_missing() {
    let err = RunConfig::from_lookup(lookup(&[])).unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"), "{}", err);
}

/// **Scenario**: With only OPENAI_API_KEY, defaults apply: stdio `python3 src/server.py`,
/// gpt-4o-mini, temperature 0, 10 iterations, no retries.
#[test]
fn from_lookup_defaults() {
    let config = RunConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
    assert_eq!(
        config.tool_source,
        ToolSourceConfig::Stdio {
            command: "python3".into(),
            args: vec!["src/server.py".into()],
        }
    );
    assert_eq!(
        config.llm,
        LlmConfig::OpenAi {
            api_base: "https://api.openai.com/v1".into(),
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
        }
    );
    assert_eq!(config.temperature, 0.0);
    assert_eq!(config.max_iterations, 10);
    assert_eq!(config.tool_retries, 0);
    assert_eq!(config.tool_call_timeout, Duration::from_secs(60));
    assert!(!config.verbose);
}

/// **Scenario**: AZURE_OPENAI_ENDPOINT selects Azure and needs key and deployment.
#[test]
fn azure_endpoint_selects_azure_backend() {
    let config = RunConfig::from_lookup(lookup(&[
        ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
        ("AZURE_OPENAI_API_KEY", "az-key"),
        ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o"),
    ]))
    .unwrap();
    assert_eq!(
        config.llm,
        LlmConfig::Azure {
            endpoint: "https://res.openai.azure.com".into(),
            api_key: "az-key".into(),
            deployment: "gpt-4o".into(),
            api_version: "2024-02-15-preview".into(),
        }
    );
    assert_eq!(config.llm.backend_name(), "azure");
    assert_eq!(config.llm.model(), "gpt-4o");

    let err = RunConfig::from_lookup(lookup(&[
        ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
        ("AZURE_OPENAI_API_KEY", "az-key"),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("AZURE_OPENAI_DEPLOYMENT_NAME"), "{}", err);
}

#[test]
fn server_url_selects_http_with_headers() {
    let config = RunConfig::from_lookup(lookup(&[
        ("OPENAI_API_KEY", "sk-test"),
        ("MCP_SERVER_URL", "http://localhost:8000/mcptest"),
        ("MCP_HEADERS", "x-api-key=secret, x-team = tools"),
        ("MCP_SERVER_COMMAND", "ignored"),
    ]))
    .unwrap();
    assert_eq!(
        config.tool_source.to_target(),
        McpTarget::Http {
            url: "http://localhost:8000/mcptest".into(),
            headers: vec![
                ("x-api-key".into(), "secret".into()),
                ("x-team".into(), "tools".into()),
            ],
        }
    );
}

/// **Scenario**: Loop settings are read from env; unparsable values fall back to defaults.
#[test]
fn numeric_settings_and_fallbacks() {
    let config = RunConfig::from_lookup(lookup(&[
        ("OPENAI_API_KEY", "sk-test"),
        ("MAX_ITERATIONS", "3"),
        ("TOOL_RETRIES", "2"),
        ("TOOL_RETRY_BACKOFF_MS", "250"),
        ("TOOL_CALL_TIMEOUT_SECS", "not-a-number"),
        ("OPENAI_TEMPERATURE", "0.7"),
        ("OPENAI_TOOL_CHOICE", "required"),
    ]))
    .unwrap();
    assert_eq!(config.max_iterations, 3);
    assert_eq!(config.tool_retries, 2);
    assert_eq!(config.tool_retry_backoff, Duration::from_millis(250));
    assert_eq!(config.tool_call_timeout, Duration::from_secs(60));
    assert_eq!(config.temperature, 0.7);
    assert_eq!(config.tool_choice, Some(ToolChoiceMode::Required));

    let agent = config.to_agent_config();
    assert_eq!(agent.orchestrator.max_iterations, 3);
    assert_eq!(agent.orchestrator.retry.max_retries, 2);
    assert_eq!(agent.session.call_timeout, Duration::from_secs(60));
    assert_eq!(agent.session.discovery_timeout, Duration::from_secs(60));
}

/// **Scenario**: CLI flags override env; --url keeps env headers, --command switches to stdio.
#[test]
fn apply_options_overrides() {
    let mut config = RunConfig::from_lookup(lookup(&[
        ("OPENAI_API_KEY", "sk-test"),
        ("MCP_SERVER_URL", "http://env/mcp"),
        ("MCP_HEADERS", "k=v"),
    ]))
    .unwrap();
    config.apply_options(&RunOptions {
        url: Some("http://flag/mcp".into()),
        max_iterations: Some(0),
        verbose: true,
        ..Default::default()
    });
    assert_eq!(
        config.tool_source,
        ToolSourceConfig::Http {
            url: "http://flag/mcp".into(),
            headers: vec![("k".into(), "v".into())],
        }
    );
    assert_eq!(config.max_iterations, 1);
    assert!(config.verbose);

    config.apply_options(&RunOptions {
        command: Some("uv".into()),
        args: vec!["run".into(), "server.py".into()],
        ..Default::default()
    });
    assert_eq!(
        config.tool_source.to_target(),
        McpTarget::stdio("uv", vec!["run".into(), "server.py".into()])
    );
    assert!(!config.verbose);
}

#[test]
fn parse_headers_skips_malformed_entries() {
    assert_eq!(
        parse_headers("a=1,broken,=2, b = x=y "),
        vec![("a".to_string(), "1".to_string()), ("b".to_string(), "x=y".to_string())]
    );
    assert!(parse_headers("").is_empty());
}
