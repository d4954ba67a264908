//! Tests for the full validation pipeline.

use super::*;

#[test]
fn default_config_validates() {
    assert!(validate(&ColloquyConfig::default()).is_ok());
}

#[test]
fn catches_context_size_too_small() {
    let mut config = ColloquyConfig::default();
    config.model.context_size = 8;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("model.context_size"));
}

#[test]
fn catches_zero_max_new_tokens() {
    let mut config = ColloquyConfig::default();
    config.generation.max_new_tokens = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("generation.max_new_tokens"));
}

#[test]
fn catches_sampling_out_of_range() {
    let mut config = ColloquyConfig::default();
    config.generation.temperature = 3.5;
    config.generation.top_p = -0.1;
    config.generation.top_k = 5000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("generation.temperature"));
    assert!(err.contains("generation.top_p"));
    assert!(err.contains("generation.top_k"));
}

#[test]
fn grammar_is_optional_but_not_empty() {
    let mut config = ColloquyConfig::default();
    config.generation.grammar = Some("root ::= \"si\" | \"no\"".into());
    assert!(validate(&config).is_ok());

    config.generation.grammar = Some(String::new());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("generation.grammar"));
}

#[test]
fn catches_nan_temperature() {
    let mut config = ColloquyConfig::default();
    config.generation.temperature = f32::NAN;
    assert!(validate(&config).is_err());
}

#[test]
fn catches_empty_markers() {
    let mut config = ColloquyConfig::default();
    config.prompt.end_of_turn.clear();
    config.prompt.leading = Some(String::new());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("prompt.end_of_turn must not be empty"));
    assert!(err.contains("prompt.leading must not be empty"));
}

#[test]
fn catches_duplicate_headers() {
    let mut config = ColloquyConfig::default();
    config.prompt.user_header = config.prompt.assistant_header.clone();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("headers must be distinct"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = ColloquyConfig::default();
    config.model.context_size = 1;
    config.generation.top_k = 2000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains(';'));
}
