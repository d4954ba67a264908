//! Sampling parameter ranges and the per-turn token budget.

use crate::schema::ColloquyConfig;

use super::helpers::{validate_non_empty, validate_range, validate_range_f32};

pub(crate) fn validate_generation(errors: &mut Vec<String>, config: &ColloquyConfig) {
    let generation = &config.generation;
    validate_range(
        errors,
        "generation.max_new_tokens",
        generation.max_new_tokens,
        1,
        u32::MAX,
    );
    validate_range_f32(
        errors,
        "generation.temperature",
        generation.temperature,
        0.0,
        2.0,
    );
    validate_range_f32(errors, "generation.top_p", generation.top_p, 0.0, 1.0);
    validate_range(errors, "generation.top_k", generation.top_k, 0, 1000);
    if let Some(grammar) = &generation.grammar {
        validate_non_empty(errors, "generation.grammar", grammar);
    }
}
