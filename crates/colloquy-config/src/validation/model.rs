use crate::schema::ColloquyConfig;

use super::helpers::validate_range;

pub(crate) fn validate_model(errors: &mut Vec<String>, config: &ColloquyConfig) {
    validate_range(
        errors,
        "model.context_size",
        config.model.context_size,
        16,
        1_048_576,
    );
}
