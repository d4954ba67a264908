//! Prompt markers must be non-empty, and the three turn headers distinct,
//! otherwise impersonation checks would match the assistant's own header.

use crate::schema::ColloquyConfig;

use super::helpers::validate_non_empty;

pub(crate) fn validate_prompt(errors: &mut Vec<String>, config: &ColloquyConfig) {
    let prompt = &config.prompt;
    validate_non_empty(errors, "prompt.end_of_turn", &prompt.end_of_turn);
    validate_non_empty(errors, "prompt.system_header", &prompt.system_header);
    validate_non_empty(errors, "prompt.user_header", &prompt.user_header);
    validate_non_empty(errors, "prompt.assistant_header", &prompt.assistant_header);
    validate_non_empty(errors, "prompt.think_open", &prompt.think_open);
    validate_non_empty(errors, "prompt.think_close", &prompt.think_close);

    if let Some(leading) = &prompt.leading {
        validate_non_empty(errors, "prompt.leading", leading);
    }

    let headers = [
        &prompt.system_header,
        &prompt.user_header,
        &prompt.assistant_header,
    ];
    if headers[0] == headers[1] || headers[0] == headers[2] || headers[1] == headers[2] {
        errors.push("prompt headers must be distinct".into());
    }
}
