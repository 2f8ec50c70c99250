use crate::domain::error::{AppError, Result};
use validator::{Validate, ValidationErrors};

/// Checks an input type before any network I/O. Field failures become a
/// single `ValidationError` with one "field: message" segment per problem.
pub fn validate_input<T: Validate>(input: &T) -> Result<()> {
    input
        .validate()
        .map_err(|errors| AppError::ValidationError(format_errors(&errors)))
}

fn format_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let mut parts = Vec::new();
    for (field, field_errors) in fields {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("invalid value ({})", error.code));
            parts.push(format!("{}: {}", field, message));
        }
    }
    parts.join("; ")
}
