/// Contract violations raised by the engine.
///
/// A value that simply does not satisfy its rules is never reported through this type; that
/// outcome is a [`ValidationResult`](crate::ValidationResult) with `is_valid == false`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Check '{check}' is not supported for {kind}")]
    UnsupportedCheck { check: String, kind: &'static str },
    #[error("list_type must be either 'whitelist' or 'blacklist', got '{0}'")]
    InvalidListType(String),
    #[error("Combination must be either \"AND\" or \"OR\", got '{0}'")]
    InvalidCombination(String),
    #[error("Unknown URL component '{0}'")]
    InvalidComponent(String),
    #[error("Value type {0} is not supported")]
    UnsupportedValueType(String),
    #[error("Malformed rule options: {0}")]
    InvalidOptions(String),
    #[error("Failed to decode query '{input}': {message}")]
    MalformedQuery { input: String, message: String },
    #[error("Failed to parse URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("Field '{0}' is defined twice")]
    DuplicateField(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(e: serde_json::Error) -> Self {
        RuleError::InvalidOptions(e.to_string())
    }
}
