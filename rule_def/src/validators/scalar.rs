use crate::validators::by_list::{DEFAULT_LABEL, ErrorMessage, ListOptions, validate_by_list};
use crate::{ListRules, ListType, RuleError, Scalar, ValidationResult, Validator};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;

const DEFAULT_LIST_SEQUENCE: [ListType; 2] = [ListType::Whitelist, ListType::Blacklist];

/// Rules for a string value.
pub type StringRules = ScalarRules<String>;

/// Rules for a number value.
pub type NumberRules = ScalarRules<f64>;

/// Overrides for the messages produced by [`ScalarRules`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields, bound(deserialize = ""))]
pub struct ErrorMessages<T> {
    pub type_error: Option<String>,
    pub required_error: Option<String>,
    pub allowed_error: Option<String>,
    pub whitelist: Option<ErrorMessage<T>>,
    pub blacklist: Option<ErrorMessage<T>>,
}

impl<T> Default for ErrorMessages<T> {
    fn default() -> Self {
        Self {
            type_error: None,
            required_error: None,
            allowed_error: None,
            whitelist: None,
            blacklist: None,
        }
    }
}

impl<T> ErrorMessages<T> {
    fn for_list(&self, list_type: ListType) -> Option<&ErrorMessage<T>> {
        match list_type {
            ListType::Whitelist => self.whitelist.as_ref(),
            ListType::Blacklist => self.blacklist.as_ref(),
        }
    }
}

/// Presence checks plus a whitelist and a blacklist for one scalar value.
///
/// Validation runs the type check, then `required`, then `allowed`. An empty value that got
/// that far is valid. Otherwise the lists run in `validation_sequence` order (whitelist first
/// by default) and the first list that rejects the value decides the result.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields, bound(deserialize = "T: Deserialize<'de>"))]
pub struct ScalarRules<T> {
    /// An empty value is rejected.
    pub required: bool,
    /// When `false`, only an empty value is accepted.
    pub allowed: bool,
    pub whitelist: Option<ListRules<T>>,
    pub blacklist: Option<ListRules<T>>,
    pub validation_sequence: Option<Vec<ListType>>,
    pub error_label: Option<String>,
    pub error_messages: ErrorMessages<T>,
}

impl<T> Default for ScalarRules<T> {
    fn default() -> Self {
        Self {
            required: false,
            allowed: true,
            whitelist: None,
            blacklist: None,
            validation_sequence: None,
            error_label: None,
            error_messages: ErrorMessages::default(),
        }
    }
}

impl<T: Scalar> ScalarRules<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, RuleError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn allowed(mut self, allowed: bool) -> Self {
        self.allowed = allowed;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn whitelist(mut self, list: ListRules<T>) -> Self {
        self.whitelist = Some(list);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn blacklist(mut self, list: ListRules<T>) -> Self {
        self.blacklist = Some(list);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn sequence(mut self, list_types: impl IntoIterator<Item = ListType>) -> Self {
        self.validation_sequence = Some(list_types.into_iter().collect());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn error_label(mut self, label: impl Into<String>) -> Self {
        self.error_label = Some(label.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn type_error(mut self, message: impl Into<String>) -> Self {
        self.error_messages.type_error = Some(message.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn required_error(mut self, message: impl Into<String>) -> Self {
        self.error_messages.required_error = Some(message.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn allowed_error(mut self, message: impl Into<String>) -> Self {
        self.error_messages.allowed_error = Some(message.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn whitelist_message(mut self, message: impl Into<ErrorMessage<T>>) -> Self {
        self.error_messages.whitelist = Some(message.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn blacklist_message(mut self, message: impl Into<ErrorMessage<T>>) -> Self {
        self.error_messages.blacklist = Some(message.into());
        self
    }

    pub(crate) fn label<'a>(&'a self, default_label: &'a str) -> &'a str {
        self.error_label.as_deref().unwrap_or(default_label)
    }

    pub(crate) fn validate_labelled(
        &self,
        value: &T,
        default_label: &str,
    ) -> Result<ValidationResult, RuleError> {
        let label = self.label(default_label);
        if !value.is_well_formed() {
            return Ok(self.type_error_result(label));
        }
        if let Some(result) = self.check_presence(value.is_empty_value(), label) {
            return Ok(result);
        }
        self.validate_lists(value, label)
    }

    pub(crate) fn type_error_result(&self, label: &str) -> ValidationResult {
        ValidationResult::invalid(
            self.error_messages
                .type_error
                .clone()
                .unwrap_or_else(|| format!("{label} must be {}", T::TYPE_NAME)),
        )
    }

    /// Settles `required`, `allowed` and the empty value. `None` means the lists decide.
    pub(crate) fn check_presence(&self, is_empty: bool, label: &str) -> Option<ValidationResult> {
        if self.required && is_empty {
            let message = self.error_messages.required_error.clone();
            return Some(ValidationResult::invalid(
                message.unwrap_or_else(|| format!("{label} must not be empty")),
            ));
        }
        if !self.allowed && !is_empty {
            let message = self.error_messages.allowed_error.clone();
            return Some(ValidationResult::invalid(
                message.unwrap_or_else(|| format!("{label} must be empty")),
            ));
        }
        is_empty.then(ValidationResult::valid)
    }

    pub(crate) fn validate_lists(
        &self,
        value: &T,
        label: &str,
    ) -> Result<ValidationResult, RuleError> {
        let sequence = self
            .validation_sequence
            .as_deref()
            .unwrap_or(&DEFAULT_LIST_SEQUENCE);
        let mut seen = HashSet::new();

        for &list_type in sequence {
            let list = match list_type {
                ListType::Whitelist => self.whitelist.as_ref(),
                ListType::Blacklist => self.blacklist.as_ref(),
            };
            let Some(list) = list.filter(|list| !list.is_empty()) else {
                continue;
            };
            if !seen.insert(list_type) {
                continue;
            }

            let options = ListOptions {
                list_type: Some(list_type),
                list: Some(list),
                error_label: Some(label),
                error_message: self.error_messages.for_list(list_type),
            };
            let result = validate_by_list(value, &options)?;
            if !result.is_valid {
                return Ok(result);
            }
        }

        Ok(ValidationResult::valid())
    }
}

impl NumberRules {
    /// Validates a number given as text, e.g. a query-string value.
    ///
    /// Surrounding whitespace is ignored. Empty text goes through the presence checks like an
    /// empty string would; text that is not a number fails with the type error.
    pub fn validate_str(&self, text: &str) -> Result<ValidationResult, RuleError> {
        self.validate_text_labelled(text, DEFAULT_LABEL)
    }

    pub(crate) fn validate_text_labelled(
        &self,
        text: &str,
        default_label: &str,
    ) -> Result<ValidationResult, RuleError> {
        let text = text.trim();
        if text.is_empty() {
            let label = self.label(default_label);
            return Ok(self
                .check_presence(true, label)
                .unwrap_or_else(ValidationResult::valid));
        }
        match text.parse::<f64>() {
            Ok(number) => self.validate_labelled(&number, default_label),
            Err(_) => Ok(self.type_error_result(self.label(default_label))),
        }
    }
}

impl Validator<str> for StringRules {
    fn validate(&self, input: &str) -> Result<ValidationResult, RuleError> {
        self.validate_labelled(&input.to_string(), DEFAULT_LABEL)
    }
}

impl Validator<f64> for NumberRules {
    fn validate(&self, input: &f64) -> Result<ValidationResult, RuleError> {
        self.validate_labelled(input, DEFAULT_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckName, Combination};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presence_checks() {
        let required = StringRules::new().required(true);
        assert_eq!(
            required.validate("").unwrap(),
            ValidationResult::invalid("Value must not be empty")
        );
        assert!(required.is_valid("abc").unwrap());

        let forbidden = StringRules::new().allowed(false).error_label("Nickname");
        assert_eq!(
            forbidden.validate("abc").unwrap(),
            ValidationResult::invalid("Nickname must be empty")
        );
        assert!(forbidden.is_valid("").unwrap());

        let custom = StringRules::new()
            .required(true)
            .required_error("give me something");
        assert_eq!(
            custom.validate("").unwrap().error_message.as_deref(),
            Some("give me something")
        );
    }

    #[test]
    fn test_empty_value_skips_lists() {
        let rules = StringRules::new().whitelist(ListRules::new().values(["a"]));
        assert_eq!(rules.validate("").unwrap(), ValidationResult::valid());
    }

    #[test]
    fn test_whitelist_runs_before_blacklist() {
        let rules = StringRules::new()
            .error_label("Name")
            .whitelist(ListRules::new().starts_with(["ex"]))
            .blacklist(ListRules::new().values(["example"]));

        assert!(rules.is_valid("extra").unwrap());

        let result = rules.validate("other").unwrap();
        assert_eq!(
            result.error_message.as_deref(),
            Some(r#"Name should start with "ex""#)
        );

        let result = rules.validate("example").unwrap();
        assert_eq!(
            result.error_message.as_deref(),
            Some(r#"Name should not be "example""#)
        );

        let reversed = rules.clone().sequence([ListType::Blacklist, ListType::Whitelist]);
        let result = reversed.validate("example").unwrap();
        assert_eq!(result.sequence_names(), ["values"]);
    }

    #[test]
    fn test_list_type_sequence_is_deduplicated() {
        let rules = StringRules::new()
            .whitelist(ListRules::new().then_check(|v: &String| {
                // A second run would flip the answer.
                static CALLS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
                CALLS.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 && !v.is_empty()
            }))
            .sequence([ListType::Whitelist, ListType::Whitelist]);

        assert!(rules.is_valid("abc").unwrap());
    }

    #[test]
    fn test_per_list_messages() {
        let rules = StringRules::new()
            .whitelist(ListRules::new().values(["a"]))
            .blacklist(ListRules::new().contains(["b"]))
            .whitelist_message("not whitelisted")
            .blacklist_message(ErrorMessage::<String>::formatter(|identifier, _| {
                format!("blocked by {identifier}")
            }));

        assert_eq!(
            rules.validate("c").unwrap().error_message.as_deref(),
            Some("not whitelisted")
        );

        let rules = rules.whitelist(ListRules::new().values(["ab"]));
        assert_eq!(
            rules.validate("ab").unwrap().error_message.as_deref(),
            Some("blocked by contains")
        );
    }

    #[test]
    fn test_number_rules() {
        let rules = NumberRules::new().whitelist(
            ListRules::new()
                .combination(Combination::Or)
                .values([80.0, 443.0])
                .ranges([[8000, 8999]]),
        );

        assert!(rules.is_valid(&443.0).unwrap());
        assert!(rules.is_valid(&8080.0).unwrap());
        assert_eq!(
            rules.validate(&81.0).unwrap().error_message.as_deref(),
            Some(r#"Value should be "80", "443" or should be in range 8000 - 8999"#)
        );
        assert_eq!(
            rules.validate(&f64::NAN).unwrap(),
            ValidationResult::invalid("Value must be a number")
        );
    }

    #[test]
    fn test_number_from_text() {
        let rules = NumberRules::new()
            .error_label("Count")
            .whitelist(ListRules::new().ranges([[1, 10]]));

        assert!(rules.validate_str(" 7 ").unwrap().is_valid);
        assert!(rules.validate_str("").unwrap().is_valid);
        assert_eq!(
            rules.validate_str("seven").unwrap(),
            ValidationResult::invalid("Count must be a number")
        );
        assert_eq!(
            rules.validate_str("11").unwrap(),
            ValidationResult::invalid("Count should be in range 1 - 10")
                .with_sequence(vec![crate::TraceEntry::Named(CheckName::Ranges)])
        );
        assert_eq!(
            rules.clone().required(true).validate_str("  ").unwrap(),
            ValidationResult::invalid("Count must not be empty")
        );
    }

    #[test]
    fn test_from_json() {
        let rules = StringRules::from_json(
            r#"{
                "required": true,
                "error_label": "Host",
                "whitelist": {"ends_with": [".example.com"]},
                "blacklist": {"starts_with": ["admin."]},
                "validation_sequence": ["blacklist", "whitelist"],
                "error_messages": {"blacklist": "Host is reserved"}
            }"#,
        )
        .unwrap();

        assert!(rules.is_valid("www.example.com").unwrap());
        assert_eq!(
            rules.validate("admin.example.com").unwrap().error_message.as_deref(),
            Some("Host is reserved")
        );
        assert_eq!(
            rules.validate("").unwrap().error_message.as_deref(),
            Some("Host must not be empty")
        );

        let res = StringRules::from_json(r#"{"validation_sequence": ["greylist"]}"#);
        assert!(
            matches!(&res, Err(RuleError::InvalidOptions(message))
                if message.contains("list_type must be either 'whitelist' or 'blacklist'")),
            "Expected InvalidOptions error but got {:?}",
            &res
        );
    }
}
