//! Declarative whitelist/blacklist rules for strings, numbers, ports, query strings and URLs.
//!
//! A [`ListRules`] names the operands of a few checks (`values`, `starts_with`, `ends_with`,
//! `contains`, `ranges`) and how to combine them (`AND`/`OR`). Applied as a whitelist it
//! describes values that should match; applied as a blacklist, values that must not. The scalar
//! and composite rule sets build on it:
//!
//! ```
//! use easy_rules_def::prelude::*;
//!
//! let rules = StringRules::new()
//!     .required(true)
//!     .error_label("Host")
//!     .whitelist(ListRules::new().ends_with([".example.com"]))
//!     .blacklist(ListRules::new().starts_with(["admin."]));
//!
//! assert!(rules.is_valid("www.example.com").unwrap());
//!
//! let result = rules.validate("admin.example.com").unwrap();
//! assert_eq!(
//!     result.error_message.as_deref(),
//!     Some(r#"Host should not start with "admin.""#)
//! );
//! ```
//!
//! Failing values are reported through [`ValidationResult`]. A [`RuleError`] means the rules
//! themselves could not be applied.

extern crate self as easy_rules_def;

pub use errors::RuleError;
pub use types::{CheckName, Combination, ListType, Scalar, TraceEntry, ValidationResult};
pub use validators::Validator;
pub use validators::by_list::{ErrorMessage, ListOptions, validate_by_list};
pub use validators::evaluator::{Evaluation, ResolvedList};
pub use validators::list_rules::{ListRules, Predicate, SequenceEntry};
pub use validators::port::PortRules;
pub use validators::query::{
    KeyMessage, KeysConfig, QueryErrorMessages, QueryRules, ValueRules, ValueType,
};
pub use validators::record::{AsFieldInput, FieldInput, FieldRules, RecordRules, Validate};
pub use validators::registry::{Operands, evaluate_check};
pub use validators::scalar::{ErrorMessages, NumberRules, ScalarRules, StringRules};
pub use validators::url::{UrlComponent, UrlParts, UrlRules};
pub use easy_rules_macros::Validate;

pub mod prelude;

mod errors;
mod types;
mod validators;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_record() {
        #[derive(Debug, Validate)]
        struct Endpoint {
            #[rule(string = StringRules::new().required(true))]
            name: String,
            #[rule(port = PortRules::default())]
            port: u16,
            #[rule(url = UrlRules::new().protocol(
                StringRules::new().whitelist(ListRules::new().values(["https:"]))
            ))]
            callback: Option<String>,
            #[rule(number = NumberRules::new().whitelist(ListRules::new().ranges([[1, 10]])),
            name = "Retry count")]
            retries: i32,
            // Not validated.
            _comment: String,
        }

        let endpoint = Endpoint {
            name: "billing".to_string(),
            port: 8443,
            callback: None,
            retries: 3,
            _comment: String::new(),
        };
        assert_eq!(endpoint.validate().unwrap(), ValidationResult::valid());

        let endpoint = Endpoint {
            name: String::new(),
            ..endpoint
        };
        assert_eq!(
            endpoint.validate().unwrap(),
            ValidationResult::invalid("name must not be empty")
        );

        let endpoint = Endpoint {
            name: "billing".to_string(),
            callback: Some("http://example.com/hook".to_string()),
            ..endpoint
        };
        assert_eq!(
            endpoint.validate().unwrap().error_message.as_deref(),
            Some(r#"Protocol should be "https:""#)
        );

        let endpoint = Endpoint {
            callback: Some("https://example.com/hook".to_string()),
            retries: 11,
            ..endpoint
        };
        assert_eq!(
            endpoint.validate().unwrap().error_message.as_deref(),
            Some("Retry count should be in range 1 - 10")
        );
        assert!(!endpoint.is_valid().unwrap());
    }

    #[test]
    fn test_first_failing_field_wins() {
        #[derive(Validate)]
        struct Pair {
            #[rule(string = StringRules::new().whitelist(ListRules::new().values(["a"])))]
            first: &'static str,
            #[rule(string = StringRules::new().whitelist(ListRules::new().values(["b"])))]
            second: &'static str,
        }

        let result = Pair {
            first: "x",
            second: "y",
        }
        .validate()
        .unwrap();
        assert_eq!(
            result.error_message.as_deref(),
            Some(r#"first should be "a""#)
        );

        let result = Pair {
            first: "a",
            second: "y",
        }
        .validate()
        .unwrap();
        assert_eq!(
            result.error_message.as_deref(),
            Some(r#"second should be "b""#)
        );
    }

    #[test]
    fn test_explicit_error_label_beats_field_name() {
        #[derive(Validate)]
        struct Account {
            #[rule(string = StringRules::new().error_label("Username").required(true))]
            user: String,
        }

        let result = Account {
            user: String::new(),
        }
        .validate()
        .unwrap();
        assert_eq!(
            result,
            ValidationResult::invalid("Username must not be empty")
        );
    }

    #[test]
    fn test_type_mismatch() {
        #[derive(Validate)]
        struct Mismatch {
            #[rule(string = StringRules::new())]
            count: u32,
            #[rule(query = QueryRules::new())]
            query: f64,
        }

        let result = Mismatch {
            count: 3,
            query: 1.0,
        }
        .validate()
        .unwrap();
        assert_eq!(result, ValidationResult::invalid("count must be a string"));
    }

    #[test]
    fn test_record_rules_are_built_once() {
        #[derive(Validate)]
        struct Cached {
            #[rule(query = QueryRules::new().keys(KeysConfig::default().whitelist(["q"])))]
            query: String,
        }

        let first = Cached::record_rules().unwrap();
        let second = Cached::record_rules().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.fields().keys().copied().collect::<Vec<_>>(), ["query"]);
        assert!(matches!(first.find_field("query"), Some(FieldRules::Query(_))));

        let result = Cached {
            query: "?p=1".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(
            result,
            ValidationResult::invalid("Query key should be one of q")
        );
    }

    #[test]
    fn test_duplicate_field_names() {
        #[derive(Validate)]
        struct Clash {
            #[rule(string = StringRules::new(), name = "id")]
            _a: String,
            #[rule(number = NumberRules::new(), name = "id")]
            _b: f64,
        }

        let clash = Clash {
            _a: String::new(),
            _b: 0.0,
        };
        assert!(matches!(clash.validate(), Err(RuleError::DuplicateField(name)) if name == "id"));
        assert!(matches!(Clash::record_rules(), Err(RuleError::DuplicateField(_))));
    }
}
