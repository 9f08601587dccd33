//! The `easy_rules_def` prelude.

pub use crate::errors::RuleError;
pub use crate::types::{CheckName, Combination, ListType, TraceEntry, ValidationResult};
pub use crate::validators::Validator;
pub use crate::validators::by_list::{ErrorMessage, ListOptions};
pub use crate::validators::list_rules::{ListRules, SequenceEntry};
pub use crate::validators::port::PortRules;
pub use crate::validators::query::{KeyMessage, KeysConfig, QueryErrorMessages, QueryRules};
pub use crate::validators::record::{FieldRules, Validate};
pub use crate::validators::scalar::{NumberRules, StringRules};
pub use crate::validators::url::{UrlComponent, UrlRules};
pub use easy_rules_macros::Validate;
