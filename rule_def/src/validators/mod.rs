use crate::{RuleError, ValidationResult};

pub(crate) mod by_list;
pub(crate) mod evaluator;
pub(crate) mod list_rules;
pub(crate) mod port;
pub(crate) mod query;
pub(crate) mod record;
pub(crate) mod registry;
pub(crate) mod scalar;
pub(crate) mod url;

/// A rule set that can judge an input of type `I`.
///
/// Implementations must be `Send + Sync` so that rule sets can be shared between threads and
/// stored in a static `Lazy` cell.
///
/// A value that fails its rules is reported as `Ok` with `is_valid == false`; `Err` is
/// reserved for rule sets that cannot be applied at all.
pub trait Validator<I: ?Sized>: Send + Sync {
    fn validate(&self, input: &I) -> Result<ValidationResult, RuleError>;

    /// Boolean shortcut for [`Validator::validate`].
    fn is_valid(&self, input: &I) -> Result<bool, RuleError> {
        self.validate(input).map(|result| result.is_valid)
    }
}
