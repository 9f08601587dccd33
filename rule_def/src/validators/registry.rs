use crate::{CheckName, RuleError, Scalar};

/// The right-hand side of a named check, as handed to the registry and to message formatters.
#[derive(Debug)]
pub enum Operands<'a, T> {
    Items(&'a [T]),
    Ranges(&'a [[T; 2]]),
    /// Custom predicates and multi-check failures have no single operand set.
    None,
}

impl<T> Clone for Operands<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Operands<'_, T> {}

impl<T> Operands<'_, T> {
    pub fn is_empty(&self) -> bool {
        match self {
            Operands::Items(items) => items.is_empty(),
            Operands::Ranges(ranges) => ranges.is_empty(),
            Operands::None => true,
        }
    }
}

/// Runs one named check against `value`.
///
/// `starts_with`, `ends_with` and `contains` compare textual forms, so a number operand matches
/// on its decimal representation. Asking for a check the scalar kind cannot answer (`ranges` on
/// strings, or an operand shape that does not belong to the check) is a caller error.
pub fn evaluate_check<T: Scalar>(
    check: CheckName,
    value: &T,
    operands: Operands<'_, T>,
) -> Result<bool, RuleError> {
    match (check, operands) {
        (CheckName::Values, Operands::Items(items)) => Ok(items.contains(value)),
        (CheckName::StartsWith, Operands::Items(items)) => {
            let text = value.text();
            Ok(items.iter().any(|prefix| text.starts_with(&*prefix.text())))
        }
        (CheckName::EndsWith, Operands::Items(items)) => {
            let text = value.text();
            Ok(items.iter().any(|suffix| text.ends_with(&*suffix.text())))
        }
        (CheckName::Contains, Operands::Items(items)) => {
            let text = value.text();
            Ok(items.iter().any(|needle| text.contains(&*needle.text())))
        }
        (CheckName::Ranges, Operands::Ranges(ranges)) if T::SUPPORTS_RANGES => {
            Ok(ranges.iter().any(|range| value.in_range(range)))
        }
        (check, _) => Err(RuleError::UnsupportedCheck {
            check: check.to_string(),
            kind: T::KIND,
        }),
    }
}
