use crate::validators::evaluator::{Evaluation, ResolvedList};
use crate::validators::registry::Operands;
use crate::{
    CheckName, Combination, ListRules, ListType, RuleError, Scalar, TraceEntry, ValidationResult,
    Validator,
};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

pub(crate) const DEFAULT_LABEL: &str = "Value";

type Formatter<T> = Arc<dyn Fn(&str, Operands<'_, T>) -> String + Send + Sync>;

/// Overrides the default failure message of a rule list.
///
/// A formatter receives the identifier of the decisive check (`"values"`, `"self_check_0"`,
/// ...) and that check's operands. When several checks failed together it receives `""` and
/// [`Operands::None`].
pub enum ErrorMessage<T> {
    Text(String),
    Formatter(Formatter<T>),
}

impl<T> ErrorMessage<T> {
    pub fn formatter(f: impl Fn(&str, Operands<'_, T>) -> String + Send + Sync + 'static) -> Self {
        ErrorMessage::Formatter(Arc::new(f))
    }

    fn render(&self, identifier: &str, operands: Operands<'_, T>) -> String {
        match self {
            ErrorMessage::Text(text) => text.clone(),
            ErrorMessage::Formatter(f) => f(identifier, operands),
        }
    }
}

impl<T> Clone for ErrorMessage<T> {
    fn clone(&self) -> Self {
        match self {
            ErrorMessage::Text(text) => ErrorMessage::Text(text.clone()),
            ErrorMessage::Formatter(f) => ErrorMessage::Formatter(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for ErrorMessage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ErrorMessage::Formatter(_) => f.write_str("Formatter(..)"),
        }
    }
}

impl<T> From<&str> for ErrorMessage<T> {
    fn from(text: &str) -> Self {
        ErrorMessage::Text(text.to_string())
    }
}

impl<T> From<String> for ErrorMessage<T> {
    fn from(text: String) -> Self {
        ErrorMessage::Text(text)
    }
}

impl<'de, T> Deserialize<'de> for ErrorMessage<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ErrorMessage::Text)
    }
}

/// One application of a rule list to a value.
pub struct ListOptions<'a, T> {
    /// Defaults to [`ListType::Whitelist`].
    pub list_type: Option<ListType>,
    pub list: Option<&'a ListRules<T>>,
    /// Subject of default messages. Defaults to `Value`.
    pub error_label: Option<&'a str>,
    pub error_message: Option<&'a ErrorMessage<T>>,
}

impl<T> Default for ListOptions<'_, T> {
    fn default() -> Self {
        Self {
            list_type: None,
            list: None,
            error_label: None,
            error_message: None,
        }
    }
}

impl<'a, T: Scalar> ListOptions<'a, T> {
    pub fn new(list: &'a ListRules<T>) -> Self {
        Self {
            list: Some(list),
            ..Default::default()
        }
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn list_type(mut self, list_type: ListType) -> Self {
        self.list_type = Some(list_type);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn error_label(mut self, label: &'a str) -> Self {
        self.error_label = Some(label);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn error_message(mut self, message: &'a ErrorMessage<T>) -> Self {
        self.error_message = Some(message);
        self
    }
}

impl<T: Scalar> Validator<T> for ListOptions<'_, T> {
    fn validate(&self, input: &T) -> Result<ValidationResult, RuleError> {
        validate_by_list(input, self)
    }
}

/// Applies a whitelist or blacklist to `value`.
///
/// A whitelist is satisfied when its checks pass under the list's combination; a blacklist is
/// violated in exactly that situation. A list with nothing to enforce, and an empty string
/// value, are always valid.
pub fn validate_by_list<T: Scalar>(
    value: &T,
    options: &ListOptions<'_, T>,
) -> Result<ValidationResult, RuleError> {
    let Some(rules) = options.list else {
        return Ok(ValidationResult::valid());
    };
    if value.is_empty_value() {
        return Ok(ValidationResult::valid());
    }

    let list_type = options.list_type.unwrap_or_default();
    let resolved = ResolvedList::resolve(rules, list_type);
    let evaluation = resolved.evaluate(value)?;

    let is_valid = evaluation.is_vacuous()
        || match list_type {
            ListType::Whitelist => evaluation.outcome,
            ListType::Blacklist => !evaluation.outcome,
        };
    if is_valid {
        return Ok(ValidationResult::valid().with_sequence(evaluation.trace));
    }

    let label = options.error_label.unwrap_or(DEFAULT_LABEL);
    let message = failure_message(&resolved, &evaluation, label, options.error_message);
    tracing::debug!(%list_type, %message, "value rejected by rule list");

    Ok(ValidationResult::invalid(message).with_sequence(evaluation.trace))
}

fn failure_message<T: Scalar>(
    resolved: &ResolvedList<'_, T>,
    evaluation: &Evaluation,
    label: &str,
    custom: Option<&ErrorMessage<T>>,
) -> String {
    let list_type = resolved.list_type;
    let not = list_type.negation();
    let decisive = matches!(
        (resolved.combination, list_type),
        (Combination::And, ListType::Whitelist) | (Combination::Or, ListType::Blacklist)
    );

    // A single check decided the outcome.
    if decisive && let Some(last) = evaluation.last_check() {
        return match last {
            TraceEntry::Named(check) => {
                let operands = resolved.rules.operands(check);
                match custom {
                    Some(message) => message.render(check.as_str(), operands),
                    None => format!(
                        "{label} should {not}{} {}",
                        check.phrase(),
                        decisive_operands(operands)
                    ),
                }
            }
            TraceEntry::SelfCheck(n) => match custom {
                Some(message) => message.render(&last.to_string(), Operands::None),
                None => format!("{label} should {not}pass self check {n}"),
            },
        };
    }

    // Every evaluated check contributed to the failure.
    if let Some(message) = custom {
        return message.render("", Operands::None);
    }
    let conditions: Vec<String> = evaluation
        .trace
        .iter()
        .map(|entry| match *entry {
            TraceEntry::Named(check) => {
                condition(check, resolved.rules.operands(check), list_type)
            }
            TraceEntry::SelfCheck(n) => format!("should {not}pass self check {n}"),
        })
        .collect();
    let joiner = match list_type {
        ListType::Whitelist => " or ",
        ListType::Blacklist => " and ",
    };
    format!("{label} {}", conditions.join(joiner))
}

/// `"a" or "b"` for strings, `1 or 2` for numbers, `1 - 10 or 20 - 30` for ranges.
fn decisive_operands<T: Scalar>(operands: Operands<'_, T>) -> String {
    match operands {
        Operands::Items(items) if T::QUOTE_DECISIVE => format!("\"{}\"", join_text(items, "\" or \"")),
        Operands::Items(items) => join_text(items, " or "),
        Operands::Ranges(ranges) => join_ranges(ranges),
        Operands::None => String::new(),
    }
}

fn condition<T: Scalar>(check: CheckName, operands: Operands<'_, T>, list_type: ListType) -> String {
    let not = list_type.negation();
    match operands {
        Operands::Ranges(ranges) => {
            format!("should {not}{} {}", check.phrase(), join_ranges(ranges))
        }
        Operands::Items(items) => {
            let separator = match list_type {
                ListType::Whitelist => "\", \"",
                ListType::Blacklist => "\" or \"",
            };
            format!("should {not}{} \"{}\"", check.phrase(), join_text(items, separator))
        }
        Operands::None => format!("should {not}{}", check.phrase()),
    }
}

fn join_text<T: Scalar>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.text())
        .collect::<Vec<_>>()
        .join(separator)
}

fn join_ranges<T: Scalar>(ranges: &[[T; 2]]) -> String {
    ranges
        .iter()
        .map(|[low, high]| format!("{} - {}", low.text(), high.text()))
        .collect::<Vec<_>>()
        .join(" or ")
}
