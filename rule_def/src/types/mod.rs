use crate::errors::RuleError;
use crate::impl_literal_enum;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt::{self, Debug, Display};

mod macros;

/// The bridge between a concrete value type and the check registry.
///
/// Rule lists are generic over the scalar they validate (`ListRules<String>`,
/// `ListRules<f64>`), so every check is specialized at compile time instead of inspecting the
/// value's type at runtime. The trait captures the few places where strings and numbers
/// genuinely differ:
///
/// 1.  **Textual form.** `starts_with`, `ends_with` and `contains` compare the decimal form of a
///     number (`123454321` starts with `123`), while strings compare themselves.
/// 2.  **Emptiness.** An empty string is "no value" for `required`/`allowed`; numbers are never
///     empty.
/// 3.  **Ranges.** Only numbers can be placed in an inclusive `[low, high]` range.
/// 4.  **Rendering.** Default error messages quote string operands (`"test"`) but print number
///     operands bare (`1234543212`).
pub trait Scalar: Clone + PartialEq + Debug + Display + Send + Sync + 'static {
    /// Used in `UnsupportedCheck` errors, e.g. "string values".
    const KIND: &'static str;
    /// Used in type errors, e.g. "Value must be a string".
    const TYPE_NAME: &'static str;
    /// The evaluation order when a rule list declares no `validation_sequence`.
    const DEFAULT_SEQUENCE: &'static [CheckName];
    const SUPPORTS_RANGES: bool;
    /// Whether a single decisive check renders its operands in double quotes.
    const QUOTE_DECISIVE: bool;

    fn text(&self) -> Cow<'_, str>;

    fn is_empty_value(&self) -> bool;

    /// `false` for values of the right Rust type that still cannot be validated (`NaN`).
    fn is_well_formed(&self) -> bool {
        true
    }

    /// Inclusive membership. Only consulted when `SUPPORTS_RANGES` is true.
    fn in_range(&self, range: &[Self; 2]) -> bool;
}

impl Scalar for String {
    const KIND: &'static str = "string values";
    const TYPE_NAME: &'static str = "a string";
    const DEFAULT_SEQUENCE: &'static [CheckName] = &[
        CheckName::Values,
        CheckName::StartsWith,
        CheckName::EndsWith,
        CheckName::Contains,
    ];
    const SUPPORTS_RANGES: bool = false;
    const QUOTE_DECISIVE: bool = true;

    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn in_range(&self, _range: &[Self; 2]) -> bool {
        false
    }
}

impl Scalar for f64 {
    const KIND: &'static str = "number values";
    const TYPE_NAME: &'static str = "a number";
    const DEFAULT_SEQUENCE: &'static [CheckName] = &[
        CheckName::Values,
        CheckName::StartsWith,
        CheckName::EndsWith,
        CheckName::Contains,
        CheckName::Ranges,
    ];
    const SUPPORTS_RANGES: bool = true;
    const QUOTE_DECISIVE: bool = false;

    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_empty_value(&self) -> bool {
        false
    }

    fn is_well_formed(&self) -> bool {
        !self.is_nan()
    }

    fn in_range(&self, range: &[Self; 2]) -> bool {
        range[0] <= *self && *self <= range[1]
    }
}

/// The named checks known to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckName {
    Values,
    StartsWith,
    EndsWith,
    Contains,
    Ranges,
}

impl_literal_enum!(CheckName, |s: &str| RuleError::UnsupportedCheck {
    check: s.to_string(),
    kind: "rule lists",
}, {
    Values => "values",
    StartsWith => "starts_with",
    EndsWith => "ends_with",
    Contains => "contains",
    Ranges => "ranges",
});

impl CheckName {
    /// The verb phrase used in default error messages.
    pub const fn phrase(&self) -> &'static str {
        match self {
            CheckName::Values => "be",
            CheckName::StartsWith => "start with",
            CheckName::EndsWith => "end with",
            CheckName::Contains => "contain",
            CheckName::Ranges => "be in range",
        }
    }
}

/// Polarity of a rule list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListType {
    /// The list describes values that should match.
    #[default]
    Whitelist,
    /// The list describes values that must not match.
    Blacklist,
}

impl_literal_enum!(ListType, |s: &str| RuleError::InvalidListType(s.to_string()), {
    Whitelist => "whitelist",
    Blacklist => "blacklist",
});

impl ListType {
    /// "must satisfy ALL whitelist conditions", "must violate AT LEAST ONE blacklist condition".
    pub const fn default_combination(&self) -> Combination {
        match self {
            ListType::Whitelist => Combination::And,
            ListType::Blacklist => Combination::Or,
        }
    }

    pub(crate) const fn negation(&self) -> &'static str {
        match self {
            ListType::Whitelist => "",
            ListType::Blacklist => "not ",
        }
    }
}

/// How the checks of one list are aggregated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Combination {
    And,
    Or,
}

impl_literal_enum!(Combination, |s: &str| RuleError::InvalidCombination(s.to_string()), {
    And => "AND",
    Or => "OR",
});

/// One check that actually ran during an evaluation.
///
/// Custom predicates have no name of their own and are identified by their position among
/// the predicates of the sequence (`self_check_0`, `self_check_1`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraceEntry {
    Named(CheckName),
    SelfCheck(usize),
}

impl Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEntry::Named(check) => Display::fmt(check, f),
            TraceEntry::SelfCheck(n) => write!(f, "self_check_{n}"),
        }
    }
}

impl Serialize for TraceEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The outcome of one validation call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_sequence: Option<Vec<TraceEntry>>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: Some(message.into()),
            actual_sequence: None,
        }
    }

    /// Attaches the evaluation trace. An empty trace is dropped.
    #[must_use]
    pub fn with_sequence(mut self, trace: Vec<TraceEntry>) -> Self {
        self.actual_sequence = (!trace.is_empty()).then_some(trace);
        self
    }

    /// The trace rendered as identifiers, e.g. `["values", "self_check_0"]`.
    pub fn sequence_names(&self) -> Vec<String> {
        self.actual_sequence
            .iter()
            .flatten()
            .map(ToString::to_string)
            .collect()
    }
}
