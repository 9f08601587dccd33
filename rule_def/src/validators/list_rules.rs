use crate::validators::registry::Operands;
use crate::{CheckName, Combination, RuleError, Scalar};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

/// A caller-supplied check placed inside a `validation_sequence`.
///
/// The closure must be pure: the evaluator may call it any number of times and expects the
/// same answer for the same value.
pub struct Predicate<T>(Arc<dyn Fn(&T) -> bool + Send + Sync>);

impl<T> Predicate<T> {
    pub fn new(check: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    pub fn check(&self, value: &T) -> bool {
        (self.0)(value)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// One step of a `validation_sequence`.
#[derive(Clone, Debug)]
pub enum SequenceEntry<T> {
    Named(CheckName),
    Custom(Predicate<T>),
}

impl<T> SequenceEntry<T> {
    pub fn custom(check: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        SequenceEntry::Custom(Predicate::new(check))
    }
}

impl<T> From<CheckName> for SequenceEntry<T> {
    fn from(check: CheckName) -> Self {
        SequenceEntry::Named(check)
    }
}

// Rule documents can only name checks; predicates are attached in code.
impl<'de, T> Deserialize<'de> for SequenceEntry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        CheckName::deserialize(deserializer).map(SequenceEntry::Named)
    }
}

/// A whitelist or blacklist: operands for each named check plus how to combine them.
///
/// Whether the list is a whitelist or a blacklist is decided by whoever applies it
/// (see [`ListOptions`](crate::ListOptions)); the same `ListRules` can serve as either.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields, bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListRules<T> {
    /// Defaults to `AND` for whitelists and `OR` for blacklists.
    pub combination: Option<Combination>,
    /// Defaults to [`Scalar::DEFAULT_SEQUENCE`].
    pub validation_sequence: Option<Vec<SequenceEntry<T>>>,
    pub values: Vec<T>,
    pub starts_with: Vec<T>,
    pub ends_with: Vec<T>,
    pub contains: Vec<T>,
    /// Inclusive `[low, high]` bounds. Numbers only.
    pub ranges: Vec<[T; 2]>,
}

impl<T> Default for ListRules<T> {
    fn default() -> Self {
        Self {
            combination: None,
            validation_sequence: None,
            values: Vec::new(),
            starts_with: Vec::new(),
            ends_with: Vec::new(),
            contains: Vec::new(),
            ranges: Vec::new(),
        }
    }
}

impl<T: Scalar> ListRules<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a rule list from a JSON document such as
    /// `{"combination": "OR", "values": ["a"], "validation_sequence": ["values"]}`.
    pub fn from_json(json: &str) -> Result<Self, RuleError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn combination(mut self, combination: Combination) -> Self {
        self.combination = Some(combination);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn values<V: Into<T>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn starts_with<V: Into<T>>(mut self, prefixes: impl IntoIterator<Item = V>) -> Self {
        self.starts_with = prefixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn ends_with<V: Into<T>>(mut self, suffixes: impl IntoIterator<Item = V>) -> Self {
        self.ends_with = suffixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn contains<V: Into<T>>(mut self, needles: impl IntoIterator<Item = V>) -> Self {
        self.contains = needles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn ranges<V: Into<T>>(mut self, ranges: impl IntoIterator<Item = [V; 2]>) -> Self {
        self.ranges = ranges
            .into_iter()
            .map(|[low, high]| [low.into(), high.into()])
            .collect();
        self
    }

    /// Replaces the evaluation order.
    #[must_use = "builder methods must be chained or built"]
    pub fn sequence(mut self, entries: impl IntoIterator<Item = SequenceEntry<T>>) -> Self {
        self.validation_sequence = Some(entries.into_iter().collect());
        self
    }

    /// Appends a named check to the evaluation order.
    #[must_use = "builder methods must be chained or built"]
    pub fn then(mut self, check: CheckName) -> Self {
        self.validation_sequence
            .get_or_insert_with(Vec::new)
            .push(SequenceEntry::Named(check));
        self
    }

    /// Appends a custom predicate to the evaluation order.
    #[must_use = "builder methods must be chained or built"]
    pub fn then_check(mut self, check: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.validation_sequence
            .get_or_insert_with(Vec::new)
            .push(SequenceEntry::custom(check));
        self
    }

    pub fn operands(&self, check: CheckName) -> Operands<'_, T> {
        match check {
            CheckName::Values => Operands::Items(&self.values),
            CheckName::StartsWith => Operands::Items(&self.starts_with),
            CheckName::EndsWith => Operands::Items(&self.ends_with),
            CheckName::Contains => Operands::Items(&self.contains),
            CheckName::Ranges => Operands::Ranges(&self.ranges),
        }
    }

    /// `true` when the list has nothing to enforce: no operands and no custom predicates.
    pub fn is_empty(&self) -> bool {
        let has_predicates = self
            .validation_sequence
            .iter()
            .flatten()
            .any(|entry| matches!(entry, SequenceEntry::Custom(_)));
        !has_predicates
            && self.values.is_empty()
            && self.starts_with.is_empty()
            && self.ends_with.is_empty()
            && self.contains.is_empty()
            && self.ranges.is_empty()
    }
}
