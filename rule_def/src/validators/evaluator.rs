use crate::validators::registry::evaluate_check;
use crate::{Combination, ListRules, ListType, RuleError, Scalar, SequenceEntry, TraceEntry};
use std::borrow::Cow;
use std::collections::HashSet;

/// A rule list with every default materialized.
///
/// Defaults cascade (the combination depends on the list type, the sequence on the scalar
/// kind), so they are settled here once instead of inside the evaluation loop.
#[derive(Clone, Debug)]
pub struct ResolvedList<'a, T: Scalar> {
    pub list_type: ListType,
    pub combination: Combination,
    pub sequence: Cow<'a, [SequenceEntry<T>]>,
    pub rules: &'a ListRules<T>,
}

/// Raw result of running a sequence, before list-type polarity is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// `AND`: every evaluated check passed. `OR`: some evaluated check passed.
    /// Always `true` for a vacuous evaluation.
    pub outcome: bool,
    /// The checks that actually ran, in order.
    pub trace: Vec<TraceEntry>,
    /// Whether the loop stopped before exhausting the sequence.
    pub short_circuited: bool,
}

impl Evaluation {
    /// No check had anything to enforce.
    pub fn is_vacuous(&self) -> bool {
        self.trace.is_empty()
    }

    /// The check that decided a short-circuited evaluation.
    pub fn last_check(&self) -> Option<TraceEntry> {
        if self.short_circuited {
            self.trace.last().copied()
        } else {
            None
        }
    }
}

impl<'a, T: Scalar> ResolvedList<'a, T> {
    pub fn resolve(rules: &'a ListRules<T>, list_type: ListType) -> Self {
        let combination = rules
            .combination
            .unwrap_or_else(|| list_type.default_combination());
        let sequence = match rules.validation_sequence.as_deref() {
            Some(sequence) => Cow::Borrowed(sequence),
            None => Cow::Owned(
                T::DEFAULT_SEQUENCE
                    .iter()
                    .copied()
                    .map(SequenceEntry::Named)
                    .collect(),
            ),
        };
        Self {
            list_type,
            combination,
            sequence,
            rules,
        }
    }

    /// Runs the sequence against `value`.
    ///
    /// Named checks with no operands are skipped without leaving a trace, and a named check
    /// only runs the first time it appears. Custom predicates always run, each occurrence
    /// getting its own `self_check_<n>` identity. `AND` stops at the first failing check,
    /// `OR` at the first passing one.
    pub fn evaluate(&self, value: &T) -> Result<Evaluation, RuleError> {
        let mut outcome = match self.combination {
            Combination::And => true,
            Combination::Or => false,
        };
        let mut trace = Vec::new();
        let mut seen = HashSet::new();
        let mut self_checks = 0;
        let mut short_circuited = false;

        for entry in self.sequence.iter() {
            let (id, passed) = match entry {
                SequenceEntry::Named(check) => {
                    let operands = self.rules.operands(*check);
                    if operands.is_empty() || !seen.insert(*check) {
                        continue;
                    }
                    let id = TraceEntry::Named(*check);
                    trace.push(id);
                    (id, evaluate_check(*check, value, operands)?)
                }
                SequenceEntry::Custom(predicate) => {
                    let id = TraceEntry::SelfCheck(self_checks);
                    self_checks += 1;
                    trace.push(id);
                    (id, predicate.check(value))
                }
            };
            tracing::trace!(check = %id, passed, "check evaluated");

            match (self.combination, passed) {
                (Combination::And, false) => {
                    outcome = false;
                    short_circuited = true;
                    break;
                }
                (Combination::Or, true) => {
                    outcome = true;
                    short_circuited = true;
                    break;
                }
                _ => {}
            }
        }

        if trace.is_empty() {
            outcome = true;
        }
        if short_circuited {
            tracing::debug!(
                combination = %self.combination,
                trace = ?trace,
                "evaluation short-circuited"
            );
        }

        Ok(Evaluation {
            outcome,
            trace,
            short_circuited,
        })
    }
}
