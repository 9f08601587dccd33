use crate::{
    NumberRules, PortRules, QueryRules, RuleError, StringRules, UrlRules, ValidationResult,
    Validator,
};
use indexmap::IndexMap;

/// A struct whose fields carry `#[rule(...)]` attributes.
///
/// Implemented by `#[derive(Validate)]`; the rules are built once on first use.
pub trait Validate {
    /// The contract for getting the rules of every annotated field.
    fn record_rules() -> Result<&'static RecordRules, RuleError>;

    /// Validates annotated fields in declaration order and returns the first failure.
    fn validate(&self) -> Result<ValidationResult, RuleError>;

    fn is_valid(&self) -> Result<bool, RuleError> {
        self.validate().map(|result| result.is_valid)
    }
}

/// The rules attached to one field.
#[derive(Clone, Debug)]
pub enum FieldRules {
    String(StringRules),
    Number(NumberRules),
    Port(PortRules),
    Query(QueryRules),
    Url(UrlRules),
}

impl FieldRules {
    /// Checks one field value. `label` is used when the rules carry no `error_label`.
    pub fn check(&self, label: &str, input: FieldInput<'_>) -> Result<ValidationResult, RuleError> {
        match (self, input) {
            (FieldRules::Url(_), FieldInput::Absent) => Ok(ValidationResult::valid()),
            (rules, FieldInput::Absent) => rules.check(label, FieldInput::Text("")),

            (FieldRules::String(rules), FieldInput::Text(text)) => {
                rules.validate_labelled(&text.to_string(), label)
            }
            (FieldRules::Number(rules), FieldInput::Text(text)) => {
                rules.validate_text_labelled(text, label)
            }
            (FieldRules::Port(rules), FieldInput::Text(text)) => {
                rules.validate_text_labelled(text, label)
            }
            (FieldRules::Query(rules), FieldInput::Text(text)) => rules.validate(text),
            (FieldRules::Url(rules), FieldInput::Text(text)) => rules.validate(text),

            (FieldRules::Number(rules), FieldInput::Number(number)) => {
                rules.validate_labelled(&number, label)
            }
            (FieldRules::Port(rules), FieldInput::Number(number)) => {
                rules.validate_number_labelled(number, label)
            }
            (FieldRules::String(rules), FieldInput::Number(_)) => {
                Ok(rules.type_error_result(rules.label(label)))
            }
            (FieldRules::Query(_) | FieldRules::Url(_), FieldInput::Number(_)) => {
                Ok(ValidationResult::invalid(format!("{label} must be a string")))
            }
        }
    }
}

/// A field value as seen by its rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldInput<'a> {
    Text(&'a str),
    Number(f64),
    /// An `Option` field holding `None`.
    Absent,
}

/// Adapts a field's Rust type to the input its rules expect.
pub trait AsFieldInput {
    fn as_field_input(&self) -> FieldInput<'_>;
}

impl AsFieldInput for str {
    fn as_field_input(&self) -> FieldInput<'_> {
        FieldInput::Text(self)
    }
}

impl AsFieldInput for String {
    fn as_field_input(&self) -> FieldInput<'_> {
        FieldInput::Text(self)
    }
}

impl<T: AsFieldInput + ?Sized> AsFieldInput for &T {
    fn as_field_input(&self) -> FieldInput<'_> {
        (**self).as_field_input()
    }
}

impl<T: AsFieldInput> AsFieldInput for Option<T> {
    fn as_field_input(&self) -> FieldInput<'_> {
        match self {
            Some(value) => value.as_field_input(),
            None => FieldInput::Absent,
        }
    }
}

macro_rules! impl_number_field_input {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AsFieldInput for $ty {
                fn as_field_input(&self) -> FieldInput<'_> {
                    FieldInput::Number(*self as f64)
                }
            }
        )*
    };
}

impl_number_field_input!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

/// The rules of every annotated field of a record, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct RecordRules {
    fields: IndexMap<&'static str, FieldRules>,
}

impl RecordRules {
    pub fn find_field(&self, name: &str) -> Option<&FieldRules> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &IndexMap<&'static str, FieldRules> {
        &self.fields
    }

    /// Checks the value of field `name`, labelled with the field name. A field without rules
    /// passes.
    pub fn check_field(
        &self,
        name: &str,
        input: FieldInput<'_>,
    ) -> Result<ValidationResult, RuleError> {
        match self.find_field(name) {
            Some(rules) => {
                let result = rules.check(name, input)?;
                if !result.is_valid {
                    tracing::debug!(field = name, "field rejected");
                }
                Ok(result)
            }
            None => Ok(ValidationResult::valid()),
        }
    }
}

impl TryFrom<Vec<(&'static str, FieldRules)>> for RecordRules {
    type Error = RuleError;

    /// Creates `RecordRules` from `(name, rules)` pairs, checking for duplicates.
    fn try_from(fields: Vec<(&'static str, FieldRules)>) -> Result<Self, Self::Error> {
        let mut map = IndexMap::with_capacity(fields.len());
        for (name, rules) in fields {
            if map.insert(name, rules).is_some() {
                return Err(RuleError::DuplicateField(name.to_string()));
            }
        }
        Ok(RecordRules { fields: map })
    }
}
