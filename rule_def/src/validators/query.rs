use crate::errors::RuleError;
use crate::impl_literal_enum;
use crate::validators::by_list::DEFAULT_LABEL;
use crate::{NumberRules, PortRules, StringRules, ValidationResult, Validator};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

const PORT_LABEL: &str = "Port";

/// The `type` tag of a query value rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueType {
    #[default]
    String,
    Number,
    Port,
}

impl_literal_enum!(ValueType, |s: &str| RuleError::UnsupportedValueType(s.to_string()), {
    String => "string",
    Number => "number",
    Port => "port",
});

/// Rules for the value of one query key.
///
/// In a rule document the variant is picked by a `type` field, which defaults to `string`:
/// `{"type": "port", "whitelist": {"values": [443]}}`.
#[derive(Clone, Debug)]
pub enum ValueRules {
    String(StringRules),
    Number(NumberRules),
    Port(PortRules),
}

impl ValueRules {
    pub fn value_type(&self) -> ValueType {
        match self {
            ValueRules::String(_) => ValueType::String,
            ValueRules::Number(_) => ValueType::Number,
            ValueRules::Port(_) => ValueType::Port,
        }
    }

    fn validate(&self, value: &str) -> Result<ValidationResult, RuleError> {
        match self {
            ValueRules::String(rules) => rules.validate_labelled(&value.to_string(), DEFAULT_LABEL),
            ValueRules::Number(rules) => rules.validate_text_labelled(value, DEFAULT_LABEL),
            ValueRules::Port(rules) => rules.validate_text_labelled(value, PORT_LABEL),
        }
    }
}

impl From<StringRules> for ValueRules {
    fn from(rules: StringRules) -> Self {
        ValueRules::String(rules)
    }
}

impl From<NumberRules> for ValueRules {
    fn from(rules: NumberRules) -> Self {
        ValueRules::Number(rules)
    }
}

impl From<PortRules> for ValueRules {
    fn from(rules: PortRules) -> Self {
        ValueRules::Port(rules)
    }
}

impl<'de> Deserialize<'de> for ValueRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let value_type = match fields.remove("type") {
            None => ValueType::default(),
            Some(serde_json::Value::String(tag)) => tag.parse().map_err(D::Error::custom)?,
            Some(other) => {
                return Err(D::Error::custom(RuleError::UnsupportedValueType(
                    other.to_string(),
                )));
            }
        };

        let fields = serde_json::Value::Object(fields);
        let rules = match value_type {
            ValueType::String => StringRules::deserialize(fields).map(ValueRules::String),
            ValueType::Number => NumberRules::deserialize(fields).map(ValueRules::Number),
            ValueType::Port => PortRules::deserialize(fields).map(ValueRules::Port),
        };
        rules.map_err(D::Error::custom)
    }
}

/// Which keys may appear in a query, and how often.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysConfig {
    /// Keys outside this list are rejected. `None` accepts any key.
    pub whitelist: Option<Vec<String>>,
    pub allow_duplicates: bool,
    /// Every whitelisted key must be present.
    pub require_all: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            whitelist: None,
            allow_duplicates: true,
            require_all: false,
        }
    }
}

impl KeysConfig {
    #[must_use = "builder methods must be chained or built"]
    pub fn whitelist<K: Into<String>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.whitelist = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }
}

/// A message about one query key, either fixed or built from the key.
#[derive(Clone)]
pub enum KeyMessage {
    Text(String),
    Formatter(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl KeyMessage {
    pub fn formatter(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        KeyMessage::Formatter(Arc::new(f))
    }

    fn render(&self, key: &str) -> String {
        match self {
            KeyMessage::Text(text) => text.clone(),
            KeyMessage::Formatter(f) => f(key),
        }
    }
}

impl fmt::Debug for KeyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMessage::Text(text) => f.debug_tuple("Text").field(text).finish(),
            KeyMessage::Formatter(_) => f.write_str("Formatter(..)"),
        }
    }
}

impl From<&str> for KeyMessage {
    fn from(text: &str) -> Self {
        KeyMessage::Text(text.to_string())
    }
}

impl From<String> for KeyMessage {
    fn from(text: String) -> Self {
        KeyMessage::Text(text)
    }
}

impl<'de> Deserialize<'de> for KeyMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(KeyMessage::Text)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryErrorMessages {
    pub required_error: Option<String>,
    pub allowed_error: Option<String>,
    pub invalid_key_error: Option<KeyMessage>,
    pub duplicate_key_error: Option<KeyMessage>,
    pub require_all_error: Option<KeyMessage>,
}

/// Rules for a query string such as `?page=2&sort=asc`.
///
/// Pairs are checked in order: duplicates first, then the key whitelist, then the value rules
/// registered for the key. The first failing pair decides the result; `require_all` is checked
/// once every pair passed.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryRules {
    pub required: bool,
    pub allowed: bool,
    pub keys_config: Option<KeysConfig>,
    /// Value rules per decoded key, in declaration order.
    pub values_config: IndexMap<String, ValueRules>,
    pub error_messages: QueryErrorMessages,
}

impl Default for QueryRules {
    fn default() -> Self {
        Self {
            required: false,
            allowed: true,
            keys_config: None,
            values_config: IndexMap::new(),
            error_messages: QueryErrorMessages::default(),
        }
    }
}

impl QueryRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, RuleError> {
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
    pub fn keys(mut self, keys: KeysConfig) -> Self {
        self.keys_config = Some(keys);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn value(mut self, key: impl Into<String>, rules: impl Into<ValueRules>) -> Self {
        self.values_config.insert(key.into(), rules.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn error_messages(mut self, messages: QueryErrorMessages) -> Self {
        self.error_messages = messages;
        self
    }

    fn is_empty(&self) -> bool {
        self.keys_config.is_none() && self.values_config.is_empty()
    }
}

impl Validator<str> for QueryRules {
    fn validate(&self, query: &str) -> Result<ValidationResult, RuleError> {
        let messages = &self.error_messages;
        if self.required && query.is_empty() {
            let message = messages.required_error.as_deref();
            return Ok(ValidationResult::invalid(
                message.unwrap_or("Query must not be empty"),
            ));
        }
        if !self.allowed && !query.is_empty() {
            let message = messages.allowed_error.as_deref();
            return Ok(ValidationResult::invalid(message.unwrap_or("Query must be empty")));
        }
        if query.is_empty() || self.is_empty() {
            return Ok(ValidationResult::valid());
        }

        let default_keys = KeysConfig::default();
        let keys = self.keys_config.as_ref().unwrap_or(&default_keys);
        let mut seen = HashSet::new();

        for (key, value) in parse_pairs(query)? {
            if seen.contains(&*key) {
                if !keys.allow_duplicates {
                    tracing::debug!(%key, "duplicate query key");
                    return Ok(ValidationResult::invalid(render_key_message(
                        messages.duplicate_key_error.as_ref(),
                        &key,
                        || format!("Duplicate query key: {key}"),
                    )));
                }
                continue;
            }
            if let Some(whitelist) = &keys.whitelist
                && !whitelist.iter().any(|allowed| *allowed == key)
            {
                tracing::debug!(%key, "query key not whitelisted");
                return Ok(ValidationResult::invalid(render_key_message(
                    messages.invalid_key_error.as_ref(),
                    &key,
                    || format!("Query key should be one of {}", whitelist.join(", ")),
                )));
            }
            if let Some(rules) = self.values_config.get(&*key) {
                let result = rules.validate(&value)?;
                if !result.is_valid {
                    tracing::debug!(%key, "query value rejected");
                    return Ok(result);
                }
            }
            seen.insert(key);
        }

        if keys.require_all
            && let Some(whitelist) = &keys.whitelist
            && let Some(missing) = whitelist.iter().find(|key| !seen.contains(key.as_str()))
        {
            return Ok(ValidationResult::invalid(render_key_message(
                messages.require_all_error.as_ref(),
                missing,
                || format!("Query keys must have all of {}", whitelist.join(", ")),
            )));
        }

        Ok(ValidationResult::valid())
    }
}

fn render_key_message(
    custom: Option<&KeyMessage>,
    key: &str,
    default: impl FnOnce() -> String,
) -> String {
    custom.map_or_else(default, |message| message.render(key))
}

/// Splits a query into percent-decoded `(key, value)` pairs, keeping their order.
///
/// A leading `?` is ignored, empty segments are skipped and a segment without `=` has an
/// empty value. `+` is kept as is.
fn parse_pairs(query: &str) -> Result<Vec<(Cow<'_, str>, Cow<'_, str>)>, RuleError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            Ok((decode(query, key)?, decode(query, value)?))
        })
        .collect()
}

fn decode<'a>(query: &str, component: &'a str) -> Result<Cow<'a, str>, RuleError> {
    percent_decode_str(component)
        .decode_utf8()
        .map_err(|e| RuleError::MalformedQuery {
            input: query.to_string(),
            message: e.to_string(),
        })
}
