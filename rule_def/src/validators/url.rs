use crate::errors::RuleError;
use crate::impl_literal_enum;
use crate::{PortRules, QueryRules, StringRules, ValidationResult, Validator};
use ::url::Url;
use serde::Deserialize;
use std::collections::HashSet;

/// The parts of a URL that can carry their own rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrlComponent {
    Protocol,
    Host,
    Port,
    Path,
    Query,
    Hash,
}

impl_literal_enum!(UrlComponent, |s: &str| RuleError::InvalidComponent(s.to_string()), {
    Protocol => "protocol",
    Host => "host",
    Port => "port",
    Path => "path",
    Query => "query",
    Hash => "hash",
});

impl UrlComponent {
    pub const ALL: [UrlComponent; 6] = [
        UrlComponent::Protocol,
        UrlComponent::Host,
        UrlComponent::Port,
        UrlComponent::Path,
        UrlComponent::Query,
        UrlComponent::Hash,
    ];

    const fn label(&self) -> &'static str {
        match self {
            UrlComponent::Protocol => "Protocol",
            UrlComponent::Host => "Host",
            UrlComponent::Port => "Port",
            UrlComponent::Path => "Path",
            UrlComponent::Query => "Query",
            UrlComponent::Hash => "Hash",
        }
    }
}

/// The textual components of a parsed URL.
///
/// `https://example.com:8443/a/b?x=1#top` splits into `https:`, `example.com`, `8443`,
/// `/a/b`, `x=1` and `#top`. Components the URL does not have are empty; so is a port equal
/// to the scheme's default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlParts {
    pub protocol: String,
    pub host: String,
    pub port: String,
    pub path: String,
    pub query: String,
    pub hash: String,
}

impl UrlParts {
    pub fn parse(input: &str) -> Result<Self, RuleError> {
        let url = Url::parse(input).map_err(|e| RuleError::InvalidUrl {
            url: input.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            protocol: format!("{}:", url.scheme()),
            host: url.host_str().unwrap_or_default().to_string(),
            port: url.port().map(|port| port.to_string()).unwrap_or_default(),
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
            hash: url
                .fragment()
                .map(|fragment| format!("#{fragment}"))
                .unwrap_or_default(),
        })
    }

    fn get(&self, component: UrlComponent) -> &str {
        match component {
            UrlComponent::Protocol => &self.protocol,
            UrlComponent::Host => &self.host,
            UrlComponent::Port => &self.port,
            UrlComponent::Path => &self.path,
            UrlComponent::Query => &self.query,
            UrlComponent::Hash => &self.hash,
        }
    }
}

/// Per-component rules for a URL.
///
/// Components are validated in `validation_sequence` order (every component by default) and
/// the first failing component decides the result. Components without rules are skipped.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlRules {
    pub protocol_config: Option<StringRules>,
    pub host_config: Option<StringRules>,
    pub port_config: Option<PortRules>,
    pub path_config: Option<StringRules>,
    pub query_config: Option<QueryRules>,
    pub hash_config: Option<StringRules>,
    pub validation_sequence: Option<Vec<UrlComponent>>,
}

impl UrlRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn protocol(mut self, rules: StringRules) -> Self {
        self.protocol_config = Some(rules);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn host(mut self, rules: StringRules) -> Self {
        self.host_config = Some(rules);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn port(mut self, rules: PortRules) -> Self {
        self.port_config = Some(rules);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn path(mut self, rules: StringRules) -> Self {
        self.path_config = Some(rules);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn query(mut self, rules: QueryRules) -> Self {
        self.query_config = Some(rules);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn hash(mut self, rules: StringRules) -> Self {
        self.hash_config = Some(rules);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn sequence(mut self, components: impl IntoIterator<Item = UrlComponent>) -> Self {
        self.validation_sequence = Some(components.into_iter().collect());
        self
    }

    fn is_empty(&self) -> bool {
        self.protocol_config.is_none()
            && self.host_config.is_none()
            && self.port_config.is_none()
            && self.path_config.is_none()
            && self.query_config.is_none()
            && self.hash_config.is_none()
    }

    fn validate_component(
        &self,
        component: UrlComponent,
        text: &str,
    ) -> Option<Result<ValidationResult, RuleError>> {
        let label = component.label();
        let result = match component {
            UrlComponent::Protocol => self.protocol_config.as_ref()?.validate_labelled(&text.to_string(), label),
            UrlComponent::Host => self.host_config.as_ref()?.validate_labelled(&text.to_string(), label),
            UrlComponent::Port => self.port_config.as_ref()?.validate_text_labelled(text, label),
            UrlComponent::Path => self.path_config.as_ref()?.validate_labelled(&text.to_string(), label),
            UrlComponent::Query => self.query_config.as_ref()?.validate(text),
            UrlComponent::Hash => self.hash_config.as_ref()?.validate_labelled(&text.to_string(), label),
        };
        Some(result)
    }
}

impl Validator<str> for UrlRules {
    fn validate(&self, input: &str) -> Result<ValidationResult, RuleError> {
        if self.is_empty() {
            return Ok(ValidationResult::valid());
        }

        let parts = UrlParts::parse(input)?;
        let sequence = self
            .validation_sequence
            .as_deref()
            .unwrap_or(&UrlComponent::ALL);
        let mut seen = HashSet::new();

        for &component in sequence {
            if !seen.insert(component) {
                continue;
            }
            let Some(result) = self.validate_component(component, parts.get(component)) else {
                continue;
            };
            let result = result?;
            if !result.is_valid {
                tracing::debug!(%component, "url component rejected");
                return Ok(result);
            }
        }

        Ok(ValidationResult::valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeysConfig, ListRules, NumberRules};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parts() {
        let parts = UrlParts::parse("https://example.com:8443/a/b?x=1&y=%20#top").unwrap();
        assert_eq!(
            parts,
            UrlParts {
                protocol: "https:".to_string(),
                host: "example.com".to_string(),
                port: "8443".to_string(),
                path: "/a/b".to_string(),
                query: "x=1&y=%20".to_string(),
                hash: "#top".to_string(),
            }
        );

        let parts = UrlParts::parse("https://example.com:443").unwrap();
        assert_eq!(parts.port, "");
        assert_eq!(parts.path, "/");
        assert_eq!(parts.query, "");
        assert_eq!(parts.hash, "");

        assert!(matches!(
            UrlParts::parse("not a url"),
            Err(RuleError::InvalidUrl { .. })
        ));
    }

    fn secure_site() -> UrlRules {
        UrlRules::new()
            .protocol(StringRules::new().whitelist(ListRules::new().values(["https:"])))
            .host(
                StringRules::new()
                    .required(true)
                    .whitelist(ListRules::new().ends_with([".example.com"])),
            )
            .port(PortRules::new(
                NumberRules::new().blacklist(ListRules::new().values([8080.0])),
            ))
            .query(QueryRules::new().keys(KeysConfig::default().allow_duplicates(false)))
            .hash(StringRules::new().allowed(false))
    }

    #[test]
    fn test_components_in_order() {
        let rules = secure_site();

        assert!(rules.is_valid("https://www.example.com/path?a=1").unwrap());
        assert_eq!(
            rules.validate("http://evil.com").unwrap().error_message.as_deref(),
            Some(r#"Protocol should be "https:""#)
        );
        assert_eq!(
            rules.validate("https://evil.com").unwrap().error_message.as_deref(),
            Some(r#"Host should end with ".example.com""#)
        );
        assert_eq!(
            rules
                .validate("https://www.example.com:8080")
                .unwrap()
                .error_message
                .as_deref(),
            Some("Port should not be 8080")
        );
        assert_eq!(
            rules
                .validate("https://www.example.com/?a=1&a=2")
                .unwrap()
                .error_message
                .as_deref(),
            Some("Duplicate query key: a")
        );
        assert_eq!(
            rules
                .validate("https://www.example.com/#frag")
                .unwrap()
                .error_message
                .as_deref(),
            Some("Hash must be empty")
        );
    }

    #[test]
    fn test_custom_sequence() {
        let rules = secure_site().sequence([UrlComponent::Hash, UrlComponent::Hash, UrlComponent::Protocol]);

        // Host rules exist but are not in the sequence.
        assert!(rules.is_valid("https://evil.com").unwrap());
        assert_eq!(
            rules.validate("http://evil.com#x").unwrap().error_message.as_deref(),
            Some("Hash must be empty")
        );
    }

    #[test]
    fn test_empty_rules_do_not_parse() {
        assert!(UrlRules::new().is_valid("not a url").unwrap());
        assert!(matches!(
            secure_site().validate("not a url"),
            Err(RuleError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let rules = UrlRules::from_json(
            r#"{
                "path_config": {"error_label": "Route", "whitelist": {"starts_with": ["/api/"]}},
                "validation_sequence": ["path"]
            }"#,
        )
        .unwrap();

        assert!(rules.is_valid("https://example.com/api/v1").unwrap());
        assert_eq!(
            rules.validate("https://example.com/admin").unwrap().error_message.as_deref(),
            Some(r#"Route should start with "/api/""#)
        );

        let res = UrlRules::from_json(r#"{"validation_sequence": ["fragment"]}"#);
        assert!(
            matches!(&res, Err(RuleError::InvalidOptions(message))
                if message.contains("Unknown URL component 'fragment'")),
            "Expected InvalidOptions error but got {:?}",
            &res
        );
    }
}
