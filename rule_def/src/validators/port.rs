use crate::{NumberRules, RuleError, ValidationResult, Validator};
use serde::Deserialize;

const PORT_LABEL: &str = "Port";
const MIN_PORT: f64 = 1.0;
const MAX_PORT: f64 = 65535.0;

/// Rules for a TCP/UDP port given as text or as a number.
///
/// Whatever the caller's lists say, a port outside `1..=65535` is invalid. `required` and
/// `allowed` only apply to text input, where an empty string means "no port".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct PortRules {
    pub rules: NumberRules,
}

impl From<NumberRules> for PortRules {
    fn from(rules: NumberRules) -> Self {
        Self { rules }
    }
}

impl PortRules {
    pub fn new(rules: NumberRules) -> Self {
        Self { rules }
    }

    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate_str(&self, text: &str) -> Result<ValidationResult, RuleError> {
        self.validate_text_labelled(text, PORT_LABEL)
    }

    pub fn validate_number(&self, port: f64) -> Result<ValidationResult, RuleError> {
        self.validate_number_labelled(port, PORT_LABEL)
    }

    pub(crate) fn validate_text_labelled(
        &self,
        text: &str,
        default_label: &str,
    ) -> Result<ValidationResult, RuleError> {
        let label = self.rules.label(default_label);
        if let Some(result) = self.rules.check_presence(text.is_empty(), label) {
            return Ok(result);
        }
        match text.trim().parse::<f64>() {
            Ok(port) => self.validate_number_labelled(port, default_label),
            Err(_) => Ok(self.rules.type_error_result(label)),
        }
    }

    pub(crate) fn validate_number_labelled(
        &self,
        port: f64,
        default_label: &str,
    ) -> Result<ValidationResult, RuleError> {
        let label = self.rules.label(default_label);
        if port.is_nan() {
            return Ok(self.rules.type_error_result(label));
        }
        if !(MIN_PORT..=MAX_PORT).contains(&port) {
            tracing::debug!(port, "port out of range");
            return Ok(ValidationResult::invalid(format!(
                "{label} must be between 1 and 65535"
            )));
        }
        self.rules.validate_lists(&port, label)
    }
}

impl Validator<str> for PortRules {
    fn validate(&self, input: &str) -> Result<ValidationResult, RuleError> {
        self.validate_str(input)
    }
}

impl Validator<f64> for PortRules {
    fn validate(&self, input: &f64) -> Result<ValidationResult, RuleError> {
        self.validate_number(*input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Combination, ListRules};
    use pretty_assertions::assert_eq;

    macro_rules! test_ports {
        ($test_name:ident, $rules:expr, $ok_values:expr, $bad_values:expr) => {
            #[test]
            fn $test_name() {
                let rules: PortRules = $rules;

                for &value in $ok_values {
                    let result = rules.validate_str(value).unwrap();
                    assert!(result.is_valid, "Expected '{}' to be valid, got {:?}", value, result);
                }

                for &value in $bad_values {
                    let result = rules.validate_str(value).unwrap();
                    assert!(!result.is_valid, "Expected '{}' to be invalid, got {:?}", value, result);
                }
            }
        };
    }

    test_ports!(
        test_any_port_in_range,
        PortRules::default(),
        &["1", "80", "65535", ""],
        &["0", "65536", "70000", "-1", "http"]
    );

    test_ports!(
        test_out_of_range_beats_caller_whitelist,
        NumberRules::new()
            .whitelist(ListRules::new().ranges([[1.0, 100000.0]]))
            .into(),
        &["8080"],
        &["70000"]
    );

    test_ports!(
        test_whitelisted_ports,
        NumberRules::new()
            .whitelist(
                ListRules::new()
                    .combination(Combination::Or)
                    .values([80.0, 443.0])
                    .ranges([[8000.0, 8999.0]])
            )
            .blacklist(ListRules::new().values([8443.0]))
            .into(),
        &["80", "443", "8000", "8999"],
        &["81", "8443", "9000"]
    );

    test_ports!(
        test_required_port,
        NumberRules::new().required(true).into(),
        &["22"],
        &[""]
    );

    #[test]
    fn test_messages() {
        let rules = PortRules::default();
        assert_eq!(
            rules.validate_str("70000").unwrap(),
            ValidationResult::invalid("Port must be between 1 and 65535")
        );
        assert_eq!(
            rules.validate_str("http").unwrap(),
            ValidationResult::invalid("Port must be a number")
        );
        assert_eq!(
            rules.validate_number(0.0).unwrap(),
            ValidationResult::invalid("Port must be between 1 and 65535")
        );

        let rules = PortRules::new(
            NumberRules::new()
                .error_label("Admin port")
                .allowed(false),
        );
        assert_eq!(
            rules.validate_str("22").unwrap(),
            ValidationResult::invalid("Admin port must be empty")
        );
        // `allowed` is a text-only constraint.
        assert!(rules.validate_number(22.0).unwrap().is_valid);
    }

    #[test]
    fn test_from_json() {
        let rules = PortRules::from_json(
            r#"{"whitelist": {"ranges": [[1024, 49151]]}, "error_label": "Service port"}"#,
        )
        .unwrap();

        assert!(rules.is_valid("8080").unwrap());
        assert_eq!(
            rules.validate(&80.0).unwrap().error_message.as_deref(),
            Some("Service port should be in range 1024 - 49151")
        );
    }
}
