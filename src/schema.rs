//! Schema trees describing provider and resource attributes.
//!
//! A [`Schema`] serves two purposes. It is what the provider reports to the
//! framework for planning and diffing, and it binds the provider's
//! snake_case attribute names to the JSON names the custom resource uses
//! (see [`Schema::state_to_json`] and [`Schema::json_to_state`]).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AttributePath, Diagnostic, Diagnostics};

pub type Attributes = BTreeMap<String, Attribute>;

/// Builds an attribute map from `(name, attribute)` pairs.
pub fn attrs<const N: usize>(list: [(&str, Attribute); N]) -> Attributes {
    list.into_iter()
        .map(|(name, attribute)| (name.to_owned(), attribute))
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Schema {
    pub description: String,
    pub markdown_description: String,
    pub version: i64,
    pub attributes: Attributes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    String,
    Bool,
    Int64,
    Float64,
    Dynamic,
}

impl ElementType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ElementType::String => value.is_string(),
            ElementType::Bool => value.is_boolean(),
            ElementType::Int64 => value.is_i64() || value.is_u64(),
            ElementType::Float64 => value.is_number(),
            ElementType::Dynamic => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "element", rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    Int64,
    Float64,
    /// Arbitrary JSON, for fields the CRD marks as preserving unknown fields.
    Dynamic,
    List(ElementType),
    Map(ElementType),
    SingleNested(Attributes),
    ListNested(Attributes),
}

impl AttributeKind {
    fn name(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Bool => "bool",
            AttributeKind::Int64 => "number",
            AttributeKind::Float64 => "number",
            AttributeKind::Dynamic => "dynamic",
            AttributeKind::List(_) => "list",
            AttributeKind::Map(_) => "map",
            AttributeKind::SingleNested(_) => "object",
            AttributeKind::ListNested(_) => "list of objects",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            AttributeKind::String => value.is_string(),
            AttributeKind::Bool => value.is_boolean(),
            AttributeKind::Int64 => value.is_i64() || value.is_u64(),
            AttributeKind::Float64 => value.is_number(),
            AttributeKind::Dynamic => true,
            AttributeKind::List(element) => value
                .as_array()
                .map_or(false, |items| items.iter().all(|item| element.accepts(item))),
            AttributeKind::Map(element) => value
                .as_object()
                .map_or(false, |entries| entries.values().all(|item| element.accepts(item))),
            AttributeKind::SingleNested(_) => value.is_object(),
            AttributeKind::ListNested(_) => value
                .as_array()
                .map_or(false, |items| items.iter().all(Value::is_object)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    RequiresReplace,
    UseStateForUnknown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    OneOf(Vec<String>),
    /// RFC 1123 subdomain, as required for most object names.
    Dns1123Subdomain,
    /// RFC 1123 label, as required for namespaces.
    Dns1123Label,
    LengthBetween(usize, usize),
    Int64Between(i64, i64),
}

impl Validator {
    pub fn one_of<const N: usize>(values: [&str; N]) -> Self {
        Validator::OneOf(values.iter().map(|v| (*v).to_owned()).collect())
    }

    /// Checks `value`, returning the reason it was rejected.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => Ok(()),
                _ => Err(format!(
                    "value must be one of: {}, got: {}",
                    allowed
                        .iter()
                        .map(|a| format!("{:?}", a))
                        .collect::<Vec<_>>()
                        .join(", "),
                    value
                )),
            },
            Validator::Dns1123Subdomain => match value.as_str() {
                Some(s) if is_dns1123_subdomain(s) => Ok(()),
                _ => Err(format!(
                    "{} is not a valid RFC 1123 subdomain: it must consist of lower case \
                     alphanumeric characters, '-' or '.', start and end with an alphanumeric \
                     character and be at most 253 characters",
                    value
                )),
            },
            Validator::Dns1123Label => match value.as_str() {
                Some(s) if is_dns1123_label(s) => Ok(()),
                _ => Err(format!(
                    "{} is not a valid RFC 1123 label: it must consist of lower case \
                     alphanumeric characters or '-', start and end with an alphanumeric \
                     character and be at most 63 characters",
                    value
                )),
            },
            Validator::LengthBetween(min, max) => {
                let len = value.as_str().map(|s| s.chars().count()).unwrap_or_default();
                if (*min..=*max).contains(&len) {
                    Ok(())
                } else {
                    Err(format!(
                        "string length must be between {} and {}, got: {}",
                        min, max, len
                    ))
                }
            }
            Validator::Int64Between(min, max) => match value.as_i64() {
                Some(n) if (*min..=*max).contains(&n) => Ok(()),
                _ => Err(format!(
                    "value must be between {} and {}, got: {}",
                    min, max, value
                )),
            },
        }
    }
}

/// Lower case alphanumerics and '-', starting and ending with an
/// alphanumeric. No length limit.
fn is_dns1123_part(s: &str) -> bool {
    let bytes = s.as_bytes();
    !bytes.is_empty()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes[0] != b'-'
        && bytes[bytes.len() - 1] != b'-'
}

fn is_dns1123_label(s: &str) -> bool {
    s.len() <= 63 && is_dns1123_part(s)
}

/// Only the whole name is limited to 253 characters; its dot-separated
/// parts are not limited to 63.
fn is_dns1123_subdomain(s: &str) -> bool {
    s.len() <= 253 && s.split('.').all(is_dns1123_part)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    /// Name of the field in the custom resource's JSON, when it differs
    /// from the attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Attribute {
    fn new(kind: AttributeKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            json_name: None,
            description: description.into(),
            required: false,
            optional: true,
            computed: false,
            sensitive: false,
            deprecation_message: None,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
            default: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::String, description)
    }

    pub fn bool(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::Bool, description)
    }

    pub fn int64(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::Int64, description)
    }

    pub fn float64(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::Float64, description)
    }

    pub fn dynamic(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::Dynamic, description)
    }

    pub fn list(element: ElementType, description: impl Into<String>) -> Self {
        Self::new(AttributeKind::List(element), description)
    }

    pub fn map(element: ElementType, description: impl Into<String>) -> Self {
        Self::new(AttributeKind::Map(element), description)
    }

    pub fn single_nested(description: impl Into<String>, attributes: Attributes) -> Self {
        Self::new(AttributeKind::SingleNested(attributes), description)
    }

    pub fn list_nested(description: impl Into<String>, attributes: Attributes) -> Self {
        Self::new(AttributeKind::ListNested(attributes), description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// Marks the attribute as set by the provider only.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self.optional = false;
        self.required = false;
        self
    }

    /// Marks the attribute as settable by the user, filled in by the
    /// provider otherwise.
    pub fn optional_computed(mut self) -> Self {
        self.computed = true;
        self.optional = true;
        self.required = false;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn json(mut self, name: &str) -> Self {
        self.json_name = Some(name.to_owned());
        self
    }

    pub fn deprecated(mut self, message: &str) -> Self {
        self.deprecation_message = Some(message.to_owned());
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// The key this attribute uses in the custom resource's JSON.
    pub fn json_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.json_name.as_deref().unwrap_or(name)
    }

    pub fn nested(&self) -> Option<&Attributes> {
        match &self.kind {
            AttributeKind::SingleNested(attributes) | AttributeKind::ListNested(attributes) => {
                Some(attributes)
            }
            _ => None,
        }
    }

    fn is_read_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

impl Schema {
    pub fn new(description: impl Into<String>, attributes: Attributes) -> Self {
        let description = description.into();
        Self {
            markdown_description: description.clone(),
            description,
            version: 0,
            attributes,
        }
    }

    pub fn with_markdown_description(mut self, markdown: impl Into<String>) -> Self {
        self.markdown_description = markdown.into();
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Checks a configuration value against the schema, reporting every
    /// problem found rather than stopping at the first.
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        match config {
            Value::Object(map) => {
                validate_attributes(&self.attributes, map, &AttributePath::root(), &mut diagnostics)
            }
            Value::Null => {
                validate_attributes(&self.attributes, &Map::new(), &AttributePath::root(), &mut diagnostics)
            }
            other => diagnostics.push(Diagnostic::error(
                "Invalid configuration",
                format!("expected an object, got: {}", other),
            )),
        }
        diagnostics
    }

    /// Converts a state or plan value keyed by attribute names into the
    /// JSON shape the custom resource uses. Null and unknown attributes are
    /// dropped.
    pub fn state_to_json(&self, state: &Value) -> Value {
        attributes_to_json(&self.attributes, state)
    }

    /// Converts custom resource JSON into a state value keyed by attribute
    /// names. Every attribute in the schema is present in the result, null
    /// when the JSON does not carry it.
    pub fn json_to_state(&self, json: &Value) -> Value {
        attributes_to_state(&self.attributes, json)
    }
}

fn validate_attributes(
    attributes: &Attributes,
    values: &Map<String, Value>,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) {
    for (name, attribute) in attributes {
        let path = path.attribute(name);
        let value = values.get(name).unwrap_or(&Value::Null);
        if value.is_null() {
            if attribute.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing Configuration for Required Attribute",
                        format!("Must set a configuration value for the {} attribute.", path),
                    )
                    .at(&path),
                );
            }
            continue;
        }
        if attribute.is_read_only() {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!("Cannot set value for the {} attribute, it is read-only.", path),
                )
                .at(&path),
            );
            continue;
        }
        if !attribute.kind.accepts(value) {
            diagnostics.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!("{} must be a {}, got: {}", path, attribute.kind.name(), value),
                )
                .at(&path),
            );
            continue;
        }
        if let Some(message) = &attribute.deprecation_message {
            diagnostics.push(Diagnostic::warning("Attribute Deprecated", message.clone()).at(&path));
        }
        match &attribute.kind {
            AttributeKind::List(_) | AttributeKind::ListNested(_) => {
                for (i, item) in value.as_array().into_iter().flatten().enumerate() {
                    check_validators(attribute, item, &path.index(i), diagnostics);
                }
            }
            AttributeKind::Map(_) => {
                for (key, item) in value.as_object().into_iter().flatten() {
                    check_validators(attribute, item, &path.attribute(key), diagnostics);
                }
            }
            _ => check_validators(attribute, value, &path, diagnostics),
        }
        match &attribute.kind {
            AttributeKind::SingleNested(nested) => {
                if let Some(map) = value.as_object() {
                    validate_attributes(nested, map, &path, diagnostics);
                }
            }
            AttributeKind::ListNested(nested) => {
                for (i, item) in value.as_array().into_iter().flatten().enumerate() {
                    if let Some(map) = item.as_object() {
                        validate_attributes(nested, map, &path.index(i), diagnostics);
                    }
                }
            }
            _ => {}
        }
    }
}

fn check_validators(
    attribute: &Attribute,
    value: &Value,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) {
    if attribute.nested().is_some() {
        return;
    }
    for validator in &attribute.validators {
        if let Err(reason) = validator.check(value) {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid Attribute Value",
                    format!("Attribute {} {}", path, reason),
                )
                .at(path),
            );
        }
    }
}

fn attributes_to_json(attributes: &Attributes, value: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    let mut out = Map::new();
    for (name, attribute) in attributes {
        match map.get(name) {
            None | Some(Value::Null) => {}
            Some(v) => {
                out.insert(attribute.json_key(name).to_owned(), kind_to_json(&attribute.kind, v));
            }
        }
    }
    Value::Object(out)
}

fn kind_to_json(kind: &AttributeKind, value: &Value) -> Value {
    match (kind, value) {
        (AttributeKind::SingleNested(nested), _) => attributes_to_json(nested, value),
        (AttributeKind::ListNested(nested), Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| attributes_to_json(nested, item))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn attributes_to_state(attributes: &Attributes, value: &Value) -> Value {
    let empty = Map::new();
    let map = match value {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => return other.clone(),
    };
    let out = attributes
        .iter()
        .map(|(name, attribute)| {
            let v = match map.get(attribute.json_key(name)) {
                None | Some(Value::Null) => Value::Null,
                Some(v) => kind_to_state(&attribute.kind, v),
            };
            (name.clone(), v)
        })
        .collect();
    Value::Object(out)
}

fn kind_to_state(kind: &AttributeKind, value: &Value) -> Value {
    match (kind, value) {
        (AttributeKind::SingleNested(nested), _) => attributes_to_state(nested, value),
        (AttributeKind::ListNested(nested), Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| attributes_to_state(nested, item))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema() -> Schema {
        Schema::new(
            "test",
            attrs([
                ("id", Attribute::string("id").computed()),
                (
                    "name",
                    Attribute::string("name")
                        .required()
                        .validator(Validator::Dns1123Subdomain),
                ),
                (
                    "spec",
                    Attribute::single_nested(
                        "spec",
                        attrs([
                            (
                                "global_output_refs",
                                Attribute::list(ElementType::String, "refs").json("globalOutputRefs"),
                            ),
                            (
                                "selectors",
                                Attribute::map(ElementType::String, "selectors")
                                    .deprecated("use match instead"),
                            ),
                            (
                                "filters",
                                Attribute::list_nested(
                                    "filters",
                                    attrs([(
                                        "tag_normaliser",
                                        Attribute::single_nested(
                                            "tag normaliser",
                                            attrs([(
                                                "match_tag",
                                                Attribute::string("match tag"),
                                            )]),
                                        ),
                                    )]),
                                ),
                            ),
                            (
                                "transport",
                                Attribute::string("transport")
                                    .validator(Validator::one_of(["tcp", "udp", "tls"])),
                            ),
                        ]),
                    ),
                ),
            ]),
        )
    }

    #[test]
    fn state_to_json_renames_and_drops_nulls() {
        let state = json!({
            "id": null,
            "name": "all",
            "spec": {
                "global_output_refs": ["syslog"],
                "selectors": null,
                "filters": [{"tag_normaliser": {"match_tag": "kubernetes.**"}}],
                "transport": null,
                "unknown": "ignored",
            }
        });
        assert_eq!(
            schema().state_to_json(&state),
            json!({
                "name": "all",
                "spec": {
                    "globalOutputRefs": ["syslog"],
                    "filters": [{"tag_normaliser": {"match_tag": "kubernetes.**"}}],
                }
            })
        );
    }

    #[test]
    fn json_to_state_fills_every_attribute() {
        let json = json!({
            "name": "all",
            "spec": {"globalOutputRefs": ["syslog"], "extra": 1},
        });
        assert_eq!(
            schema().json_to_state(&json),
            json!({
                "id": null,
                "name": "all",
                "spec": {
                    "global_output_refs": ["syslog"],
                    "selectors": null,
                    "filters": null,
                    "transport": null,
                }
            })
        );
    }

    #[test]
    fn validate_reports_missing_required_and_read_only() {
        let diagnostics = schema().validate(&json!({"id": "x"}));
        let summaries: Vec<_> = diagnostics.errors().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec![
                "Invalid Configuration for Read-Only Attribute",
                "Missing Configuration for Required Attribute",
            ]
        );
    }

    #[test]
    fn validate_runs_nested_validators_and_deprecations() {
        let diagnostics = schema().validate(&json!({
            "name": "Not_Valid",
            "spec": {
                "selectors": {"app": "nginx"},
                "transport": "quic",
                "filters": [{"tag_normaliser": {"match_tag": 3}}],
            }
        }));
        let errors: Vec<_> = diagnostics
            .errors()
            .map(|d| d.attribute.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect();
        assert_eq!(
            errors,
            vec![
                "name".to_owned(),
                "spec.filters[0].tag_normaliser.match_tag".to_owned(),
                "spec.transport".to_owned(),
            ]
        );
        let warning = diagnostics.warnings().next().unwrap();
        assert_eq!(warning.detail, "use match instead");
    }

    #[test]
    fn dns_names() {
        assert!(is_dns1123_subdomain("logging.banzaicloud.io"));
        assert!(is_dns1123_subdomain("a"));
        assert!(!is_dns1123_subdomain(""));
        assert!(!is_dns1123_subdomain("-leading"));
        assert!(!is_dns1123_subdomain("double..dot"));
        assert!(!is_dns1123_subdomain(&"a".repeat(254)));
        assert!(is_dns1123_subdomain(&"a".repeat(64)));
        assert!(is_dns1123_subdomain(&format!("{}.example", "b".repeat(200))));
        assert!(!is_dns1123_subdomain("trailing-.example"));
        assert!(is_dns1123_label("cattle-logging-system"));
        assert!(!is_dns1123_label("with.dot"));
        assert!(!is_dns1123_label(&"a".repeat(64)));
    }

    #[test]
    fn int_and_length_validators() {
        let qos = Validator::Int64Between(0, 2);
        assert!(qos.check(&json!(1)).is_ok());
        assert!(qos.check(&json!(3)).is_err());
        let len = Validator::LengthBetween(1, 3);
        assert!(len.check(&json!("ab")).is_ok());
        assert!(len.check(&json!("")).is_err());
    }
}
