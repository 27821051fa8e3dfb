//! Field schemas and validation rules
//!
//! Values are JSON values as entered. A field counts as *unset* when it is
//! missing, `null`, an empty (or all-whitespace) string, or equal to its
//! declared sentinel; unset and absent are the same thing everywhere here.

use crate::ValidationErrors;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

/// A single check applied to a set value
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Syntactically valid email address
    Email,
    /// Exactly `n` ASCII decimal digits
    ExactDigits(usize),
    /// At least `n` characters
    MinLength(usize),
    /// One of a closed set of strings
    OneOf(Vec<String>),
    /// Integer within `[min, max]`
    IntRange(i64, i64),
    /// Number above `min`; `inclusive` allows `min` itself
    NumberMin { min: f64, inclusive: bool },
}

impl Rule {
    /// Check a set value, returning the message on failure
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Rule::Email => match value.as_str() {
                Some(s) if email_regex().is_match(s.trim()) => Ok(()),
                _ => Err("must be a valid email address".to_string()),
            },
            Rule::ExactDigits(n) => {
                let text = as_text(value);
                match text {
                    Some(s) if s.len() == *n && s.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
                    _ => Err(format!("must be exactly {} digits", n)),
                }
            }
            Rule::MinLength(n) => match value.as_str() {
                Some(s) if s.chars().count() >= *n => Ok(()),
                _ => Err(format!("must be at least {} characters", n)),
            },
            Rule::OneOf(options) => match value.as_str() {
                Some(s) if options.iter().any(|o| o == s) => Ok(()),
                _ => Err(format!("must be one of: {}", options.join(", "))),
            },
            Rule::IntRange(min, max) => match as_integer(value) {
                Some(n) if n >= *min && n <= *max => Ok(()),
                Some(_) => Err(format!("must be between {} and {}", min, max)),
                None => Err("must be a whole number".to_string()),
            },
            Rule::NumberMin { min, inclusive } => match as_number(value) {
                Some(x) if x > *min || (*inclusive && x == *min) => Ok(()),
                Some(_) if *inclusive => Err(format!("must be at least {}", min)),
                Some(_) => Err(format!("must be greater than {}", min)),
                None => Err("must be a number".to_string()),
            },
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// One form field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub rules: Vec<Rule>,
    pub required: bool,
    /// Placeholder value that means "not chosen"
    pub sentinel: Option<Value>,
    /// Strip surrounding whitespace from text before validating and sending
    pub trim: bool,
}

impl FieldSpec {
    pub fn required<N: Into<String>, L: Into<String>>(name: N, label: L) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            rules: Vec::new(),
            required: true,
            sentinel: None,
            trim: true,
        }
    }

    pub fn optional<N: Into<String>, L: Into<String>>(name: N, label: L) -> Self {
        Self {
            required: false,
            ..Self::required(name, label)
        }
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn sentinel(mut self, sentinel: Value) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    /// Validate and send text exactly as entered (passwords)
    pub fn keep_whitespace(mut self) -> Self {
        self.trim = false;
        self
    }

    pub fn is_unset(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) if s.trim().is_empty() => true,
            Some(v) => self.sentinel.as_ref() == Some(v),
        }
    }

    /// Validate this field's value; every failing rule contributes a message
    pub fn validate(&self, value: Option<&Value>) -> Vec<String> {
        let value = match value {
            Some(v) if !self.is_unset(Some(v)) => v,
            _ if self.required => return vec![format!("{} is required", self.label)],
            _ => return Vec::new(),
        };

        // rules see the text that will be sent
        let value = self.entered_text(value);
        self.rules
            .iter()
            .filter_map(|rule| rule.check(&value).err())
            .collect()
    }

    fn entered_text(&self, value: &Value) -> Value {
        match value {
            Value::String(s) if self.trim => Value::String(s.trim().to_string()),
            other => other.clone(),
        }
    }

    /// Outbound form of a set value: numeric rules turn numeric text into numbers
    fn normalize(&self, value: &Value) -> Value {
        let value = &self.entered_text(value);
        for rule in &self.rules {
            match rule {
                Rule::IntRange(..) => {
                    if let Some(n) = as_integer(value) {
                        return Value::from(n);
                    }
                }
                Rule::NumberMin { .. } => {
                    if let Some(n) = as_number(value).and_then(Number::from_f64) {
                        return Value::Number(n);
                    }
                }
                _ => {}
            }
        }
        value.clone()
    }
}

/// Ordered set of fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate only the named fields
    pub fn validate_fields<'a, I>(&self, values: &Map<String, Value>, names: I) -> ValidationErrors
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut errors = ValidationErrors::new();
        for name in names {
            if let Some(spec) = self.field(name) {
                for message in spec.validate(values.get(name)) {
                    errors.add(name, message);
                }
            }
        }
        errors
    }

    /// Validate every field
    pub fn validate(&self, values: &Map<String, Value>) -> ValidationErrors {
        self.validate_fields(values, self.fields.iter().map(|f| f.name.as_str()))
    }

    /// Outbound payload: schema fields only, unset values stripped
    pub fn payload(&self, values: &Map<String, Value>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|spec| {
                let value = values.get(&spec.name)?;
                if spec.is_unset(Some(value)) {
                    return None;
                }
                Some((spec.name.clone(), spec.normalize(value)))
            })
            .collect()
    }
}
