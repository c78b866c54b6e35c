use std::{fmt, ops::RangeInclusive};

use crate::{env::Environment, ConfigError, ParseError};

/// A single command line flag: its identity, constraint and current value.
///
/// Flags are declared once in the [`App`](crate::App) tree and copied into a
/// [`Context`](crate::Context) when the scope that owns them is built, so the
/// declaration itself never changes.
#[derive(Debug, Clone)]
pub struct Flag {
    name: String,
    short: Option<char>,
    required: bool,
    usage: String,
    metavar: Option<String>,
    env: Option<String>,
    kind: Kind,
}

/// The four value types a flag can hold, each with its own constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    String { value: String, choices: Vec<String> },
    Int { value: i64, range: Option<RangeInclusive<i64>> },
    Float { value: f64, range: Option<RangeInclusive<f64>> },
    Bool { value: bool },
}

/// A snapshot of a flag value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(it) => fmt::Display::fmt(it, f),
            Value::Int(it) => fmt::Display::fmt(it, f),
            Value::Float(it) => fmt::Display::fmt(it, f),
            Value::Bool(it) => fmt::Display::fmt(it, f),
        }
    }
}

impl Flag {
    fn new(name: impl Into<String>, kind: Kind) -> Flag {
        Flag {
            name: name.into(),
            short: None,
            required: false,
            usage: String::new(),
            metavar: None,
            env: None,
            kind,
        }
    }

    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Flag {
        Flag::new(name, Kind::String { value: default.into(), choices: Vec::new() })
    }

    /// A string flag restricted to `choices`.
    pub fn choice<I, S>(name: impl Into<String>, default: impl Into<String>, choices: I) -> Flag
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices = choices.into_iter().map(Into::into).collect();
        Flag::new(name, Kind::String { value: default.into(), choices })
    }

    pub fn int(name: impl Into<String>, default: i64) -> Flag {
        Flag::new(name, Kind::Int { value: default, range: None })
    }

    pub fn int_in(name: impl Into<String>, default: i64, range: RangeInclusive<i64>) -> Flag {
        Flag::new(name, Kind::Int { value: default, range: Some(range) })
    }

    pub fn float(name: impl Into<String>, default: f64) -> Flag {
        Flag::new(name, Kind::Float { value: default, range: None })
    }

    pub fn float_in(name: impl Into<String>, default: f64, range: RangeInclusive<f64>) -> Flag {
        Flag::new(name, Kind::Float { value: default, range: Some(range) })
    }

    pub fn bool(name: impl Into<String>, default: bool) -> Flag {
        Flag::new(name, Kind::Bool { value: default })
    }

    pub fn short(mut self, short: char) -> Flag {
        self.short = Some(short);
        self
    }

    pub fn required(mut self) -> Flag {
        self.required = true;
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Flag {
        self.usage = usage.into();
        self
    }

    /// Placeholder shown for the flag's value in usage text.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Flag {
        self.metavar = Some(metavar.into());
        self
    }

    /// Take the default value from environment variable `var` when it is set
    /// and non-empty.
    pub fn env(mut self, var: impl Into<String>) -> Flag {
        self.env = Some(var.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_alias(&self) -> Option<char> {
        self.short
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn metavar_text(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, Kind::Bool { .. })
    }

    pub fn value(&self) -> Value {
        match &self.kind {
            Kind::String { value, .. } => Value::String(value.clone()),
            Kind::Int { value, .. } => Value::Int(*value),
            Kind::Float { value, .. } => Value::Float(*value),
            Kind::Bool { value } => Value::Bool(*value),
        }
    }

    /// Parses `token` into the flag's type, checks the constraint, and only
    /// then stores it.
    pub fn set(&mut self, token: &str) -> Result<(), ParseError> {
        let name = &self.name;
        let mismatch = |expected: &'static str| ParseError::TypeMismatch {
            flag: name.clone(),
            value: token.to_string(),
            expected,
        };
        let violation = |reason: String| ParseError::ConstraintViolation {
            flag: name.clone(),
            value: token.to_string(),
            reason,
        };
        match &mut self.kind {
            Kind::String { value, choices } => {
                if !choices.is_empty() && !choices.iter().any(|it| it == token) {
                    return Err(violation(format!("is not one of {{{}}}", choices.join(", "))));
                }
                *value = token.to_string();
            }
            Kind::Int { value, range } => {
                let parsed = token.parse::<i64>().map_err(|_| mismatch("an integer"))?;
                if let Some(range) = range {
                    if !range.contains(&parsed) {
                        let reason = format!("is outside {}-{}", range.start(), range.end());
                        return Err(violation(reason));
                    }
                }
                *value = parsed;
            }
            Kind::Float { value, range } => {
                let parsed = token.parse::<f64>().map_err(|_| mismatch("a number"))?;
                if let Some(range) = range {
                    if !range.contains(&parsed) {
                        let reason = format!("is outside {}-{}", range.start(), range.end());
                        return Err(violation(reason));
                    }
                }
                *value = parsed;
            }
            Kind::Bool { value } => {
                *value = match token.to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(mismatch("`true` or `false`")),
                };
            }
        }
        Ok(())
    }

    pub(crate) fn set_true(&mut self) {
        if let Kind::Bool { value } = &mut self.kind {
            *value = true;
        }
    }

    /// Structural check run once when the flag is registered into a scope.
    pub fn validate_declaration(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyFlagName);
        }
        if self.name.starts_with('-') || self.name.contains(|c: char| c == '=' || c.is_whitespace())
        {
            return Err(ConfigError::InvalidFlagName(self.name.clone()));
        }
        if let Some(short) = self.short {
            if short == '-' || short == '=' || short.is_whitespace() {
                return Err(ConfigError::InvalidShort { flag: self.name.clone(), short });
            }
        }
        let invalid_default = |reason: String| ConfigError::InvalidDefault {
            flag: self.name.clone(),
            reason,
        };
        match &self.kind {
            Kind::String { value, choices } => {
                if !choices.is_empty() && !choices.contains(value) {
                    let reason = format!("`{value}` not in {{{}}}", choices.join(", "));
                    return Err(invalid_default(reason));
                }
            }
            Kind::Int { value, range: Some(range) } => {
                if range.start() > range.end() {
                    return Err(ConfigError::InvalidRange(self.name.clone()));
                }
                if !range.contains(value) {
                    let reason = format!("{value} outside {}-{}", range.start(), range.end());
                    return Err(invalid_default(reason));
                }
            }
            Kind::Float { value, range: Some(range) } => {
                if range.start().is_nan() || range.end().is_nan() || range.start() > range.end() {
                    return Err(ConfigError::InvalidRange(self.name.clone()));
                }
                if !range.contains(value) {
                    let reason = format!("{value} outside {}-{}", range.start(), range.end());
                    return Err(invalid_default(reason));
                }
            }
            Kind::Int { range: None, .. } | Kind::Float { range: None, .. } | Kind::Bool { .. } => {
            }
        }
        Ok(())
    }

    /// Applies the environment default, if any. Called once per registration.
    pub(crate) fn bind_env(&mut self, env: &dyn Environment) {
        let Some(var) = self.env.as_deref() else { return };
        let raw = match env.var(var) {
            Some(it) if !it.is_empty() => it,
            _ => return,
        };
        if let Kind::Bool { value } = &mut self.kind {
            *value = !*value;
            tracing::debug!(flag = %self.name, var, "toggled boolean default from environment");
            return;
        }
        let mut candidate = self.clone();
        match candidate.set(&raw) {
            Ok(()) => {
                tracing::debug!(flag = %self.name, var, "default taken from environment");
                self.kind = candidate.kind;
            }
            Err(err) => {
                tracing::warn!(flag = %self.name, var, "ignoring environment value: {err}");
            }
        }
    }

    /// Usage text with the constraint appended, as shown in help screens.
    pub fn display_usage(&self) -> String {
        let mut res = self.usage.clone();
        let constraint = match &self.kind {
            Kind::String { choices, .. } if !choices.is_empty() => {
                Some(format!("{{{}}}", choices.join(", ")))
            }
            Kind::Int { range: Some(range), .. } => {
                Some(format!("{{{}-{}}}", range.start(), range.end()))
            }
            Kind::Float { range: Some(range), .. } => {
                Some(format!("{{{}-{}}}", range.start(), range.end()))
            }
            _ => None,
        };
        if let Some(constraint) = constraint {
            if !res.is_empty() {
                res.push(' ');
            }
            res.push_str(&constraint);
        }
        res
    }

    /// `METAVAR` for usage text: the declared one, `value` for non-boolean
    /// flags without one, nothing for booleans.
    pub(crate) fn display_metavar(&self) -> Option<&str> {
        match &self.metavar {
            Some(it) => Some(it.as_str()),
            None if self.is_bool() => None,
            None => Some("value"),
        }
    }
}
