//! constraint checking
//!
//! [check] compares a [ResolutionResult] against a single [ConstraintSpec]
//! and produces [Violation]s. The one rule that shapes everything here:
//! an unresolvable expression never produces a violation. We only flag what
//! we could actually pin down.
use crate::document::SourceSpan;
use crate::normalize::{canonicalize, CanonicalValue, NumericHint};
use crate::resolve::ResolutionResult;
use crate::value::Value;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Notice,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Notice => f.write_str("notice"),
        }
    }
}

/// What a constraint expects of the resolved values
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// every resolved scalar must equal one of these values
    OneOf(Vec<Value>),
    /// every resolved collection must equal one of these collections
    SetOneOf(Vec<Value>),
    /// the attribute must be present and resolve to something
    Required,
}

/// How an explicit `null` interacts with a constraint
///
/// Terraform treats a `null` attribute like an omitted one, so by default a
/// null satisfies any allow list. [NullPolicy::Violates] is for constraints
/// where an unset value is itself the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    Satisfies,
    Violates,
}

/// A single declarative constraint on one resource attribute
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    pub rule: String,
    pub resource_type: String,
    /// dot-separated path, e.g. `sku.name`
    pub attribute: String,
    pub expect: Expectation,
    pub null_policy: NullPolicy,
    pub severity: Severity,
    /// message template with `{value}`, `{attribute}` and `{allowed}`
    /// placeholders; `None` renders the standard message
    pub message: Option<String>,
    pub link: String,
}

impl ConstraintSpec {
    pub fn one_of(
        rule: impl Into<String>,
        resource_type: impl Into<String>,
        attribute: impl Into<String>,
        allowed: Vec<Value>,
        link: impl Into<String>,
    ) -> Self {
        Self::new(rule, resource_type, attribute, Expectation::OneOf(allowed), link)
    }

    pub fn set_one_of(
        rule: impl Into<String>,
        resource_type: impl Into<String>,
        attribute: impl Into<String>,
        allowed: Vec<Value>,
        link: impl Into<String>,
    ) -> Self {
        Self::new(rule, resource_type, attribute, Expectation::SetOneOf(allowed), link)
    }

    pub fn required(
        rule: impl Into<String>,
        resource_type: impl Into<String>,
        attribute: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self::new(rule, resource_type, attribute, Expectation::Required, link)
            .with_null_policy(NullPolicy::Violates)
    }

    fn new(
        rule: impl Into<String>,
        resource_type: impl Into<String>,
        attribute: impl Into<String>,
        expect: Expectation,
        link: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            resource_type: resource_type.into(),
            attribute: attribute.into(),
            expect,
            null_policy: NullPolicy::Satisfies,
            severity: Severity::Error,
            message: None,
            link: link.into(),
        }
    }

    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// Scalar allow lists must hold scalars, set allow lists collections,
    /// and both must be non-empty
    pub fn is_well_formed(&self) -> bool {
        match &self.expect {
            Expectation::OneOf(allowed) => {
                !allowed.is_empty()
                    && allowed
                        .iter()
                        .all(|value| !matches!(value, Value::Array(_) | Value::Object(_)))
            }
            Expectation::SetOneOf(allowed) => {
                !allowed.is_empty()
                    && allowed.iter().all(|value| matches!(value, Value::Array(_)))
            }
            Expectation::Required => true,
        }
    }

    fn attribute_leaf(&self) -> &str {
        self.attribute.rsplit('.').next().unwrap_or(&self.attribute)
    }
}

/// One reported rule breach
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Violation {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    /// `azurerm_lb.this` for resource checks, `var.<name>` for variable checks
    pub address: String,
    pub attribute: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceSpan>,
}

impl Violation {
    pub fn new(spec: &ConstraintSpec, message: String) -> Self {
        Self {
            rule: spec.rule.clone(),
            severity: spec.severity,
            message,
            address: String::new(),
            attribute: spec.attribute.clone(),
            link: spec.link.clone(),
            range: None,
        }
    }

    /// Attaches the reporting location
    pub fn locate(mut self, address: &str, range: Option<SourceSpan>) -> Self {
        self.address = address.to_string();
        self.range = range;
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.address.is_empty() {
            write!(f, "{}: {} [{}]", self.severity, self.message, self.rule)
        } else {
            write!(
                f,
                "{}: {}: {} [{}]",
                self.severity, self.address, self.message, self.rule
            )
        }
    }
}

pub fn check(result: &ResolutionResult, spec: &ConstraintSpec) -> Vec<Violation> {
    if !spec.is_well_formed() {
        debug_assert!(false, "rule {} is malformed", spec.rule);
        tracing::warn!(rule = spec.rule.as_str(), "malformed constraint, skipping");
        return Vec::new();
    }

    match &spec.expect {
        Expectation::OneOf(allowed) => check_allowlist(result, spec, allowed, Rendering::Bare),
        Expectation::SetOneOf(allowed) => check_allowlist(result, spec, allowed, Rendering::Quoted),
        Expectation::Required => check_required(result, spec),
    }
}

#[derive(Clone, Copy)]
enum Rendering {
    Bare,
    Quoted,
}

fn check_allowlist(
    result: &ResolutionResult,
    spec: &ConstraintSpec,
    allowed: &[Value],
    rendering: Rendering,
) -> Vec<Violation> {
    if !result.resolvable {
        tracing::trace!(rule = spec.rule.as_str(), "unresolvable, skipping");
        return Vec::new();
    }

    let numeric = NumericHint::for_allowed(allowed);
    let allowed_canonical: Vec<CanonicalValue> = allowed
        .iter()
        .map(|value| canonicalize(value, numeric))
        .collect();

    let mut violations = Vec::new();
    for resolved in &result.values {
        let canonical = canonicalize(&resolved.value, numeric);

        if canonical == CanonicalValue::Null && spec.null_policy == NullPolicy::Satisfies {
            continue;
        }
        if allowed_canonical.contains(&canonical) {
            continue;
        }

        tracing::debug!(
            rule = spec.rule.as_str(),
            value = %canonical,
            origin = ?resolved.origin,
            "allow list violated"
        );
        violations.push(Violation::new(
            spec,
            allowlist_message(spec, &canonical, &allowed_canonical, rendering),
        ));
    }

    violations
}

fn check_required(result: &ResolutionResult, spec: &ConstraintSpec) -> Vec<Violation> {
    let specified = result.resolvable
        && result.values.iter().any(|resolved| {
            !resolved.value.is_null() || spec.null_policy == NullPolicy::Satisfies
        });

    if specified {
        return Vec::new();
    }

    vec![Violation::new(spec, required_message(spec))]
}

fn allowlist_message(
    spec: &ConstraintSpec,
    found: &CanonicalValue,
    allowed: &[CanonicalValue],
    rendering: Rendering,
) -> String {
    let found = match rendering {
        Rendering::Bare => found.to_string(),
        Rendering::Quoted => format!("\"{found}\""),
    };

    if let Some(template) = &spec.message {
        return template
            .replace("{value}", &found)
            .replace("{attribute}", spec.attribute_leaf())
            .replace("{allowed}", &render_allowed(allowed));
    }

    format!(
        "{} is an invalid attribute value of `{}` - expecting (one of) {}",
        found,
        spec.attribute_leaf(),
        render_allowed(allowed)
    )
}

fn required_message(spec: &ConstraintSpec) -> String {
    if let Some(template) = &spec.message {
        return template.replace("{attribute}", &spec.attribute);
    }

    format!("The attribute `{}` must be specified", spec.attribute)
}

fn render_allowed(allowed: &[CanonicalValue]) -> String {
    let mut out = String::from("[");
    for (index, alternative) in allowed.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{alternative}");
    }
    out.push(']');
    out
}
