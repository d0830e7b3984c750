//! structural type conformance
//!
//! Compares a variable's declared type constraint against an expected schema.
//! This is a comparison between two [TypeExpr] trees, not a value check:
//! `string` matches `string`, `object({ kind = string })` matches an object
//! schema with a required `kind`, and so on. Mismatches come back as a typed
//! [TypeMismatch], never as a panic.
use crate::check::Severity;
use crate::document::VariableDeclaration;
use crate::expr::ExpressionNode;
use crate::typeexpr::{ObjectAttribute, TypeExpr};
use crate::value::Value;

/// A named schema contract one module variable must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSpec {
    pub rule: String,
    /// the variable name the contract applies to
    pub name: String,
    /// the expected type constraint, in HCL type syntax
    pub type_definition: String,
    /// the default the variable must declare, if the contract prescribes one
    pub default: Option<Value>,
    /// reject declared attributes the schema does not name
    pub strict: bool,
    pub enabled: bool,
    pub severity: Severity,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeMismatch {
    #[error("no type is declared")]
    MissingType,
    #[error("expected {expected}, found {found}")]
    Kind { expected: String, found: String },
    #[error("missing attribute `{name}`")]
    MissingAttribute { name: String },
    #[error("unexpected attribute `{name}`")]
    UnexpectedAttribute { name: String },
    #[error("attribute `{name}` must not be optional")]
    RequiredAttribute { name: String },
    #[error("attribute `{name}`: {mismatch}")]
    Attribute {
        name: String,
        mismatch: Box<TypeMismatch>,
    },
    #[error("element type: {0}")]
    Element(Box<TypeMismatch>),
    #[error("expected a tuple of {expected} elements, found {found}")]
    TupleLength { expected: usize, found: usize },
    #[error("default does not match: expected {expected}, found {found}")]
    Default { expected: String, found: String },
}

/// Checks a whole variable declaration against a schema: the declared type
/// constraint, then the declared default when the schema prescribes one
pub fn check_variable(
    declaration: &VariableDeclaration,
    schema: &TypeExpr,
    expected_default: Option<&Value>,
    strict: bool,
) -> Result<(), TypeMismatch> {
    let declared = declaration
        .declared_type
        .as_ref()
        .ok_or(TypeMismatch::MissingType)?;
    check_type(declared, schema, strict)?;

    let Some(expected) = expected_default else {
        return Ok(());
    };
    match &declaration.default {
        Some(ExpressionNode::Literal(default)) if default == expected => Ok(()),
        Some(ExpressionNode::Literal(default)) => Err(TypeMismatch::Default {
            expected: format!("`{expected}`"),
            found: format!("`{default}`"),
        }),
        Some(_) => Err(TypeMismatch::Default {
            expected: format!("`{expected}`"),
            found: "an unresolved expression".to_string(),
        }),
        None => Err(TypeMismatch::Default {
            expected: format!("`{expected}`"),
            found: "no default".to_string(),
        }),
    }
}

/// Does `declared` conform to `schema`?
///
/// `strict` additionally rejects declared object attributes the schema does
/// not name; without it supersets pass.
pub fn check_type(declared: &TypeExpr, schema: &TypeExpr, strict: bool) -> Result<(), TypeMismatch> {
    match (declared, schema) {
        (_, TypeExpr::Any) => Ok(()),
        (TypeExpr::String, TypeExpr::String)
        | (TypeExpr::Number, TypeExpr::Number)
        | (TypeExpr::Bool, TypeExpr::Bool) => Ok(()),
        (TypeExpr::List(declared), TypeExpr::List(schema))
        | (TypeExpr::Set(declared), TypeExpr::Set(schema))
        | (TypeExpr::Map(declared), TypeExpr::Map(schema)) => {
            check_type(declared, schema, strict)
                .map_err(|mismatch| TypeMismatch::Element(Box::new(mismatch)))
        }
        (TypeExpr::Tuple(declared), TypeExpr::Tuple(schema)) => {
            if declared.len() != schema.len() {
                return Err(TypeMismatch::TupleLength {
                    expected: schema.len(),
                    found: declared.len(),
                });
            }
            for (declared, schema) in declared.iter().zip(schema) {
                check_type(declared, schema, strict)
                    .map_err(|mismatch| TypeMismatch::Element(Box::new(mismatch)))?;
            }
            Ok(())
        }
        (TypeExpr::Object(declared), TypeExpr::Object(schema)) => {
            check_object(declared, schema, strict)
        }
        (declared, schema) => Err(TypeMismatch::Kind {
            expected: schema.to_string(),
            found: declared.to_string(),
        }),
    }
}

fn check_object(
    declared: &indexmap::IndexMap<String, ObjectAttribute>,
    schema: &indexmap::IndexMap<String, ObjectAttribute>,
    strict: bool,
) -> Result<(), TypeMismatch> {
    for (name, expected) in schema {
        let Some(found) = declared.get(name) else {
            if expected.optional {
                continue;
            }
            return Err(TypeMismatch::MissingAttribute { name: name.clone() });
        };

        check_type(&found.type_expr, &expected.type_expr, strict).map_err(|mismatch| {
            TypeMismatch::Attribute {
                name: name.clone(),
                mismatch: Box::new(mismatch),
            }
        })?;

        // a declaration may be stricter than the schema, never looser
        if found.optional && !expected.optional {
            return Err(TypeMismatch::RequiredAttribute { name: name.clone() });
        }
        if found.optional && expected.optional && found.default != expected.default {
            return Err(TypeMismatch::Attribute {
                name: name.clone(),
                mismatch: Box::new(TypeMismatch::Default {
                    expected: render_optional_default(&expected.default),
                    found: render_optional_default(&found.default),
                }),
            });
        }
    }

    if strict {
        for name in declared.keys() {
            if !schema.contains_key(name) {
                return Err(TypeMismatch::UnexpectedAttribute { name: name.clone() });
            }
        }
    }

    Ok(())
}

fn render_optional_default(default: &Option<Value>) -> String {
    match default {
        Some(value) => format!("`{value}`"),
        None => "no default".to_string(),
    }
}
