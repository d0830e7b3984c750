//! terraform type constraint expressions
//!
//! `variable` blocks carry their type as an expression (`string`,
//! `list(string)`, `object({...})`). This module parses the subset of the
//! type constraint grammar we need, including `optional(type, default)`
//! attributes inside `object(...)`.
use crate::value::Value;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Any,
    String,
    Number,
    Bool,
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Map(Box<TypeExpr>),
    Object(IndexMap<String, ObjectAttribute>),
    Tuple(Vec<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttribute {
    pub type_expr: TypeExpr,
    pub optional: bool,
    pub default: Option<Value>,
}

impl ObjectAttribute {
    pub fn required(type_expr: TypeExpr) -> Self {
        Self {
            type_expr,
            optional: false,
            default: None,
        }
    }

    pub fn optional(type_expr: TypeExpr, default: Option<Value>) -> Self {
        Self {
            type_expr,
            optional: true,
            default,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TypeExprError {
    #[error("unable to parse type expression")]
    Syntax(#[from] hcl_edit::parser::Error),
    #[error("unsupported type expression: {0}")]
    Unsupported(String),
}

/// Parses a type constraint from its textual form
pub fn from_str(text: &str) -> Result<TypeExpr, TypeExprError> {
    let expression: hcl_edit::expr::Expression = text.parse()?;
    from_expression(&expression.into())
}

/// Parses a type constraint from a `type = ...` attribute expression
pub fn from_expression(expression: &hcl::Expression) -> Result<TypeExpr, TypeExprError> {
    use hcl::Expression;

    match expression {
        Expression::Variable(name) => match name.as_str() {
            "string" => Ok(TypeExpr::String),
            "number" => Ok(TypeExpr::Number),
            "bool" => Ok(TypeExpr::Bool),
            "any" => Ok(TypeExpr::Any),
            other => Err(TypeExprError::Unsupported(other.to_string())),
        },
        Expression::Parenthesis(inner) => from_expression(inner),
        Expression::FuncCall(call) => from_func_call(call),
        other => Err(TypeExprError::Unsupported(format!("{other:?}"))),
    }
}

fn from_func_call(call: &hcl::expr::FuncCall) -> Result<TypeExpr, TypeExprError> {
    match (call.name.as_str(), call.args.as_slice()) {
        ("list", [element]) => Ok(TypeExpr::List(Box::new(from_expression(element)?))),
        ("set", [element]) => Ok(TypeExpr::Set(Box::new(from_expression(element)?))),
        ("map", [element]) => Ok(TypeExpr::Map(Box::new(from_expression(element)?))),
        ("object", [hcl::Expression::Object(fields)]) => {
            let mut attributes = IndexMap::new();
            for (key, value) in fields.iter() {
                attributes.insert(key.to_string(), object_attribute(value)?);
            }
            Ok(TypeExpr::Object(attributes))
        }
        ("tuple", [hcl::Expression::Array(elements)]) => {
            let elements = elements
                .iter()
                .map(from_expression)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypeExpr::Tuple(elements))
        }
        (name, _) => Err(TypeExprError::Unsupported(format!("{name}(...)"))),
    }
}

fn object_attribute(expression: &hcl::Expression) -> Result<ObjectAttribute, TypeExprError> {
    if let hcl::Expression::FuncCall(call) = expression {
        if call.name.as_str() == "optional" {
            return match call.args.as_slice() {
                [type_arg] => Ok(ObjectAttribute::optional(from_expression(type_arg)?, None)),
                [type_arg, default_arg] => {
                    let default = Value::from_literal(default_arg).ok_or_else(|| {
                        TypeExprError::Unsupported("optional() default must be a literal".to_string())
                    })?;
                    Ok(ObjectAttribute::optional(from_expression(type_arg)?, Some(default)))
                }
                _ => Err(TypeExprError::Unsupported("optional(...)".to_string())),
            };
        }
    }

    Ok(ObjectAttribute::required(from_expression(expression)?))
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Any => f.write_str("any"),
            TypeExpr::String => f.write_str("string"),
            TypeExpr::Number => f.write_str("number"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::List(element) => write!(f, "list({element})"),
            TypeExpr::Set(element) => write!(f, "set({element})"),
            TypeExpr::Map(element) => write!(f, "map({element})"),
            TypeExpr::Object(attributes) => {
                if attributes.is_empty() {
                    return f.write_str("object({})");
                }

                f.write_str("object({ ")?;
                for (index, (name, attribute)) in attributes.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} = {attribute}")?;
                }
                f.write_str(" })")
            }
            TypeExpr::Tuple(elements) => {
                f.write_str("tuple([")?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("])")
            }
        }
    }
}

impl std::fmt::Display for ObjectAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.optional {
            return write!(f, "{}", self.type_expr);
        }

        match &self.default {
            Some(default) => write!(f, "optional({}, {})", self.type_expr, default),
            None => write!(f, "optional({})", self.type_expr),
        }
    }
}
