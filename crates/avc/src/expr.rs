//! expression classification
//!
//! Attribute values are sorted into a closed set of shapes before any
//! resolution happens. Everything we do not understand ends up as
//! [ExpressionNode::Unsupported] and is skipped later instead of guessed at.
use crate::value::Value;
use hcl::{Expression, Traversal, TraversalOperator};

/// The shapes of attribute expressions the resolver understands
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// A plain literal, including explicit `null`
    Literal(Value),
    /// A single-step variable reference: `var.<name>`
    Variable(String),
    /// The iteration value of the enclosing `for_each`: `each.value`
    EachValue,
    /// Anything else (function calls, conditionals, templates, `each.key`, ...)
    Unsupported,
}

pub fn classify(expression: &Expression) -> ExpressionNode {
    match expression {
        Expression::Parenthesis(inner) => classify(inner),
        Expression::Traversal(traversal) => classify_traversal(traversal),
        other => match Value::from_literal(other) {
            Some(value) => ExpressionNode::Literal(value),
            None => {
                tracing::trace!(?other, "expression shape not understood");
                ExpressionNode::Unsupported
            }
        },
    }
}

fn classify_traversal(traversal: &Traversal) -> ExpressionNode {
    let Expression::Variable(root) = &traversal.expr else {
        return ExpressionNode::Unsupported;
    };

    // only single-step lookups; `var.a.b` and `var.a[0]` stay unsupported
    let [TraversalOperator::GetAttr(attribute)] = traversal.operators.as_slice() else {
        return ExpressionNode::Unsupported;
    };

    match (root.as_str(), attribute.as_str()) {
        ("var", name) => ExpressionNode::Variable(name.to_string()),
        ("each", "value") => ExpressionNode::EachValue,
        _ => ExpressionNode::Unsupported,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify_text(text: &str) -> ExpressionNode {
        let expression: hcl_edit::expr::Expression = text.parse().expect("expression must parse");
        classify(&expression.into())
    }

    #[test]
    fn literals() {
        assert_eq!(classify_text("null"), ExpressionNode::Literal(Value::Null));
        assert_eq!(classify_text("\"Standard\""), ExpressionNode::Literal("Standard".into()));
        assert_eq!(classify_text("[1, 2, 3]"), ExpressionNode::Literal(vec![1, 2, 3].into()));
        assert_eq!(classify_text("(true)"), ExpressionNode::Literal(true.into()));
    }

    #[test]
    fn variable_references() {
        assert_eq!(classify_text("var.sku"), ExpressionNode::Variable("sku".to_string()));
        assert_eq!(classify_text("(var.sku)"), ExpressionNode::Variable("sku".to_string()));
    }

    #[test]
    fn each_value() {
        assert_eq!(classify_text("each.value"), ExpressionNode::EachValue);
    }

    #[test]
    fn unsupported_shapes() {
        // multi-step traversals
        assert_eq!(classify_text("var.a.b"), ExpressionNode::Unsupported);
        assert_eq!(classify_text("var.a[0]"), ExpressionNode::Unsupported);
        // each.key is not a value source
        assert_eq!(classify_text("each.key"), ExpressionNode::Unsupported);
        // other roots
        assert_eq!(classify_text("local.sku"), ExpressionNode::Unsupported);
        assert_eq!(classify_text("somevar"), ExpressionNode::Unsupported);
        // function calls, conditionals, templates
        assert_eq!(classify_text("toset([1, 2])"), ExpressionNode::Unsupported);
        assert_eq!(classify_text("var.a ? 1 : 2"), ExpressionNode::Unsupported);
        assert_eq!(classify_text("\"${var.sku}\""), ExpressionNode::Unsupported);
        // literals with embedded references
        assert_eq!(classify_text("[1, var.zone]"), ExpressionNode::Unsupported);
    }
}
