//! Expression evaluation: name resolution, operator semantics, numeric
//! coercion, and the built-in function registry. Evaluating an
//! expression never panics and never halts the interpreter — every failure
//! mode resolves to [`Value::Null`] plus a runtime diagnostic.

use hypha_common::{Clock, Diagnostic, SourceLocation};
use hypha_parser::ast::{BinaryOperator, Expression, LiteralValue, UnaryOperator};
use indexmap::IndexMap;

use crate::value::Value;

/// The two name-resolution scopes an expression is evaluated against: a
/// rule-local scope (the bound signal payload plus any `let` bindings) and
/// the owning agent's persistent state.
pub struct EvalContext<'a> {
    pub locals: &'a IndexMap<String, Value>,
    pub state: &'a IndexMap<String, Value>,
    pub clock: &'a dyn Clock,
}

/// Evaluate `expr` against `ctx`, appending any runtime diagnostics produced
/// (unknown function, division by zero) to `diagnostics`.
pub fn evaluate(expr: &Expression, ctx: &EvalContext, diagnostics: &mut Vec<Diagnostic>) -> Value {
    match expr {
        Expression::Literal { value, .. } => literal_value(value),
        Expression::Identifier { name, .. } => resolve_identifier(name, ctx),
        Expression::FieldAccess { base, field, .. } => {
            evaluate(base, ctx, diagnostics).field(field)
        }
        Expression::BinaryOp { left, op, right, location } => {
            evaluate_binary(*op, left, right, ctx, diagnostics, location)
        }
        Expression::UnaryOp { op, operand, .. } => {
            let value = evaluate(operand, ctx, diagnostics);
            apply_unary(*op, value)
        }
        Expression::FunctionCall { name, args, location } => {
            let values: Vec<Value> = args.iter().map(|a| evaluate(a, ctx, diagnostics)).collect();
            call_builtin(name, &values, ctx, diagnostics, location)
        }
        Expression::ObjectConstruction { fields, .. } => {
            let mut record = IndexMap::new();
            for (name, value_expr) in fields {
                record.insert(name.clone(), evaluate(value_expr, ctx, diagnostics));
            }
            Value::Record(record)
        }
    }
}

fn literal_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Integer(i) => Value::Integer(*i),
        LiteralValue::Float(f) => Value::Float(*f),
        LiteralValue::Str(s) => Value::Str(s.clone()),
        LiteralValue::Bool(b) => Value::Bool(*b),
    }
}

/// An Identifier is looked up first in the bound signal's payload (the
/// rule-local scope), then in the agent's state map. Unresolved identifiers
/// evaluate to [`Value::Null`] without error.
fn resolve_identifier(name: &str, ctx: &EvalContext) -> Value {
    if let Some(v) = ctx.locals.get(name) {
        return v.clone();
    }
    ctx.state.get(name).cloned().unwrap_or(Value::Null)
}

fn apply_unary(op: UnaryOperator, value: Value) -> Value {
    match (op, &value) {
        (UnaryOperator::Not, _) => Value::Bool(!value.is_truthy()),
        (UnaryOperator::Neg, Value::Integer(i)) => Value::Integer(-i),
        (UnaryOperator::Neg, Value::Float(f)) => Value::Float(-f),
        (UnaryOperator::Neg, _) => Value::Null,
    }
}

/// Numeric coercion ladder: `f64` dominates `i64` dominates `u32`. This
/// interpreter keeps one integer kind (`i64`) internally, so the ladder
/// collapses to "float wins if either operand is a float".
fn evaluate_binary(
    op: BinaryOperator,
    left: &Expression,
    right: &Expression,
    ctx: &EvalContext,
    diagnostics: &mut Vec<Diagnostic>,
    location: &SourceLocation,
) -> Value {
    // Short-circuit before evaluating the right operand.
    if op == BinaryOperator::And {
        let l = evaluate(left, ctx, diagnostics);
        if !l.is_truthy() {
            return Value::Bool(false);
        }
        return Value::Bool(evaluate(right, ctx, diagnostics).is_truthy());
    }
    if op == BinaryOperator::Or {
        let l = evaluate(left, ctx, diagnostics);
        if l.is_truthy() {
            return Value::Bool(true);
        }
        return Value::Bool(evaluate(right, ctx, diagnostics).is_truthy());
    }

    let l = evaluate(left, ctx, diagnostics);
    let r = evaluate(right, ctx, diagnostics);

    match op {
        BinaryOperator::Add => add(l, r),
        BinaryOperator::Sub => numeric_op(l, r, |a, b| a - b, |a, b| a - b),
        BinaryOperator::Mul => numeric_op(l, r, |a, b| a * b, |a, b| a * b),
        BinaryOperator::Div => divide(l, r, diagnostics, location),
        BinaryOperator::Rem => remainder(l, r, diagnostics, location),
        BinaryOperator::Eq => Value::Bool(l == r),
        BinaryOperator::NotEq => Value::Bool(l != r),
        BinaryOperator::Lt => compare(l, r, |o| o == std::cmp::Ordering::Less),
        BinaryOperator::LtEq => compare(l, r, |o| o != std::cmp::Ordering::Greater),
        BinaryOperator::Gt => compare(l, r, |o| o == std::cmp::Ordering::Greater),
        BinaryOperator::GtEq => compare(l, r, |o| o != std::cmp::Ordering::Less),
        BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above with short-circuiting"),
    }
}

/// `+` is arithmetic on numerics, concatenation on strings.
fn add(l: Value, r: Value) -> Value {
    match (&l, &r) {
        (Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
        _ => numeric_op(l, r, |a, b| a + b, |a, b| a + b),
    }
}

fn numeric_op(l: Value, r: Value, int_op: fn(i64, i64) -> i64, float_op: fn(f64, f64) -> f64) -> Value {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(int_op(a, b)),
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Value::Float(float_op(a, b)),
            _ => Value::Null,
        },
    }
}

fn divide(l: Value, r: Value, diagnostics: &mut Vec<Diagnostic>, location: &SourceLocation) -> Value {
    match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                diagnostics.push(Diagnostic::warning("division by zero", location.clone()));
                Value::Null
            } else {
                Value::Integer(a / b)
            }
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => {
                if b == 0.0 {
                    diagnostics.push(Diagnostic::warning("division by zero", location.clone()));
                    Value::Null
                } else {
                    Value::Float(a / b)
                }
            }
            _ => Value::Null,
        },
    }
}

fn remainder(l: Value, r: Value, diagnostics: &mut Vec<Diagnostic>, location: &SourceLocation) -> Value {
    match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                diagnostics.push(Diagnostic::warning("division by zero", location.clone()));
                Value::Null
            } else {
                Value::Integer(a % b)
            }
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => {
                if b == 0.0 {
                    diagnostics.push(Diagnostic::warning("division by zero", location.clone()));
                    Value::Null
                } else {
                    Value::Float(a % b)
                }
            }
            _ => Value::Null,
        },
    }
}

fn compare(l: Value, r: Value, accept: fn(std::cmp::Ordering) -> bool) -> Value {
    match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => match a.partial_cmp(&b) {
            Some(ord) => Value::Bool(accept(ord)),
            None => Value::Null,
        },
        _ => Value::Null,
    }
}

/// The built-in function registry. Unknown names yield [`Value::Null`]
/// plus a runtime diagnostic, never a panic.
fn call_builtin(
    name: &str,
    args: &[Value],
    ctx: &EvalContext,
    diagnostics: &mut Vec<Diagnostic>,
    location: &SourceLocation,
) -> Value {
    match name {
        "format" => builtin_format(args),
        "len" => args.first().and_then(Value::len).map(|n| Value::Integer(n as i64)).unwrap_or(Value::Null),
        "sum" => builtin_sum(args),
        "mean" => builtin_mean(args),
        "now" => Value::Integer(ctx.clock.now_millis()),
        _ => {
            diagnostics.push(Diagnostic::warning(format!("unknown function '{name}'"), location.clone()));
            Value::Null
        }
    }
}

/// `format(fmt, ...args)` substitutes `{}` left-to-right.
fn builtin_format(args: &[Value]) -> Value {
    let Some(Value::Str(fmt)) = args.first() else {
        return Value::Null;
    };
    let mut out = String::with_capacity(fmt.len());
    let mut rest = args[1..].iter();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            match rest.next() {
                Some(v) => out.push_str(&v.to_string()),
                None => out.push_str("{}"),
            }
        } else {
            out.push(c);
        }
    }
    Value::Str(out)
}

fn numeric_elements(container: &Value) -> Option<&[Value]> {
    match container {
        Value::List(items) => Some(items),
        _ => None,
    }
}

/// `sum(vec)`: integer sum if every element is an integer, float sum
/// otherwise (the coercion ladder applied element-wise).
fn builtin_sum(args: &[Value]) -> Value {
    let Some(items) = args.first().and_then(numeric_elements) else {
        return Value::Null;
    };
    if items.iter().all(|v| matches!(v, Value::Integer(_))) {
        let total: i64 = items
            .iter()
            .map(|v| if let Value::Integer(i) = v { *i } else { 0 })
            .sum();
        return Value::Integer(total);
    }
    match items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>() {
        Some(floats) => Value::Float(floats.iter().sum()),
        None => Value::Null,
    }
}

/// `mean(vec)`: numeric average, `0` for an empty vector.
fn builtin_mean(args: &[Value]) -> Value {
    let Some(items) = args.first().and_then(numeric_elements) else {
        return Value::Null;
    };
    if items.is_empty() {
        return Value::Integer(0);
    }
    match items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>() {
        Some(floats) => Value::Float(floats.iter().sum::<f64>() / floats.len() as f64),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypha_common::SystemClock;
    use hypha_parser::parse;

    fn eval_in_rule(src_expr: &str, state: IndexMap<String, Value>, locals: IndexMap<String, Value>) -> Value {
        let src = format!(
            "network n {{ frequencies {{}} hyphae {{ hyphal h {{ on rest {{ let r = {src_expr}; }} }} }} }}"
        );
        let (network, diags) = parse(&src, None);
        assert!(diags.is_empty(), "{diags:?}");
        let network = network.unwrap();
        let expr = match &network.hyphae[0].rules[0].body[0] {
            hypha_parser::ast::Statement::Let { value, .. } => value.clone(),
            _ => unreachable!(),
        };
        let clock = SystemClock;
        let ctx = EvalContext { locals: &locals, state: &state, clock: &clock };
        let mut diagnostics = Vec::new();
        evaluate(&expr, &ctx, &mut diagnostics)
    }

    #[test]
    fn arithmetic_on_integers() {
        assert_eq!(eval_in_rule("1 + 2 * 3", IndexMap::new(), IndexMap::new()), Value::Integer(7));
    }

    #[test]
    fn mixed_int_float_arithmetic_coerces_to_float() {
        assert_eq!(eval_in_rule("1 + 2.5", IndexMap::new(), IndexMap::new()), Value::Float(3.5));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            eval_in_rule(r#""a" + "b""#, IndexMap::new(), IndexMap::new()),
            Value::Str("ab".into())
        );
    }

    #[test]
    fn division_by_zero_is_null_with_diagnostic() {
        let src = "network n { frequencies {} hyphae { hyphal h { on rest { let r = 1 / 0; } } } }";
        let (network, _) = parse(src, None);
        let network = network.unwrap();
        let expr = match &network.hyphae[0].rules[0].body[0] {
            hypha_parser::ast::Statement::Let { value, .. } => value,
            _ => unreachable!(),
        };
        let clock = hypha_common::SystemClock;
        let empty = IndexMap::new();
        let ctx = EvalContext { locals: &empty, state: &empty, clock: &clock };
        let mut diagnostics = Vec::new();
        let result = evaluate(expr, &ctx, &mut diagnostics);
        assert_eq!(result, Value::Null);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("division by zero"));
    }

    #[test]
    fn relational_and_equality_operators() {
        assert_eq!(eval_in_rule("3 < 5", IndexMap::new(), IndexMap::new()), Value::Bool(true));
        assert_eq!(eval_in_rule("3 == 3", IndexMap::new(), IndexMap::new()), Value::Bool(true));
        assert_eq!(eval_in_rule("3 != 3", IndexMap::new(), IndexMap::new()), Value::Bool(false));
    }

    #[test]
    fn short_circuit_and_or() {
        assert_eq!(eval_in_rule("false && true", IndexMap::new(), IndexMap::new()), Value::Bool(false));
        assert_eq!(eval_in_rule("true || false", IndexMap::new(), IndexMap::new()), Value::Bool(true));
    }

    #[test]
    fn unary_not_and_negation() {
        assert_eq!(eval_in_rule("!false", IndexMap::new(), IndexMap::new()), Value::Bool(true));
        assert_eq!(eval_in_rule("-5", IndexMap::new(), IndexMap::new()), Value::Integer(-5));
    }

    #[test]
    fn unresolved_identifier_is_null_without_diagnostic() {
        let src = "network n { frequencies {} hyphae { hyphal h { on rest { let r = missing; } } } }";
        let (network, _) = parse(src, None);
        let network = network.unwrap();
        let expr = match &network.hyphae[0].rules[0].body[0] {
            hypha_parser::ast::Statement::Let { value, .. } => value,
            _ => unreachable!(),
        };
        let clock = hypha_common::SystemClock;
        let empty = IndexMap::new();
        let ctx = EvalContext { locals: &empty, state: &empty, clock: &clock };
        let mut diagnostics = Vec::new();
        assert_eq!(evaluate(expr, &ctx, &mut diagnostics), Value::Null);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn identifier_resolves_locals_before_state() {
        let mut state = IndexMap::new();
        state.insert("x".to_string(), Value::Integer(1));
        let mut locals = IndexMap::new();
        locals.insert("x".to_string(), Value::Integer(2));
        assert_eq!(eval_in_rule("x", state, locals), Value::Integer(2));
    }

    #[test]
    fn format_substitutes_braces_left_to_right() {
        assert_eq!(
            eval_in_rule(r#"format("Hello, {}! You are {}.", "world", 3)"#, IndexMap::new(), IndexMap::new()),
            Value::Str("Hello, world! You are 3.".into())
        );
    }

    #[test]
    fn unknown_function_is_null_with_diagnostic() {
        let src = "network n { frequencies {} hyphae { hyphal h { on rest { let r = mystery(1); } } } }";
        let (network, _) = parse(src, None);
        let network = network.unwrap();
        let expr = match &network.hyphae[0].rules[0].body[0] {
            hypha_parser::ast::Statement::Let { value, .. } => value,
            _ => unreachable!(),
        };
        let clock = hypha_common::SystemClock;
        let empty = IndexMap::new();
        let ctx = EvalContext { locals: &empty, state: &empty, clock: &clock };
        let mut diagnostics = Vec::new();
        assert_eq!(evaluate(expr, &ctx, &mut diagnostics), Value::Null);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("unknown function"));
    }
}
