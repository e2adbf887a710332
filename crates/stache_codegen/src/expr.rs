//! Lowering of token-level values into render program expressions.

use stache_core::{
    ArgValue, AttrPart, CompileError, CompileErrorKind, Expression, MissingDefault,
    MustacheToken, TextPart,
};

pub(crate) fn expr_from_arg(value: &ArgValue, default: MissingDefault) -> Expression {
    match value {
        ArgValue::Str(s) => Expression::Str(s.clone()),
        ArgValue::Num(n) => Expression::Num(n.clone()),
        ArgValue::Bool(b) => Expression::Bool(*b),
        ArgValue::Null => Expression::Null,
        ArgValue::Path(path) => Expression::Path {
            path: path.clone(),
            default,
        },
    }
}

/// Split a helper token's arguments into positionals and hash pairs.
pub(crate) fn split_helper_args(
    token: &MustacheToken,
) -> (Vec<Expression>, Vec<(String, Expression)>) {
    let mut args = Vec::new();
    let mut hash = Vec::new();
    for arg in &token.args {
        match &arg.value {
            None => args.push(expr_from_arg(&arg.name, MissingDefault::Empty)),
            Some(value) => hash.push((
                arg.name.implicit_name(),
                expr_from_arg(value, MissingDefault::Empty),
            )),
        }
    }
    (args, hash)
}

/// An `{{if …}}`/`{{unless …}}` in attribute-value position. One argument
/// yields the argument's own name on a pass, further arguments concatenate
/// into the result. Hash arguments make no sense here.
pub(crate) fn inline_cond_value(token: &MustacheToken) -> Result<Expression, CompileError> {
    let negate = token.tag_name() == "unless";
    if token.args.iter().any(|arg| !arg.is_positional()) {
        return Err(CompileError::new(
            CompileErrorKind::InlineCondArity(
                "attribute-value if/unless cannot take hash arguments",
            ),
            token.pos,
        ));
    }
    let Some(first) = token.args.first() else {
        return Err(CompileError::new(
            CompileErrorKind::InlineCondArity(
                "attribute-value if/unless requires a condition argument",
            ),
            token.pos,
        ));
    };
    let gate = expr_from_arg(&first.name, MissingDefault::Empty);
    let implicit_name = first.name.implicit_name();
    let results = token.args[1..]
        .iter()
        .map(|arg| expr_from_arg(&arg.name, MissingDefault::Empty))
        .collect();
    Ok(Expression::CondValue {
        negate,
        gate: Box::new(gate),
        implicit_name,
        results,
    })
}

/// Convert an attribute's value fragments into render text parts.
pub(crate) fn value_parts(parts: &[AttrPart]) -> Result<Vec<TextPart>, CompileError> {
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            AttrPart::Literal(lit) => out.push(TextPart::Literal(lit.clone())),
            AttrPart::Expr(token) => out.push(TextPart::Expr(mustache_value_expr(token)?)),
        }
    }
    Ok(out)
}

/// A mustache embedded in an attribute value: a plain path, an inline
/// conditional or an inline helper call.
pub(crate) fn mustache_value_expr(token: &MustacheToken) -> Result<Expression, CompileError> {
    use stache_core::MustacheKind;
    match token.kind {
        MustacheKind::Tag => Ok(Expression::Path {
            path: token.path.clone(),
            default: MissingDefault::Empty,
        }),
        MustacheKind::Helper => match token.tag_name() {
            "if" | "unless" => inline_cond_value(token),
            name => {
                let (args, hash) = split_helper_args(token);
                Ok(Expression::Helper {
                    name: name.to_string(),
                    args,
                    hash,
                })
            }
        },
        // Partials and block markers were rejected by the tokenizer.
        _ => Err(CompileError::new(
            CompileErrorKind::BlockOutsideBody,
            token.pos,
        )),
    }
}
