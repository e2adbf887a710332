use std::rc::Rc;

use serde_json::Value;
use stache_core::{
    DynAttr, Expression, Instruction, MissingDefault, Path, RenderProgram, TextPart,
};

use crate::error::RenderError;
use crate::patcher::Patcher;
use crate::registry::Registry;
use crate::scope::{IterationMeta, Scope};
use crate::value::{is_truthy, number_from_raw, stringify};

/// Execute a render program against `data`, driving `patcher` with the
/// resulting node stream.
pub fn render<P: Patcher>(
    program: &RenderProgram,
    data: &Value,
    registry: &Registry,
    patcher: &mut P,
) -> Result<(), RenderError> {
    let scope = Scope::root(data.clone());
    let mut renderer = Renderer { registry, patcher };
    renderer.run(&program.root, program, &scope, None)
}

/// Render to an HTML string via [`crate::HtmlWriter`]. Test convenience.
pub fn render_to_string(
    program: &RenderProgram,
    data: &Value,
    registry: &Registry,
) -> Result<String, RenderError> {
    let mut writer = crate::HtmlWriter::new();
    render(program, data, registry, &mut writer)?;
    Ok(writer.html())
}

/// The captured body of the component invocation currently being rendered,
/// resolvable through `{{> @content}}`. `scope` is the caller's context;
/// `program` owns the instructions (fragment const-attr indices point into
/// its tables). `outer` restores the frame that was active at the call
/// site, so a body containing another `@content` keeps resolving outward.
struct ContentFrame<'a> {
    instructions: &'a [Instruction],
    program: &'a RenderProgram,
    scope: Rc<Scope>,
    props: Value,
    outer: Option<&'a ContentFrame<'a>>,
}

struct Renderer<'r, P: Patcher> {
    registry: &'r Registry,
    patcher: &'r mut P,
}

impl<'r, P: Patcher> Renderer<'r, P> {
    fn run(
        &mut self,
        instructions: &[Instruction],
        program: &RenderProgram,
        scope: &Rc<Scope>,
        content: Option<&ContentFrame<'_>>,
    ) -> Result<(), RenderError> {
        for instruction in instructions {
            match instruction {
                Instruction::Text(parts) => {
                    let mut text = String::new();
                    for part in parts {
                        match part {
                            TextPart::Literal(literal) => text.push_str(literal),
                            TextPart::Expr(expr) => {
                                let value = eval_expression(expr, scope, self.registry)?;
                                text.push_str(&stringify(&value));
                            }
                        }
                    }
                    self.patcher.text(&text);
                }
                Instruction::Element {
                    tag,
                    ordinal,
                    const_attrs,
                    dyn_attrs,
                    children,
                } => {
                    let identity = node_identity(program, *ordinal, scope);
                    let const_group = const_group(program, *const_attrs);
                    if dyn_attrs.is_empty() {
                        self.patcher.open_node(tag, &identity, const_group);
                    } else {
                        self.patcher.open_node_start(tag, &identity);
                        for (name, value) in const_group {
                            self.patcher.attr(name, value);
                        }
                        for attr in dyn_attrs {
                            for (name, value) in self.eval_dyn_attr(attr, scope)? {
                                self.patcher.attr(&name, &value);
                            }
                        }
                        self.patcher.open_node_end(tag);
                    }
                    self.run(children, program, scope, content)?;
                    self.patcher.close_node(tag);
                }
                Instruction::Void {
                    tag,
                    ordinal,
                    const_attrs,
                    dyn_attrs,
                } => {
                    let identity = node_identity(program, *ordinal, scope);
                    let mut attrs = const_group(program, *const_attrs).to_vec();
                    for attr in dyn_attrs {
                        attrs.extend(self.eval_dyn_attr(attr, scope)?);
                    }
                    self.patcher.void_node(tag, &identity, &attrs);
                }
                Instruction::If {
                    negate,
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    let value = eval_expression(cond, scope, self.registry)?;
                    if is_truthy(&value) != *negate {
                        self.run(then_branch, program, scope, content)?;
                    } else if let Some(branch) = else_branch {
                        self.run(branch, program, scope, content)?;
                    }
                }
                Instruction::Each { items, body } => {
                    let value = resolve(items, MissingDefault::Null, scope, self.registry)?;
                    self.iterate(&value, body, program, scope, content)?;
                }
                Instruction::Block { path, body } => {
                    let value = resolve(path, MissingDefault::Null, scope, self.registry)?;
                    match value {
                        Value::Null => {}
                        Value::Array(_) => {
                            self.iterate(&value, body, program, scope, content)?;
                        }
                        // `true` renders once without touching the context;
                        // any other value, falsy scalars included, becomes
                        // the new context for one pass.
                        Value::Bool(true) => {
                            self.run(body, program, scope, content)?;
                        }
                        other => {
                            let pushed = Scope::child(scope, other);
                            self.run(body, program, &pushed, content)?;
                        }
                    }
                }
                Instruction::HelperBlock {
                    name,
                    args,
                    hash,
                    body,
                } => {
                    self.call_block_helper(name, args, hash, body, program, scope, content)?;
                }
                Instruction::Partial { name } => {
                    if name == "@content" {
                        let Some(frame) = content else {
                            return Err(RenderError::MissingContent);
                        };
                        let body_scope = Scope::content(&frame.scope, frame.props.clone());
                        self.run(frame.instructions, frame.program, &body_scope, frame.outer)?;
                    } else {
                        let Some(partial) = self.registry.partial(name) else {
                            return Err(RenderError::MissingPartial(name.clone()));
                        };
                        self.run(&partial.root, partial, scope, content)?;
                    }
                }
                Instruction::Component {
                    tag,
                    ordinal,
                    id,
                    wrapper,
                    const_attrs,
                    props,
                    has_fragment,
                } => {
                    let Some(component) = self.registry.component(tag) else {
                        return Err(RenderError::MissingComponent(tag.clone()));
                    };
                    let mut bag = serde_json::Map::new();
                    for (name, value) in const_group(program, *const_attrs) {
                        bag.insert(name.clone(), Value::String(value.clone()));
                    }
                    for (name, parts) in props {
                        bag.insert(name.clone(), self.eval_parts(parts, scope)?);
                    }
                    let props_value = Value::Object(bag);

                    if *wrapper {
                        let identity = node_identity(program, *ordinal, scope);
                        self.patcher.open_node(tag, &identity, &[]);
                    }
                    let frame = if *has_fragment {
                        let (instructions, owner) = match program.fragment(id) {
                            Some(fragment) => (fragment.body.as_slice(), program),
                            None => match self.registry.fragment(id) {
                                Some(sub) => (sub.root.as_slice(), sub),
                                None => (&[][..], program),
                            },
                        };
                        Some(ContentFrame {
                            instructions,
                            program: owner,
                            scope: scope.clone(),
                            props: props_value.clone(),
                            outer: content,
                        })
                    } else {
                        None
                    };
                    let component_scope = Scope::component(props_value);
                    self.run(&component.root, component, &component_scope, frame.as_ref())?;
                    if *wrapper {
                        self.patcher.close_node(tag);
                    }
                }
            }
        }
        Ok(())
    }

    fn iterate(
        &mut self,
        items: &Value,
        body: &[Instruction],
        program: &RenderProgram,
        scope: &Rc<Scope>,
        content: Option<&ContentFrame<'_>>,
    ) -> Result<(), RenderError> {
        match items {
            Value::Array(values) => {
                let last = values.len().saturating_sub(1);
                for (index, item) in values.iter().enumerate() {
                    let meta = IterationMeta {
                        index,
                        key: Value::from(index as u64),
                        first: index == 0,
                        last: index == last,
                    };
                    let item_scope = Scope::iteration(scope, item.clone(), meta);
                    self.run(body, program, &item_scope, content)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                let last = map.len().saturating_sub(1);
                for (index, (key, item)) in map.iter().enumerate() {
                    let meta = IterationMeta {
                        index,
                        key: Value::String(key.clone()),
                        first: index == 0,
                        last: index == last,
                    };
                    let item_scope = Scope::iteration(scope, item.clone(), meta);
                    self.run(body, program, &item_scope, content)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn call_block_helper(
        &mut self,
        name: &str,
        args: &[Expression],
        hash: &[(String, Expression)],
        body: &[Instruction],
        program: &RenderProgram,
        scope: &Rc<Scope>,
        content: Option<&ContentFrame<'_>>,
    ) -> Result<(), RenderError> {
        let registry = self.registry;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(eval_expression(arg, scope, registry)?);
        }
        let mut hash_values = Vec::with_capacity(hash.len());
        for (key, expr) in hash {
            hash_values.push((key.clone(), eval_expression(expr, scope, registry)?));
        }
        let mut run_body = |pushed: Option<&Value>| -> Result<(), RenderError> {
            match pushed {
                Some(value) => {
                    let body_scope = Scope::child(scope, value.clone());
                    self.run(body, program, &body_scope, content)
                }
                None => self.run(body, program, scope, content),
            }
        };
        registry.call_helper(name, &arg_values, &hash_values, Some(&mut run_body))?;
        Ok(())
    }

    /// A dynamic attribute yields zero or more `(name, value)` pairs.
    fn eval_dyn_attr(
        &mut self,
        attr: &DynAttr,
        scope: &Rc<Scope>,
    ) -> Result<Vec<(String, String)>, RenderError> {
        match attr {
            DynAttr::Value { name, parts } => {
                let value = self.eval_parts(parts, scope)?;
                Ok(vec![(name.clone(), stringify(&value))])
            }
            DynAttr::Cond {
                negate,
                gate,
                implicit_name,
                sets,
            } => {
                let gate_value = eval_expression(gate, scope, self.registry)?;
                if is_truthy(&gate_value) == *negate {
                    return Ok(Vec::new());
                }
                if sets.is_empty() {
                    return Ok(vec![(implicit_name.clone(), stringify(&gate_value))]);
                }
                let mut out = Vec::with_capacity(sets.len());
                for (name, expr) in sets {
                    let value = eval_expression(expr, scope, self.registry)?;
                    out.push((name.clone(), stringify(&value)));
                }
                Ok(out)
            }
        }
    }

    /// A single-expression part list passes the resolved value through
    /// unstringified; mixed lists concatenate to a string.
    fn eval_parts(&self, parts: &[TextPart], scope: &Rc<Scope>) -> Result<Value, RenderError> {
        if let [TextPart::Expr(expr)] = parts {
            return eval_expression(expr, scope, self.registry);
        }
        let mut text = String::new();
        for part in parts {
            match part {
                TextPart::Literal(literal) => text.push_str(literal),
                TextPart::Expr(expr) => {
                    let value = eval_expression(expr, scope, self.registry)?;
                    text.push_str(&stringify(&value));
                }
            }
        }
        Ok(Value::String(text))
    }
}

fn const_group(program: &RenderProgram, index: Option<u32>) -> &[(String, String)] {
    match index {
        Some(index) => program.const_attr_group(index),
        None => &[],
    }
}

fn node_identity(program: &RenderProgram, ordinal: u32, scope: &Scope) -> String {
    let context_id = scope.context_id();
    if context_id.is_empty() {
        format!("{}:{}", program.generation, ordinal)
    } else {
        format!("{}:{}:{}", program.generation, ordinal, context_id)
    }
}

fn resolve(
    path: &Path,
    default: MissingDefault,
    scope: &Rc<Scope>,
    registry: &Registry,
) -> Result<Value, RenderError> {
    scope.resolve_path(path, default, registry)
}

fn eval_expression(
    expr: &Expression,
    scope: &Rc<Scope>,
    registry: &Registry,
) -> Result<Value, RenderError> {
    match expr {
        Expression::Path { path, default } => resolve(path, *default, scope, registry),
        Expression::Str(s) => Ok(Value::String(s.clone())),
        Expression::Num(raw) => Ok(number_from_raw(raw)),
        Expression::Bool(b) => Ok(Value::Bool(*b)),
        Expression::Null => Ok(Value::Null),
        Expression::Helper { name, args, hash } => {
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(eval_expression(arg, scope, registry)?);
            }
            let mut hash_values = Vec::with_capacity(hash.len());
            for (key, value) in hash {
                hash_values.push((key.clone(), eval_expression(value, scope, registry)?));
            }
            registry.call_helper(name, &arg_values, &hash_values, None)
        }
        Expression::CondValue {
            negate,
            gate,
            implicit_name,
            results,
        } => {
            let gate_value = eval_expression(gate, scope, registry)?;
            if is_truthy(&gate_value) == *negate {
                return Ok(Value::String(String::new()));
            }
            match results.as_slice() {
                [] => Ok(Value::String(implicit_name.clone())),
                [single] => eval_expression(single, scope, registry),
                many => {
                    let mut text = String::new();
                    for result in many {
                        let value = eval_expression(result, scope, registry)?;
                        text.push_str(&stringify(&value));
                    }
                    Ok(Value::String(text))
                }
            }
        }
    }
}
