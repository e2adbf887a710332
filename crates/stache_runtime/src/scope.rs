use std::rc::Rc;

use serde_json::Value;
use stache_core::{MissingDefault, Path, PathSegment, SpecialRef};

use crate::error::RenderError;
use crate::registry::Registry;

/// Per-item metadata attached by iteration. For arrays `key` equals the
/// index; for objects it is the property name.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationMeta {
    pub index: usize,
    pub key: Value,
    pub first: bool,
    pub last: bool,
}

/// One link of the context chain a program renders against.
///
/// Scopes are immutable once built and shared through `Rc`: blocks push a
/// child, iterations push a child per item, component invocations start a
/// fresh chain whose data is the property bag.
#[derive(Debug, Clone)]
pub struct Scope {
    data: Value,
    parent: Option<Rc<Scope>>,
    iteration: Option<IterationMeta>,
    props: Option<Value>,
}

impl Scope {
    pub fn root(data: Value) -> Rc<Scope> {
        Rc::new(Scope {
            data,
            parent: None,
            iteration: None,
            props: None,
        })
    }

    /// A generic-block push: `data` becomes the context, `@parent` walks back.
    pub fn child(parent: &Rc<Scope>, data: Value) -> Rc<Scope> {
        Rc::new(Scope {
            data,
            parent: Some(parent.clone()),
            iteration: None,
            props: None,
        })
    }

    pub fn iteration(parent: &Rc<Scope>, data: Value, meta: IterationMeta) -> Rc<Scope> {
        Rc::new(Scope {
            data,
            parent: Some(parent.clone()),
            iteration: Some(meta),
            props: None,
        })
    }

    /// The root scope of a component program: properties are the data and
    /// are also reachable as `@props`.
    pub fn component(props: Value) -> Rc<Scope> {
        Rc::new(Scope {
            data: props.clone(),
            parent: None,
            iteration: None,
            props: Some(props),
        })
    }

    /// The scope a captured component body renders against: the caller's
    /// context verbatim, with the component properties linked as `@props`.
    pub fn content(caller: &Rc<Scope>, props: Value) -> Rc<Scope> {
        Rc::new(Scope {
            data: caller.data.clone(),
            parent: caller.parent.clone(),
            iteration: caller.iteration.clone(),
            props: Some(props),
        })
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The logical id of this context, used in node identities so repeated
    /// renders diff the same node. Iteration indices from the outermost
    /// loop inward, joined with `.`; empty outside any loop.
    pub fn context_id(&self) -> String {
        let mut indices = Vec::new();
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(meta) = &current.iteration {
                indices.push(meta.index.to_string());
            }
            scope = current.parent.as_deref();
        }
        indices.reverse();
        indices.join(".")
    }

    fn nearest_iteration(&self) -> Option<&IterationMeta> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(meta) = &current.iteration {
                return Some(meta);
            }
            scope = current.parent.as_deref();
        }
        None
    }

    fn nearest_props(&self) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(props) = &current.props {
                return Some(props);
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Resolve a path against this context.
    ///
    /// A single non-special segment consults the helper registry first: a
    /// registered helper of that name is called with no arguments and wins
    /// over field lookup. `@` specials may only lead the path; lookup is
    /// strict within the selected context, it never falls through to the
    /// parent (use `../`).
    pub fn resolve_path(
        &self,
        path: &Path,
        default: MissingDefault,
        registry: &Registry,
    ) -> Result<Value, RenderError> {
        if let [PathSegment::Key(name)] = path.as_slice() {
            if registry.has_helper(name) {
                return registry.call_helper(name, &[], &[], None);
            }
        }

        let mut scope = self;
        let mut current: Option<Value> = None;
        for segment in path {
            match segment {
                PathSegment::Special(special) if current.is_none() => match special {
                    SpecialRef::Parent => match scope.parent.as_deref() {
                        Some(parent) => scope = parent,
                        None => return Ok(missing(default)),
                    },
                    SpecialRef::Root => {
                        while let Some(parent) = scope.parent.as_deref() {
                            scope = parent;
                        }
                    }
                    SpecialRef::This => current = Some(scope.data.clone()),
                    SpecialRef::Key => match scope.nearest_iteration() {
                        Some(meta) => current = Some(meta.key.clone()),
                        None => return Ok(missing(default)),
                    },
                    SpecialRef::Index => match scope.nearest_iteration() {
                        Some(meta) => current = Some(Value::from(meta.index as u64)),
                        None => return Ok(missing(default)),
                    },
                    SpecialRef::First => match scope.nearest_iteration() {
                        Some(meta) => current = Some(Value::Bool(meta.first)),
                        None => return Ok(missing(default)),
                    },
                    SpecialRef::Last => match scope.nearest_iteration() {
                        Some(meta) => current = Some(Value::Bool(meta.last)),
                        None => return Ok(missing(default)),
                    },
                    SpecialRef::Props => match scope.nearest_props() {
                        Some(props) => current = Some(props.clone()),
                        None => return Ok(missing(default)),
                    },
                },
                // Specials never appear after a value-producing segment.
                PathSegment::Special(_) => return Ok(missing(default)),
                PathSegment::Key(key) => {
                    let base = match current.take() {
                        Some(value) => value,
                        None => scope.data.clone(),
                    };
                    match index_value(&base, key) {
                        Some(value) => current = Some(value),
                        None => return Ok(missing(default)),
                    }
                }
            }
        }
        Ok(current.unwrap_or_else(|| scope.data.clone()))
    }
}

fn index_value(base: &Value, key: &str) -> Option<Value> {
    match base {
        Value::Object(map) => map.get(key).cloned(),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index))
            .cloned(),
        _ => None,
    }
}

fn missing(default: MissingDefault) -> Value {
    match default {
        MissingDefault::Empty => Value::String(String::new()),
        MissingDefault::Null => Value::Null,
        MissingDefault::False => Value::Bool(false),
    }
}
