use fxhash::FxHashMap;
use serde_json::Value;
use stache_core::RenderProgram;

use crate::error::RenderError;

/// The body callback handed to block helpers. `Some(value)` renders the
/// block body once with `value` pushed as the context; `None` renders it
/// against the helper's own calling context.
pub type HelperBody<'a> = &'a mut dyn FnMut(Option<&Value>) -> Result<(), RenderError>;

/// One helper call. `body` is present only for `{{#helper}}…{{/helper}}`
/// invocations; the helper decides whether and how often to run it. The
/// body borrow is mutable and lives independently of the argument slices,
/// so it carries its own lifetime.
pub struct HelperInvocation<'a, 'b> {
    pub args: &'a [Value],
    pub hash: &'a [(String, Value)],
    pub body: Option<HelperBody<'b>>,
}

pub type HelperFn = Box<dyn Fn(&mut HelperInvocation) -> Result<Value, RenderError>>;

/// Helpers, partials, components and fragments for one template namespace.
///
/// The embedder owns the instance and passes it to every render; nothing
/// here is global, two registries never observe each other.
#[derive(Default)]
pub struct Registry {
    helpers: FxHashMap<String, HelperFn>,
    partials: FxHashMap<String, RenderProgram>,
    components: FxHashMap<String, RenderProgram>,
    fragments: FxHashMap<String, RenderProgram>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register_helper<F>(&mut self, name: &str, helper: F)
    where
        F: Fn(&mut HelperInvocation) -> Result<Value, RenderError> + 'static,
    {
        self.helpers.insert(name.to_string(), Box::new(helper));
    }

    pub fn register_partial(&mut self, name: &str, program: RenderProgram) {
        self.partials.insert(name.to_string(), program);
    }

    pub fn register_component(&mut self, tag: &str, program: RenderProgram) {
        self.components.insert(tag.to_string(), program);
    }

    /// Register every fragment of `program` as a standalone sub-program, so
    /// `@content` lookups work when the invoking program is not at hand.
    pub fn register_fragments(&mut self, program: &RenderProgram) {
        for fragment in &program.fragments {
            let sub = RenderProgram {
                generation: program.generation.clone(),
                source_name: program.source_name.clone(),
                root: fragment.body.clone(),
                fragments: program.fragments.clone(),
                const_attrs: program.const_attrs.clone(),
                dependencies: Vec::new(),
                source_map: Vec::new(),
            };
            self.fragments.insert(fragment.id.clone(), sub);
        }
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn partial(&self, name: &str) -> Option<&RenderProgram> {
        self.partials.get(name)
    }

    pub fn component(&self, tag: &str) -> Option<&RenderProgram> {
        self.components.get(tag)
    }

    pub fn fragment(&self, id: &str) -> Option<&RenderProgram> {
        self.fragments.get(id)
    }

    pub fn call_helper(
        &self,
        name: &str,
        args: &[Value],
        hash: &[(String, Value)],
        body: Option<HelperBody<'_>>,
    ) -> Result<Value, RenderError> {
        let Some(helper) = self.helpers.get(name) else {
            return Err(RenderError::MissingHelper(name.to_string()));
        };
        let mut invocation = HelperInvocation { args, hash, body };
        helper(&mut invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unregistered_helper_is_an_error() {
        let registry = Registry::new();
        let err = registry.call_helper("nope", &[], &[], None).unwrap_err();
        assert_eq!(err, RenderError::MissingHelper("nope".to_string()));
    }

    #[test]
    fn helpers_receive_positional_and_hash_arguments() {
        let mut registry = Registry::new();
        registry.register_helper("greet", |inv| {
            let name = inv.args.first().cloned().unwrap_or(Value::Null);
            let loud = inv
                .hash
                .iter()
                .any(|(key, value)| key == "loud" && value == &json!(true));
            let mut text = format!("hello {}", name.as_str().unwrap_or("?"));
            if loud {
                text.make_ascii_uppercase();
            }
            Ok(Value::String(text))
        });
        let result = registry
            .call_helper(
                "greet",
                &[json!("ada")],
                &[("loud".to_string(), json!(true))],
                None,
            )
            .unwrap();
        assert_eq!(result, json!("HELLO ADA"));
    }

    #[test]
    fn body_callback_borrows_independently_of_arguments() {
        let mut registry = Registry::new();
        registry.register_helper("twice", |inv| {
            if let Some(body) = inv.body.as_mut() {
                body(None)?;
                body(None)?;
            }
            Ok(Value::Null)
        });
        let args = vec![json!(1)];
        let mut count = 0;
        {
            let mut run = |_: Option<&Value>| -> Result<(), RenderError> {
                count += 1;
                Ok(())
            };
            registry
                .call_helper("twice", &args, &[], Some(&mut run))
                .unwrap();
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn registered_fragments_become_standalone_programs() {
        let mut registry = Registry::new();
        let program = RenderProgram {
            generation: "g1".to_string(),
            fragments: vec![stache_core::Fragment {
                id: "my-tag:g1:0".to_string(),
                body: Vec::new(),
            }],
            ..RenderProgram::default()
        };
        registry.register_fragments(&program);
        let sub = registry.fragment("my-tag:g1:0").unwrap();
        assert_eq!(sub.generation, "g1");
    }
}
