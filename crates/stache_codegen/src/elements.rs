use stache_core::{
    is_void_tag, CompileError, CompileErrorKind, DynAttr, ElementData, Fragment, Instruction,
    MissingDefault, MustacheKind, MustacheToken, NodeId, TagAttr,
};

use crate::expr::{expr_from_arg, value_parts};
use crate::serializer::Serializer;
use stache_core::TreeAdapter;

impl<'a, A: TreeAdapter> Serializer<'a, A> {
    /// Serialize one element node. `<require>` contributes a dependency
    /// and no instruction; dash-named tags become component invocations.
    pub(crate) fn serialize_element(
        &mut self,
        node: NodeId,
    ) -> Result<Option<Instruction>, CompileError> {
        let tree = self.tree;
        let Some(element) = tree.element(node) else {
            return Ok(None);
        };
        if element.tag_name == "require" {
            self.serialize_require(element)?;
            return Ok(None);
        }
        if tree.is_component(node) {
            return self.serialize_component(element, node).map(Some);
        }

        let mut static_attrs: Vec<(String, String)> = Vec::new();
        let mut dyn_attrs: Vec<DynAttr> = Vec::new();
        for attr in &element.attrs {
            match attr {
                TagAttr::Html(attr) => match attr.static_value() {
                    Some(value) => static_attrs.push((attr.name.clone(), value.to_string())),
                    None => dyn_attrs.push(DynAttr::Value {
                        name: attr.name.clone(),
                        parts: value_parts(&attr.parts)?,
                    }),
                },
                TagAttr::Mustache(token) => dyn_attrs.push(element_cond(token)?),
            }
        }
        let const_attrs = self.intern_attrs(static_attrs);
        let ordinal = self.next_ordinal();
        self.map_instruction(&element.tag_name, element.pos);

        if is_void_tag(&element.tag_name) {
            return Ok(Some(Instruction::Void {
                tag: element.tag_name.clone(),
                ordinal,
                const_attrs,
                dyn_attrs,
            }));
        }
        let child_nodes: Vec<NodeId> = tree.children(node).to_vec();
        let children = self.serialize_children(&child_nodes)?;
        Ok(Some(Instruction::Element {
            tag: element.tag_name.clone(),
            ordinal,
            const_attrs,
            dyn_attrs,
            children,
        }))
    }

    /// `<require from="module">` declares a dependency for the host to
    /// resolve; the element and its children leave no trace in the program.
    fn serialize_require(&mut self, element: &ElementData) -> Result<(), CompileError> {
        let mut from = None;
        for attr in &element.attrs {
            match attr {
                TagAttr::Mustache(_) => {
                    return Err(CompileError::new(
                        CompileErrorKind::RequireDynamicAttr,
                        element.pos,
                    ));
                }
                TagAttr::Html(attr) => match attr.static_value() {
                    None => {
                        return Err(CompileError::new(
                            CompileErrorKind::RequireDynamicAttr,
                            element.pos,
                        ));
                    }
                    Some(value) => {
                        if attr.name == "from" {
                            from = Some(value.to_string());
                        }
                    }
                },
            }
        }
        match from {
            Some(module) => {
                if !self.dependencies.contains(&module) {
                    self.dependencies.push(module);
                }
                Ok(())
            }
            None => Err(CompileError::new(
                CompileErrorKind::RequireMissingFrom,
                element.pos,
            )),
        }
    }

    fn serialize_component(
        &mut self,
        element: &ElementData,
        node: NodeId,
    ) -> Result<Instruction, CompileError> {
        let tag = element.tag_name.clone();
        let count = {
            let counter = self.component_counts.entry(tag.clone()).or_insert(0);
            let current = *counter;
            *counter += 1;
            current
        };
        let id = format!("{}:{}:{}", tag, self.generation, count);

        let mut static_attrs: Vec<(String, String)> = Vec::new();
        let mut props = Vec::new();
        for attr in &element.attrs {
            match attr {
                TagAttr::Mustache(_) => {
                    return Err(CompileError::new(
                        CompileErrorKind::ComponentMustacheAttr,
                        element.pos,
                    ));
                }
                TagAttr::Html(attr) => {
                    let name = camel_case_prop(&attr.name);
                    match attr.static_value() {
                        Some(value) => static_attrs.push((name, value.to_string())),
                        None => props.push((name, value_parts(&attr.parts)?)),
                    }
                }
            }
        }
        let const_attrs = self.intern_attrs(static_attrs);

        let child_nodes: Vec<NodeId> = self.tree.children(node).to_vec();
        let has_fragment = !child_nodes.is_empty();
        if has_fragment {
            let body = self.serialize_children(&child_nodes)?;
            self.fragments.push(Fragment {
                id: id.clone(),
                body,
            });
        }
        let ordinal = self.next_ordinal();
        self.map_instruction(&tag, element.pos);
        Ok(Instruction::Component {
            tag,
            ordinal,
            id,
            wrapper: self.options.component_wrapper,
            const_attrs,
            props,
            has_fragment,
        })
    }

    pub(crate) fn intern_attrs(&mut self, attrs: Vec<(String, String)>) -> Option<u32> {
        if attrs.is_empty() {
            return None;
        }
        if let Some(&index) = self.const_attr_index.get(&attrs) {
            return Some(index);
        }
        let index = self.const_attrs.len() as u32;
        self.const_attr_index.insert(attrs.clone(), index);
        self.const_attrs.push(attrs);
        Some(index)
    }
}

/// An element-located mustache: only the conditional-attribute forms of
/// `if`/`unless` are meaningful inside a start tag.
fn element_cond(token: &MustacheToken) -> Result<DynAttr, CompileError> {
    if token.kind != MustacheKind::Helper {
        return Err(CompileError::new(
            CompileErrorKind::MustacheInElement,
            token.pos,
        ));
    }
    let negate = match token.tag_name() {
        "if" => false,
        "unless" => true,
        name => {
            return Err(CompileError::new(
                CompileErrorKind::HelperInElement(name.to_string()),
                token.pos,
            ));
        }
    };
    let positionals: Vec<_> = token.args.iter().filter(|arg| arg.is_positional()).collect();
    if positionals.len() != 1 {
        return Err(CompileError::new(
            CompileErrorKind::InlineCondArity(
                "element-located if/unless takes exactly one condition argument",
            ),
            token.pos,
        ));
    }
    let gate = expr_from_arg(&positionals[0].name, MissingDefault::Empty);
    let implicit_name = positionals[0].name.implicit_name();
    let mut sets = Vec::new();
    for arg in &token.args {
        if let Some(value) = &arg.value {
            sets.push((
                arg.name.implicit_name(),
                expr_from_arg(value, MissingDefault::Empty),
            ));
        }
    }
    Ok(DynAttr::Cond {
        negate,
        gate,
        implicit_name,
        sets,
    })
}

/// Component prop names normalize to camelCase, so `on-click` arrives as
/// `onClick` and `data-user-id` as `dataUserId`.
fn camel_case_prop(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '-' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
