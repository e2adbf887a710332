//! Render program generation.
//!
//! The serializer walks a parsed template tree through the [`TreeAdapter`]
//! interface and lowers it into a [`RenderProgram`]: a nested instruction
//! tree plus the interned constant-attribute table, captured component
//! fragments, declared dependencies and a diagnostics source map.
//!
//! [`TreeAdapter`]: stache_core::TreeAdapter
//! [`RenderProgram`]: stache_core::RenderProgram

mod elements;
mod expr;
mod serializer;

pub use serializer::{serialize, Serializer};

#[cfg(test)]
mod tests {
    use super::*;
    use stache_core::{
        CompileErrorKind, CompileOptions, DynAttr, Expression, Instruction, MissingDefault,
        PathSegment, RenderProgram, TextPart,
    };
    use stache_parser::parse_template;

    fn compile(source: &str) -> RenderProgram {
        compile_with(source, &CompileOptions::default())
    }

    fn compile_with(source: &str, options: &CompileOptions) -> RenderProgram {
        let tree = parse_template(source).expect("template should parse");
        serialize(&tree, source, options).expect("template should serialize")
    }

    fn compile_err(source: &str) -> CompileErrorKind {
        let tree = parse_template(source).expect("template should parse");
        match serialize(&tree, source, &CompileOptions::default()) {
            Ok(_) => panic!("expected a serialize error for {:?}", source),
            Err(err) => err.kind,
        }
    }

    fn key(name: &str) -> PathSegment {
        PathSegment::Key(name.to_string())
    }

    #[test]
    fn coalesces_text_and_inline_mustaches() {
        let program = compile("a{{b}}c");
        assert_eq!(program.root.len(), 1);
        let Instruction::Text(parts) = &program.root[0] else {
            panic!("expected a text instruction");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], TextPart::Literal(lit) if lit == "a"));
        assert!(matches!(
            &parts[1],
            TextPart::Expr(Expression::Path { path, .. }) if path.as_slice() == [key("b")]
        ));
        assert!(matches!(&parts[2], TextPart::Literal(lit) if lit == "c"));
    }

    #[test]
    fn body_helpers_join_the_text_run() {
        let program = compile("x{{fmt a size=2}}y");
        let Instruction::Text(parts) = &program.root[0] else {
            panic!("expected a text instruction");
        };
        assert_eq!(parts.len(), 3);
        let TextPart::Expr(Expression::Helper { name, args, hash }) = &parts[1] else {
            panic!("expected a helper expression");
        };
        assert_eq!(name, "fmt");
        assert_eq!(args.len(), 1);
        assert_eq!(hash.len(), 1);
        assert_eq!(hash[0].0, "size");
    }

    #[test]
    fn interns_static_attribute_groups() {
        let program =
            compile("<p class=\"a\" id=\"b\"></p><p class=\"a\" id=\"b\"></p><p class=\"z\"></p>");
        assert_eq!(program.const_attrs.len(), 2);
        let indices: Vec<_> = program
            .root
            .iter()
            .map(|instruction| match instruction {
                Instruction::Element { const_attrs, .. } => *const_attrs,
                _ => panic!("expected elements"),
            })
            .collect();
        assert_eq!(indices, vec![Some(0), Some(0), Some(1)]);
        assert_eq!(
            program.const_attr_group(0),
            &[("class".to_string(), "a".to_string()), ("id".to_string(), "b".to_string())]
        );
    }

    #[test]
    fn ordinals_increase_per_element() {
        let program = compile("<p></p><div><br></div>");
        let Instruction::Element { ordinal, .. } = &program.root[0] else {
            panic!("expected element");
        };
        assert_eq!(*ordinal, 0);
        let Instruction::Element {
            ordinal, children, ..
        } = &program.root[1]
        else {
            panic!("expected element");
        };
        assert_eq!(*ordinal, 1);
        assert!(matches!(children[0], Instruction::Void { ordinal: 2, .. }));
    }

    #[test]
    fn lowers_dynamic_attribute_values() {
        let program = compile("<p class=\"x-{{y}}\"></p>");
        let Instruction::Element {
            const_attrs,
            dyn_attrs,
            ..
        } = &program.root[0]
        else {
            panic!("expected element");
        };
        assert_eq!(*const_attrs, None);
        let [DynAttr::Value { name, parts }] = dyn_attrs.as_slice() else {
            panic!("expected one dynamic attribute");
        };
        assert_eq!(name, "class");
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn lowers_element_located_conditionals() {
        let program = compile("<p {{if important}}>x</p>");
        let Instruction::Element { dyn_attrs, .. } = &program.root[0] else {
            panic!("expected element");
        };
        let [DynAttr::Cond {
            negate,
            implicit_name,
            sets,
            ..
        }] = dyn_attrs.as_slice()
        else {
            panic!("expected a conditional attribute");
        };
        assert!(!*negate);
        assert_eq!(implicit_name, "important");
        assert!(sets.is_empty());

        let program = compile("<p {{unless user.hidden class=\"on\" title=\"t\"}}>x</p>");
        let Instruction::Element { dyn_attrs, .. } = &program.root[0] else {
            panic!("expected element");
        };
        let [DynAttr::Cond { negate, sets, .. }] = dyn_attrs.as_slice() else {
            panic!("expected a conditional attribute");
        };
        assert!(*negate);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].0, "class");
    }

    #[test]
    fn builds_if_else_branches() {
        let program = compile("{{#if a}}x{{else}}y{{/if}}");
        let Instruction::If {
            negate,
            then_branch,
            else_branch,
            ..
        } = &program.root[0]
        else {
            panic!("expected an if instruction");
        };
        assert!(!*negate);
        assert_eq!(then_branch.len(), 1);
        assert_eq!(else_branch.as_ref().map(|b| b.len()), Some(1));

        let program = compile("{{#unless a}}x{{/unless}}");
        let Instruction::If {
            negate,
            else_branch,
            ..
        } = &program.root[0]
        else {
            panic!("expected an if instruction");
        };
        assert!(*negate);
        assert!(else_branch.is_none());
    }

    #[test]
    fn inverted_blocks_negate_with_false_default() {
        let program = compile("{{^items}}none{{/items}}");
        let Instruction::If { negate, cond, .. } = &program.root[0] else {
            panic!("expected an if instruction");
        };
        assert!(*negate);
        assert!(matches!(
            cond,
            Expression::Path {
                default: MissingDefault::False,
                ..
            }
        ));
    }

    #[test]
    fn builds_each_generic_and_helper_blocks() {
        let program = compile("{{#each items}}{{name}}{{/each}}");
        let Instruction::Each { items, body } = &program.root[0] else {
            panic!("expected an each instruction");
        };
        assert_eq!(items.as_slice(), [key("items")]);
        assert_eq!(body.len(), 1);

        let program = compile("{{#user}}{{name}}{{/user}}");
        let Instruction::Block { path, .. } = &program.root[0] else {
            panic!("expected a generic block");
        };
        assert_eq!(path.as_slice(), [key("user")]);

        let program = compile("{{#list items sep=\",\"}}i{{/list}}");
        let Instruction::HelperBlock {
            name, args, hash, ..
        } = &program.root[0]
        else {
            panic!("expected a helper block");
        };
        assert_eq!(name, "list");
        assert_eq!(args.len(), 1);
        assert_eq!(hash[0].0, "sep");
    }

    #[test]
    fn blocks_nest_across_the_marker_stream() {
        let program = compile("{{#if a}}{{#each items}}{{.}}{{/each}}{{/if}}done");
        assert_eq!(program.root.len(), 2);
        let Instruction::If { then_branch, .. } = &program.root[0] else {
            panic!("expected an if instruction");
        };
        assert!(matches!(then_branch[0], Instruction::Each { .. }));
        assert!(matches!(&program.root[1], Instruction::Text(_)));
    }

    #[test]
    fn lowers_partials() {
        let program = compile("{{>header}}");
        assert!(
            matches!(&program.root[0], Instruction::Partial { name } if name == "header")
        );
    }

    #[test]
    fn components_capture_fragments_and_normalize_props() {
        let source = concat!(
            "<my-tag title=\"Hi\" on-click={{handler}} note=\"n-{{x}}\">body {{text}}</my-tag>",
            "<my-tag></my-tag>"
        );
        let program = compile(source);
        let Instruction::Component {
            tag,
            id,
            wrapper,
            const_attrs,
            props,
            has_fragment,
            ..
        } = &program.root[0]
        else {
            panic!("expected a component");
        };
        assert_eq!(tag, "my-tag");
        assert_eq!(*id, format!("my-tag:{}:0", program.generation));
        assert!(*wrapper);
        assert_eq!(
            program.const_attr_group(const_attrs.expect("const attrs")),
            &[("title".to_string(), "Hi".to_string())]
        );
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].0, "onClick");
        assert_eq!(props[1].0, "note");
        assert!(*has_fragment);
        assert_eq!(program.fragments.len(), 1);
        assert_eq!(program.fragments[0].id, *id);

        let Instruction::Component {
            id, has_fragment, ..
        } = &program.root[1]
        else {
            panic!("expected a component");
        };
        assert_eq!(*id, format!("my-tag:{}:1", program.generation));
        assert!(!*has_fragment);
    }

    #[test]
    fn component_wrapper_can_be_disabled() {
        let options = CompileOptions {
            component_wrapper: false,
            ..Default::default()
        };
        let program = compile_with("<my-tag></my-tag>", &options);
        assert!(
            matches!(&program.root[0], Instruction::Component { wrapper: false, .. })
        );
    }

    #[test]
    fn require_declares_dependencies() {
        let program = compile(
            "<require from=\"./button\"></require><require from=\"./button\"></require><p></p>",
        );
        assert_eq!(program.dependencies, vec!["./button".to_string()]);
        assert_eq!(program.root.len(), 1);

        assert_eq!(
            compile_err("<require></require>"),
            CompileErrorKind::RequireMissingFrom
        );
        assert_eq!(
            compile_err("<require from={{x}}></require>"),
            CompileErrorKind::RequireDynamicAttr
        );
    }

    #[test]
    fn validates_block_pairing() {
        assert_eq!(
            compile_err("{{#if a}}x{{/each}}"),
            CompileErrorKind::MismatchedBlockClose {
                found: "each".to_string(),
                expected: Some("if".to_string()),
            }
        );
        assert_eq!(
            compile_err("{{/if}}"),
            CompileErrorKind::MismatchedBlockClose {
                found: "if".to_string(),
                expected: None,
            }
        );
        assert_eq!(compile_err("{{else}}"), CompileErrorKind::ElseWithoutBlock);
        assert_eq!(
            compile_err("{{#each items}}x{{else}}y{{/each}}"),
            CompileErrorKind::ElseAfter("each".to_string())
        );
        // Inverted blocks have no else branch, `{{^if}}` included.
        assert_eq!(
            compile_err("{{^items}}a{{else}}b{{/items}}"),
            CompileErrorKind::ElseAfter("items".to_string())
        );
        assert_eq!(
            compile_err("<p>{{#if a}}x</p>"),
            CompileErrorKind::UnclosedBlock("if".to_string())
        );
    }

    #[test]
    fn rejects_misused_element_mustaches() {
        assert_eq!(
            compile_err("<p {{bold x}}>t</p>"),
            CompileErrorKind::HelperInElement("bold".to_string())
        );
        assert_eq!(
            compile_err("<p {{x}}>t</p>"),
            CompileErrorKind::MustacheInElement
        );
        assert_eq!(
            compile_err("{{#each \"a\"}}x{{/each}}"),
            CompileErrorKind::EachNonPath("a".to_string())
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let a = compile("<p>{{msg}}</p>");
        let b = compile("<p>{{msg}}</p>");
        assert_eq!(a.generation, b.generation);
        assert_eq!(a, b);
    }

    #[test]
    fn pre_keeps_its_leading_newline() {
        let program = compile("<pre>\nfoo</pre>");
        let Instruction::Element { children, .. } = &program.root[0] else {
            panic!("expected element");
        };
        let Instruction::Text(parts) = &children[0] else {
            panic!("expected text");
        };
        assert!(matches!(&parts[0], TextPart::Literal(lit) if lit == "\nfoo"));
    }

    #[test]
    fn source_map_points_back_at_the_template() {
        let program = compile("<p>hi</p>\n<div></div>");
        assert_eq!(program.source_map.len(), 2);
        assert_eq!(program.source_map[0].name, "p");
        assert_eq!(program.source_map[0].original.line, 1);
        assert_eq!(program.source_map[1].name, "div");
        assert_eq!(program.source_map[1].original.line, 2);
    }
}
