//! Executes the render programs produced by `stache_codegen`.
//!
//! The compiler never touches any of this: helpers, partials, components
//! and fragments live in a [`Registry`] owned by the embedder, data flows
//! through an `Rc`-linked [`Scope`] chain, and the node stream is driven
//! into a [`Patcher`] supplied per render. [`HtmlWriter`] is the string
//! patcher the test suites render through.

mod error;
mod patcher;
mod registry;
mod render;
mod scope;
mod value;

pub use error::RenderError;
pub use patcher::{HtmlWriter, Patcher};
pub use registry::{HelperBody, HelperFn, HelperInvocation, Registry};
pub use render::{render, render_to_string};
pub use scope::{IterationMeta, Scope};
pub use value::{is_truthy, stringify};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use stache_core::{CompileOptions, RenderProgram};

    fn compile(source: &str) -> RenderProgram {
        let tree = stache_parser::parse_template(source).unwrap();
        stache_codegen::serialize(&tree, source, &CompileOptions::default()).unwrap()
    }

    fn output(source: &str, data: Value) -> String {
        output_with(source, data, &Registry::new())
    }

    fn output_with(source: &str, data: Value, registry: &Registry) -> String {
        render_to_string(&compile(source), &data, registry).unwrap()
    }

    #[test]
    fn renders_literal_markup_unchanged() {
        assert_eq!(
            output("<div class=\"box\"><p>hi</p><br></div>", json!({})),
            "<div class=\"box\"><p>hi</p><br></div>"
        );
    }

    #[test]
    fn resolves_body_expressions() {
        assert_eq!(
            output("<p>{{user.name}}!</p>", json!({"user": {"name": "ada"}})),
            "<p>ada!</p>"
        );
    }

    #[test]
    fn missing_body_expression_renders_empty() {
        assert_eq!(output("<p>{{nope}}</p>", json!({})), "<p></p>");
    }

    #[test]
    fn each_exposes_index_metadata() {
        assert_eq!(
            output(
                "{{#each items}}{{@index}}{{/each}}",
                json!({"items": [1, 2, 3, 4, 5]})
            ),
            "01234"
        );
    }

    #[test]
    fn each_marks_first_and_last() {
        assert_eq!(
            output(
                "{{#each items}}{{#if @first}}[{{/if}}{{this}}{{#if @last}}]{{/if}}{{/each}}",
                json!({"items": ["a", "b", "c"]})
            ),
            "[abc]"
        );
    }

    #[test]
    fn generic_block_true_keeps_the_context() {
        let data = json!({"flag": true, "name": "ada"});
        assert_eq!(output("{{#flag}}{{name}}{{/flag}}", data), "ada");
    }

    #[test]
    fn generic_block_scalar_becomes_the_context() {
        let data = json!({"flag": "yes", "name": "ada"});
        // The scalar shadows the outer fields: `name` is gone, `this` is it.
        assert_eq!(output("{{#flag}}{{name}}:{{this}}{{/flag}}", data), ":yes");
    }

    #[test]
    fn generic_block_skips_null_and_missing() {
        assert_eq!(output("a{{#flag}}x{{/flag}}b", json!({"flag": null})), "ab");
        assert_eq!(output("a{{#flag}}x{{/flag}}b", json!({})), "ab");
    }

    #[test]
    fn generic_block_iterates_sequences() {
        assert_eq!(
            output("{{#items}}{{this}}{{/items}}", json!({"items": [1, 2, 3]})),
            "123"
        );
    }

    #[test]
    fn parent_hop_resolves_in_the_enclosing_context() {
        let data = json!({"label": "outer", "inner": {"label": "inner"}});
        assert_eq!(
            output("{{#inner}}{{../label}}-{{label}}{{/inner}}", data),
            "outer-inner"
        );
    }

    #[test]
    fn block_helper_controls_its_body() {
        let mut registry = Registry::new();
        registry.register_helper("repeat", |inv| {
            let times = inv.args.first().and_then(Value::as_u64).unwrap_or(0);
            if let Some(body) = inv.body.as_mut() {
                for _ in 0..times {
                    body(None)?;
                }
            }
            Ok(Value::Null)
        });
        assert_eq!(
            output_with("{{#repeat 3}}x{{/repeat}}", json!({}), &registry),
            "xxx"
        );
    }

    #[test]
    fn block_helper_may_push_a_context() {
        let mut registry = Registry::new();
        registry.register_helper("with", |inv| {
            let value = inv.args.first().cloned().unwrap_or(Value::Null);
            if let Some(body) = inv.body.as_mut() {
                body(Some(&value))?;
            }
            Ok(Value::Null)
        });
        assert_eq!(
            output_with(
                "{{#with user}}{{name}}{{/with}}",
                json!({"user": {"name": "ada"}}),
                &registry
            ),
            "ada"
        );
    }

    #[test]
    fn inline_helper_renders_its_result() {
        let mut registry = Registry::new();
        registry.register_helper("shout", |inv| {
            let text = inv
                .args
                .first()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_uppercase();
            Ok(Value::String(text))
        });
        assert_eq!(
            output_with("{{shout name}}!", json!({"name": "ada"}), &registry),
            "ADA!"
        );
    }

    #[test]
    fn unregistered_helper_fails_the_render() {
        let program = compile("{{nope a b}}");
        let err = render_to_string(&program, &json!({}), &Registry::new()).unwrap_err();
        assert_eq!(err, RenderError::MissingHelper("nope".to_string()));
    }

    #[test]
    fn partials_render_against_the_current_context() {
        let mut registry = Registry::new();
        registry.register_partial("badge", compile("<b>{{name}}</b>"));
        assert_eq!(
            output_with(
                "{{#each people}}{{>badge}}{{/each}}",
                json!({"people": [{"name": "a"}, {"name": "b"}]}),
                &registry
            ),
            "<b>a</b><b>b</b>"
        );
    }

    #[test]
    fn unknown_partial_fails_the_render() {
        let program = compile("{{>missing}}");
        let err = render_to_string(&program, &json!({}), &Registry::new()).unwrap_err();
        assert_eq!(err, RenderError::MissingPartial("missing".to_string()));
    }

    #[test]
    fn components_receive_props_as_their_data() {
        let mut registry = Registry::new();
        registry.register_component("my-badge", compile("<b>{{label}}</b>"));
        assert_eq!(
            output_with(
                "<my-badge label={{name}}></my-badge>",
                json!({"name": "ada"}),
                &registry
            ),
            "<my-badge><b>ada</b></my-badge>"
        );
    }

    #[test]
    fn component_content_renders_in_the_caller_context() {
        let mut registry = Registry::new();
        registry.register_component("my-alert", compile("<div>{{> @content}}</div>"));
        assert_eq!(
            output_with(
                "<my-alert kind=\"warn\">{{x}}</my-alert>",
                json!({"x": "outer value"}),
                &registry
            ),
            "<my-alert><div>outer value</div></my-alert>"
        );
    }

    #[test]
    fn component_content_sees_props() {
        let mut registry = Registry::new();
        registry.register_component("my-alert", compile("{{> @content}}"));
        assert_eq!(
            output_with(
                "<my-alert kind=\"warn\">{{@props.kind}}</my-alert>",
                json!({}),
                &registry
            ),
            "<my-alert>warn</my-alert>"
        );
    }

    #[test]
    fn unregistered_component_fails_the_render() {
        let program = compile("<my-gone></my-gone>");
        let err = render_to_string(&program, &json!({}), &Registry::new()).unwrap_err();
        assert_eq!(err, RenderError::MissingComponent("my-gone".to_string()));
    }

    #[test]
    fn conditional_attributes_come_and_go() {
        let source = "<p {{if warn class=\"warning\"}}>x</p>";
        assert_eq!(
            output(source, json!({"warn": true})),
            "<p class=\"warning\">x</p>"
        );
        assert_eq!(output(source, json!({"warn": false})), "<p>x</p>");
    }

    #[test]
    fn dynamic_attribute_values_concatenate() {
        assert_eq!(
            output("<p class=\"box {{kind}}\">x</p>", json!({"kind": "wide"})),
            "<p class=\"box wide\">x</p>"
        );
    }
}
