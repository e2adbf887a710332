use serde_json::{json, Value};
use stache::{
    compile, render_to_string, CompileErrorKind, CompileOptions, Registry, RenderError,
};

fn program(source: &str) -> stache::RenderProgram {
    compile(source, &CompileOptions::default()).unwrap()
}

fn output(source: &str, data: Value) -> String {
    render_to_string(&program(source), &data, &Registry::new()).unwrap()
}

fn output_with(source: &str, data: Value, registry: &Registry) -> String {
    render_to_string(&program(source), &data, registry).unwrap()
}

#[test]
fn compiling_and_rendering_round_trips() {
    assert_eq!(output("<p>{{msg}}</p>", json!({"msg": "hi"})), "<p>hi</p>");
}

#[test]
fn rendering_is_repeatable() {
    let program = program("<p>{{n}}</p>");
    let registry = Registry::new();
    let first = render_to_string(&program, &json!({"n": 1}), &registry).unwrap();
    let second = render_to_string(&program, &json!({"n": 1}), &registry).unwrap();
    assert_eq!(first, second);
}

#[test]
fn if_else_follows_the_truthiness_table() {
    let source = "{{#if cond}}A{{else}}B{{/if}}";
    for truthy in [json!(true), json!(1), json!(-1), json!("x"), json!({"a": 1})] {
        assert_eq!(output(source, json!({ "cond": truthy })), "A");
    }
    for falsy in [json!(false), json!(0), json!(""), json!(null)] {
        assert_eq!(output(source, json!({ "cond": falsy })), "B");
    }
    // Missing entirely is falsy too.
    assert_eq!(output(source, json!({})), "B");
}

#[test]
fn unless_negates_the_condition() {
    let source = "{{#unless done}}pending{{else}}done{{/unless}}";
    assert_eq!(output(source, json!({"done": false})), "pending");
    assert_eq!(output(source, json!({"done": true})), "done");
}

#[test]
fn inverted_blocks_render_on_falsy_values() {
    let source = "{{^items}}empty{{/items}}";
    assert_eq!(output(source, json!({"items": false})), "empty");
    assert_eq!(output(source, json!({})), "empty");
    assert_eq!(output(source, json!({"items": true})), "");
}

#[test]
fn each_renders_indices() {
    assert_eq!(
        output(
            "{{#each items}}{{@index}}{{/each}}",
            json!({"items": [1, 2, 3, 4, 5]})
        ),
        "01234"
    );
}

#[test]
fn each_over_objects_exposes_keys() {
    assert_eq!(
        output(
            "{{#each prices}}{{@key}}={{this}};{{/each}}",
            json!({"prices": {"apple": 3, "pear": 5}})
        ),
        "apple=3;pear=5;"
    );
}

#[test]
fn parent_hops_ascend_one_context_per_level() {
    let data = json!({
        "name": "root",
        "child": {"name": "mid", "grand": {"name": "leaf"}}
    });
    assert_eq!(
        output(
            "{{#child}}{{#grand}}{{name}}/{{../name}}/{{../../name}}{{/grand}}{{/child}}",
            data
        ),
        "leaf/mid/root"
    );
}

#[test]
fn generic_block_true_is_not_a_context_push() {
    let data = json!({"flag": true, "name": "ada"});
    assert_eq!(output("{{#flag}}{{name}}{{/flag}}", data), "ada");
}

#[test]
fn generic_block_truthy_scalar_is_a_context_push() {
    let data = json!({"flag": "yes", "name": "ada"});
    assert_eq!(output("{{#flag}}{{name}}|{{this}}{{/flag}}", data), "|yes");
}

#[test]
fn generic_block_renders_zero_and_empty_string() {
    // Unlike `{{#if}}`, generic dispatch only skips null and missing.
    assert_eq!(output("({{#n}}{{this}}{{/n}})", json!({"n": 0})), "(0)");
    assert_eq!(output("({{#s}}x{{/s}})", json!({"s": ""})), "(x)");
    assert_eq!(output("({{#n}}x{{/n}})", json!({"n": null})), "()");
}

#[test]
fn conditional_attributes_are_set_when_the_gate_passes() {
    let source = "<p {{if warn class=\"warning\" role=\"alert\"}}>x</p>";
    assert_eq!(
        output(source, json!({"warn": true})),
        "<p class=\"warning\" role=\"alert\">x</p>"
    );
    assert_eq!(output(source, json!({"warn": false})), "<p>x</p>");
}

#[test]
fn inline_value_conditionals_gate_attribute_values() {
    let source = "<p class=\"{{if active}}\" data-mode={{if dark \"night\"}}>x</p>";
    assert_eq!(
        output(source, json!({"active": true, "dark": true})),
        "<p class=\"active\" data-mode=\"night\">x</p>"
    );
    assert_eq!(
        output(source, json!({"active": false, "dark": false})),
        "<p class=\"\" data-mode=\"\">x</p>"
    );
}

#[test]
fn paired_inline_conditionals_share_one_attribute_value() {
    let source = "<p class=\"{{if active}} {{unless busy idle}}\">x</p>";
    assert_eq!(
        output(source, json!({"active": true, "busy": false, "idle": "calm"})),
        "<p class=\"active calm\">x</p>"
    );
    assert_eq!(
        output(source, json!({"active": false, "busy": true})),
        "<p class=\" \">x</p>"
    );
}

#[test]
fn slash_paths_resolve_like_dotted_ones() {
    assert_eq!(
        output("{{user/name}}", json!({"user": {"name": "ada"}})),
        "ada"
    );
}

#[test]
fn mixed_attribute_values_concatenate() {
    assert_eq!(
        output(
            "<a href=\"/users/{{id}}\" title=\"{{first}} {{last}}\">x</a>",
            json!({"id": 7, "first": "Ada", "last": "L"})
        ),
        "<a href=\"/users/7\" title=\"Ada L\">x</a>"
    );
}

#[test]
fn helpers_take_positional_and_hash_arguments() {
    let mut registry = Registry::new();
    registry.register_helper("greet", |inv| {
        let name = inv.args.first().and_then(Value::as_str).unwrap_or("?");
        let punct = inv
            .hash
            .iter()
            .find(|(key, _)| key == "punct")
            .and_then(|(_, value)| value.as_str())
            .unwrap_or(".");
        Ok(Value::String(format!("hello {}{}", name, punct)))
    });
    assert_eq!(
        output_with(
            "{{greet name punct=\"!\"}}",
            json!({"name": "ada"}),
            &registry
        ),
        "hello ada!"
    );
}

#[test]
fn zero_argument_helpers_shadow_fields() {
    let mut registry = Registry::new();
    registry.register_helper("today", |_| Ok(json!("2026-08-25")));
    assert_eq!(
        output_with("{{today}}", json!({"today": "from data"}), &registry),
        "2026-08-25"
    );
}

#[test]
fn recursive_partials_walk_nested_data() {
    let mut registry = Registry::new();
    registry.register_partial(
        "node",
        program("{{name}}({{#each kids}}{{>node}}{{/each}})"),
    );
    let data = json!({
        "name": "a",
        "kids": [
            {"name": "b", "kids": []},
            {"name": "c", "kids": [{"name": "d", "kids": []}]}
        ]
    });
    assert_eq!(output_with("{{>node}}", data, &registry), "a(b()c(d()))");
}

#[test]
fn component_body_renders_against_the_caller_context() {
    let mut registry = Registry::new();
    registry.register_component(
        "my-alert",
        program("<div class=\"alert\">{{> @content}}</div>"),
    );
    let html = output_with(
        "<my-alert label=\"hi\">{{x}}</my-alert>",
        json!({"x": "outer"}),
        &registry,
    );
    assert_eq!(html, "<my-alert><div class=\"alert\">outer</div></my-alert>");
}

#[test]
fn component_props_are_camel_cased_and_resolved() {
    let mut registry = Registry::new();
    registry.register_component("my-button", program("<button>{{onClick}}:{{label}}</button>"));
    let html = output_with(
        "<my-button on-click={{handler}} label=\"Go\"></my-button>",
        json!({"handler": "save"}),
        &registry,
    );
    assert_eq!(html, "<my-button><button>save:Go</button></my-button>");
}

#[test]
fn component_wrapper_can_be_suppressed() {
    let compiled = compile(
        "<my-badge label=\"x\"></my-badge>",
        &CompileOptions {
            component_wrapper: false,
            ..CompileOptions::default()
        },
    )
    .unwrap();
    let mut registry = Registry::new();
    registry.register_component("my-badge", program("<b>{{label}}</b>"));
    let html = render_to_string(&compiled, &json!({}), &registry).unwrap();
    assert_eq!(html, "<b>x</b>");
}

#[test]
fn unregistered_component_raises_at_render_time() {
    let err = render_to_string(&program("<my-gone></my-gone>"), &json!({}), &Registry::new())
        .unwrap_err();
    assert_eq!(err, RenderError::MissingComponent("my-gone".to_string()));
}

#[test]
fn pre_blocks_keep_their_leading_newline() {
    // The serialization convention doubles the newline so a reparse sees it.
    assert_eq!(output("<pre>\ncode</pre>", json!({})), "<pre>\n\ncode</pre>");
}

#[test]
fn numeric_literal_paths_resolve() {
    assert_eq!(
        output("{{prices.0}}", json!({"prices": [9, 8]})),
        "9"
    );
    assert_eq!(
        output("{{a.[1]}}", json!({"a": ["x", "y"]})),
        "y"
    );
}

#[test]
fn block_close_must_match_the_innermost_open() {
    let err = compile("{{#each xs}}{{#if a}}x{{/each}}{{/if}}", &CompileOptions::default())
        .unwrap_err();
    assert_eq!(
        err.kind,
        CompileErrorKind::MismatchedBlockClose {
            found: "each".to_string(),
            expected: Some("if".to_string()),
        }
    );
}
