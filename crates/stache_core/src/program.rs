use serde::{Deserialize, Serialize};

use crate::{Path, SourcePos};

/// The compiled artifact: an ordered instruction tree plus the side tables
/// the runtime needs to execute it. The program is plain data; it can be
/// inspected, serialized and shipped without any source evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderProgram {
    /// Deterministic per-compile generation id, part of every node identity.
    pub generation: String,
    pub source_name: String,
    pub root: Vec<Instruction>,
    /// Component body sub-programs, keyed by generated component id.
    pub fragments: Vec<Fragment>,
    /// Interned static attribute groups, referenced by index.
    pub const_attrs: Vec<Vec<(String, String)>>,
    /// Module names declared by `<require from="…">` elements.
    pub dependencies: Vec<String>,
    /// Diagnostics-only mapping from generated instructions to the source.
    pub source_map: Vec<SourceMapping>,
}

/// A captured component body, retrievable at render time via `{{> @content}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMapping {
    pub generated_line: u32,
    pub original: SourcePos,
    pub name: String,
}

/// What a path expression yields when resolution hits a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingDefault {
    /// Body text and attribute values: missing renders as `""`.
    Empty,
    /// Generic block dispatch: missing must stay distinguishable from `""`.
    Null,
    /// Inverted blocks: missing is plainly false.
    False,
}

/// A computed value inside the render program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Resolve a path against the current context. A single non-special
    /// segment first consults the helper registry (zero-argument call).
    Path {
        path: Path,
        default: MissingDefault,
    },
    Str(String),
    /// Raw spelling preserved; parsed by the runtime.
    Num(String),
    Bool(bool),
    Null,
    /// Inline helper invocation, e.g. inside an attribute value.
    Helper {
        name: String,
        args: Vec<Expression>,
        hash: Vec<(String, Expression)>,
    },
    /// Inline `{{if gate result…}}` / `{{unless …}}` in an attribute value.
    /// With no `results`, a truthy gate yields `implicit_name`.
    CondValue {
        negate: bool,
        gate: Box<Expression>,
        implicit_name: String,
        results: Vec<Expression>,
    },
}

/// One fragment of an emit-text instruction or of a dynamic attribute value.
/// A single-`Expr` list passes the resolved value through unstringified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextPart {
    Literal(String),
    Expr(Expression),
}

/// A per-render attribute of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DynAttr {
    /// `value={{x}}`, `class="a-{{b}}"`
    Value { name: String, parts: Vec<TextPart> },
    /// `{{if cond class="x" …}}` inside a start tag. With no `sets`, a
    /// truthy gate sets the attribute named `implicit_name` to the gate
    /// value itself.
    Cond {
        negate: bool,
        gate: Expression,
        implicit_name: String,
        sets: Vec<(String, Expression)>,
    },
}

/// A single render instruction. Sub-programs (`children`, branch and body
/// vectors) are owned in place, so the program forms a tree the runtime
/// walks once per render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Open/close pair around children. `ordinal` feeds node identity.
    Element {
        tag: String,
        ordinal: u32,
        const_attrs: Option<u32>,
        dyn_attrs: Vec<DynAttr>,
        children: Vec<Instruction>,
    },
    /// Void element, no children traversal.
    Void {
        tag: String,
        ordinal: u32,
        const_attrs: Option<u32>,
        dyn_attrs: Vec<DynAttr>,
    },
    /// Coalesced literal/computed text.
    Text(Vec<TextPart>),
    /// Structural `{{#if}}`/`{{#unless}}`/`{{^name}}` conditional.
    If {
        negate: bool,
        cond: Expression,
        then_branch: Vec<Instruction>,
        else_branch: Option<Vec<Instruction>>,
    },
    /// Structural `{{#each items}}`.
    Each { items: Path, body: Vec<Instruction> },
    /// Generic `{{#name}}` block: runtime dispatch on the resolved value.
    Block { path: Path, body: Vec<Instruction> },
    /// `{{#helper args…}}`: the body is handed to the helper as a callable.
    HelperBlock {
        name: String,
        args: Vec<Expression>,
        hash: Vec<(String, Expression)>,
        body: Vec<Instruction>,
    },
    /// `{{>name}}`: runtime partial invocation with the current context.
    Partial { name: String },
    /// Custom-tag component invocation.
    Component {
        tag: String,
        ordinal: u32,
        /// Stable id under which the captured body fragment is registered.
        id: String,
        wrapper: bool,
        const_attrs: Option<u32>,
        props: Vec<(String, Vec<TextPart>)>,
        has_fragment: bool,
    },
}

impl RenderProgram {
    pub fn fragment(&self, id: &str) -> Option<&Fragment> {
        self.fragments.iter().find(|fragment| fragment.id == id)
    }

    pub fn const_attr_group(&self, index: u32) -> &[(String, String)] {
        self.const_attrs
            .get(index as usize)
            .map(|group| group.as_slice())
            .unwrap_or(&[])
    }
}
