use fxhash::FxHashMap;
use stache_core::{
    CompileError, CompileErrorKind, CompileOptions, Expression, Fragment, Instruction,
    MissingDefault, MustacheKind, MustacheToken, NodeId, RenderProgram, SourceMapping, SourcePos,
    TextPart, TreeAdapter,
};

use crate::expr::{expr_from_arg, split_helper_args};

/// Walks the syntax tree and produces the render program. One serializer
/// per compile; it owns the interning and identity state shared by every
/// sub-program (fragments included).
pub struct Serializer<'a, A: TreeAdapter> {
    pub(crate) tree: &'a A,
    pub(crate) options: &'a CompileOptions,
    pub(crate) generation: String,
    ordinal: u32,
    instr_count: u32,
    pub(crate) component_counts: FxHashMap<String, u32>,
    pub(crate) const_attrs: Vec<Vec<(String, String)>>,
    pub(crate) const_attr_index: FxHashMap<Vec<(String, String)>, u32>,
    pub(crate) fragments: Vec<Fragment>,
    pub(crate) dependencies: Vec<String>,
    source_map: Vec<SourceMapping>,
}

/// Serialize a parsed template into a render program.
pub fn serialize<A: TreeAdapter>(
    tree: &A,
    source: &str,
    options: &CompileOptions,
) -> Result<RenderProgram, CompileError> {
    let mut serializer = Serializer::new(tree, source, options);
    let roots: Vec<NodeId> = tree.children(tree.root()).to_vec();
    let root = serializer.serialize_children(&roots)?;
    Ok(serializer.finish(root))
}

/// A `{{#…}}`/`{{^…}}` the walk is currently inside. Instructions build up
/// in a side buffer until the matching close marker arrives; an `{{else}}`
/// stashes the buffer as the then-branch and starts over.
struct OpenBlock {
    token: MustacheToken,
    then_branch: Option<Vec<Instruction>>,
}

fn flush_parts(parts: &mut Vec<TextPart>, sink: &mut Vec<Instruction>) {
    if !parts.is_empty() {
        sink.push(Instruction::Text(std::mem::take(parts)));
    }
}

impl<'a, A: TreeAdapter> Serializer<'a, A> {
    pub fn new(tree: &'a A, source: &str, options: &'a CompileOptions) -> Serializer<'a, A> {
        Serializer {
            tree,
            options,
            generation: generation_id(options.source_name(), source),
            ordinal: 0,
            instr_count: 0,
            component_counts: FxHashMap::default(),
            const_attrs: Vec::new(),
            const_attr_index: FxHashMap::default(),
            fragments: Vec::new(),
            dependencies: Vec::new(),
            source_map: Vec::new(),
        }
    }

    fn finish(self, root: Vec<Instruction>) -> RenderProgram {
        RenderProgram {
            generation: self.generation,
            source_name: self.options.source_name().to_string(),
            root,
            fragments: self.fragments,
            const_attrs: self.const_attrs,
            dependencies: self.dependencies,
            source_map: self.source_map,
        }
    }

    pub(crate) fn next_ordinal(&mut self) -> u32 {
        let ordinal = self.ordinal;
        self.ordinal += 1;
        ordinal
    }

    pub(crate) fn map_instruction(&mut self, name: &str, pos: SourcePos) {
        self.instr_count += 1;
        self.source_map.push(SourceMapping {
            generated_line: self.instr_count,
            original: pos,
            name: name.to_string(),
        });
    }

    /// Serialize a child list into an instruction vector.
    ///
    /// Because the tree builder nests everything after a block open inside
    /// the open node, the lists chain at the tail: entering a block swaps
    /// the walk over to the block node's children and the outer list has
    /// nothing left. Close and else markers appear as plain children and
    /// drive the `blocks` stack.
    pub(crate) fn serialize_children(
        &mut self,
        nodes: &[NodeId],
    ) -> Result<Vec<Instruction>, CompileError> {
        let tree = self.tree;
        let mut out: Vec<Instruction> = Vec::new();
        let mut blocks: Vec<(OpenBlock, Vec<Instruction>)> = Vec::new();
        let mut parts: Vec<TextPart> = Vec::new();
        let mut lists: Vec<(Vec<NodeId>, usize)> = vec![(nodes.to_vec(), 0)];

        loop {
            let node = {
                let Some((list, cursor)) = lists.last_mut() else {
                    break;
                };
                match list.get(*cursor) {
                    Some(&node) => {
                        *cursor += 1;
                        node
                    }
                    None => {
                        lists.pop();
                        continue;
                    }
                }
            };

            if let Some(text) = tree.text(node) {
                parts.push(TextPart::Literal(text.to_string()));
                continue;
            }

            if let Some(token) = tree.mustache(node) {
                match token.kind {
                    MustacheKind::Tag => {
                        parts.push(TextPart::Expr(Expression::Path {
                            path: token.path.clone(),
                            default: MissingDefault::Empty,
                        }));
                    }
                    MustacheKind::Helper => {
                        let (args, hash) = split_helper_args(token);
                        parts.push(TextPart::Expr(Expression::Helper {
                            name: token.tag_name().to_string(),
                            args,
                            hash,
                        }));
                    }
                    MustacheKind::BlockOpen | MustacheKind::InvertedBlockOpen => {
                        {
                            let sink = match blocks.last_mut() {
                                Some((_, buf)) => buf,
                                None => &mut out,
                            };
                            flush_parts(&mut parts, sink);
                        }
                        self.map_instruction(token.tag_name(), token.pos);
                        blocks.push((
                            OpenBlock {
                                token: token.clone(),
                                then_branch: None,
                            },
                            Vec::new(),
                        ));
                        lists.push((tree.children(node).to_vec(), 0));
                    }
                    MustacheKind::Else => {
                        let Some((open, buf)) = blocks.last_mut() else {
                            return Err(CompileError::new(
                                CompileErrorKind::ElseWithoutBlock,
                                token.pos,
                            ));
                        };
                        flush_parts(&mut parts, buf);
                        let takes_else = open.token.kind == MustacheKind::BlockOpen
                            && matches!(open.token.tag_name(), "if" | "unless");
                        if !takes_else {
                            return Err(CompileError::new(
                                CompileErrorKind::ElseAfter(open.token.tag_name().to_string()),
                                token.pos,
                            ));
                        }
                        if open.then_branch.is_some() {
                            return Err(CompileError::new(
                                CompileErrorKind::ElseAfter("else".to_string()),
                                token.pos,
                            ));
                        }
                        open.then_branch = Some(std::mem::take(buf));
                    }
                    MustacheKind::BlockClose => {
                        let found = token.tag_name().to_string();
                        let Some((open, mut buf)) = blocks.pop() else {
                            return Err(CompileError::new(
                                CompileErrorKind::MismatchedBlockClose {
                                    found,
                                    expected: None,
                                },
                                token.pos,
                            ));
                        };
                        flush_parts(&mut parts, &mut buf);
                        if found != open.token.tag_name() {
                            return Err(CompileError::new(
                                CompileErrorKind::MismatchedBlockClose {
                                    found,
                                    expected: Some(open.token.tag_name().to_string()),
                                },
                                token.pos,
                            ));
                        }
                        let instruction = self.build_block(open, buf)?;
                        let sink = match blocks.last_mut() {
                            Some((_, buf)) => buf,
                            None => &mut out,
                        };
                        sink.push(instruction);
                    }
                    MustacheKind::Partial => {
                        let sink = match blocks.last_mut() {
                            Some((_, buf)) => buf,
                            None => &mut out,
                        };
                        flush_parts(&mut parts, sink);
                        let name = partial_name(token);
                        self.map_instruction(&name, token.pos);
                        let sink = match blocks.last_mut() {
                            Some((_, buf)) => buf,
                            None => &mut out,
                        };
                        sink.push(Instruction::Partial { name });
                    }
                }
                continue;
            }

            if tree.is_element(node) {
                {
                    let sink = match blocks.last_mut() {
                        Some((_, buf)) => buf,
                        None => &mut out,
                    };
                    flush_parts(&mut parts, sink);
                }
                if let Some(instruction) = self.serialize_element(node)? {
                    let sink = match blocks.last_mut() {
                        Some((_, buf)) => buf,
                        None => &mut out,
                    };
                    sink.push(instruction);
                }
            }
        }

        if let Some((open, _)) = blocks.last() {
            return Err(CompileError::new(
                CompileErrorKind::UnclosedBlock(open.token.tag_name().to_string()),
                open.token.pos,
            ));
        }
        flush_parts(&mut parts, &mut out);
        Ok(out)
    }

    /// Turn a completed block into its instruction. `tail` is whatever
    /// accumulated after the last `{{else}}` (or the whole body without one).
    fn build_block(
        &mut self,
        open: OpenBlock,
        tail: Vec<Instruction>,
    ) -> Result<Instruction, CompileError> {
        let token = open.token;
        let (then_branch, else_branch) = match open.then_branch {
            Some(before_else) => (before_else, Some(tail)),
            None => (tail, None),
        };
        match token.kind {
            MustacheKind::InvertedBlockOpen => Ok(Instruction::If {
                negate: true,
                cond: Expression::Path {
                    path: token.path.clone(),
                    default: MissingDefault::False,
                },
                then_branch,
                else_branch,
            }),
            MustacheKind::BlockOpen => match token.tag_name() {
                name @ ("if" | "unless") => {
                    let Some(first) = token.args.iter().find(|arg| arg.is_positional()) else {
                        return Err(CompileError::new(
                            CompileErrorKind::InlineCondArity(
                                "#if/#unless requires a condition argument",
                            ),
                            token.pos,
                        ));
                    };
                    Ok(Instruction::If {
                        negate: name == "unless",
                        cond: expr_from_arg(&first.name, MissingDefault::Empty),
                        then_branch,
                        else_branch,
                    })
                }
                "each" => {
                    let Some(first) = token.args.iter().find(|arg| arg.is_positional()) else {
                        return Err(CompileError::new(
                            CompileErrorKind::InlineCondArity(
                                "#each requires an items argument",
                            ),
                            token.pos,
                        ));
                    };
                    match first.name.as_path() {
                        Some(items) => Ok(Instruction::Each {
                            items: items.clone(),
                            body: then_branch,
                        }),
                        None => Err(CompileError::new(
                            CompileErrorKind::EachNonPath(first.name.implicit_name()),
                            token.pos,
                        )),
                    }
                }
                name => {
                    if token.args.is_empty() {
                        Ok(Instruction::Block {
                            path: token.path.clone(),
                            body: then_branch,
                        })
                    } else {
                        let (args, hash) = split_helper_args(&token);
                        Ok(Instruction::HelperBlock {
                            name: name.to_string(),
                            args,
                            hash,
                            body: then_branch,
                        })
                    }
                }
            },
            _ => Err(CompileError::new(
                CompileErrorKind::BlockOutsideBody,
                token.pos,
            )),
        }
    }
}

fn partial_name(token: &MustacheToken) -> String {
    match &token.tag_name {
        Some(name) => name.clone(),
        None => token
            .path
            .iter()
            .map(|segment| segment.display_name())
            .collect::<Vec<_>>()
            .join("."),
    }
}

/// Deterministic per-compile id, part of every node identity. Derived from
/// the source so recompiling an unchanged template yields the same ids.
fn generation_id(source_name: &str, source: &str) -> String {
    base36(fxhash::hash64(&(source_name, source)))
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}
