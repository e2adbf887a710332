//! The mustache half of the tokenizer: identifier, path and argument
//! states, plus kind disambiguation when the closing `}}` is reached.

use std::str::FromStr;

use smallvec::SmallVec;
use stache_core::{
    ArgValue, AttrPart, CompileError, CompileErrorKind, MustacheArg, MustacheKind,
    MustacheLocation, MustacheToken, PathSegment, SpecialRef, TagAttr, Token,
};

use crate::tokenizer::{is_mustache_ident_char, is_whitespace, State, Tokenizer};

impl Tokenizer {
    fn new_mustache(&mut self, kind: MustacheKind, self_closing: bool) {
        self.ident.clear();
        self.current_mustache = Some(MustacheToken {
            kind,
            path: SmallVec::new(),
            tag_name: None,
            args: Vec::new(),
            location: self.location,
            self_closing,
            pos: self.mustache_pos,
        });
    }

    /// Close one identifier fragment and push it on the path. `this` maps
    /// to the `@this` special, a lone `@` is remembered and folded into the
    /// following segment, other `@`-spellings resolve to specials where
    /// known. Bracket literals are taken verbatim.
    fn leave_ident_fragment(&mut self, from_literal: bool) {
        let buf = std::mem::take(&mut self.ident.buf);
        if buf.is_empty() {
            return;
        }
        if from_literal {
            self.ident.path.push(PathSegment::Key(buf));
            return;
        }
        if buf == "this" {
            self.ident.path.push(PathSegment::Special(SpecialRef::This));
            return;
        }
        if buf == "@" {
            self.ident.leading_at = true;
            return;
        }
        let segment = if buf.starts_with('@') {
            match SpecialRef::from_str(&buf) {
                Ok(special) => PathSegment::Special(special),
                Err(_) => PathSegment::Key(buf),
            }
        } else {
            PathSegment::Key(buf)
        };
        self.ident.path.push(segment);
    }

    /// Take the completed identifier. A pending `@` attaches to the final
    /// segment, so `@../index` resolves to the parent scope's `@index`.
    fn finish_ident(&mut self) -> (stache_core::Path, bool) {
        let mut path = std::mem::take(&mut self.ident.path);
        if self.ident.leading_at {
            if let Some(last) = path.pop() {
                let spelled = format!("@{}", last.display_name());
                let segment = match SpecialRef::from_str(&spelled) {
                    Ok(special) => PathSegment::Special(special),
                    Err(_) => PathSegment::Key(spelled),
                };
                path.push(segment);
            }
        }
        let numeric = self.ident.numeric;
        self.ident.leading_at = false;
        self.ident.numeric = false;
        (path, numeric)
    }

    /// Identifier in a value position: single-segment literals collapse to
    /// typed values, everything else stays a path expression.
    fn finish_ident_value(&mut self) -> ArgValue {
        let (path, numeric) = self.finish_ident();
        if path.len() == 1 {
            if let Some(key) = path[0].key() {
                if numeric {
                    return ArgValue::Num(key.to_string());
                }
                match key {
                    "true" => return ArgValue::Bool(true),
                    "false" => return ArgValue::Bool(false),
                    "null" => return ArgValue::Null,
                    _ => {}
                }
            }
        }
        ArgValue::Path(path)
    }

    /// Attach the completed identifier to the token as its path/tag name.
    /// No-op when nothing is pending, so looping states may call it freely.
    fn finish_mustache_path(&mut self) {
        if self.ident.path.is_empty() && !self.ident.leading_at {
            return;
        }
        let (path, _) = self.finish_ident();
        if let Some(token) = self.current_mustache.as_mut() {
            if path.len() == 1 {
                token.tag_name = Some(path[0].display_name().to_string());
            }
            token.path = path;
        }
    }

    fn leave_mustache_arg_name(&mut self, assign: bool) -> Result<(), CompileError> {
        let name = if self.arg_name_quoted {
            ArgValue::Str(std::mem::take(&mut self.arg_buf))
        } else {
            self.finish_ident_value()
        };
        let name = if assign {
            match name {
                ArgValue::Path(path) => {
                    if path.len() == 1 {
                        ArgValue::Str(path[0].display_name().to_string())
                    } else {
                        return Err(self.err(CompileErrorKind::AssignToPath));
                    }
                }
                other => other,
            }
        } else {
            name
        };
        if let Some(token) = self.current_mustache.as_mut() {
            token.args.push(MustacheArg { name, value: None });
        }
        Ok(())
    }

    fn leave_mustache_arg_value(&mut self) {
        let value = if self.arg_value_quoted {
            ArgValue::Str(std::mem::take(&mut self.arg_buf))
        } else {
            self.finish_ident_value()
        };
        if let Some(token) = self.current_mustache.as_mut() {
            if let Some(arg) = token.args.last_mut() {
                arg.value = Some(value);
            }
        }
    }

    /// Final kind disambiguation and routing of the finished token.
    fn emit_mustache(&mut self) -> Result<(), CompileError> {
        let Some(mut token) = self.current_mustache.take() else {
            return Ok(());
        };
        if token.kind == MustacheKind::Tag {
            if !token.args.is_empty() {
                token.kind = MustacheKind::Helper;
            } else if token.tag_name() == "else" {
                token.kind = MustacheKind::Else;
                token.self_closing = true;
            }
        }
        let is_block = matches!(
            token.kind,
            MustacheKind::BlockOpen
                | MustacheKind::InvertedBlockOpen
                | MustacheKind::BlockClose
                | MustacheKind::Else
        );
        if is_block && token.location != MustacheLocation::Body {
            return Err(CompileError::new(
                CompileErrorKind::BlockOutsideBody,
                token.pos,
            ));
        }
        match token.location {
            MustacheLocation::Body => {
                self.flush_body_text();
                self.tokens.push(Token::Mustache(token));
            }
            MustacheLocation::Element => {
                if let Some(tag) = self.current_tag.as_mut() {
                    tag.attrs.push(TagAttr::Mustache(token));
                }
            }
            MustacheLocation::AttributeValue => {
                if let Some(attr) = self.current_attr.as_mut() {
                    attr.flush_lit();
                    attr.parts.push(AttrPart::Expr(token));
                }
            }
        }
        Ok(())
    }

    fn flush_body_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.tokens.push(Token::Text(text));
        }
    }

    pub(crate) fn before_mustache_open_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            Some('{') => self.state = State::MustacheOpen,
            _ => {
                // A lone `{` stands for itself.
                match self.location {
                    MustacheLocation::AttributeValue => {
                        if let Some(attr) = self.current_attr.as_mut() {
                            attr.lit.push('{');
                        }
                    }
                    _ => self.text.push('{'),
                }
                self.reconsume_in_prev();
            }
        }
        Ok(())
    }

    pub(crate) fn mustache_open_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some('}') => Err(self.err(CompileErrorKind::EmptyMustache)),
            Some('{') | Some('&') => Err(self.err(CompileErrorKind::EscapedMustache)),
            Some('#') => {
                self.new_mustache(MustacheKind::BlockOpen, false);
                self.return_states.push(State::BeforeMustacheAttributeName);
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some('^') => {
                self.new_mustache(MustacheKind::InvertedBlockOpen, false);
                self.return_states.push(State::BeforeMustacheAttributeName);
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some('/') => {
                self.new_mustache(MustacheKind::BlockClose, true);
                self.return_states.push(State::BeforeMustacheAttributeName);
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some('>') => {
                if self.location != MustacheLocation::Body {
                    return Err(self.err(CompileErrorKind::PartialOutsideBody));
                }
                self.new_mustache(MustacheKind::Partial, true);
                self.return_states.push(State::AfterMustachePartialName);
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some(_) => {
                self.new_mustache(MustacheKind::Tag, true);
                self.return_states.push(State::BeforeMustacheAttributeName);
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
        }
    }

    pub(crate) fn mustache_close_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some('}') => {
                self.state = self.return_states.pop().unwrap_or(State::Data);
                self.emit_mustache()
            }
            Some(ch) => Err(self.err(CompileErrorKind::UnterminatedMustache(ch))),
        }
    }

    pub(crate) fn mustache_identifier_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        let is_first = self.ident.is_first_char();
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof(
                "inside mustache identifier",
            ))),
            Some(ch) if is_whitespace(ch) => {
                // Whitespace before the identifier is insignificant.
                if !is_first {
                    self.leave_ident_fragment(false);
                    self.reconsume_in_prev();
                }
                Ok(())
            }
            Some(ch) if is_first && (ch == '-' || ch.is_ascii_digit()) => {
                self.ident.buf.push(ch);
                self.state = State::MustacheIdentifierNumeric;
                Ok(())
            }
            Some('}') => {
                if is_first {
                    return Err(self.err(CompileErrorKind::EmptyMustache));
                }
                self.leave_ident_fragment(false);
                self.reconsume_in_prev();
                Ok(())
            }
            Some('[') => {
                self.leave_ident_fragment(false);
                self.state = State::MustacheIdentifierLiteral;
                Ok(())
            }
            Some('@') => {
                if !is_first {
                    return Err(self.err(CompileErrorKind::MisplacedAt));
                }
                self.ident.buf.push('@');
                Ok(())
            }
            Some('/') => {
                if is_first {
                    return Err(self.err(CompileErrorKind::MisplacedSolidus));
                }
                self.leave_ident_fragment(false);
                Ok(())
            }
            Some('.') => {
                self.leave_ident_fragment(false);
                self.ident.buf.push('.');
                self.state = State::MustacheIdentifierPath;
                Ok(())
            }
            Some('=') => {
                self.leave_ident_fragment(false);
                self.reconsume_in_prev();
                Ok(())
            }
            Some(ch) if is_mustache_ident_char(ch) => {
                self.ident.buf.push(ch);
                Ok(())
            }
            Some(ch) => Err(self.err(CompileErrorKind::IllegalIdentifierChar(ch))),
        }
    }

    /// `[...]` accepts every character but the closing bracket, so keys with
    /// dots, spaces or reserved characters stay addressable.
    pub(crate) fn mustache_identifier_literal_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof(
                "inside mustache identifier literal",
            ))),
            Some(']') => {
                self.leave_ident_fragment(true);
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some(ch) => {
                self.ident.buf.push(ch);
                Ok(())
            }
        }
    }

    /// Numeric identifiers: a literal that terminates here stays one key,
    /// so `{{56.78}}` resolves the single key `"56.78"`. A longer dotted
    /// spelling such as `{{127.0.0.1}}` falls back to a plain path.
    pub(crate) fn mustache_identifier_numeric_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof(
                "inside mustache identifier",
            ))),
            Some(ch) if ch.is_ascii_digit() => {
                self.ident.buf.push(ch);
                Ok(())
            }
            Some('.') => {
                if self.ident.path.len() > 1 {
                    self.reconsume();
                    self.state = State::MustacheIdentifier;
                } else {
                    self.leave_ident_fragment(false);
                }
                Ok(())
            }
            Some(ch) if ch == '}' || is_whitespace(ch) => {
                self.leave_ident_fragment(false);
                let joined = self
                    .ident
                    .path
                    .iter()
                    .map(|segment| segment.display_name())
                    .collect::<Vec<_>>()
                    .join(".");
                self.ident.path.clear();
                self.ident.path.push(PathSegment::Key(joined));
                self.ident.numeric = true;
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some(_) => {
                self.leave_ident_fragment(false);
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
        }
    }

    /// After one or more dots: `.`/`./` reference the current scope, `../`
    /// the parent, one level per occurrence.
    pub(crate) fn mustache_identifier_path_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof(
                "inside mustache identifier",
            ))),
            Some('.') => {
                self.ident.buf.push('.');
                Ok(())
            }
            Some('}') => {
                if self.ident.buf.len() > 2 || !self.ident.path.is_empty() {
                    let spelled = format!("{}}}", self.ident.buf);
                    return Err(self.err(CompileErrorKind::IllegalPathSequence(spelled)));
                }
                let special = if self.ident.buf.len() == 1 {
                    SpecialRef::This
                } else {
                    SpecialRef::Parent
                };
                self.ident.path.push(PathSegment::Special(special));
                self.ident.buf.clear();
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some('/') => {
                match self.ident.buf.len() {
                    1 => {
                        if !self.ident.path.is_empty() {
                            return Err(self
                                .err(CompileErrorKind::IllegalPathSequence("./".to_string())));
                        }
                        self.ident.path.push(PathSegment::Special(SpecialRef::This));
                    }
                    2 => {
                        self.ident
                            .path
                            .push(PathSegment::Special(SpecialRef::Parent));
                    }
                    _ => {
                        let spelled = format!("{}/", self.ident.buf);
                        return Err(self.err(CompileErrorKind::IllegalPathSequence(spelled)));
                    }
                }
                self.ident.buf.clear();
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
            Some(ch) => {
                if self.ident.buf.len() > 1 || self.ident.path.is_empty() {
                    let spelled = format!("{}{}", self.ident.buf, ch);
                    return Err(self.err(CompileErrorKind::IllegalPathSequence(spelled)));
                }
                self.ident.buf.clear();
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
        }
    }

    pub(crate) fn before_mustache_attribute_name_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        self.finish_mustache_path();
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some(ch) if is_whitespace(ch) => {
                self.state = State::MustacheAttributeName;
                Ok(())
            }
            Some('}') => {
                self.state = State::MustacheClose;
                Ok(())
            }
            Some(ch) => Err(self.err(CompileErrorKind::UnexpectedAfterTagName(ch))),
        }
    }

    pub(crate) fn mustache_attribute_name_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some(ch) if is_whitespace(ch) => Ok(()),
            Some('}') => {
                self.state = State::MustacheClose;
                Ok(())
            }
            Some('"') => {
                self.arg_buf.clear();
                self.arg_name_quoted = true;
                self.state = State::MustacheAttributeNameDoubleQuoted;
                Ok(())
            }
            Some('\'') => {
                self.arg_buf.clear();
                self.arg_name_quoted = true;
                self.state = State::MustacheAttributeNameSingleQuoted;
                Ok(())
            }
            Some('=') => Err(self.err(CompileErrorKind::IllegalIdentifierChar('='))),
            Some(_) => {
                self.ident.clear();
                self.arg_name_quoted = false;
                self.return_states.push(State::AfterMustacheAttributeName);
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
        }
    }

    pub(crate) fn after_mustache_attribute_name_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some(ch) if is_whitespace(ch) => Ok(()),
            Some('}') => {
                self.leave_mustache_arg_name(false)?;
                self.state = State::MustacheClose;
                Ok(())
            }
            Some('=') => {
                self.leave_mustache_arg_name(true)?;
                self.state = State::BeforeMustacheAttributeValue;
                Ok(())
            }
            Some(_) => {
                self.leave_mustache_arg_name(false)?;
                self.reconsume();
                self.state = State::MustacheAttributeName;
                Ok(())
            }
        }
    }

    pub(crate) fn before_mustache_attribute_value_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some(ch) if is_whitespace(ch) => Ok(()),
            Some('"') => {
                self.arg_buf.clear();
                self.arg_value_quoted = true;
                self.state = State::MustacheAttributeValueDoubleQuoted;
                Ok(())
            }
            Some('\'') => {
                self.arg_buf.clear();
                self.arg_value_quoted = true;
                self.state = State::MustacheAttributeValueSingleQuoted;
                Ok(())
            }
            Some(ch @ '{') | Some(ch @ '}') => {
                Err(self.err(CompileErrorKind::UnexpectedInAttrValue(ch)))
            }
            Some(_) => {
                self.ident.clear();
                self.arg_value_quoted = false;
                self.return_states.push(State::AfterMustacheAttributeValue);
                self.reconsume();
                self.state = State::MustacheIdentifier;
                Ok(())
            }
        }
    }

    pub(crate) fn mustache_quoted_name_state(
        &mut self,
        cp: Option<char>,
        quote: char,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof(
                "inside quoted mustache attribute",
            ))),
            Some(ch) if ch == quote => {
                self.state = State::AfterMustacheAttributeName;
                Ok(())
            }
            Some(ch) => {
                self.arg_buf.push(ch);
                Ok(())
            }
        }
    }

    pub(crate) fn mustache_quoted_value_state(
        &mut self,
        cp: Option<char>,
        quote: char,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof(
                "inside quoted mustache attribute",
            ))),
            Some(ch) if ch == quote => {
                self.state = State::AfterMustacheAttributeValue;
                Ok(())
            }
            Some(ch) => {
                self.arg_buf.push(ch);
                Ok(())
            }
        }
    }

    pub(crate) fn after_mustache_attribute_value_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some(ch) if is_whitespace(ch) => Ok(()),
            Some('}') => {
                self.leave_mustache_arg_value();
                self.state = State::MustacheClose;
                Ok(())
            }
            Some(_) => {
                self.leave_mustache_arg_value();
                self.reconsume();
                self.state = State::MustacheAttributeName;
                Ok(())
            }
        }
    }

    pub(crate) fn after_mustache_partial_name_state(
        &mut self,
        cp: Option<char>,
    ) -> Result<(), CompileError> {
        self.finish_mustache_path();
        match cp {
            None => Err(self.err(CompileErrorKind::UnexpectedEof("inside mustache"))),
            Some(ch) if is_whitespace(ch) => Ok(()),
            Some('}') => {
                self.state = State::MustacheClose;
                Ok(())
            }
            Some(ch) => Err(self.err(CompileErrorKind::UnexpectedAfterPartialName(ch))),
        }
    }
}
