use stache_core::{
    is_rcdata_tag, is_raw_text_tag, AttrPart, CompileError, CompileErrorKind, HtmlAttribute,
    MustacheLocation, MustacheToken, SourcePos, TagAttr, TagToken, Token,
};

use crate::entities;

/// The tokenizer states. The HTML side follows the standard tokenization
/// algorithm trimmed to what templates need; the `Mustache*` family extends
/// it with the mustache grammar, entered from character data, from a start
/// tag's attribute list and from inside attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Data,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValue,
    SelfClosingStartTag,
    Comment,
    CommentEndDash,
    CommentEnd,
    BogusComment,
    RawText,
    RawTextLessThan,
    RawTextEndTagName,
    BeforeMustacheOpen,
    MustacheOpen,
    MustacheClose,
    MustacheIdentifier,
    MustacheIdentifierLiteral,
    MustacheIdentifierNumeric,
    MustacheIdentifierPath,
    BeforeMustacheAttributeName,
    MustacheAttributeName,
    AfterMustacheAttributeName,
    BeforeMustacheAttributeValue,
    MustacheAttributeNameDoubleQuoted,
    MustacheAttributeNameSingleQuoted,
    MustacheAttributeValueDoubleQuoted,
    MustacheAttributeValueSingleQuoted,
    AfterMustacheAttributeValue,
    AfterMustachePartialName,
}

/// An HTML attribute while its value is still being collected. Literal
/// runs accumulate in `lit` and are flushed into `parts` whenever an
/// embedded mustache lands.
pub(crate) struct AttrBuilder {
    pub(crate) name: String,
    pub(crate) parts: Vec<AttrPart>,
    pub(crate) lit: String,
    pub(crate) dropped: bool,
}

impl AttrBuilder {
    fn new() -> AttrBuilder {
        AttrBuilder {
            name: String::new(),
            parts: Vec::new(),
            lit: String::new(),
            dropped: false,
        }
    }

    pub(crate) fn flush_lit(&mut self) {
        if !self.lit.is_empty() {
            self.parts.push(AttrPart::Literal(std::mem::take(&mut self.lit)));
        }
    }
}

/// Scratch for the mustache identifier states. `buf` holds the fragment
/// being collected, `path` the finished segments. A leading `@` followed
/// by a path prefix is remembered in `leading_at` and folded into the
/// last segment when the identifier completes.
#[derive(Default)]
pub(crate) struct IdentBuilder {
    pub(crate) buf: String,
    pub(crate) path: stache_core::Path,
    pub(crate) leading_at: bool,
    pub(crate) numeric: bool,
}

impl IdentBuilder {
    pub(crate) fn clear(&mut self) {
        self.buf.clear();
        self.path.clear();
        self.leading_at = false;
        self.numeric = false;
    }

    pub(crate) fn is_first_char(&self) -> bool {
        self.buf.is_empty() && self.path.is_empty() && !self.leading_at
    }
}

pub struct Tokenizer {
    pub(crate) chars: Vec<char>,
    pub(crate) idx: usize,
    line_starts: Vec<usize>,
    pub(crate) state: State,
    pub(crate) return_states: Vec<State>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) text: String,
    pub(crate) current_tag: Option<TagToken>,
    pub(crate) is_end_tag: bool,
    pub(crate) current_attr: Option<AttrBuilder>,
    pub(crate) current_mustache: Option<MustacheToken>,
    pub(crate) ident: IdentBuilder,
    pub(crate) arg_buf: String,
    pub(crate) arg_name_quoted: bool,
    pub(crate) arg_value_quoted: bool,
    pub(crate) location: MustacheLocation,
    pub(crate) mustache_pos: SourcePos,
    tag_pos: SourcePos,
    last_start_tag: String,
    rawtext_refs: bool,
    end_tag_buf: String,
    done: bool,
}

impl Tokenizer {
    pub fn new(source: &str) -> Tokenizer {
        // Normalize line endings up front so position tracking stays simple.
        let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
        let chars: Vec<char> = normalized.chars().collect();
        let mut line_starts = vec![0];
        for (i, ch) in chars.iter().enumerate() {
            if *ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Tokenizer {
            chars,
            idx: 0,
            line_starts,
            state: State::Data,
            return_states: Vec::new(),
            tokens: Vec::new(),
            text: String::new(),
            current_tag: None,
            is_end_tag: false,
            current_attr: None,
            current_mustache: None,
            ident: IdentBuilder::default(),
            arg_buf: String::new(),
            arg_name_quoted: false,
            arg_value_quoted: false,
            location: MustacheLocation::Body,
            mustache_pos: SourcePos::default(),
            tag_pos: SourcePos::default(),
            last_start_tag: String::new(),
            rawtext_refs: false,
            end_tag_buf: String::new(),
            done: false,
        }
    }

    pub fn run(mut self) -> Result<Vec<Token>, CompileError> {
        while !self.done {
            let cp = self.consume();
            self.step(cp)?;
        }
        Ok(self.tokens)
    }

    fn consume(&mut self) -> Option<char> {
        let cp = self.chars.get(self.idx).copied();
        self.idx += 1;
        cp
    }

    pub(crate) fn reconsume(&mut self) {
        self.idx = self.idx.saturating_sub(1);
    }

    pub(crate) fn reconsume_in_prev(&mut self) {
        self.reconsume();
        self.state = self.return_states.pop().unwrap_or(State::Data);
    }

    fn pos_at(&self, idx: usize) -> SourcePos {
        let line = match self.line_starts.binary_search(&idx) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        SourcePos::new(line as u32 + 1, (idx - self.line_starts[line]) as u32 + 1)
    }

    /// Position of the character last consumed.
    pub(crate) fn pos(&self) -> SourcePos {
        if self.chars.is_empty() {
            return SourcePos::new(1, 1);
        }
        let idx = self.idx.saturating_sub(1).min(self.chars.len() - 1);
        self.pos_at(idx)
    }

    pub(crate) fn err(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.pos())
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.tokens.push(Token::Text(std::mem::take(&mut self.text)));
        }
    }

    fn commit_attr(&mut self) {
        if let Some(mut attr) = self.current_attr.take() {
            attr.flush_lit();
            if !attr.dropped {
                if let Some(tag) = self.current_tag.as_mut() {
                    tag.attrs.push(TagAttr::Html(HtmlAttribute {
                        name: attr.name,
                        parts: attr.parts,
                    }));
                }
            }
        }
    }

    fn start_attr(&mut self) {
        self.commit_attr();
        self.current_attr = Some(AttrBuilder::new());
    }

    /// Name is complete; duplicate attributes are parsed but discarded.
    fn leave_attr_name(&mut self) {
        let duplicate = match (&self.current_attr, &self.current_tag) {
            (Some(attr), Some(tag)) => tag.attrs.iter().any(|entry| match entry {
                TagAttr::Html(existing) => existing.name == attr.name,
                TagAttr::Mustache(_) => false,
            }),
            _ => false,
        };
        if let Some(attr) = self.current_attr.as_mut() {
            attr.dropped = duplicate;
        }
    }

    fn leave_attr_value(&mut self) {
        self.commit_attr();
    }

    fn attr_lit_push(&mut self, ch: char) {
        if let Some(attr) = self.current_attr.as_mut() {
            attr.lit.push(ch);
        }
    }

    fn attr_lit_push_str(&mut self, s: &str) {
        if let Some(attr) = self.current_attr.as_mut() {
            attr.lit.push_str(s);
        }
    }

    fn emit_tag(&mut self) {
        self.commit_attr();
        let tag = match self.current_tag.take() {
            Some(tag) => tag,
            None => {
                self.state = State::Data;
                return;
            }
        };
        self.flush_text();
        self.state = self.return_states.pop().unwrap_or(State::Data);
        if self.is_end_tag {
            self.tokens.push(Token::EndTag(tag));
        } else {
            if !tag.self_closing && (is_raw_text_tag(&tag.name) || is_rcdata_tag(&tag.name)) {
                self.rawtext_refs = is_rcdata_tag(&tag.name);
                self.last_start_tag = tag.name.clone();
                self.state = State::RawText;
            }
            self.tokens.push(Token::StartTag(tag));
        }
    }

    /// Decode a character reference right after a consumed `&`. Returns
    /// `None` without consuming anything when the input is not a valid
    /// `;`-terminated reference, in which case the `&` stands for itself.
    fn consume_char_ref(&mut self) -> Option<String> {
        let rest = &self.chars[self.idx.min(self.chars.len())..];
        if rest.first() == Some(&'#') {
            let (hex, digits_start) = match rest.get(1) {
                Some('x') | Some('X') => (true, 2),
                _ => (false, 1),
            };
            let mut end = digits_start;
            while end < rest.len() && rest[end].is_ascii_hexdigit() && (hex || rest[end].is_ascii_digit())
            {
                end += 1;
            }
            if end == digits_start || rest.get(end) != Some(&';') {
                return None;
            }
            let digits: String = rest[digits_start..end].iter().collect();
            let radix = if hex { 16 } else { 10 };
            let code = u32::from_str_radix(&digits, radix).ok()?;
            let decoded = char::from_u32(code).unwrap_or('\u{fffd}');
            self.idx += end + 1;
            return Some(decoded.to_string());
        }
        let mut end = 0;
        while end < rest.len() && end < 48 && rest[end].is_ascii_alphanumeric() {
            end += 1;
        }
        if end == 0 || rest.get(end) != Some(&';') {
            return None;
        }
        let name: String = rest[..end].iter().collect();
        let decoded = entities::lookup(&name)?;
        self.idx += end + 1;
        Some(decoded.to_string())
    }

    /// Lookahead for an exact match at the cursor; consumes it on success.
    fn eat(&mut self, pattern: &str) -> bool {
        let rest = &self.chars[self.idx.min(self.chars.len())..];
        let wanted: Vec<char> = pattern.chars().collect();
        if rest.len() >= wanted.len() && rest[..wanted.len()] == wanted[..] {
            self.idx += wanted.len();
            true
        } else {
            false
        }
    }

    fn peek_is(&self, ch: char) -> bool {
        self.chars.get(self.idx) == Some(&ch)
    }

    fn step(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match self.state {
            State::Data => self.data_state(cp),
            State::TagOpen => self.tag_open_state(cp),
            State::EndTagOpen => self.end_tag_open_state(cp),
            State::TagName => self.tag_name_state(cp),
            State::BeforeAttributeName => self.before_attribute_name_state(cp),
            State::AttributeName => self.attribute_name_state(cp),
            State::AfterAttributeName => self.after_attribute_name_state(cp),
            State::BeforeAttributeValue => self.before_attribute_value_state(cp),
            State::AttributeValueDoubleQuoted => self.attribute_value_quoted_state(cp, '"'),
            State::AttributeValueSingleQuoted => self.attribute_value_quoted_state(cp, '\''),
            State::AttributeValueUnquoted => self.attribute_value_unquoted_state(cp),
            State::AfterAttributeValue => self.after_attribute_value_state(cp),
            State::SelfClosingStartTag => self.self_closing_start_tag_state(cp),
            State::Comment => self.comment_state(cp),
            State::CommentEndDash => self.comment_end_dash_state(cp),
            State::CommentEnd => self.comment_end_state(cp),
            State::BogusComment => self.bogus_comment_state(cp),
            State::RawText => self.raw_text_state(cp),
            State::RawTextLessThan => self.raw_text_less_than_state(cp),
            State::RawTextEndTagName => self.raw_text_end_tag_name_state(cp),
            State::BeforeMustacheOpen => self.before_mustache_open_state(cp),
            State::MustacheOpen => self.mustache_open_state(cp),
            State::MustacheClose => self.mustache_close_state(cp),
            State::MustacheIdentifier => self.mustache_identifier_state(cp),
            State::MustacheIdentifierLiteral => self.mustache_identifier_literal_state(cp),
            State::MustacheIdentifierNumeric => self.mustache_identifier_numeric_state(cp),
            State::MustacheIdentifierPath => self.mustache_identifier_path_state(cp),
            State::BeforeMustacheAttributeName => self.before_mustache_attribute_name_state(cp),
            State::MustacheAttributeName => self.mustache_attribute_name_state(cp),
            State::AfterMustacheAttributeName => self.after_mustache_attribute_name_state(cp),
            State::BeforeMustacheAttributeValue => self.before_mustache_attribute_value_state(cp),
            State::MustacheAttributeNameDoubleQuoted => {
                self.mustache_quoted_name_state(cp, '"')
            }
            State::MustacheAttributeNameSingleQuoted => {
                self.mustache_quoted_name_state(cp, '\'')
            }
            State::MustacheAttributeValueDoubleQuoted => {
                self.mustache_quoted_value_state(cp, '"')
            }
            State::MustacheAttributeValueSingleQuoted => {
                self.mustache_quoted_value_state(cp, '\'')
            }
            State::AfterMustacheAttributeValue => self.after_mustache_attribute_value_state(cp),
            State::AfterMustachePartialName => self.after_mustache_partial_name_state(cp),
        }
    }

    fn data_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            None => {
                self.flush_text();
                self.tokens.push(Token::Eof);
                self.done = true;
            }
            Some('&') => match self.consume_char_ref() {
                Some(decoded) => self.text.push_str(&decoded),
                None => self.text.push('&'),
            },
            Some('<') => {
                self.tag_pos = self.pos();
                self.state = State::TagOpen;
            }
            Some('{') => {
                self.location = MustacheLocation::Body;
                self.mustache_pos = self.pos();
                self.return_states.push(State::Data);
                self.state = State::BeforeMustacheOpen;
            }
            Some(ch) => self.text.push(ch),
        }
        Ok(())
    }

    fn tag_open_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('!') => {
                if self.eat("--") {
                    self.state = State::Comment;
                } else {
                    self.state = State::BogusComment;
                }
            }
            Some('/') => self.state = State::EndTagOpen,
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.current_tag = Some(TagToken::new(self.tag_pos));
                self.is_end_tag = false;
                self.reconsume();
                self.state = State::TagName;
            }
            Some('?') => self.state = State::BogusComment,
            _ => {
                self.text.push('<');
                self.reconsume();
                self.state = State::Data;
            }
        }
        Ok(())
    }

    fn end_tag_open_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.current_tag = Some(TagToken::new(self.tag_pos));
                self.is_end_tag = true;
                self.reconsume();
                self.state = State::TagName;
            }
            Some('>') => self.state = State::Data,
            None => {
                self.text.push_str("</");
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => self.state = State::BogusComment,
        }
        Ok(())
    }

    fn tag_name_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if is_whitespace(ch) => self.state = State::BeforeAttributeName,
            Some('/') => self.state = State::SelfClosingStartTag,
            Some('>') => self.emit_tag(),
            None => {
                self.current_tag = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(ch) => {
                if let Some(tag) = self.current_tag.as_mut() {
                    tag.name.push(ch.to_ascii_lowercase());
                }
            }
        }
        Ok(())
    }

    fn before_attribute_name_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if is_whitespace(ch) => {}
            Some('{') => {
                self.commit_attr();
                self.location = MustacheLocation::Element;
                self.mustache_pos = self.pos();
                self.return_states.push(State::BeforeAttributeName);
                self.state = State::BeforeMustacheOpen;
            }
            Some('/') => self.state = State::SelfClosingStartTag,
            Some('>') => self.emit_tag(),
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => {
                self.start_attr();
                self.reconsume();
                self.state = State::AttributeName;
            }
        }
        Ok(())
    }

    fn attribute_name_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if is_whitespace(ch) => {
                self.leave_attr_name();
                self.state = State::AfterAttributeName;
            }
            Some('/') => {
                self.leave_attr_name();
                self.commit_attr();
                self.state = State::SelfClosingStartTag;
            }
            Some('=') => {
                self.leave_attr_name();
                self.state = State::BeforeAttributeValue;
            }
            Some('>') => {
                self.leave_attr_name();
                self.emit_tag();
            }
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(ch) => {
                if let Some(attr) = self.current_attr.as_mut() {
                    attr.name.push(ch.to_ascii_lowercase());
                }
            }
        }
        Ok(())
    }

    fn after_attribute_name_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if is_whitespace(ch) => {}
            Some('=') => self.state = State::BeforeAttributeValue,
            Some('/') => {
                self.commit_attr();
                self.state = State::SelfClosingStartTag;
            }
            Some('>') => self.emit_tag(),
            Some('{') => {
                self.commit_attr();
                self.location = MustacheLocation::Element;
                self.mustache_pos = self.pos();
                self.return_states.push(State::BeforeAttributeName);
                self.state = State::BeforeMustacheOpen;
            }
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => {
                self.reconsume();
                self.state = State::BeforeAttributeName;
            }
        }
        Ok(())
    }

    fn before_attribute_value_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if is_whitespace(ch) => {}
            Some('"') => self.state = State::AttributeValueDoubleQuoted,
            Some('\'') => self.state = State::AttributeValueSingleQuoted,
            Some('{') => {
                self.location = MustacheLocation::AttributeValue;
                self.mustache_pos = self.pos();
                self.return_states.push(State::AfterAttributeValue);
                self.state = State::BeforeMustacheOpen;
            }
            Some('>') => {
                self.leave_attr_value();
                self.emit_tag();
            }
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => {
                self.reconsume();
                self.state = State::AttributeValueUnquoted;
            }
        }
        Ok(())
    }

    fn attribute_value_quoted_state(
        &mut self,
        cp: Option<char>,
        quote: char,
    ) -> Result<(), CompileError> {
        match cp {
            Some(ch) if ch == quote => self.state = State::AfterAttributeValue,
            Some('&') => match self.consume_char_ref() {
                Some(decoded) => self.attr_lit_push_str(&decoded),
                None => self.attr_lit_push('&'),
            },
            Some('{') => {
                self.location = MustacheLocation::AttributeValue;
                self.mustache_pos = self.pos();
                self.return_states.push(if quote == '"' {
                    State::AttributeValueDoubleQuoted
                } else {
                    State::AttributeValueSingleQuoted
                });
                self.state = State::BeforeMustacheOpen;
            }
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(ch) => self.attr_lit_push(ch),
        }
        Ok(())
    }

    fn attribute_value_unquoted_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if is_whitespace(ch) => {
                self.leave_attr_value();
                self.state = State::BeforeAttributeName;
            }
            Some('&') => match self.consume_char_ref() {
                Some(decoded) => self.attr_lit_push_str(&decoded),
                None => self.attr_lit_push('&'),
            },
            Some('>') => {
                self.leave_attr_value();
                self.emit_tag();
            }
            Some('{') => {
                if self.peek_is('{') {
                    return Err(self.err(CompileErrorKind::MustacheInUnquotedValue));
                }
                self.attr_lit_push('{');
            }
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(ch) => self.attr_lit_push(ch),
        }
        Ok(())
    }

    fn after_attribute_value_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some(ch) if is_whitespace(ch) => {
                self.leave_attr_value();
                self.state = State::BeforeAttributeName;
            }
            Some('/') => {
                self.leave_attr_value();
                self.state = State::SelfClosingStartTag;
            }
            Some('>') => {
                self.leave_attr_value();
                self.emit_tag();
            }
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => {
                self.leave_attr_value();
                self.reconsume();
                self.state = State::BeforeAttributeName;
            }
        }
        Ok(())
    }

    fn self_closing_start_tag_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('>') => {
                if let Some(tag) = self.current_tag.as_mut() {
                    tag.self_closing = true;
                }
                self.emit_tag();
            }
            None => {
                self.current_tag = None;
                self.current_attr = None;
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => {
                self.reconsume();
                self.state = State::BeforeAttributeName;
            }
        }
        Ok(())
    }

    fn comment_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('-') => self.state = State::CommentEndDash,
            None => {
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn comment_end_dash_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('-') => self.state = State::CommentEnd,
            None => {
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => self.state = State::Comment,
        }
        Ok(())
    }

    fn comment_end_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('>') => self.state = State::Data,
            Some('-') => {}
            None => {
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => self.state = State::Comment,
        }
        Ok(())
    }

    fn bogus_comment_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('>') => self.state = State::Data,
            None => {
                self.reconsume();
                self.state = State::Data;
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn raw_text_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('<') => {
                self.tag_pos = self.pos();
                self.state = State::RawTextLessThan;
            }
            Some('&') if self.rawtext_refs => match self.consume_char_ref() {
                Some(decoded) => self.text.push_str(&decoded),
                None => self.text.push('&'),
            },
            None => {
                self.reconsume();
                self.state = State::Data;
            }
            Some(ch) => self.text.push(ch),
        }
        Ok(())
    }

    fn raw_text_less_than_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        match cp {
            Some('/') => {
                self.end_tag_buf.clear();
                self.state = State::RawTextEndTagName;
            }
            _ => {
                self.text.push('<');
                self.reconsume();
                self.state = State::RawText;
            }
        }
        Ok(())
    }

    fn raw_text_end_tag_name_state(&mut self, cp: Option<char>) -> Result<(), CompileError> {
        let is_appropriate = self.end_tag_buf == self.last_start_tag;
        match cp {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.end_tag_buf.push(ch.to_ascii_lowercase());
            }
            Some(ch) if is_whitespace(ch) && is_appropriate => {
                self.make_raw_end_tag();
                self.state = State::BeforeAttributeName;
            }
            Some('/') if is_appropriate => {
                self.make_raw_end_tag();
                self.state = State::SelfClosingStartTag;
            }
            Some('>') if is_appropriate => {
                self.make_raw_end_tag();
                self.emit_tag();
            }
            _ => {
                self.text.push_str("</");
                let pending = std::mem::take(&mut self.end_tag_buf);
                self.text.push_str(&pending);
                self.reconsume();
                self.state = State::RawText;
            }
        }
        Ok(())
    }

    fn make_raw_end_tag(&mut self) {
        let mut tag = TagToken::new(self.tag_pos);
        tag.name = std::mem::take(&mut self.end_tag_buf);
        self.current_tag = Some(tag);
        self.is_end_tag = true;
    }
}

pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\t' | '\x0c')
}

/// Characters permitted in a plain mustache identifier fragment. The
/// reserved set mirrors handlebars: structural punctuation and anything
/// that could be confused with HTML syntax.
pub(crate) fn is_mustache_ident_char(ch: char) -> bool {
    !matches!(
        ch,
        '!' | '"'
            | '#'
            | '%'
            | '&'
            | '\''
            | '('
            | ')'
            | '*'
            | '+'
            | ','
            | ';'
            | '<'
            | '='
            | '>'
            | '@'
            | '['
            | '\\'
            | ']'
            | '^'
            | '`'
            | '{'
            | '|'
            | '}'
            | '~'
    )
}
