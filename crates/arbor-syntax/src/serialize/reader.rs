use std::io::{self, Read};

use arbor_errors::{Diagnostic, Severity};
use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};

use super::{
    DecodeError, MAGIC, Strategy, TAG_BACK_REF, TAG_EMPTY, TAG_NODE, TAG_TOKEN,
    TOKEN_HAS_VALUE, TOKEN_MISSING, TRIVIA_STRUCTURE, TRIVIA_TEXT, VERSION,
};
use crate::annotation::SyntaxAnnotation;
use crate::green::{
    GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList, Slot, TriviaKind,
};
use crate::red::{ParseOptions, SourceKind};
use crate::{NodeOrToken, SyntaxKind};

/// Upper bound on capacity reserved from a count read off the stream.
const MAX_PREALLOCATION: usize = 1024;

pub(super) struct Header {
    pub(super) strategy: Strategy,
    pub(super) depth: usize,
    pub(super) options: ParseOptions,
}

#[derive(Default)]
struct Extra {
    diagnostics: Vec<Diagnostic>,
    annotations: Vec<SyntaxAnnotation>,
}

struct NodeHeader {
    id: u32,
    kind: SyntaxKind,
    slots: usize,
    extra: Extra,
}

struct TokenHeader {
    id: u32,
    kind: SyntaxKind,
    missing: bool,
    text: Box<str>,
    value: Option<Box<str>>,
    extra: Extra,
    leading: usize,
}

struct TriviaHeader {
    kind: TriviaKind,
    extra: Extra,
}

enum Opened {
    Done(Slot),
    Node(NodeHeader),
    Token(TokenHeader),
}

enum OpenedTrivia {
    Done(GreenTrivia),
    Structure(TriviaHeader),
}

/// An element of the iterative strategy whose children are still being read.
enum Frame {
    Node { header: NodeHeader, slots: Vec<Slot> },
    Token {
        header: TokenHeader,
        leading: Vec<GreenTrivia>,
        trailing: Vec<GreenTrivia>,
        trailing_count: Option<usize>,
    },
    Structure { header: TriviaHeader },
}

enum Done {
    Slot(Slot),
    Trivia(GreenTrivia),
}

enum Step {
    Slot,
    Trivia,
    TrailingCount,
    Close,
}

pub(super) struct Decoder<R> {
    input: R,
    elements: Vec<Option<GreenElement>>,
    annotations: FxHashMap<u64, SyntaxAnnotation>,
    max_depth: usize,
}

impl<R: Read> Decoder<R> {
    pub(super) fn new(input: R) -> Self {
        Self { input, elements: Vec::new(), annotations: FxHashMap::default(), max_depth: 0 }
    }

    pub(super) fn header(&mut self) -> Result<Header, DecodeError> {
        let mut magic = [0; 4];
        self.input.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let version = self.byte()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let raw = self.byte()?;
        let strategy = Strategy::from_u8(raw).ok_or(DecodeError::UnknownStrategy(raw))?;
        let depth = self.count()?;

        let kind = SourceKind::from_u8(self.byte()?)
            .ok_or(DecodeError::Malformed("unknown source kind"))?;
        let language_version = narrow(self.leb()?, "language version out of range")?;
        let symbols = self.count()?;
        let mut preprocessor_symbols = Vec::with_capacity(symbols.min(MAX_PREALLOCATION));
        for _ in 0..symbols {
            preprocessor_symbols.push(self.str()?);
        }
        let options = ParseOptions { kind, language_version, preprocessor_symbols };
        Ok(Header { strategy, depth, options })
    }

    /// Reads the root by recursion, refusing to nest deeper than `max_depth`.
    pub(super) fn root(&mut self, max_depth: usize) -> Result<GreenNode, DecodeError> {
        self.max_depth = max_depth;
        match self.element(1)? {
            Some(NodeOrToken::Node(node)) => Ok(node),
            _ => Err(DecodeError::Malformed("root is not a node")),
        }
    }

    fn element(&mut self, depth: usize) -> Result<Slot, DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::Malformed("nesting deeper than the header declares"));
        }
        match self.open()? {
            Opened::Done(slot) => Ok(slot),
            Opened::Node(header) => {
                let mut slots = Vec::with_capacity(header.slots.min(MAX_PREALLOCATION));
                for _ in 0..header.slots {
                    slots.push(self.element(depth + 1)?);
                }
                Ok(Some(self.close_node(header, slots).into()))
            }
            Opened::Token(header) => {
                let leading = (0..header.leading)
                    .map(|_| self.trivia(depth))
                    .collect::<Result<Vec<_>, _>>()?;
                let trailing = (0..self.count()?)
                    .map(|_| self.trivia(depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(self.close_token(header, leading, trailing)?.into()))
            }
        }
    }

    fn trivia(&mut self, depth: usize) -> Result<GreenTrivia, DecodeError> {
        match self.open_trivia()? {
            OpenedTrivia::Done(trivia) => Ok(trivia),
            OpenedTrivia::Structure(header) => {
                let structure = self.element(depth + 1)?;
                close_structure(header, structure)
            }
        }
    }

    pub(super) fn root_iterative(&mut self) -> Result<GreenNode, DecodeError> {
        let mut stack = Vec::new();
        let mut done = self.next_slot(&mut stack)?;
        loop {
            if let Some(value) = done.take() {
                let Some(frame) = stack.pop() else {
                    return match value {
                        Done::Slot(Some(NodeOrToken::Node(node))) => Ok(node),
                        _ => Err(DecodeError::Malformed("root is not a node")),
                    };
                };
                match (frame, value) {
                    (Frame::Node { header, mut slots }, Done::Slot(slot)) => {
                        slots.push(slot);
                        stack.push(Frame::Node { header, slots });
                    }
                    (mut frame @ Frame::Token { .. }, Done::Trivia(trivia)) => {
                        if let Frame::Token { leading, trailing, trailing_count, .. } = &mut frame {
                            match trailing_count {
                                None => leading.push(trivia),
                                Some(_) => trailing.push(trivia),
                            }
                        }
                        stack.push(frame);
                    }
                    (Frame::Structure { header }, Done::Slot(structure)) => {
                        done = Some(Done::Trivia(close_structure(header, structure)?));
                        continue;
                    }
                    _ => return Err(DecodeError::Malformed("element in the wrong position")),
                }
            }

            let step = match stack.last() {
                Some(Frame::Node { header, slots }) if slots.len() < header.slots => Step::Slot,
                Some(Frame::Token { header, leading, trailing_count: None, .. }) => {
                    if leading.len() < header.leading { Step::Trivia } else { Step::TrailingCount }
                }
                Some(Frame::Token { trailing, trailing_count: Some(count), .. })
                    if trailing.len() < *count =>
                {
                    Step::Trivia
                }
                Some(Frame::Structure { .. }) => Step::Slot,
                Some(_) => Step::Close,
                None => return Err(DecodeError::Malformed("truncated tree")),
            };
            match step {
                Step::Slot => done = self.next_slot(&mut stack)?,
                Step::Trivia => done = self.next_trivia(&mut stack)?,
                Step::TrailingCount => {
                    let count = self.count()?;
                    if let Some(Frame::Token { trailing_count, .. }) = stack.last_mut() {
                        *trailing_count = Some(count);
                    }
                }
                Step::Close => {
                    done = match stack.pop() {
                        Some(Frame::Node { header, slots }) => {
                            Some(Done::Slot(Some(self.close_node(header, slots).into())))
                        }
                        Some(Frame::Token { header, leading, trailing, .. }) => {
                            let token = self.close_token(header, leading, trailing)?;
                            Some(Done::Slot(Some(token.into())))
                        }
                        _ => return Err(DecodeError::Malformed("truncated tree")),
                    };
                }
            }
        }
    }

    fn next_slot(&mut self, stack: &mut Vec<Frame>) -> Result<Option<Done>, DecodeError> {
        match self.open()? {
            Opened::Done(slot) => return Ok(Some(Done::Slot(slot))),
            Opened::Node(header) => {
                let slots = Vec::with_capacity(header.slots.min(MAX_PREALLOCATION));
                stack.push(Frame::Node { header, slots });
            }
            Opened::Token(header) => stack.push(Frame::Token {
                header,
                leading: Vec::new(),
                trailing: Vec::new(),
                trailing_count: None,
            }),
        }
        Ok(None)
    }

    fn next_trivia(&mut self, stack: &mut Vec<Frame>) -> Result<Option<Done>, DecodeError> {
        match self.open_trivia()? {
            OpenedTrivia::Done(trivia) => Ok(Some(Done::Trivia(trivia))),
            OpenedTrivia::Structure(header) => {
                stack.push(Frame::Structure { header });
                Ok(None)
            }
        }
    }

    fn open(&mut self) -> Result<Opened, DecodeError> {
        match self.byte()? {
            TAG_EMPTY => Ok(Opened::Done(None)),
            TAG_BACK_REF => {
                let id: u32 = narrow(self.leb()?, "back reference out of range")?;
                match self.elements.get(id as usize) {
                    Some(Some(element)) => Ok(Opened::Done(Some(element.clone()))),
                    _ => Err(DecodeError::BadBackReference(id)),
                }
            }
            TAG_NODE => {
                let id = self.reserve();
                let kind = self.kind()?;
                let slots = self.count()?;
                let extra = self.extra()?;
                Ok(Opened::Node(NodeHeader { id, kind, slots, extra }))
            }
            TAG_TOKEN => {
                let id = self.reserve();
                let kind = self.kind()?;
                let flags = self.byte()?;
                let text = self.str()?;
                let value = if flags & TOKEN_HAS_VALUE != 0 { Some(self.str()?) } else { None };
                let extra = self.extra()?;
                let leading = self.count()?;
                let missing = flags & TOKEN_MISSING != 0;
                Ok(Opened::Token(TokenHeader { id, kind, missing, text, value, extra, leading }))
            }
            _ => Err(DecodeError::Malformed("unknown element tag")),
        }
    }

    fn open_trivia(&mut self) -> Result<OpenedTrivia, DecodeError> {
        let kind = TriviaKind::from_u8(self.byte()?)
            .ok_or(DecodeError::Malformed("unknown trivia kind"))?;
        let extra = self.extra()?;
        match self.byte()? {
            TRIVIA_TEXT => {
                let trivia = GreenTrivia::new(kind, self.str()?);
                Ok(OpenedTrivia::Done(apply_trivia_extra(trivia, extra)))
            }
            TRIVIA_STRUCTURE => Ok(OpenedTrivia::Structure(TriviaHeader { kind, extra })),
            _ => Err(DecodeError::Malformed("unknown trivia content")),
        }
    }

    fn close_node(&mut self, header: NodeHeader, slots: Vec<Slot>) -> GreenNode {
        let mut node = GreenNode::new(header.kind, slots);
        if !header.extra.diagnostics.is_empty() {
            node = node.with_diagnostics(header.extra.diagnostics);
        }
        if !header.extra.annotations.is_empty() {
            node = node.with_annotations(header.extra.annotations);
        }
        self.elements[header.id as usize] = Some(node.clone().into());
        node
    }

    fn close_token(
        &mut self,
        header: TokenHeader,
        leading: Vec<GreenTrivia>,
        trailing: Vec<GreenTrivia>,
    ) -> Result<GreenToken, DecodeError> {
        let leading = GreenTriviaList::new(leading);
        let trailing = GreenTriviaList::new(trailing);
        let mut token = if header.missing {
            if !header.text.is_empty() || header.value.is_some() {
                return Err(DecodeError::Malformed("missing token with text"));
            }
            GreenToken::missing(header.kind).with_trivia(leading, trailing)
        } else {
            GreenToken::with_parts(header.kind, header.text, header.value, leading, trailing)
        };
        if !header.extra.diagnostics.is_empty() {
            token = token.with_diagnostics(header.extra.diagnostics);
        }
        if !header.extra.annotations.is_empty() {
            token = token.with_annotations(header.extra.annotations);
        }
        self.elements[header.id as usize] = Some(token.clone().into());
        Ok(token)
    }

    fn reserve(&mut self) -> u32 {
        self.elements.push(None);
        (self.elements.len() - 1) as u32
    }

    fn extra(&mut self) -> Result<Extra, DecodeError> {
        let mut extra = Extra::default();
        for _ in 0..self.count()? {
            let severity = Severity::from_u8(self.byte()?)
                .ok_or(DecodeError::Malformed("unknown severity"))?;
            let code = self.u32()?;
            let message = self.str()?;
            let start = TextSize::new(self.u32()?);
            let len = TextSize::new(self.u32()?);
            let end = start
                .checked_add(len)
                .ok_or(DecodeError::Malformed("diagnostic range out of bounds"))?;
            let range = TextRange::new(start, end);
            extra.diagnostics.push(Diagnostic::new(severity, code, message, range));
        }
        for _ in 0..self.count()? {
            let id = self.leb()?;
            let kind = self.opt_str()?;
            let data = self.opt_str()?;
            let annotation = self
                .annotations
                .entry(id)
                .or_insert_with(|| SyntaxAnnotation::from_parts(id, kind, data))
                .clone();
            extra.annotations.push(annotation);
        }
        Ok(extra)
    }

    fn kind(&mut self) -> Result<SyntaxKind, DecodeError> {
        narrow(self.leb()?, "syntax kind out of range").map(SyntaxKind)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let mut byte = [0];
        self.input.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn leb(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.byte()?;
            if shift > 63 {
                return Err(DecodeError::Malformed("integer too large"));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        narrow(self.leb()?, "integer too large")
    }

    fn count(&mut self) -> Result<usize, DecodeError> {
        narrow(self.leb()?, "count too large")
    }

    fn str(&mut self) -> Result<Box<str>, DecodeError> {
        let len = self.leb()?;
        let mut bytes = Vec::new();
        (&mut self.input).take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        let text = String::from_utf8(bytes).ok();
        text.map(String::into_boxed_str).ok_or(DecodeError::Malformed("string is not UTF-8"))
    }

    fn opt_str(&mut self) -> Result<Option<Box<str>>, DecodeError> {
        match self.byte()? {
            0 => Ok(None),
            1 => self.str().map(Some),
            _ => Err(DecodeError::Malformed("bad optional string marker")),
        }
    }
}

fn narrow<T: TryFrom<u64>>(value: u64, what: &'static str) -> Result<T, DecodeError> {
    T::try_from(value).ok().ok_or(DecodeError::Malformed(what))
}

fn close_structure(header: TriviaHeader, structure: Slot) -> Result<GreenTrivia, DecodeError> {
    match structure {
        Some(NodeOrToken::Node(node)) => {
            Ok(apply_trivia_extra(GreenTrivia::structured(header.kind, node), header.extra))
        }
        _ => Err(DecodeError::Malformed("trivia structure is not a node")),
    }
}

fn apply_trivia_extra(mut trivia: GreenTrivia, extra: Extra) -> GreenTrivia {
    if !extra.diagnostics.is_empty() {
        trivia = trivia.with_diagnostics(extra.diagnostics);
    }
    if !extra.annotations.is_empty() {
        trivia = trivia.with_annotations(extra.annotations);
    }
    trivia
}
