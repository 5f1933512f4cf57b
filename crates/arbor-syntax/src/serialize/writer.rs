use std::io::{self, Write};

use arbor_errors::Diagnostic;
use rustc_hash::FxHashMap;

use super::{
    MAGIC, Strategy, TAG_BACK_REF, TAG_EMPTY, TAG_NODE, TAG_TOKEN, TOKEN_HAS_VALUE,
    TOKEN_MISSING, TRIVIA_STRUCTURE, TRIVIA_TEXT, VERSION,
};
use crate::NodeOrToken;
use crate::annotation::SyntaxAnnotation;
use crate::green::{GreenNode, GreenToken, GreenTrivia, Slot, TriviaContent};
use crate::red::ParseOptions;

/// Pending output of the iterative strategy.
enum Work<'a> {
    Slot(&'a Slot),
    Node(&'a GreenNode),
    Trivia(&'a GreenTrivia),
    /// The trailing trivia count, written once the leading trivia is done.
    Count(usize),
}

pub(super) struct Encoder<W> {
    out: W,
    ids: FxHashMap<usize, u32>,
}

impl<W: Write> Encoder<W> {
    pub(super) fn new(out: W) -> Self {
        Self { out, ids: FxHashMap::default() }
    }

    pub(super) fn finish(mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub(super) fn header(
        &mut self,
        strategy: Strategy,
        depth: usize,
        options: &ParseOptions,
    ) -> io::Result<()> {
        self.out.write_all(&MAGIC)?;
        self.byte(VERSION)?;
        self.byte(strategy as u8)?;
        self.leb(depth as u64)?;
        self.byte(options.kind.as_u8())?;
        self.leb(u64::from(options.language_version))?;
        self.leb(options.preprocessor_symbols.len() as u64)?;
        for symbol in &options.preprocessor_symbols {
            self.str(symbol)?;
        }
        Ok(())
    }

    pub(super) fn node(&mut self, node: &GreenNode) -> io::Result<()> {
        if !self.begin_node(node)? {
            return Ok(());
        }
        for slot in node.slots() {
            self.slot(slot)?;
        }
        Ok(())
    }

    fn slot(&mut self, slot: &Slot) -> io::Result<()> {
        match slot {
            None => self.byte(TAG_EMPTY),
            Some(NodeOrToken::Node(node)) => self.node(node),
            Some(NodeOrToken::Token(token)) => self.token(token),
        }
    }

    fn token(&mut self, token: &GreenToken) -> io::Result<()> {
        if !self.begin_token(token)? {
            return Ok(());
        }
        for piece in token.leading().pieces() {
            self.trivia(piece)?;
        }
        self.leb(token.trailing().len() as u64)?;
        for piece in token.trailing().pieces() {
            self.trivia(piece)?;
        }
        Ok(())
    }

    fn trivia(&mut self, trivia: &GreenTrivia) -> io::Result<()> {
        match self.begin_trivia(trivia)? {
            Some(structure) => self.node(structure),
            None => Ok(()),
        }
    }

    pub(super) fn node_iterative(&mut self, root: &GreenNode) -> io::Result<()> {
        let mut stack = vec![Work::Node(root)];
        while let Some(work) = stack.pop() {
            match work {
                Work::Slot(None) => self.byte(TAG_EMPTY)?,
                Work::Slot(Some(NodeOrToken::Node(node))) | Work::Node(node) => {
                    if self.begin_node(node)? {
                        stack.extend(node.slots().iter().rev().map(Work::Slot));
                    }
                }
                Work::Slot(Some(NodeOrToken::Token(token))) => {
                    if self.begin_token(token)? {
                        stack.extend(token.trailing().pieces().iter().rev().map(Work::Trivia));
                        stack.push(Work::Count(token.trailing().len()));
                        stack.extend(token.leading().pieces().iter().rev().map(Work::Trivia));
                    }
                }
                Work::Trivia(trivia) => {
                    if let Some(structure) = self.begin_trivia(trivia)? {
                        stack.push(Work::Node(structure));
                    }
                }
                Work::Count(count) => self.leb(count as u64)?,
            }
        }
        Ok(())
    }

    /// Writes a back reference if `addr` was written before, otherwise
    /// numbers it and returns `true`.
    fn first_occurrence(&mut self, addr: usize) -> io::Result<bool> {
        let next = self.ids.len() as u32;
        match self.ids.get(&addr) {
            Some(&id) => {
                self.byte(TAG_BACK_REF)?;
                self.leb(u64::from(id))?;
                Ok(false)
            }
            None => {
                self.ids.insert(addr, next);
                Ok(true)
            }
        }
    }

    fn begin_node(&mut self, node: &GreenNode) -> io::Result<bool> {
        if !self.first_occurrence(node.addr())? {
            return Ok(false);
        }
        self.byte(TAG_NODE)?;
        self.leb(u64::from(node.kind().0))?;
        self.leb(node.slot_count() as u64)?;
        self.extra(node.diagnostics(), node.annotations())?;
        Ok(true)
    }

    /// Writes everything up to and including the leading trivia count.
    fn begin_token(&mut self, token: &GreenToken) -> io::Result<bool> {
        if !self.first_occurrence(token.addr())? {
            return Ok(false);
        }
        let mut flags = 0;
        if token.is_missing() {
            flags |= TOKEN_MISSING;
        }
        if token.value().is_some() {
            flags |= TOKEN_HAS_VALUE;
        }
        self.byte(TAG_TOKEN)?;
        self.leb(u64::from(token.kind().0))?;
        self.byte(flags)?;
        self.str(token.text())?;
        if let Some(value) = token.value() {
            self.str(value)?;
        }
        self.extra(token.diagnostics(), token.annotations())?;
        self.leb(token.leading().len() as u64)?;
        Ok(true)
    }

    /// Writes the trivia header and returns the structure still to be written.
    fn begin_trivia<'t>(&mut self, trivia: &'t GreenTrivia) -> io::Result<Option<&'t GreenNode>> {
        self.byte(trivia.kind().as_u8())?;
        self.extra(trivia.diagnostics(), trivia.annotations())?;
        match trivia.content() {
            TriviaContent::Text(text) => {
                self.byte(TRIVIA_TEXT)?;
                self.str(text)?;
                Ok(None)
            }
            TriviaContent::Structure(structure) => {
                self.byte(TRIVIA_STRUCTURE)?;
                Ok(Some(structure))
            }
        }
    }

    fn extra(
        &mut self,
        diagnostics: &[Diagnostic],
        annotations: &[SyntaxAnnotation],
    ) -> io::Result<()> {
        self.leb(diagnostics.len() as u64)?;
        for diagnostic in diagnostics {
            self.byte(diagnostic.severity().as_u8())?;
            self.leb(u64::from(diagnostic.code()))?;
            self.str(diagnostic.message())?;
            self.leb(u64::from(u32::from(diagnostic.range().start())))?;
            self.leb(u64::from(u32::from(diagnostic.range().len())))?;
        }
        self.leb(annotations.len() as u64)?;
        for annotation in annotations {
            self.leb(annotation.id())?;
            self.opt_str(annotation.kind())?;
            self.opt_str(annotation.data())?;
        }
        Ok(())
    }

    fn byte(&mut self, byte: u8) -> io::Result<()> {
        self.out.write_all(&[byte])
    }

    fn leb(&mut self, mut value: u64) -> io::Result<()> {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                return self.byte(byte);
            }
            self.byte(byte | 0x80)?;
        }
    }

    fn str(&mut self, text: &str) -> io::Result<()> {
        self.leb(text.len() as u64)?;
        self.out.write_all(text.as_bytes())
    }

    fn opt_str(&mut self, text: Option<&str>) -> io::Result<()> {
        match text {
            Some(text) => {
                self.byte(1)?;
                self.str(text)
            }
            None => self.byte(0),
        }
    }
}
