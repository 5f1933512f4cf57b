//! Text changes between two versions of a tree.
//!
//! The trees are walked together from the root. Shared green subtrees are
//! skipped outright; children of matching nodes are paired up, through a
//! longest common subsequence when their counts differ. Runs that do not
//! pair up become one replacement each. Among equally long subsequences the
//! one matching old elements leftmost wins.

use std::fmt;

use text_size::{TextRange, TextSize};

use crate::green::GreenElement;
use crate::{NodeOrToken, SyntaxNode, SyntaxTree};

/// Replace `span` of the old text with `new_text`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TextChange {
    pub span: TextRange,
    pub new_text: String,
}

impl TextChange {
    pub fn new(span: TextRange, new_text: impl Into<String>) -> Self {
        Self { span, new_text: new_text.into() }
    }
}

impl fmt::Debug for TextChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} => {:?}", self.span, self.new_text)
    }
}

/// Applies ascending, non-overlapping `changes` to `text`.
pub fn apply_changes(text: &str, changes: &[TextChange]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for change in changes {
        let start = usize::from(change.span.start());
        out.push_str(&text[cursor..start]);
        out.push_str(&change.new_text);
        cursor = usize::from(change.span.end());
    }
    out.push_str(&text[cursor..]);
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffOptions {
    /// Largest `old * new` child count for which a subsequence is computed.
    /// Bigger runs are replaced wholesale.
    pub max_lcs_cells: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { max_lcs_cells: 1 << 22 }
    }
}

/// The changes that turn the text of `old` into the text of `new`.
pub fn changes(old: &SyntaxNode, new: &SyntaxNode, options: DiffOptions) -> Vec<TextChange> {
    let old_green = NodeOrToken::Node(old.green().clone());
    let new_green = NodeOrToken::Node(new.green().clone());
    let mut differ = Differ { options, raw: Vec::new() };
    differ.element(&old_green, TextSize::new(0), &new_green);
    let old_text = old.text();
    finish(differ.raw, &old_text)
}

/// A raw replacement, before merging and trimming.
struct RawChange {
    span: TextRange,
    new_text: String,
}

struct Differ {
    options: DiffOptions,
    raw: Vec<RawChange>,
}

impl Differ {
    fn element(&mut self, old: &GreenElement, offset: TextSize, new: &GreenElement) {
        if old.ptr_eq(new) {
            return;
        }
        match (old, new) {
            (NodeOrToken::Node(o), NodeOrToken::Node(n)) if o.kind() == n.kind() => {
                let old_children = children(o.slots().iter().flatten(), offset);
                let new_children: Vec<&GreenElement> = n.slots().iter().flatten().collect();
                self.children(&old_children, &new_children, offset + o.full_width());
            }
            (NodeOrToken::Token(o), NodeOrToken::Token(n))
                if o.kind() == n.kind() && old.text_eq(new) => {}
            _ => self.replace(TextRange::at(offset, old.full_width()), &[new]),
        }
    }

    /// Diffs two child runs. `end` is where the old run stops.
    fn children(
        &mut self,
        old: &[(TextSize, &GreenElement)],
        new: &[&GreenElement],
        end: TextSize,
    ) {
        let prefix = old.iter().zip(new).take_while(|((_, o), n)| same(o, n)).count();
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|((_, o), n)| same(o, n))
            .count();
        let end = if suffix == 0 { end } else { old[old.len() - suffix].0 };
        let old = &old[prefix..old.len() - suffix];
        let new = &new[prefix..new.len() - suffix];

        if old.len() == new.len() || old.is_empty() || new.is_empty() {
            self.unmatched(old, new, end);
            return;
        }
        if old.len().saturating_mul(new.len()) > self.options.max_lcs_cells {
            tracing::debug!(
                old = old.len(),
                new = new.len(),
                "child runs too long for a subsequence, replacing wholesale"
            );
            let start = old.first().map_or(end, |(offset, _)| *offset);
            self.replace(TextRange::new(start, end), new);
            return;
        }
        self.subsequence(old, new, end);
    }

    fn subsequence(
        &mut self,
        old: &[(TextSize, &GreenElement)],
        new: &[&GreenElement],
        end: TextSize,
    ) {
        let (rows, cols) = (old.len(), new.len());
        // lengths[i][j]: subsequence length of old[i..] and new[j..]
        let mut lengths = vec![0u32; (rows + 1) * (cols + 1)];
        let at = |i: usize, j: usize| i * (cols + 1) + j;
        for i in (0..rows).rev() {
            for j in (0..cols).rev() {
                lengths[at(i, j)] = if same(old[i].1, new[j]) {
                    lengths[at(i + 1, j + 1)] + 1
                } else {
                    lengths[at(i + 1, j)].max(lengths[at(i, j + 1)])
                };
            }
        }

        let (mut i, mut j) = (0, 0);
        let (mut run_i, mut run_j) = (0, 0);
        while i < rows && j < cols {
            if same(old[i].1, new[j]) && lengths[at(i, j)] == lengths[at(i + 1, j + 1)] + 1 {
                let run_end = old[i].0;
                self.unmatched(&old[run_i..i], &new[run_j..j], run_end);
                i += 1;
                j += 1;
                (run_i, run_j) = (i, j);
            } else if lengths[at(i + 1, j)] >= lengths[at(i, j + 1)] {
                i += 1;
            } else {
                j += 1;
            }
        }
        self.unmatched(&old[run_i..], &new[run_j..], end);
    }

    /// A run between two matched elements, ending at `end` in the old text.
    fn unmatched(
        &mut self,
        old: &[(TextSize, &GreenElement)],
        new: &[&GreenElement],
        end: TextSize,
    ) {
        if old.is_empty() && new.is_empty() {
            return;
        }
        if old.len() == new.len() && old.iter().zip(new).all(|((_, o), n)| o.kind() == n.kind()) {
            for ((offset, o), n) in old.iter().zip(new) {
                self.element(o, *offset, n);
            }
            return;
        }
        let start = old.first().map_or(end, |(offset, _)| *offset);
        self.replace(TextRange::new(start, end), new);
    }

    fn replace(&mut self, span: TextRange, new: &[&GreenElement]) {
        let mut new_text = String::new();
        for element in new {
            element.write_text(&mut new_text);
        }
        self.raw.push(RawChange { span, new_text });
    }
}

fn children<'a>(
    slots: impl Iterator<Item = &'a GreenElement>,
    start: TextSize,
) -> Vec<(TextSize, &'a GreenElement)> {
    let mut offset = start;
    slots
        .map(|element| {
            let at = offset;
            offset += element.full_width();
            (at, element)
        })
        .collect()
}

/// Elements that can stand for each other without looking inside.
fn same(old: &GreenElement, new: &GreenElement) -> bool {
    old.ptr_eq(new) || (old.kind() == new.kind() && old.text_eq(new))
}

/// Sorts, merges touching changes and trims text both sides agree on.
fn finish(mut raw: Vec<RawChange>, old_text: &str) -> Vec<TextChange> {
    raw.sort_by_key(|change| change.span.start());
    let mut merged: Vec<RawChange> = Vec::with_capacity(raw.len());
    for change in raw {
        match merged.last_mut() {
            Some(last) if change.span.start() <= last.span.end() => {
                let gap = TextRange::new(last.span.end(), change.span.start());
                last.new_text.push_str(&old_text[gap]);
                last.new_text.push_str(&change.new_text);
                last.span = last.span.cover(change.span);
            }
            _ => merged.push(change),
        }
    }
    merged.into_iter().filter_map(|change| trim(change, old_text)).collect()
}

fn trim(change: RawChange, old_text: &str) -> Option<TextChange> {
    let old = &old_text[change.span];
    let new = change.new_text.as_str();
    let prefix: usize = old
        .chars()
        .zip(new.chars())
        .take_while(|(o, n)| o == n)
        .map(|(o, _)| o.len_utf8())
        .sum();
    let (old_rest, new_rest) = (&old[prefix..], &new[prefix..]);
    let suffix: usize = old_rest
        .chars()
        .rev()
        .zip(new_rest.chars().rev())
        .take_while(|(o, n)| o == n)
        .map(|(o, _)| o.len_utf8())
        .sum();
    let old_len = old.len() - prefix - suffix;
    let new_text = &new_rest[..new_rest.len() - suffix];
    if old_len == 0 && new_text.is_empty() {
        return None;
    }
    let start = change.span.start() + TextSize::new(prefix as u32);
    let span = TextRange::at(start, TextSize::new(old_len as u32));
    Some(TextChange::new(span, new_text))
}

impl SyntaxNode {
    /// Changes turning `old`'s text into this node's text.
    pub fn changes_from(&self, old: &Self) -> Vec<TextChange> {
        changes(old, self, DiffOptions::default())
    }

    /// Spans of `old`'s text that differ in this node.
    pub fn changed_spans_from(&self, old: &Self) -> Vec<TextRange> {
        self.changes_from(old).into_iter().map(|change| change.span).collect()
    }
}

impl SyntaxTree {
    pub fn changes_from(&self, old: &Self) -> Vec<TextChange> {
        self.root().changes_from(old.root())
    }

    pub fn changed_spans_from(&self, old: &Self) -> Vec<TextRange> {
        self.root().changed_spans_from(old.root())
    }
}
