//! Parser for the curly-brace test language.

mod grammar;
mod language;
mod parser;
#[cfg(test)]
mod tests;

use arbor_syntax::{NodeCache, ParseOptions, SyntaxTree};
pub use arbor_tokenizer::kinds;
pub use language::{LANGUAGE, TestLanguage};

/// Diagnostic codes reported by the parser.
pub mod codes {
    pub const EXPECTED: u32 = 100;
    pub const UNEXPECTED: u32 = 101;
}

pub fn parse(text: &str, options: &ParseOptions) -> SyntaxTree {
    parse_with_cache(text, options, NodeCache::shared())
}

pub fn parse_with_cache(text: &str, options: &ParseOptions, cache: &NodeCache) -> SyntaxTree {
    let _span = tracing::debug_span!("parse", len = text.len()).entered();
    let mut parser = parser::Parser::new(text, cache, &options.preprocessor_symbols);
    grammar::items::source_file(&mut parser);
    SyntaxTree::new(parser.finish(cache), &LANGUAGE, options.clone())
}
