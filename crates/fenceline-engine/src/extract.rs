//! Fenced code block extraction from markdown documents.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::block::Block;

/// Collect every fenced code block in `markdown` as an engine [`Block`],
/// in document order. The fence info string is split at its first
/// whitespace into language and metadata. Indented code blocks carry
/// neither and are skipped.
pub fn extract_blocks(markdown: &str) -> Vec<Block> {
    let parser = Parser::new(markdown);
    let mut blocks = Vec::new();
    let mut current: Option<(String, String, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let (language, meta) = split_info_string(&info);
                current = Some((language.to_string(), meta.to_string(), String::new()));
            }
            Event::Text(text) => {
                if let Some((_, _, code)) = current.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, meta, mut code)) = current.take() {
                    if code.ends_with('\n') {
                        code.pop();
                    }
                    blocks.push(Block::new(&code, &language, &meta));
                }
            }
            _ => {}
        }
    }
    blocks
}

/// Split a fence info string at its first whitespace: `rust {1-3} title="x"`
/// becomes language `rust` and metadata `{1-3} title="x"`.
fn split_info_string(info: &str) -> (&str, &str) {
    let info = info.trim();
    match info.split_once(char::is_whitespace) {
        Some((language, meta)) => (language, meta.trim_start()),
        None => (info, ""),
    }
}
