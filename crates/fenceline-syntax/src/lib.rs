//! # fenceline-syntax
//!
//! A lightweight token highlighter for fenceline blocks, built on [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! This is deliberately not a full grammar per language. The lexer
//! ([`lexer`] module) recognizes the token shapes most languages share -
//! comments, strings, numbers, identifiers - and a per-language
//! [`Profile`] chooses the comment style and promotes identifiers to
//! keywords. That is enough to produce useful highlighting annotations
//! for documentation snippets without dragging in a grammar library.
//!
//! ## Pipeline role
//!
//! [`SyntaxHighlight`] implements the engine's `Plugin` trait and runs in
//! the syntax-analysis phase: it lexes the block's current code, maps each
//! classified token span onto line columns, and adds one inline annotation
//! per token per line. Annotations render as `<span class="tok-...">`
//! wrappers in the earliest phase, so marker plugins running later wrap
//! around them.

pub mod lexer;

use fenceline_engine::{Annotation, AnnotationRender, Block, InlineRange, Plugin, RenderPhase};

use crate::lexer::{CommentStyle, TokenClass, lex_with_spans};

pub const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

pub const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "delete", "do", "else", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "let", "new", "null", "of", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "yield",
];

pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "false", "for", "func", "go", "goto", "if", "import", "interface", "map", "nil", "package",
    "range", "return", "select", "struct", "switch", "true", "type", "var",
];

pub const SHELL_KEYWORDS: &[&str] = &[
    "case", "do", "done", "elif", "else", "esac", "exit", "export", "fi", "for", "function",
    "if", "in", "local", "return", "select", "then", "until", "while",
];

/// How one language is highlighted: its comment style plus the identifier
/// set promoted to keywords.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub style: CommentStyle,
    pub keywords: &'static [&'static str],
}

impl Profile {
    /// Look up the profile for a fence language tag. Unknown languages get
    /// C-like comments and no keywords, so strings and numbers still
    /// highlight.
    pub fn for_language(language: &str) -> Self {
        match language {
            "rust" | "rs" => Self { style: CommentStyle::CLike, keywords: RUST_KEYWORDS },
            "js" | "jsx" | "javascript" | "ts" | "tsx" | "typescript" => {
                Self { style: CommentStyle::CLike, keywords: JS_KEYWORDS }
            }
            "python" | "py" => Self { style: CommentStyle::Script, keywords: PYTHON_KEYWORDS },
            "go" => Self { style: CommentStyle::CLike, keywords: GO_KEYWORDS },
            "sh" | "bash" | "shell" | "zsh" => {
                Self { style: CommentStyle::Script, keywords: SHELL_KEYWORDS }
            }
            "toml" | "yaml" | "yml" | "ini" => {
                Self { style: CommentStyle::Script, keywords: &[] }
            }
            _ => Self { style: CommentStyle::CLike, keywords: &[] },
        }
    }
}

/// The highlighting plugin. Stateless; one instance serves any number of
/// blocks.
#[derive(Debug, Default)]
pub struct SyntaxHighlight;

impl SyntaxHighlight {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for SyntaxHighlight {
    fn name(&self) -> &str {
        "syntax-highlight"
    }

    fn perform_syntax_analysis(&self, block: &mut Block) -> anyhow::Result<()> {
        if block.language().is_empty() {
            return Ok(());
        }
        let profile = Profile::for_language(block.language());
        let code = block.code();

        for (index, range, name) in token_annotations(&code, profile) {
            let annotation = Annotation::inline(
                name,
                InlineRange::new(range.0, range.1),
                AnnotationRender::wrap_with_class("span", name),
            )
            .with_phase(RenderPhase::Earliest);
            block.add_annotation(index, annotation)?;
        }
        Ok(())
    }
}

/// Lex `code` and map every highlightable token onto per-line column
/// ranges: `(line index, (start, end), annotation name)`. Tokens spanning
/// several lines (block comments) are split at line boundaries; the
/// newline bytes themselves are never annotated.
fn token_annotations(code: &str, profile: Profile) -> Vec<(usize, (usize, usize), &'static str)> {
    let mut line_starts = vec![0usize];
    for (offset, byte) in code.bytes().enumerate() {
        if byte == b'\n' {
            line_starts.push(offset + 1);
        }
    }
    let line_end = |line: usize| -> usize {
        match line_starts.get(line + 1) {
            Some(&next_start) => next_start - 1,
            None => code.len(),
        }
    };

    let mut annotations = Vec::new();
    for (token, span) in lex_with_spans(code, profile.style) {
        let Some(name) = annotation_name(token.class, token.text, profile.keywords) else {
            continue;
        };
        let first = line_starts.partition_point(|&start| start <= span.start) - 1;
        let last = line_starts.partition_point(|&start| start < span.end).saturating_sub(1);
        for line in first..=last {
            let start = span.start.max(line_starts[line]) - line_starts[line];
            let end = span.end.min(line_end(line)).saturating_sub(line_starts[line]);
            if start < end {
                annotations.push((line, (start, end), name));
            }
        }
    }
    annotations
}

fn annotation_name(
    class: TokenClass,
    text: &str,
    keywords: &'static [&'static str],
) -> Option<&'static str> {
    match class {
        TokenClass::Comment => Some("tok-comment"),
        TokenClass::Str => Some("tok-string"),
        TokenClass::Number => Some("tok-number"),
        TokenClass::Ident if keywords.iter().any(|keyword| *keyword == text) => {
            Some("tok-keyword")
        }
        _ => None,
    }
}
