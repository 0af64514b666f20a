//! # Lexer - Tokenizing Code for Highlighting
//!
//! Breaks a block's code into classified tokens using the [Logos] lexer
//! generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token; nothing is skipped
//! or discarded. Concatenating all token texts reconstructs the input, which
//! is what lets token spans be mapped back onto line columns exactly.
//!
//! ## Why Two Token Enums?
//!
//! Comment syntax is the one place languages genuinely disagree in a way a
//! single context-free token set cannot express: `#` opens a comment in
//! Python or shell but is ordinary punctuation in Rust or Go. Logos derives
//! a fixed automaton per enum, so there is one enum per comment style
//! ([`CLikeToken`], [`ScriptToken`]) and both map into the shared public
//! [`TokenClass`].
//!
//! ## Token Design Philosophy
//!
//! Tokens are minimal and context-free. The lexer does not know whether an
//! identifier is a keyword - that promotion happens later against a
//! per-language table. Characters that fit no rule (a lone `/`, an
//! unterminated quote) come back as Logos errors and degrade to
//! [`TokenClass::Punct`], so malformed code still lexes.

use std::ops::Range;

use logos::Logos;

/// Which comment grammar a language uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` line comments and `/* */` block comments.
    CLike,
    /// `#` comments to end of line.
    Script,
}

/// The unified token classification both lexers map into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Comment,
    Str,
    Number,
    Ident,
    Whitespace,
    Newline,
    Punct,
}

/// Token kinds for C-style languages (Rust, JS, Go, C...).
///
/// Deliberately no skip pattern: every byte either matches a rule or comes
/// back from Logos as an error span, which the driver folds into `Punct`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum CLikeToken {
    /// `// …` to end of line
    #[regex(r"//[^\n]*")]
    LineComment,

    /// `/* … */`, non-nesting, may span lines
    #[regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
    BlockComment,

    /// Double-quoted string with backslash escapes
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    DoubleString,

    /// Single-quoted string or char literal with backslash escapes
    #[regex(r"'([^'\\\n]|\\.)*'")]
    SingleString,

    /// Numeric literal, loosely: digits plus trailing alphanumerics
    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,

    /// Identifier or keyword
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Horizontal whitespace
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// Any other single character. `/`, `"` and `'` are left out so a
    /// failed comment/string match falls through to the error path instead
    /// of being swallowed here.
    #[regex(r#"[^\sA-Za-z0-9_/"']"#)]
    Punct,
}

impl CLikeToken {
    fn class(self) -> TokenClass {
        match self {
            CLikeToken::LineComment | CLikeToken::BlockComment => TokenClass::Comment,
            CLikeToken::DoubleString | CLikeToken::SingleString => TokenClass::Str,
            CLikeToken::Number => TokenClass::Number,
            CLikeToken::Ident => TokenClass::Ident,
            CLikeToken::Whitespace => TokenClass::Whitespace,
            CLikeToken::Newline => TokenClass::Newline,
            CLikeToken::Punct => TokenClass::Punct,
        }
    }
}

/// Token kinds for hash-comment languages (Python, shell, TOML...).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptToken {
    /// `# …` to end of line
    #[regex(r"#[^\n]*")]
    HashComment,

    /// Double-quoted string with backslash escapes
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    DoubleString,

    /// Single-quoted string with backslash escapes
    #[regex(r"'([^'\\\n]|\\.)*'")]
    SingleString,

    /// Numeric literal
    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,

    /// Identifier or keyword
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Horizontal whitespace
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// Any other single character; `#`, `"` and `'` fall through to the
    /// error path when their longer rules fail
    #[regex(r#"[^\sA-Za-z0-9_#"']"#)]
    Punct,
}

impl ScriptToken {
    fn class(self) -> TokenClass {
        match self {
            ScriptToken::HashComment => TokenClass::Comment,
            ScriptToken::DoubleString | ScriptToken::SingleString => TokenClass::Str,
            ScriptToken::Number => TokenClass::Number,
            ScriptToken::Ident => TokenClass::Ident,
            ScriptToken::Whitespace => TokenClass::Whitespace,
            ScriptToken::Newline => TokenClass::Newline,
            ScriptToken::Punct => TokenClass::Punct,
        }
    }
}

/// A lexed token with its classification and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub class: TokenClass,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str, style: CommentStyle) -> Vec<Token<'_>> {
    lex_with_spans(input, style)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str, style: CommentStyle) -> Vec<(Token<'_>, Range<usize>)> {
    let mut tokens = Vec::new();
    match style {
        CommentStyle::CLike => {
            let mut lexer = CLikeToken::lexer(input);
            while let Some(result) = lexer.next() {
                let span = lexer.span();
                let text = lexer.slice();
                let class = match result {
                    Ok(token) => token.class(),
                    // unrecognized character - treat as punctuation
                    Err(()) => TokenClass::Punct,
                };
                tokens.push((Token { class, text }, span));
            }
        }
        CommentStyle::Script => {
            let mut lexer = ScriptToken::lexer(input);
            while let Some(result) = lexer.next() {
                let span = lexer.span();
                let text = lexer.slice();
                let class = match result {
                    Ok(token) => token.class(),
                    Err(()) => TokenClass::Punct,
                };
                tokens.push((Token { class, text }, span));
            }
        }
    }
    tokens
}
