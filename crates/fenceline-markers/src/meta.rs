//! # Meta String Grammar
//!
//! Parses the marker directives out of a fence meta string. The grammar is a
//! flat token soup - order carries no meaning and anything unrecognized is
//! left for other plugins to interpret:
//!
//! - `{2-4}` / `{7}` - 1-based inclusive line ranges, marked with kind
//!   `mark`.
//! - `mark=` / `ins=` / `del=` followed by `{range}`, `"substring"`,
//!   `'substring'` or `/regex/` - explicit kinds. A bare selector defaults
//!   to `mark`.
//! - `diff` - standalone word enabling diff preprocessing.
//!
//! Only one thing is an error: a `/regex/` selector whose pattern the regex
//! engine rejects. Everything else unparseable is simply not a marker token.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors from parsing a meta string.
#[derive(Debug, Error)]
pub enum MetaError {
    /// A `/pattern/` selector that is not a valid regex.
    #[error("invalid mark pattern /{pattern}/: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Which element a mark renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Mark,
    Ins,
    Del,
}

impl MarkKind {
    /// Element name (and annotation name) for this kind's wrap render.
    pub fn element(self) -> &'static str {
        match self {
            MarkKind::Mark => "mark",
            MarkKind::Ins => "ins",
            MarkKind::Del => "del",
        }
    }
}

/// What a mark selects: 1-based inclusive line numbers, a literal substring
/// matched per line, or a regex matched per line.
#[derive(Debug, Clone)]
pub enum Selector {
    Lines { start: usize, end: usize },
    Substring(String),
    Pattern(Regex),
}

/// One parsed mark directive.
#[derive(Debug, Clone)]
pub struct Mark {
    pub kind: MarkKind,
    pub selector: Selector,
}

/// Everything the marker plugin reads out of a meta string.
#[derive(Debug, Clone, Default)]
pub struct MetaSpec {
    pub diff: bool,
    pub marks: Vec<Mark>,
}

/// Parse a meta string into its marker directives.
pub fn parse_meta(meta: &str) -> Result<MetaSpec, MetaError> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let token = TOKEN.get_or_init(|| {
        Regex::new(
            r#"(?:(mark|ins|del)=)?(?:\{([0-9]+)(?:-([0-9]+))?\}|"([^"]*)"|'([^']*)'|/((?:[^/\\]|\\.)*)/)"#,
        )
        .expect("invalid mark token pattern")
    });

    let mut spec = MetaSpec {
        diff: meta.split_whitespace().any(|word| word == "diff"),
        marks: Vec::new(),
    };

    for captures in token.captures_iter(meta) {
        let kind = match captures.get(1).map(|group| group.as_str()) {
            Some("ins") => MarkKind::Ins,
            Some("del") => MarkKind::Del,
            _ => MarkKind::Mark,
        };

        let selector = if let Some(start) = captures.get(2) {
            let start = line_number(start.as_str());
            let end = captures
                .get(3)
                .map(|group| line_number(group.as_str()))
                .unwrap_or(start);
            Selector::Lines { start, end }
        } else if let Some(text) = captures.get(4).or_else(|| captures.get(5)) {
            Selector::Substring(text.as_str().to_string())
        } else if let Some(pattern) = captures.get(6) {
            // `\/` is a valid escape to the regex engine, so the captured
            // text compiles as written
            let regex = Regex::new(pattern.as_str()).map_err(|source| MetaError::InvalidPattern {
                pattern: pattern.as_str().to_string(),
                source,
            })?;
            Selector::Pattern(regex)
        } else {
            continue;
        };

        spec.marks.push(Mark { kind, selector });
    }
    Ok(spec)
}

/// Absurdly large line numbers clamp to `usize::MAX` and then fall off the
/// end of any real block.
fn line_number(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn marks_of(meta: &str) -> Vec<(MarkKind, String)> {
        parse_meta(meta)
            .unwrap()
            .marks
            .into_iter()
            .map(|mark| {
                let selector = match mark.selector {
                    Selector::Lines { start, end } => format!("lines:{start}-{end}"),
                    Selector::Substring(text) => format!("sub:{text}"),
                    Selector::Pattern(regex) => format!("re:{}", regex.as_str()),
                };
                (mark.kind, selector)
            })
            .collect()
    }

    #[rstest]
    #[case("{2-4}", MarkKind::Mark, "lines:2-4")]
    #[case("{7}", MarkKind::Mark, "lines:7-7")]
    #[case("mark={1-2}", MarkKind::Mark, "lines:1-2")]
    #[case("ins={3}", MarkKind::Ins, "lines:3-3")]
    #[case("del=\"gone\"", MarkKind::Del, "sub:gone")]
    #[case("\"bare\"", MarkKind::Mark, "sub:bare")]
    #[case("'single quoted'", MarkKind::Mark, "sub:single quoted")]
    #[case("mark=/ba+r/", MarkKind::Mark, "re:ba+r")]
    fn one_token_parses(#[case] meta: &str, #[case] kind: MarkKind, #[case] selector: &str) {
        assert_eq!(marks_of(meta), vec![(kind, selector.to_string())]);
    }

    #[test]
    fn mixed_meta_keeps_token_order() {
        let spec = parse_meta("{1} del=\"x\" diff ins=/y+/").unwrap();
        assert!(spec.diff);
        assert_eq!(
            marks_of("{1} del=\"x\" diff ins=/y+/"),
            vec![
                (MarkKind::Mark, "lines:1-1".to_string()),
                (MarkKind::Del, "sub:x".to_string()),
                (MarkKind::Ins, "re:y+".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("diff", true)]
    #[case("diff {2}", true)]
    #[case("diffx", false)]
    #[case("nodiff", false)]
    #[case("", false)]
    fn diff_is_a_standalone_word(#[case] meta: &str, #[case] expected: bool) {
        assert_eq!(parse_meta(meta).unwrap().diff, expected);
    }

    #[test]
    fn quoted_diff_is_a_substring_not_a_flag() {
        let spec = parse_meta("\"diff\"").unwrap();
        assert!(!spec.diff);
        assert_eq!(marks_of("\"diff\""), vec![(MarkKind::Mark, "sub:diff".to_string())]);
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let spec = parse_meta("wrap line-numbers title=example").unwrap();
        assert!(!spec.diff);
        assert!(spec.marks.is_empty());
    }

    #[test]
    fn escaped_slash_stays_in_pattern() {
        assert_eq!(
            marks_of(r"/a\/b/"),
            vec![(MarkKind::Mark, r"re:a\/b".to_string())]
        );
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = parse_meta("/((/").unwrap_err();
        assert!(err.to_string().contains("/((/"), "got: {err}");
    }

    #[test]
    fn huge_line_number_clamps() {
        assert_eq!(
            marks_of("{99999999999999999999999}"),
            vec![(MarkKind::Mark, format!("lines:{max}-{max}", max = usize::MAX))]
        );
    }
}
