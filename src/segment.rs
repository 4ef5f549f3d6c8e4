//! # Content Segmentation
//!
//! Splits one card face into plain-text and formula segments. Inline math is
//! delimited by `\( … \)` and display math by `\[ … \]`. Each kind is matched
//! non-greedily and never across a line break; the two match streams are
//! merged by start offset. Unterminated delimiters stay in the plain text.
//!
//! Also home to the reducer that turns a card face into a short table of
//! contents label.

use std::ops::Range;

use crate::text::markup::{decode_entities, find_tag};

const INLINE_OPEN: &str = "\\(";
const INLINE_CLOSE: &str = "\\)";
const DISPLAY_OPEN: &str = "\\[";
const DISPLAY_CLOSE: &str = "\\]";

/// TOC labels longer than this many characters are truncated.
const TOC_LABEL_MAX: usize = 40;
/// Characters kept from a truncated label before the ellipsis.
const TOC_LABEL_KEEP: usize = 37;
/// Math-only content shorter than this is shown verbatim in the TOC.
const TOC_MATH_VERBATIM_MAX: usize = 20;

/// One piece of a card face, borrowing from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSegment<'a> {
    /// Byte range of the whole segment in the source, delimiters included.
    pub span: Range<usize>,
    pub kind: SegmentKind<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind<'a> {
    PlainText {
        html: &'a str,
    },
    Formula {
        tex: &'a str,
        display: bool,
        /// The formula with its delimiters, as written.
        original: &'a str,
    },
}

impl ContentSegment<'_> {
    pub fn is_formula(&self) -> bool {
        matches!(self.kind, SegmentKind::Formula { .. })
    }
}

struct Match {
    outer: Range<usize>,
    inner: Range<usize>,
    display: bool,
}

/// Find non-overlapping `open … close` spans, shortest first.
fn find_delimited(
    content: &str,
    open: &str,
    close: &str,
    allow_newlines: bool,
) -> Vec<(Range<usize>, Range<usize>)> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(rel) = content[pos..].find(open) {
        let start = pos + rel;
        let body_start = start + open.len();
        match content[body_start..].find(close) {
            Some(close_rel)
                if allow_newlines || !content[body_start..body_start + close_rel].contains('\n') =>
            {
                let body_end = body_start + close_rel;
                let end = body_end + close.len();
                found.push((start..end, body_start..body_end));
                pos = end;
            }
            // No closer on this line for this opener; retry from the next byte.
            _ => pos = start + 1,
        }
    }

    found
}

/// Split `content` into plain-text and formula segments in source order.
///
/// Gaps between formulas become [`SegmentKind::PlainText`] segments, even when
/// they are blank; callers decide whether blank text is worth drawing.
pub fn segment(content: &str) -> Vec<ContentSegment<'_>> {
    let mut matches: Vec<Match> = find_delimited(content, INLINE_OPEN, INLINE_CLOSE, false)
        .into_iter()
        .map(|(outer, inner)| Match {
            outer,
            inner,
            display: false,
        })
        .chain(
            find_delimited(content, DISPLAY_OPEN, DISPLAY_CLOSE, false)
                .into_iter()
                .map(|(outer, inner)| Match {
                    outer,
                    inner,
                    display: true,
                }),
        )
        .collect();
    matches.sort_by_key(|m| m.outer.start);

    let mut segments = Vec::with_capacity(matches.len() * 2 + 1);
    let mut last = 0;
    for m in matches {
        // Inline and display spans can interleave; the earlier one wins.
        if m.outer.start < last {
            continue;
        }
        if m.outer.start > last {
            segments.push(ContentSegment {
                span: last..m.outer.start,
                kind: SegmentKind::PlainText {
                    html: &content[last..m.outer.start],
                },
            });
        }
        segments.push(ContentSegment {
            span: m.outer.clone(),
            kind: SegmentKind::Formula {
                tex: &content[m.inner],
                display: m.display,
                original: &content[m.outer.clone()],
            },
        });
        last = m.outer.end;
    }
    if last < content.len() {
        segments.push(ContentSegment {
            span: last..content.len(),
            kind: SegmentKind::PlainText {
                html: &content[last..],
            },
        });
    }

    segments
}

/// True when the trimmed text opens and closes with one kind of math
/// delimiter on a single line.
fn is_math_only(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.contains('\n') {
        return false;
    }
    [(INLINE_OPEN, INLINE_CLOSE), (DISPLAY_OPEN, DISPLAY_CLOSE)]
        .iter()
        .any(|(open, close)| {
            trimmed.len() >= open.len() + close.len()
                && trimmed.starts_with(open)
                && trimmed.ends_with(close)
        })
}

/// Replace every formula, line breaks allowed, with `[math]`.
fn replace_math(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    loop {
        let next = [(INLINE_OPEN, INLINE_CLOSE), (DISPLAY_OPEN, DISPLAY_CLOSE)]
            .iter()
            .filter_map(|&(open, close)| {
                let start = pos + html[pos..].find(open)?;
                let body = start + open.len();
                let end = body + html[body..].find(close)? + close.len();
                Some((start, end))
            })
            .min_by_key(|&(start, _)| start);

        match next {
            Some((start, end)) => {
                out.push_str(&html[pos..start]);
                out.push_str("[math]");
                pos = end;
            }
            None => break,
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Drop tags, turning block ends and line breaks into spaces.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(tag) = find_tag(rest) {
        out.push_str(&rest[..tag.start]);
        let inner = rest[tag.start + 1..tag.end - 1].to_ascii_lowercase();
        let name: String = inner
            .trim_end_matches('/')
            .chars()
            .take_while(|c| *c == '/' || c.is_ascii_alphanumeric())
            .collect();
        if matches!(name.as_str(), "/div" | "/p" | "/li" | "br") {
            out.push(' ');
        }
        rest = &rest[tag.end..];
    }
    out.push_str(rest);
    out
}

/// Short single-line label for a card face in the table of contents.
pub fn toc_label(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    if is_math_only(html) {
        let inner = [INLINE_OPEN, INLINE_CLOSE, DISPLAY_OPEN, DISPLAY_CLOSE]
            .iter()
            .fold(html.to_string(), |acc, delim| acc.replace(delim, ""));
        let inner = inner.trim();
        return if inner.chars().count() < TOC_MATH_VERBATIM_MAX {
            format!("Math: {}", inner)
        } else {
            "Mathematical expression".to_string()
        };
    }

    let text = decode_entities(&strip_tags(&replace_math(html)));
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() > TOC_LABEL_MAX {
        let kept: String = text.chars().take(TOC_LABEL_KEEP).collect();
        format!("{}...", kept)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<'a>(segments: &[ContentSegment<'a>]) -> Vec<(&'a str, Option<bool>)> {
        segments
            .iter()
            .map(|s| match s.kind {
                SegmentKind::PlainText { html } => (html, None),
                SegmentKind::Formula { tex, display, .. } => (tex, Some(display)),
            })
            .collect()
    }

    #[test]
    fn test_plain_text_only() {
        let segments = segment("just words");
        assert_eq!(kinds(&segments), vec![("just words", None)]);
        assert_eq!(segments[0].span, 0..10);
    }

    #[test]
    fn test_empty_content_has_no_segments() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_mixed_inline_and_display_in_order() {
        let content = r"Area \(\pi r^2\) and \[E = mc^2\] done";
        let segments = segment(content);
        assert_eq!(
            kinds(&segments),
            vec![
                ("Area ", None),
                (r"\pi r^2", Some(false)),
                (" and ", None),
                ("E = mc^2", Some(true)),
                (" done", None),
            ]
        );
        match segments[3].kind {
            SegmentKind::Formula { original, .. } => assert_eq!(original, r"\[E = mc^2\]"),
            _ => panic!("expected formula"),
        }
        assert_eq!(&content[segments[1].span.clone()], r"\(\pi r^2\)");
    }

    #[test]
    fn test_display_before_inline_sorted_by_start() {
        let segments = segment(r"\[a\]\(b\)");
        assert_eq!(kinds(&segments), vec![("a", Some(true)), ("b", Some(false))]);
    }

    #[test]
    fn test_non_greedy_matching() {
        let segments = segment(r"\(a\) x \(b\)");
        assert_eq!(
            kinds(&segments),
            vec![("a", Some(false)), (" x ", None), ("b", Some(false))]
        );
    }

    #[test]
    fn test_unterminated_delimiter_left_as_text() {
        let segments = segment(r"cost \(x + 1 forever");
        assert_eq!(kinds(&segments), vec![(r"cost \(x + 1 forever", None)]);
    }

    #[test]
    fn test_formula_does_not_span_lines() {
        let segments = segment("\\(a\nb\\) then \\(c\\)");
        assert_eq!(
            kinds(&segments),
            vec![("\\(a\nb\\) then ", None), ("c", Some(false))]
        );
    }

    #[test]
    fn test_overlapping_kinds_earlier_wins() {
        // The display span starts inside the inline span and is dropped.
        let segments = segment(r"\(a \[b\) c\]");
        assert_eq!(kinds(&segments), vec![(r"a \[b", Some(false)), (r" c\]", None)]);
    }

    #[test]
    fn test_toc_label_short_math() {
        assert_eq!(toc_label(r"\(x\)"), "Math: x");
        assert_eq!(toc_label(r"  \[a+b\]  "), "Math: a+b");
    }

    #[test]
    fn test_toc_label_long_math() {
        assert_eq!(
            toc_label(r"\(\int_0^1 x^2 \, dx = \frac{1}{3}\)"),
            "Mathematical expression"
        );
    }

    #[test]
    fn test_toc_label_mixed_content() {
        assert_eq!(toc_label(r"Solve \(x^2 = 4\) for <b>x</b>"), "Solve [math] for x");
        assert_eq!(toc_label("Line one<br>line&nbsp;two</p>end"), "Line one line two end");
    }

    #[test]
    fn test_toc_label_keeps_comparisons() {
        assert_eq!(toc_label("x < 3 and y > 2"), "x < 3 and y > 2");
        assert_eq!(toc_label("<i>a</i> < b &gt; c"), "a < b > c");
    }

    #[test]
    fn test_toc_label_math_across_lines_collapses() {
        assert_eq!(toc_label("see \\[a\n+b\\] here"), "see [math] here");
    }

    #[test]
    fn test_toc_label_truncates_long_text() {
        let label = toc_label("The mitochondria is the powerhouse of the cell, they say");
        assert_eq!(label.chars().count(), 40);
        assert!(label.ends_with("..."));
        assert_eq!(label, "The mitochondria is the powerhouse of...");
    }

    #[test]
    fn test_toc_label_exactly_forty_kept() {
        let text = "a".repeat(40);
        assert_eq!(toc_label(&text), text);
    }

    #[test]
    fn test_toc_label_empty() {
        assert_eq!(toc_label(""), "");
    }
}
