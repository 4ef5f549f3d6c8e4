//! # Inline Markup
//!
//! Flattens the small tag vocabulary allowed in card text into a sequence of
//! [`FormattedRun`]s. `<b>`/`<strong>` set bold, `<i>`/`<em>` set italic and
//! `<br>` becomes a literal newline run. Any other tag is dropped while its
//! contents are kept. A closing tag with no matching opener is ignored.
//!
//! A tag opens only at `<` followed by an ASCII letter, or by `/` and a
//! letter. Every other `<` is text, so `a < b and c > d` survives intact.
//!
//! Entities are decoded per text run after tags are split off, so `&lt;b&gt;`
//! renders as the literal text `<b>`.

use std::ops::Range;

/// A span of text sharing one bold/italic combination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl FormattedRun {
    pub fn new(text: impl Into<String>, bold: bool, italic: bool) -> Self {
        FormattedRun {
            text: text.into(),
            bold,
            italic,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, false, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    Bold,
    Italic,
}

enum Tag {
    Open(Emphasis),
    Close(Emphasis),
    LineBreak,
    Other,
}

/// Parse simple inline markup into formatted runs.
///
/// Always returns at least one run; empty input yields a single empty run.
pub fn parse_markup(html: &str) -> Vec<FormattedRun> {
    let mut parser = RunBuilder::default();
    let mut rest = html;

    while let Some(tag) = find_tag(rest) {
        parser.text(&rest[..tag.start]);
        match classify_tag(&rest[tag.start + 1..tag.end - 1]) {
            Tag::Open(kind) => {
                parser.flush();
                parser.stack.push(kind);
            }
            Tag::Close(kind) => {
                if let Some(pos) = parser.stack.iter().rposition(|k| *k == kind) {
                    parser.flush();
                    parser.stack.remove(pos);
                }
            }
            Tag::LineBreak => {
                parser.flush();
                parser.pending.push('\n');
                parser.flush();
            }
            Tag::Other => {}
        }
        rest = &rest[tag.end..];
    }
    parser.text(rest);
    parser.finish()
}

/// Byte range of the next tag in `text`, from its `<` through its `>`.
///
/// `None` when no tag opener is left, or the next opener is never closed.
pub(crate) fn find_tag(text: &str) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(rel) = text[from..].find('<') {
        let lt = from + rel;
        let name_at = if bytes.get(lt + 1) == Some(&b'/') { lt + 2 } else { lt + 1 };
        if bytes.get(name_at).is_some_and(u8::is_ascii_alphabetic) {
            return text[name_at..].find('>').map(|gt| lt..name_at + gt + 1);
        }
        from = lt + 1;
    }
    None
}

fn classify_tag(inner: &str) -> Tag {
    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, inner),
    };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    let emphasis = match name.as_str() {
        "b" | "strong" => Some(Emphasis::Bold),
        "i" | "em" => Some(Emphasis::Italic),
        "br" => return if closing { Tag::Other } else { Tag::LineBreak },
        _ => None,
    };
    match (emphasis, closing) {
        (Some(kind), false) => Tag::Open(kind),
        (Some(kind), true) => Tag::Close(kind),
        (None, _) => Tag::Other,
    }
}

#[derive(Default)]
struct RunBuilder {
    runs: Vec<FormattedRun>,
    stack: Vec<Emphasis>,
    /// Raw text for the current flags, entities not yet decoded.
    pending: String,
}

impl RunBuilder {
    fn text(&mut self, raw: &str) {
        self.pending.push_str(raw);
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.pending);
        self.runs.push(FormattedRun {
            text: decode_entities(&raw),
            bold: self.stack.contains(&Emphasis::Bold),
            italic: self.stack.contains(&Emphasis::Italic),
        });
    }

    fn finish(mut self) -> Vec<FormattedRun> {
        self.flush();
        if self.runs.is_empty() {
            self.runs.push(FormattedRun::default());
        }
        self.runs
    }
}

/// Decode the named entities card text commonly carries plus numeric
/// references. Unknown or malformed entities are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail[1..].find(';').filter(|&semi| semi <= 10) {
            Some(semi) => match decode_entity(&tail[1..semi + 1]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &tail[semi + 2..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_single_run() {
        assert_eq!(parse_markup("hello world"), vec![FormattedRun::plain("hello world")]);
    }

    #[test]
    fn test_empty_input_yields_one_empty_run() {
        assert_eq!(parse_markup(""), vec![FormattedRun::default()]);
        assert_eq!(parse_markup("<b></b>"), vec![FormattedRun::default()]);
    }

    #[test]
    fn test_bold_and_italic_runs() {
        let runs = parse_markup("a <b>bold</b> and <em>slanted</em>");
        assert_eq!(
            runs,
            vec![
                FormattedRun::plain("a "),
                FormattedRun::new("bold", true, false),
                FormattedRun::plain(" and "),
                FormattedRun::new("slanted", false, true),
            ]
        );
    }

    #[test]
    fn test_nesting_collapses_flags() {
        let runs = parse_markup("<strong>x <i>y</i></strong>");
        assert_eq!(
            runs,
            vec![FormattedRun::new("x ", true, false), FormattedRun::new("y", true, true)]
        );
    }

    #[test]
    fn test_line_break_becomes_newline_run() {
        let runs = parse_markup("one<br>two<BR/>three");
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "\n", "two", "\n", "three"]);
    }

    #[test]
    fn test_unknown_tags_dropped_contents_kept() {
        let runs = parse_markup("<span class=\"x\">kept</span> <u>too</u>");
        assert_eq!(runs, vec![FormattedRun::plain("kept too")]);
    }

    #[test]
    fn test_stray_closer_ignored() {
        let runs = parse_markup("plain</b> text");
        assert_eq!(runs, vec![FormattedRun::plain("plain text")]);
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        let runs = parse_markup("a < b");
        assert_eq!(runs, vec![FormattedRun::plain("a < b")]);
    }

    #[test]
    fn test_comparisons_are_text() {
        assert_eq!(
            parse_markup("if a < b and c > d then"),
            vec![FormattedRun::plain("if a < b and c > d then")]
        );
        assert_eq!(
            parse_markup("x < 3, y > 2 <b>so</b> 1 <2"),
            vec![
                FormattedRun::plain("x < 3, y > 2 "),
                FormattedRun::new("so", true, false),
                FormattedRun::plain(" 1 <2"),
            ]
        );
    }

    #[test]
    fn test_find_tag() {
        assert_eq!(find_tag("a < b > c"), None);
        assert_eq!(find_tag("a </ b>"), None);
        assert_eq!(find_tag("<3 <i>x"), Some(3..6));
        assert_eq!(find_tag("x</em>"), Some(1..6));
        assert_eq!(find_tag("<b unterminated"), None);
    }

    #[test]
    fn test_entities_decoded_after_tags() {
        let runs = parse_markup("&lt;b&gt; &amp; <b>&quot;x&quot;</b>");
        assert_eq!(
            runs,
            vec![FormattedRun::plain("<b> & "), FormattedRun::new("\"x\"", true, false)]
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("caf&#233; &#x41;&nbsp;"), "caf\u{e9} A\u{a0}");
        assert_eq!(decode_entities("AT&T &bogus; &"), "AT&T &bogus; &");
        assert_eq!(decode_entities("&apos;q&apos;"), "'q'");
    }
}
