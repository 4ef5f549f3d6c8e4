//! # Text Layout
//!
//! Two pieces live here. [`wrap_text_to_width`] is the plain greedy line
//! breaker behind the canvas's `wrap_text_to_width` (TOC labels, formula
//! fallback text). [`TextFlow`] lays formatted runs into the content band one
//! word or whitespace token at a time, tracking an x/y cursor.
//!
//! Break opportunities come from UAX#14 via `unicode-linebreak`.

pub mod markup;

pub use markup::{parse_markup, FormattedRun};

use crate::canvas::{Baseline, Canvas, Color, TextStyle};
use crate::font::{FontContext, FontVariant};
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Default card text size in points.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.3;
/// Vertical gap added after every text block.
pub const BLOCK_SPACING: f64 = 5.0;

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Each entry is the break opportunity *before* that character position.
/// Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields the byte offset of the start of the next segment.
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
            map[byte_idx] = char_idx;
        }
        map[text.len()] = char_count;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn make_line(chars: &[char]) -> String {
    let line: String = chars.iter().collect();
    line.trim_end().to_string()
}

/// Greedy line breaking: split `text` into lines no wider than `max_width`.
///
/// Mandatory breaks always end a line. A word that is wider than `max_width`
/// on its own is broken between characters. Trailing whitespace is trimmed
/// from every line. Empty input yields one empty line.
pub fn wrap_text_to_width(
    fonts: &FontContext,
    text: &str,
    max_width: f64,
    variant: FontVariant,
    font_size: f64,
) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars
        .iter()
        .map(|&ch| fonts.char_width(ch, variant, font_size))
        .collect();
    let break_opps = compute_break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break_point: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match break_opps[i] {
                Some(BreakOpportunity::Mandatory) => {
                    let end = if is_newline(chars[i - 1]) { i - 1 } else { i };
                    lines.push(make_line(&chars[line_start..end]));
                    line_start = i;
                    line_width = 0.0;
                    last_break_point = None;
                }
                Some(BreakOpportunity::Allowed) => {
                    // The break is after char[i - 1]
                    last_break_point = Some(i - 1);
                }
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }

        if line_width + widths[i] > max_width && line_start < i {
            if let Some(bp) = last_break_point.filter(|&bp| bp >= line_start) {
                lines.push(make_line(&chars[line_start..=bp]));
                line_start = bp + 1;
                line_width = widths[line_start..=i].iter().sum();
                last_break_point = None;
                continue;
            }

            // No break point on this line: force a break at the current char
            lines.push(make_line(&chars[line_start..i]));
            line_start = i;
            line_width = widths[i];
            last_break_point = None;
            continue;
        }

        line_width += widths[i];
    }

    if line_start < chars.len() {
        lines.push(make_line(&chars[line_start..]));
    }

    lines
}

/// Split run text into word, whitespace and newline tokens. Every newline is
/// its own token; other whitespace is kept as one token per stretch.
fn tokenize(text: &str) -> Vec<&str> {
    #[derive(PartialEq)]
    enum Class {
        Newline,
        Space,
        Word,
    }
    fn class_of(ch: char) -> Class {
        if ch == '\n' {
            Class::Newline
        } else if ch.is_whitespace() {
            Class::Space
        } else {
            Class::Word
        }
    }

    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;
    for (idx, ch) in text.char_indices() {
        let class = class_of(ch);
        let continues = match &current {
            Some(prev) => *prev == class && class != Class::Newline,
            None => true,
        };
        if !continues {
            tokens.push(&text[start..idx]);
            start = idx;
        }
        current = Some(class);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Flows formatted runs into a fixed-width column.
///
/// Each token is drawn with a top baseline at the cursor. A token that would
/// cross the right edge starts a new line, even when the line is still empty;
/// whitespace that would open a new line is not drawn. Content running past
/// `bottom` is logged and left as is.
#[derive(Debug, Clone, Copy)]
pub struct TextFlow {
    pub x: f64,
    pub width: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub block_spacing: f64,
    pub color: Color,
    pub bottom: f64,
}

impl TextFlow {
    pub fn new(x: f64, width: f64) -> Self {
        TextFlow {
            x,
            width,
            font_size: DEFAULT_FONT_SIZE,
            line_height: DEFAULT_FONT_SIZE * LINE_HEIGHT_FACTOR,
            block_spacing: BLOCK_SPACING,
            color: Color::BLACK,
            bottom: f64::INFINITY,
        }
    }

    /// Warn when the cursor passes this y coordinate.
    pub fn with_bottom(mut self, bottom: f64) -> Self {
        self.bottom = bottom;
        self
    }

    /// Parse `html` and flow the resulting runs. See [`TextFlow::flow`].
    pub fn flow_markup(&self, canvas: &mut Canvas, html: &str, y: f64) -> f64 {
        self.flow(canvas, &parse_markup(html), y)
    }

    /// Draw `runs` starting at `y` and return the cursor below the block.
    pub fn flow(&self, canvas: &mut Canvas, runs: &[FormattedRun], y: f64) -> f64 {
        let right_edge = self.x + self.width;
        let mut current_x = self.x;
        let mut current_y = y;

        for run in runs {
            let style = TextStyle::new(FontVariant::from_flags(run.bold, run.italic), self.font_size)
                .color(self.color)
                .baseline(Baseline::Top);

            for token in tokenize(&run.text) {
                if token == "\n" {
                    current_y += self.line_height;
                    current_x = self.x;
                    continue;
                }

                let token_width = canvas.measure_text_width(token, style.font, style.size);
                if current_x + token_width > right_edge {
                    current_y += self.line_height;
                    current_x = self.x;
                    if token.trim().is_empty() {
                        continue;
                    }
                }

                canvas.draw_text(token, current_x, current_y, &style);
                current_x += token_width;
            }
        }

        let line_tail = if current_x > self.x { self.line_height } else { 0.0 };
        let end_y = current_y + line_tail + self.block_spacing;
        if end_y > self.bottom {
            log::warn!(
                "Text overflows the content area by {:.1}pt on page {}",
                end_y - self.bottom,
                canvas.active_page()
            );
        }
        end_y
    }
}
