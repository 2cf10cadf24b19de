use crate::section::{HeadingLevel, Section};

const FENCE: &str = "```";

/// How a single trimmed line is treated by the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Heading(HeadingLevel),
    Bullet,
    Fence,
    Quote,
    Text,
}

/// Classify a trimmed line. Checks run in precedence order; first match wins.
fn classify(trimmed: &str) -> LineKind {
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with("##") {
        LineKind::Heading(HeadingLevel::Two)
    } else if trimmed.starts_with('#') {
        LineKind::Heading(HeadingLevel::One)
    } else if is_bullet(trimmed) {
        LineKind::Bullet
    } else if trimmed.starts_with(FENCE) {
        LineKind::Fence
    } else if trimmed.starts_with('>') {
        LineKind::Quote
    } else {
        LineKind::Text
    }
}

fn is_bullet(trimmed: &str) -> bool {
    trimmed.starts_with('-') || (trimmed.starts_with('*') && !opens_bold(trimmed))
}

/// `**` directly followed by text opens bold, e.g. `**Note** ...`.
/// A bare `**` or a `***` rule does not.
fn opens_bold(trimmed: &str) -> bool {
    trimmed
        .strip_prefix("**")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c != '*' && !c.is_whitespace())
}

/// Trim whitespace and byte order marks from both ends.
fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Remove emphasis and inline code markers, then trim.
pub fn clean(text: &str) -> String {
    let stripped = text
        .replace("**", "")
        .replace('*', "")
        .replace('_', "")
        .replace('`', "");
    trim_line(&stripped).to_string()
}

/// Convert a model answer into an ordered list of sections.
///
/// Never fails: anything that is not a recognized construct ends up in a
/// paragraph.
pub fn format(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut sections = Vec::new();
    let mut pending = String::new();
    let mut cursor = 0;

    while cursor < lines.len() {
        let trimmed = trim_line(lines[cursor]);

        match classify(trimmed) {
            LineKind::Blank => {
                flush_paragraph(&mut pending, &mut sections);
                cursor += 1;
            }
            LineKind::Heading(level) => {
                flush_paragraph(&mut pending, &mut sections);
                let text = clean(trimmed.trim_start_matches('#'));
                sections.push(Section::Heading { level, text });
                cursor += 1;
            }
            LineKind::Bullet => {
                flush_paragraph(&mut pending, &mut sections);
                let (items, next) = take_bullets(&lines, cursor);
                if !items.is_empty() {
                    sections.push(Section::List { items });
                }
                cursor = next;
            }
            LineKind::Fence => {
                flush_paragraph(&mut pending, &mut sections);
                let (text, next) = take_code(&lines, cursor + 1);
                sections.push(Section::Code { text });
                cursor = next;
            }
            LineKind::Quote => {
                flush_paragraph(&mut pending, &mut sections);
                let text = clean(&trimmed[1..]);
                sections.push(Section::Note { text });
                cursor += 1;
            }
            LineKind::Text => {
                if !pending.is_empty() {
                    pending.push(' ');
                }
                pending.push_str(trimmed);
                cursor += 1;
            }
        }
    }

    flush_paragraph(&mut pending, &mut sections);
    sections
}

fn flush_paragraph(pending: &mut String, sections: &mut Vec<Section>) {
    if !trim_line(pending).is_empty() {
        sections.push(Section::Paragraph {
            text: clean(pending),
        });
    }
    pending.clear();
}

/// Collect consecutive bullet lines starting at `start`.
///
/// Returns the cleaned items and the index of the first line not consumed.
fn take_bullets(lines: &[&str], start: usize) -> (Vec<String>, usize) {
    let mut items = Vec::new();
    let mut cursor = start;

    while let Some(line) = lines.get(cursor) {
        let trimmed = trim_line(line);
        if !is_bullet(trimmed) {
            break;
        }
        // Both markers are one byte wide.
        items.push(clean(&trimmed[1..]));
        cursor += 1;
    }

    (items, cursor)
}

/// Collect raw lines from `start` up to the closing fence or end of input.
///
/// Returns the joined code and the index just past the closing fence.
fn take_code(lines: &[&str], start: usize) -> (String, usize) {
    let start = start.min(lines.len());
    let end = lines[start..]
        .iter()
        .position(|line| trim_line(line).starts_with(FENCE))
        .map_or(lines.len(), |offset| start + offset);

    let code = lines[start..end].join("\n");
    let next = if end < lines.len() { end + 1 } else { end };
    (code, next)
}
