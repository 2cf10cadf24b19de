use crate::conversation::{Conversation, Role};
use crate::formatter;
use crate::section::{HeadingLevel, Section};

const PREAMBLE: &str = "#set par(linebreaks: \"optimized\")\n\n";

/// Convert sections to Typst markup
pub fn sections_to_typst(sections: &[Section]) -> String {
    let mut out = String::from(PREAMBLE);
    emit_sections(sections, &mut out);
    out
}

/// Convert a whole transcript to Typst markup, one labelled entry per message.
pub fn conversation_to_typst(conversation: &Conversation) -> String {
    let mut out = String::from(PREAMBLE);

    for message in conversation.messages() {
        out.push_str("#block(breakable: false)[\n*");
        escape_into(message.role.label(), &mut out);
        out.push_str("* #h(1fr) #text(size: 0.8em)[");
        escape_into(&message.timestamp.format("%Y-%m-%d %H:%M").to_string(), &mut out);
        out.push_str("]\n]\n\n");

        match message.role {
            Role::User => {
                escape_block_into(message.content.trim(), &mut out);
                out.push_str("\n\n");
            }
            Role::Assistant => emit_sections(&formatter::format(&message.content), &mut out),
        }

        out.push_str("#line(length: 100%)\n\n");
    }

    out
}

fn emit_sections(sections: &[Section], out: &mut String) {
    let mut i = 0;
    while i < sections.len() {
        let section = &sections[i];

        match section {
            Section::Heading { .. } => {
                // Keep heading with following content using a block that prevents breaks
                out.push_str("#block(breakable: false)[\n");
                emit_section(section, out);

                if i + 1 < sections.len() {
                    i += 1;
                    emit_section(&sections[i], out);
                }
                out.push_str("]\n\n");
            }
            _ => {
                emit_section(section, out);
            }
        }

        i += 1;
    }
}

fn emit_section(section: &Section, out: &mut String) {
    match section {
        Section::Heading { level, text } => {
            let marker = match level {
                HeadingLevel::One => "=",
                HeadingLevel::Two => "==",
            };
            out.push_str(marker);
            out.push(' ');
            escape_into(text, out);
            out.push_str("\n\n");
        }
        Section::Paragraph { text } => {
            escape_block_into(text, out);
            out.push_str("\n\n");
        }
        Section::List { items } => {
            // Small lists stay on one page
            let wrap = items.len() <= 5;
            if wrap {
                out.push_str("#block(breakable: false)[\n");
            }
            for item in items {
                out.push_str("- ");
                escape_into(item, out);
                out.push('\n');
            }
            if wrap {
                out.push_str("]\n\n");
            } else {
                out.push('\n');
            }
        }
        Section::Code { text } => {
            let fence = raw_fence(text);
            out.push_str("#block(breakable: false)[\n");
            out.push_str(&fence);
            out.push('\n');
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push_str("\n]\n\n");
        }
        Section::Note { text } => {
            out.push_str("#quote(block: true)[");
            escape_block_into(text, out);
            out.push_str("]\n\n");
        }
    }
}

/// A backtick fence longer than any backtick run inside the code.
fn raw_fence(code: &str) -> String {
    let longest = code
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Escape text that starts a line of markup. A leading `1.` would otherwise
/// open a numbered list.
fn escape_block_into(text: &str, out: &mut String) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 && line[digits..].starts_with('.') {
            out.push_str(&line[..digits]);
            out.push_str("\\.");
            escape_into(&line[digits + 1..], out);
        } else {
            escape_into(line, out);
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '=' | '-' | '+'
            | '/' | '~' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_typst(text: &str) -> String {
        sections_to_typst(&formatter::format(text))
    }

    #[test]
    fn heading() {
        assert_eq!(
            to_typst("# Hello"),
            format!("{PREAMBLE}#block(breakable: false)[\n= Hello\n\n]\n\n")
        );
    }

    #[test]
    fn heading_with_following_content() {
        let result = to_typst("## Title\n\nSome text.");
        assert!(result.contains("#block(breakable: false)[\n== Title\n\nSome text.\n\n]\n\n"));
    }

    #[test]
    fn paragraph() {
        assert_eq!(to_typst("Hello world"), format!("{PREAMBLE}Hello world\n\n"));
    }

    #[test]
    fn code_block() {
        assert_eq!(
            to_typst("```rust\nlet x = 1;\n```"),
            format!("{PREAMBLE}#block(breakable: false)[\n```\nlet x = 1;\n```\n]\n\n")
        );
    }

    #[test]
    fn code_with_backticks_gets_longer_fence() {
        assert_eq!(raw_fence("a ``` b"), "````");
        assert_eq!(raw_fence("plain"), "```");
    }

    #[test]
    fn short_list_is_kept_together() {
        assert_eq!(
            to_typst("- one\n- two"),
            format!("{PREAMBLE}#block(breakable: false)[\n- one\n- two\n]\n\n")
        );
    }

    #[test]
    fn long_list_may_break() {
        let result = to_typst("- 1\n- 2\n- 3\n- 4\n- 5\n- 6");
        assert_eq!(result, format!("{PREAMBLE}- 1\n- 2\n- 3\n- 4\n- 5\n- 6\n\n"));
    }

    #[test]
    fn note() {
        assert_eq!(
            to_typst("> mind the gap"),
            format!("{PREAMBLE}#quote(block: true)[mind the gap]\n\n")
        );
    }

    #[test]
    fn escapes_special_chars() {
        assert_eq!(to_typst("a # b"), format!("{PREAMBLE}a \\# b\n\n"));
        assert_eq!(to_typst("x <y> @z $5"), format!("{PREAMBLE}x \\<y\\> \\@z \\$5\n\n"));
        assert_eq!(to_typst("a = b"), format!("{PREAMBLE}a \\= b\n\n"));
    }

    #[test]
    fn leading_number_does_not_start_a_list() {
        assert_eq!(
            to_typst("1. first step"),
            format!("{PREAMBLE}1\\. first step\n\n")
        );
        assert_eq!(
            to_typst("> 12. careful"),
            format!("{PREAMBLE}#quote(block: true)[12\\. careful]\n\n")
        );
        assert_eq!(to_typst("Version 1.2"), format!("{PREAMBLE}Version 1.2\n\n"));
    }

    #[test]
    fn every_user_line_is_escaped() {
        let mut out = String::new();
        escape_block_into("Steps:\n1. one\n2. two", &mut out);
        assert_eq!(out, "Steps:\n1\\. one\n2\\. two");
    }

    #[test]
    fn transcript_labels_each_message() {
        let mut conversation = Conversation::new();
        conversation.push_user("What is *this*?");
        conversation.push_assistant("## Answer\nIt is **that**.");

        let result = conversation_to_typst(&conversation);
        assert!(result.starts_with(PREAMBLE));
        assert!(result.contains("*You*"));
        assert!(result.contains("What is \\*this\\*?\n\n"));
        assert!(result.contains("*AI Assistant*"));
        assert!(result.contains("#block(breakable: false)[\n== Answer\n\nIt is that.\n\n]\n\n"));
        assert_eq!(result.matches("#line(length: 100%)").count(), 2);
    }
}
