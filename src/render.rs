use crate::conversation::{Message, Role};
use crate::formatter;
use crate::section::{HeadingLevel, Section};

/// Render sections as plain terminal text, one block per section separated
/// by blank lines.
pub fn render_sections(sections: &[Section]) -> String {
    let blocks: Vec<String> = sections.iter().map(render_section).collect();
    blocks.join("\n\n")
}

fn render_section(section: &Section) -> String {
    match section {
        Section::Heading { level, text } => {
            let rule = match level {
                HeadingLevel::One => '=',
                HeadingLevel::Two => '-',
            };
            let width = text.chars().count().max(3);
            format!("{text}\n{}", rule.to_string().repeat(width))
        }
        Section::Paragraph { text } => text.clone(),
        Section::List { items } => items
            .iter()
            .map(|item| format!("• {item}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Section::Code { text } => text
            .split('\n')
            .map(|line| format!("    {line}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Section::Note { text } => format!("│ {text}"),
    }
}

/// Render a transcript entry with its speaker label. User text is shown as
/// typed; assistant text is formatted first.
pub fn render_message(message: &Message) -> String {
    let body = match message.role {
        Role::User => message.content.clone(),
        Role::Assistant => render_sections(&formatter::format(&message.content)),
    };
    format!("{}\n{}", message.role.label(), body)
}
