use serde::Serialize;

/// Heading depth. Only two levels are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum HeadingLevel {
    One,
    Two,
}

impl HeadingLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            HeadingLevel::One => 1,
            HeadingLevel::Two => 2,
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.as_u8()
    }
}

/// Discriminant of a [`Section`], as named in the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Heading,
    Paragraph,
    List,
    Code,
    Note,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Heading => "heading",
            SectionKind::Paragraph => "paragraph",
            SectionKind::List => "list",
            SectionKind::Code => "code",
            SectionKind::Note => "note",
        }
    }
}

/// One structured unit of a formatted answer.
///
/// Serializes tagged by `kind`, e.g. `{"kind":"heading","level":1,"text":"Title"}`.
/// Renderers match on this shape, so renaming a variant or field breaks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Section {
    Heading { level: HeadingLevel, text: String },
    Paragraph { text: String },
    /// Flat bullet list. Never empty.
    List { items: Vec<String> },
    /// Verbatim lines between fences, without marker stripping.
    Code { text: String },
    Note { text: String },
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Heading { .. } => SectionKind::Heading,
            Section::Paragraph { .. } => SectionKind::Paragraph,
            Section::List { .. } => SectionKind::List,
            Section::Code { .. } => SectionKind::Code,
            Section::Note { .. } => SectionKind::Note,
        }
    }

    /// Text content; empty for lists.
    pub fn text(&self) -> &str {
        match self {
            Section::Heading { text, .. }
            | Section::Paragraph { text }
            | Section::Code { text }
            | Section::Note { text } => text,
            Section::List { .. } => "",
        }
    }

    /// List items; empty for every other kind.
    pub fn items(&self) -> &[String] {
        match self {
            Section::List { items } => items,
            _ => &[],
        }
    }

    pub fn level(&self) -> Option<HeadingLevel> {
        match self {
            Section::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }
}
