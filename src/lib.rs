mod chat;
mod config;
mod conversation;
mod error;
mod formatter;
mod gemini;
mod render;
mod section;
mod typst;

pub use chat::{ChatError, ChatSession, Reply};
pub use config::{API_KEY_ENV_VARS, Config, ModelConfig, OutputFormat, RenderConfig};
pub use conversation::{Conversation, Message, Role};
pub use error::Error;
pub use formatter::{clean, format};
pub use gemini::{AnswerGenerator, GeminiClient, GeminiSettings, GenerateError};
pub use render::{render_message, render_sections};
pub use section::{HeadingLevel, Section, SectionKind};
pub use typst::{conversation_to_typst, sections_to_typst};

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_pdf::PdfOptions;

/// Format an answer and convert it to PDF bytes.
pub fn answer_to_pdf(answer: &str) -> Result<Vec<u8>, Error> {
    sections_to_pdf(&format(answer))
}

/// Convert sections to PDF bytes.
pub fn sections_to_pdf(sections: &[Section]) -> Result<Vec<u8>, Error> {
    typst_to_pdf(sections_to_typst(sections))
}

/// Convert a whole transcript to PDF bytes.
pub fn conversation_to_pdf(conversation: &Conversation) -> Result<Vec<u8>, Error> {
    typst_to_pdf(conversation_to_typst(conversation))
}

fn typst_to_pdf(typst_content: String) -> Result<Vec<u8>, Error> {
    use typst_library::layout::PagedDocument;

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| Error::Typst(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| Error::Pdf(format!("{:?}", e)))
}
