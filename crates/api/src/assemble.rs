//! Combines uploaded files and free text into the single string handed to the generator.

use crate::extract::{self, Extract, Format};
use base64::{engine::general_purpose::STANDARD, Engine};
use core::fmt::{self, Display};
use serde::Deserialize;

/// One uploaded file as sent by the browser.
#[derive(Debug, Deserialize)]
pub struct Upload {
    pub name: Box<str>,
    /// Standard base64 of the raw file contents.
    pub data: Box<str>,
}

#[derive(Debug)]
pub struct Failure {
    pub name: Box<str>,
    pub error: extract::Error,
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { name, error } = self;
        write!(f, "{name}: {error}")
    }
}

#[derive(Debug, Default)]
pub struct Assembled {
    pub content: String,
    pub failures: Vec<Failure>,
}

fn extract_one(extractor: &dyn Extract, upload: &Upload) -> extract::Result<String> {
    let bytes = STANDARD.decode(upload.data.trim()).map_err(|_| extract::Error::Upload)?;
    extractor.extract(Format::from_name(&upload.name), &bytes)
}

/// Extracted files come first, each followed by a blank line, then the free text. A file that fails to
/// extract is skipped and reported in [`Assembled::failures`].
pub fn assemble(extractor: &dyn Extract, uploads: &[Upload], text: &str) -> Assembled {
    let mut content = String::new();
    let mut failures = Vec::new();

    for upload in uploads {
        match extract_one(extractor, upload) {
            Ok(extracted) => {
                content.push_str(&extracted);
                content.push_str("\n\n");
            }
            Err(error) => {
                log::warn!("Skipping {}: {error}", upload.name);
                failures.push(Failure { name: upload.name.clone(), error });
            }
        }
    }

    content.push_str(text);
    let trimmed = content.trim();
    if trimmed.len() != content.len() {
        content = trimmed.to_owned();
    }

    Assembled { content, failures }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes text uploads and refuses everything else.
    struct Fake;

    impl Extract for Fake {
        fn extract(&self, format: Format, bytes: &[u8]) -> extract::Result<String> {
            match format {
                Format::Text => Ok(extract::decode_text(bytes)),
                Format::Pdf => Err(extract::Error::ToolFailed(Some(1))),
                Format::Docx => Err(extract::Error::Archive),
            }
        }
    }

    fn upload(name: &str, contents: &[u8]) -> Upload {
        Upload { name: name.into(), data: STANDARD.encode(contents).into() }
    }

    #[test]
    fn empty_inputs_produce_empty_content() {
        let assembled = assemble(&Fake, &[], "   \n");
        assert_eq!(assembled.content, "");
        assert!(assembled.failures.is_empty());
    }

    #[test]
    fn files_come_before_free_text() {
        let uploads = [upload("a.txt", b"First file."), upload("b.md", b"Second file.")];
        let assembled = assemble(&Fake, &uploads, "Typed notes.");
        assert_eq!(assembled.content, "First file.\n\nSecond file.\n\nTyped notes.");
    }

    #[test]
    fn trailing_separator_is_trimmed() {
        let assembled = assemble(&Fake, &[upload("a.txt", b"Only file.")], "");
        assert_eq!(assembled.content, "Only file.");
    }

    #[test]
    fn failures_are_reported_and_skipped() {
        let uploads = [
            upload("scan.pdf", b"%PDF-1.4"),
            Upload { name: "broken.txt".into(), data: "***".into() },
            upload("notes.txt", b"Paris is the capital of France."),
        ];
        let assembled = assemble(&Fake, &uploads, "");
        assert_eq!(assembled.content, "Paris is the capital of France.");
        assert_eq!(assembled.failures.len(), 2);
        assert_eq!(&*assembled.failures[0].name, "scan.pdf");
        assert!(matches!(assembled.failures[1].error, extract::Error::Upload));
        assert_eq!(assembled.failures[0].to_string(), "scan.pdf: pdftotext exited with status 1");
    }
}
