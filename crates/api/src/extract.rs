//! Text extraction from uploaded study materials.

use core::fmt::{self, Display};
use core::time::Duration;
use std::{
    io::{self, Cursor, Read, Write},
    process::{Child, Command, ExitStatus, Stdio},
    time::Instant,
};

/// Largest uncompressed `word/document.xml` that will be scanned.
const MAX_DOCUMENT: u64 = 64 << 20;
/// How long `pdftotext` may run before it is killed.
const PDF_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Docx,
    Text,
}

impl Format {
    /// Picks the format from the file extension. Unknown extensions are read as plain text.
    pub fn from_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((_, ext)) if ext.eq_ignore_ascii_case("pdf") => Self::Pdf,
            Some((_, ext)) if ext.eq_ignore_ascii_case("docx") => Self::Docx,
            _ => Self::Text,
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// The upload itself could not be decoded.
    Upload,
    /// The document is not a readable ZIP container.
    Archive,
    /// The container has no `word/document.xml`.
    MissingDocument,
    /// The document body expands beyond the size we are willing to read.
    TooLarge,
    /// The external converter could not be run.
    Tool(io::Error),
    /// The external converter rejected the file.
    ToolFailed(Option<i32>),
    /// The external converter ran past its deadline and was killed.
    TimedOut,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("the upload could not be decoded"),
            Self::Archive => f.write_str("not a valid DOCX file"),
            Self::MissingDocument => f.write_str("the DOCX file has no document body"),
            Self::TooLarge => f.write_str("the document is too large"),
            Self::Tool(err) => write!(f, "could not run pdftotext ({err})"),
            Self::ToolFailed(Some(code)) => write!(f, "pdftotext exited with status {code}"),
            Self::ToolFailed(None) => f.write_str("pdftotext was terminated"),
            Self::TimedOut => f.write_str("pdftotext took too long"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Turns the bytes of one uploaded file into text.
pub trait Extract {
    fn extract(&self, format: Format, bytes: &[u8]) -> Result<String>;
}

/// Plain text natively, DOCX through its XML body and PDF through poppler's `pdftotext`.
pub struct Extractor;

impl Extract for Extractor {
    fn extract(&self, format: Format, bytes: &[u8]) -> Result<String> {
        match format {
            Format::Text => Ok(decode_text(bytes)),
            Format::Docx => docx_text(bytes, MAX_DOCUMENT),
            Format::Pdf => pdf_text(bytes, PDF_DEADLINE),
        }
    }
}

/// UTF-8 first, Latin-1 otherwise. Latin-1 maps every byte, so this never fails.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match core::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().copied().map(char::from).collect(),
    }
}

fn docx_text(bytes: &[u8], limit: u64) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|_| Error::Archive)?;
    let entry = archive.by_name("word/document.xml").map_err(|_| Error::MissingDocument)?;

    // The declared size cannot be trusted, so cap what is actually inflated.
    let mut xml = Vec::new();
    entry.take(limit + 1).read_to_end(&mut xml).map_err(|_| Error::Archive)?;
    if xml.len() as u64 > limit {
        return Err(Error::TooLarge);
    }

    let xml = String::from_utf8(xml).map_err(|_| Error::Archive)?;
    Ok(document_text(&xml))
}

/// Polls the child until it exits. Past the deadline it is killed and reaped.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait().map_err(Error::Tool)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::TimedOut);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn pdf_text(bytes: &[u8], timeout: Duration) -> Result<String> {
    let mut child = Command::new("pdftotext")
        .args(["-q", "-enc", "UTF-8", "-", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(Error::Tool)?;
    let mut stdin = child.stdin.take().ok_or(Error::ToolFailed(None))?;
    let mut stdout = child.stdout.take().ok_or(Error::ToolFailed(None))?;

    // Both pipes are serviced on their own threads so neither can stall the deadline check.
    let deadline = Instant::now() + timeout;
    let (status, output) = std::thread::scope(|scope| {
        scope.spawn(move || stdin.write_all(bytes));
        let reader = scope.spawn(move || {
            let mut out = Vec::new();
            stdout.read_to_end(&mut out).map(|_| out)
        });
        let status = wait_until(&mut child, deadline);
        (status, reader.join())
    });

    let status = status?;
    if !status.success() {
        return Err(Error::ToolFailed(status.code()));
    }
    let output = output.map_err(|_| Error::ToolFailed(None))?.map_err(Error::Tool)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Collects the text runs of a WordprocessingML body, one line per paragraph.
fn document_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    let mut in_run = false;
    // Tab stops inside paragraph properties share the `w:tab` name with real tabs.
    let mut in_tab_stops = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_run {
            decode_entities(&rest[..open], &mut out);
        }

        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let (closing, body) = match tag.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, tag),
        };
        let name = body.split(|c: char| c.is_whitespace() || c == '/').next().unwrap_or_default();
        match (closing, name) {
            (false, "w:t") => in_run = !body.ends_with('/'),
            (true, "w:t") => in_run = false,
            (true, "w:p") => out.push('\n'),
            (false, "w:tabs") => in_tab_stops = !body.ends_with('/'),
            (true, "w:tabs") => in_tab_stops = false,
            (false, "w:tab") if !in_tab_stops => out.push('\t'),
            (false, "w:br" | "w:cr") => out.push('\n'),
            _ => {}
        }
    }

    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn decode_entities(text: &str, out: &mut String) {
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| Some((decode_entity(&rest[1..semi])?, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
}
