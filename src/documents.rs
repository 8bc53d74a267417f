//! Optional brat standoff corpus backing the document-viewer handoff.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const SNIPPET_CONTEXT: usize = 60;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document `{0}` is not in the corpus")]
    NotFound(String),
    #[error("`{0}` is not a valid document id")]
    InvalidId(String),
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}:{line}: {reason}", path.display())]
    Annotation {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub id: String,
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedDocument {
    pub id: String,
    pub text: String,
    spans: Vec<Span>,
    triggers: HashMap<String, String>,
}

impl AnnotatedDocument {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn resolve(&self, ids: &[String]) -> Vec<&Span> {
        ids.iter()
            .filter_map(|id| {
                let span_id = self.triggers.get(id).unwrap_or(id);
                self.spans.iter().find(|span| span.id == *span_id)
            })
            .collect()
    }

    pub fn snippet(&self, span: &Span) -> String {
        let from = span.start.saturating_sub(SNIPPET_CONTEXT);
        let to = span.end + SNIPPET_CONTEXT;
        let body = self
            .text
            .chars()
            .skip(from)
            .take(to.saturating_sub(from))
            .collect::<String>()
            .replace('\n', " ");

        let mut snippet = String::new();
        if from > 0 {
            snippet.push('…');
        }
        snippet.push_str(body.trim());
        if to < self.text.chars().count() {
            snippet.push('…');
        }
        snippet
    }
}

fn parse_offsets(raw: &str) -> Option<(usize, usize)> {
    // discontinuous spans ("0 5;9 12") collapse to their outer bounds
    let mut bounds = raw.split(';').flat_map(str::split_whitespace);
    let start = bounds.next()?.parse().ok()?;
    let end = bounds.last().unwrap_or("").parse().ok()?;
    (start <= end).then_some((start, end))
}

pub fn parse_annotations(
    path: &Path,
    raw: &str,
) -> Result<(Vec<Span>, HashMap<String, String>), DocumentError> {
    let mut spans = Vec::new();
    let mut triggers = HashMap::new();

    for (line_index, line) in raw.lines().enumerate() {
        let invalid = |reason: &str| DocumentError::Annotation {
            path: path.to_path_buf(),
            line: line_index + 1,
            reason: reason.to_owned(),
        };

        let mut fields = line.split('\t');
        let Some(id) = fields.next().filter(|id| !id.is_empty()) else {
            continue;
        };
        let body = fields.next().unwrap_or_default();

        if id.starts_with('T') {
            let (kind, offsets) = body
                .split_once(' ')
                .ok_or_else(|| invalid("text-bound annotation without offsets"))?;
            let (start, end) =
                parse_offsets(offsets).ok_or_else(|| invalid("unreadable span offsets"))?;
            spans.push(Span {
                id: id.to_owned(),
                kind: kind.to_owned(),
                start,
                end,
                text: fields.next().unwrap_or_default().to_owned(),
            });
        } else if id.starts_with('E') {
            let trigger = body
                .split_whitespace()
                .next()
                .and_then(|role| role.split_once(':'))
                .map(|(_, trigger)| trigger)
                .ok_or_else(|| invalid("event without trigger"))?;
            triggers.insert(id.to_owned(), trigger.to_owned());
        }
    }

    Ok((spans, triggers))
}

pub trait DocumentSource {
    fn load(&self, doc: &str) -> Result<AnnotatedDocument, DocumentError>;
}

#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, path: PathBuf, doc: &str) -> Result<String, DocumentError> {
        fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => DocumentError::NotFound(doc.to_owned()),
            _ => DocumentError::Io { path, source },
        })
    }
}

impl DocumentSource for DirectorySource {
    fn load(&self, doc: &str) -> Result<AnnotatedDocument, DocumentError> {
        if doc.is_empty() || doc.contains(['/', '\\']) || doc == ".." {
            return Err(DocumentError::InvalidId(doc.to_owned()));
        }

        let text = self.read(self.root.join(format!("{doc}.txt")), doc)?;
        let ann_path = self.root.join(format!("{doc}.ann"));
        let annotations = match self.read(ann_path.clone(), doc) {
            Ok(raw) => raw,
            Err(DocumentError::NotFound(_)) => String::new(),
            Err(error) => return Err(error),
        };
        let (spans, triggers) = parse_annotations(&ann_path, &annotations)?;

        debug!(doc, spans = spans.len(), "loaded annotated document");
        Ok(AnnotatedDocument {
            id: doc.to_owned(),
            text,
            spans,
            triggers,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Highlight {
    pub id: String,
    pub kind: String,
    pub text: String,
    pub snippet: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerRequest {
    pub doc: String,
    pub highlights: Vec<Highlight>,
}

/// Document-viewer handoff. Without a source every request is a no-op.
#[derive(Default)]
pub struct DocumentViewer {
    source: Option<Box<dyn DocumentSource + Send>>,
}

impl DocumentViewer {
    pub fn new(source: Option<Box<dyn DocumentSource + Send>>) -> Self {
        Self { source }
    }

    pub fn with_directory(root: Option<PathBuf>) -> Self {
        Self::new(root.map(|root| Box::new(DirectorySource::new(root)) as Box<dyn DocumentSource + Send>))
    }

    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    pub fn request(&self, doc: &str, ids: &[String]) -> Option<ViewerRequest> {
        let source = self.source.as_ref()?;
        let document = match source.load(doc) {
            Ok(document) => document,
            Err(error) => {
                warn!(doc, %error, "document handoff skipped");
                return None;
            }
        };

        let highlights = document
            .resolve(ids)
            .into_iter()
            .map(|span| Highlight {
                id: span.id.clone(),
                kind: span.kind.clone(),
                text: span.text.clone(),
                snippet: document.snippet(span),
            })
            .collect();

        Some(ViewerRequest {
            doc: document.id,
            highlights,
        })
    }
}
