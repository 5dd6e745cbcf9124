//! Log sanitization utilities for PII filtering.
//!
//! String-based sanitization applied to every formatted log line:
//! - Malaysian IC numbers (`YYMMDD-PB-NNNN`, with or without dashes)
//! - Labelled patient names (`name: ...`, `patient=...`)
//! - E-mail addresses and phone numbers
//!
//! # Important: prefer redaction-by-type
//!
//! Sanitizing strings is a fallback. `PatientIdentity` already redacts
//! itself in `Debug`; the patterns here catch values that reach a log
//! message through other paths.
//!
//! # Performance
//!
//! `sanitize()` caps its input size (see `CARDIALYZE_SANITIZE_MAX_BYTES`).

use std::io::{self, Write};
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

/// Compiled patterns for PII detection and sanitization.
static PII_PATTERNS: OnceLock<PiiPatterns> = OnceLock::new();

/// Maximum number of bytes to sanitize per call.
///
/// Defaults to 16 KiB; can be overridden via `CARDIALYZE_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

/// A compiled PII pattern with its replacement text.
struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PiiPatterns {
    set: RegexSet,
    patterns: Vec<PiiPattern>,
}

/// Longest prefix of at most `max_bytes` that ends on a char boundary.
fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let end = (0..=max_bytes)
        .rev()
        .find(|&i| input.is_char_boundary(i))
        .unwrap_or(0);
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CARDIALYZE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

/// Initialize PII patterns (called once on first use).
fn get_patterns() -> &'static PiiPatterns {
    PII_PATTERNS.get_or_init(|| {
        // Applied in order; the name rule keeps its label.
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Labelled names, up to the next separator
            (
                r"(?i)\b(name|patient)\s*[:=]\s*[^,;\n\]\}]{1,64}",
                "$1=[REDACTED-NAME]",
            ),
            // IC numbers (YYMMDD-PB-NNNN)
            (r"\b\d{6}-\d{2}-\d{4}\b", "[REDACTED-IC]"),
            (r"\b\d{12}\b", "[REDACTED-IC]"),
            // Email patterns (bounded labels; case-insensitive)
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            // Malaysian mobile and landline numbers
            (
                r"(?:\+?60|\b0)1\d[-\s]?\d{3,4}[-\s]?\d{4}\b",
                "[REDACTED-PHONE]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| PiiPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        PiiPatterns { set, patterns }
    })
}

/// Replace every PII match in `input`, after capping its length.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();

    let (head, truncated) = truncate_to_char_boundary(input, max_bytes);

    let hits = patterns.set.matches(head);
    let mut out = hits.iter().fold(head.to_string(), |text, idx| {
        let rule = &patterns.patterns[idx];
        rule.regex.replace_all(&text, rule.replacement).into_owned()
    });

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Check if a string contains potential PII.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _truncated) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().set.is_match(prefix)
}

/// `MakeWriter` wrapper that runs every complete log line through
/// [`sanitize`] before it reaches the sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: Write> {
    sink: W,
    pending: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn new(sink: W) -> Self {
        Self {
            sink,
            pending: Vec::new(),
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.sink.write_all(sanitize(&text).as_bytes())
    }

    /// Emit every newline-terminated line held in `pending`.
    fn drain_lines(&mut self) -> io::Result<()> {
        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Ok(());
        };
        let ready: Vec<u8> = self.pending.drain(..=last_newline).collect();
        for line in ready.split_inclusive(|&b| b == b'\n') {
            self.emit(line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_lines()?;

        // A single line with no newline must not grow without bound.
        if self.pending.len() > max_sanitize_bytes().saturating_mul(2) {
            let overflow = std::mem::take(&mut self.pending);
            self.emit(&overflow)?;
            self.sink.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.sink.flush()
    }
}
