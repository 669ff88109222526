//! Top-level function boundaries for editor navigation.
//!
//! This is not a GLSL parser. Candidate signatures are found with
//! a line-anchored pattern (`<word> <word?> (<args>)`) and then matched, in
//! order, against a walk over the trimmed lines that counts braces. A
//! signature spanning several lines is not detected.
//!
//! The scanner guards itself: if the walk ever faults it switches to
//! [`ScannerState::Disabled`] for the rest of the process and returns empty
//! outlines from then on.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

/// A function definition located in shader source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionBoundary {
    pub return_type: String,
    /// May be empty when the matched line has no name before `(`.
    pub name: String,
    /// Parameter list including the surrounding parentheses.
    pub args: String,
    /// `"()"` for an empty parameter list, `"(...)"` otherwise.
    pub short_args: &'static str,
    /// Trimmed text of the line the signature was found on.
    pub signature_line: String,
    /// Zero-based line of the signature.
    pub start_line: usize,
    /// Zero-based line where the brace scope closes.
    pub end_line: Option<usize>,
}

impl FunctionBoundary {
    /// Compact label such as `vec3 shade(...)`.
    pub fn short_signature(&self) -> String {
        format!("{} {}{}", self.return_type, self.name, self.short_args)
    }

    pub fn contains_line(&self, line: usize) -> bool {
        match self.end_line {
            Some(end) => (self.start_line..=end).contains(&line),
            None => line == self.start_line,
        }
    }
}

/// Returns the boundary enclosing `line`, if any.
pub fn enclosing(boundaries: &[FunctionBoundary], line: usize) -> Option<&FunctionBoundary> {
    boundaries.iter().find(|boundary| boundary.contains_line(line))
}

/// Whether the scanner still produces results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Active,
    Disabled,
}

/// Internal failure of the boundary walk.
#[derive(Debug, Error)]
pub enum ScannerFault {
    #[error("brace counter overflowed on line {line}")]
    BraceOverflow { line: usize },
    #[error("boundary walk panicked: {0}")]
    Panicked(String),
}

/// Boundary scanner with a one-way fail-safe.
#[derive(Debug)]
pub struct OutlineScanner {
    state: Mutex<ScannerState>,
}

static GLOBAL: OutlineScanner = OutlineScanner::new();

/// Scans with the process-wide scanner.
pub fn scan(source: Option<&str>) -> Vec<FunctionBoundary> {
    GLOBAL.scan(source)
}

/// State of the process-wide scanner.
pub fn scanner_state() -> ScannerState {
    GLOBAL.state()
}

impl OutlineScanner {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(ScannerState::Active),
        }
    }

    pub fn state(&self) -> ScannerState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Lists the function boundaries in `source`.
    ///
    /// Absent or empty input and a disabled scanner both yield an empty list.
    pub fn scan(&self, source: Option<&str>) -> Vec<FunctionBoundary> {
        let Some(source) = source.filter(|text| !text.is_empty()) else {
            return Vec::new();
        };
        self.guarded(|| walk(source))
    }

    pub(crate) fn guarded<F>(&self, run: F) -> Vec<FunctionBoundary>
    where
        F: FnOnce() -> Result<Vec<FunctionBoundary>, ScannerFault>,
    {
        if self.state() == ScannerState::Disabled {
            return Vec::new();
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|text| (*text).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ScannerFault::Panicked(message))
        });
        match outcome {
            Ok(boundaries) => boundaries,
            Err(fault) => {
                self.disable(&fault);
                Vec::new()
            }
        }
    }

    fn disable(&self, fault: &ScannerFault) {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard == ScannerState::Active {
            tracing::error!(error = %fault, "function outline disabled for this session");
        }
        *guard = ScannerState::Disabled;
    }
}

impl Default for OutlineScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// A signature candidate found by [`find_candidates`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate<'a> {
    matched: &'a str,
    return_type: &'a str,
    name: &'a str,
    args: &'a str,
}

#[derive(Debug, Default, Clone, Copy)]
struct BraceCount {
    open: u32,
    close: u32,
}

impl BraceCount {
    fn of(line: &str) -> Self {
        line.chars().fold(Self::default(), |mut count, ch| {
            match ch {
                '{' => count.open += 1,
                '}' => count.close += 1,
                _ => {}
            }
            count
        })
    }

    fn accumulate(self, other: Self, line: usize) -> Result<Self, ScannerFault> {
        let overflow = || ScannerFault::BraceOverflow { line };
        Ok(Self {
            open: self.open.checked_add(other.open).ok_or_else(overflow)?,
            close: self.close.checked_add(other.close).ok_or_else(overflow)?,
        })
    }

    fn is_balanced(self) -> bool {
        self.open > 0 && self.open == self.close
    }
}

struct OpenFunction<'a> {
    candidate: Candidate<'a>,
    line: &'a str,
    start_line: usize,
    braces: BraceCount,
}

fn walk(source: &str) -> Result<Vec<FunctionBoundary>, ScannerFault> {
    let candidates = find_candidates(source);
    let mut boundaries = Vec::new();
    let mut next = candidates.iter();
    let Some(mut candidate) = next.next() else {
        return Ok(boundaries);
    };
    let mut open: Option<OpenFunction<'_>> = None;

    for (index, raw) in source.split('\n').enumerate() {
        let line = raw.trim();
        if let Some(mut function) = open.take() {
            function.braces = function.braces.accumulate(BraceCount::of(line), index)?;
            if !function.braces.is_balanced() {
                open = Some(function);
                continue;
            }
            boundaries.push(close(function, index));
            match next.next() {
                Some(following) => candidate = following,
                None => break,
            }
        } else if line.starts_with(candidate.matched) {
            open = Some(OpenFunction {
                candidate: candidate.clone(),
                line,
                start_line: index,
                braces: BraceCount::of(line),
            });
        }
    }

    Ok(boundaries)
}

fn close(function: OpenFunction<'_>, end_line: usize) -> FunctionBoundary {
    let OpenFunction {
        candidate,
        line,
        start_line,
        ..
    } = function;
    FunctionBoundary {
        return_type: candidate.return_type.to_string(),
        name: candidate.name.to_string(),
        args: candidate.args.to_string(),
        short_args: if candidate.args == "()" { "()" } else { "(...)" },
        signature_line: line.to_string(),
        start_line,
        end_line: Some(end_line),
    }
}

/// Collects non-overlapping signature candidates starting at line starts.
fn find_candidates(source: &str) -> Vec<Candidate<'_>> {
    let mut candidates = Vec::new();
    let mut resume = 0;
    let line_starts =
        std::iter::once(0).chain(source.match_indices('\n').map(|(offset, _)| offset + 1));
    for start in line_starts {
        if start < resume || start >= source.len() {
            continue;
        }
        if let Some(candidate) = match_signature(source, start) {
            resume = start + candidate.matched.len();
            candidates.push(candidate);
        }
    }
    candidates
}

fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn skip_while(text: &str, from: usize, predicate: impl Fn(char) -> bool) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, ch)| !predicate(*ch))
        .map_or(text.len(), |(offset, _)| from + offset)
}

/// Matches `<word>+ <space>+ <word>* <space>* ( ... )` at `start`.
///
/// Whitespace may include line breaks; the parameter text runs to the last
/// `)` before the end of the line holding the `(`.
fn match_signature(source: &str, start: usize) -> Option<Candidate<'_>> {
    let type_end = skip_while(source, start, is_word);
    if type_end == start {
        return None;
    }
    let name_start = skip_while(source, type_end, char::is_whitespace);
    if name_start == type_end {
        return None;
    }
    let name_end = skip_while(source, name_start, is_word);
    let paren = skip_while(source, name_end, char::is_whitespace);
    if !source[paren..].starts_with('(') {
        return None;
    }
    let line_end = skip_while(source, paren, |ch| !is_line_break(ch));
    let close = source[paren + 1..line_end].rfind(')')? + paren + 1;
    let end = close + 1;
    Some(Candidate {
        matched: &source[start..end],
        return_type: &source[start..type_end],
        name: &source[name_start..name_end],
        args: &source[paren..end],
    })
}
