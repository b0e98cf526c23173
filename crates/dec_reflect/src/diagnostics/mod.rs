//! Severity-tagged reporting.
//!
//! The engine never decides on its own that a data problem is fatal.
//! Every recoverable condition becomes a [`Diagnostic`] and is handed to a
//! [`Reporter`], which forwards it to one of three host callbacks (info,
//! warning, error).
//!
//! - [`Reporter::strict`] (the default) logs through the `log` crate and
//!   then panics on errors, so configuration mistakes surface early.
//! - [`Reporter::logging`] only logs.
//! - [`Reporter::collecting`] also keeps every diagnostic for inspection.
//!
//! A callback is free to panic. The walker does not catch it and the panic
//! unwinds through the current operation.
//!
//! # Examples
//!
//! ```
//! use dec_reflect::diagnostics::{Category, Location, Reporter};
//!
//! let (reporter, collected) = Reporter::collecting();
//! reporter.error(Category::Shape, &Location::new("items.xml", Some(3)), "duplicate field `hp`");
//!
//! assert_eq!(reporter.error_count(), 1);
//! assert_eq!(collected.errors()[0].to_string(), "items.xml:3: duplicate field `hp`");
//! ```

// -----------------------------------------------------------------------------
// Modules

mod error;

// -----------------------------------------------------------------------------
// Exports

pub use error::{ConvertError, SetupError};

// -----------------------------------------------------------------------------
// Types

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

/// How severe a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Which part of the engine a [`Diagnostic`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Malformed text, wrong or duplicate root, unsupported version.
    Structural,
    /// Unknown or ambiguous type names, bad explicit types, missing
    /// definitions, references to value types.
    Reference,
    /// Duplicate fields or keys, malformed collection tags, unknown fields.
    Shape,
    /// The engine broke one of its own guarantees.
    Integrity,
    /// Setup problems independent of any document.
    Configuration,
}

/// Where a [`Diagnostic`] happened: a source name and an optional line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub source: String,
    pub line: Option<u32>,
}

impl Location {
    /// Creates a location.
    pub fn new(source: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.source, line),
            None => write!(f, "{}:???", self.source),
        }
    }
}

/// A single reported condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {message}")]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub location: Location,
    pub message: String,
}

// -----------------------------------------------------------------------------
// Reporter

/// A host callback receiving diagnostics.
pub type Handler = Rc<dyn Fn(&Diagnostic)>;

/// Forwards diagnostics to the info, warning and error callbacks.
///
/// Counts are kept per severity, so callers can check whether an
/// operation completed cleanly.
pub struct Reporter {
    info: Handler,
    warning: Handler,
    error: Handler,
    warnings: Cell<usize>,
    errors: Cell<usize>,
}

impl Reporter {
    /// Logs every diagnostic and panics on errors.
    pub fn strict() -> Self {
        Self::logging().with_error(|diagnostic| {
            log::error!("{diagnostic}");
            panic!("{diagnostic}");
        })
    }

    /// Logs every diagnostic through the `log` crate.
    pub fn logging() -> Self {
        Self {
            info: Rc::new(|d| log::info!("{d}")),
            warning: Rc::new(|d| log::warn!("{d}")),
            error: Rc::new(|d| log::error!("{d}")),
            warnings: Cell::new(0),
            errors: Cell::new(0),
        }
    }

    /// Logs every diagnostic and keeps a copy in the returned [`Collected`].
    pub fn collecting() -> (Self, Collected) {
        let collected = Collected::default();
        let (a, b, c) = (collected.clone(), collected.clone(), collected.clone());
        let reporter = Self {
            info: Rc::new(move |d| {
                log::info!("{d}");
                a.push(d);
            }),
            warning: Rc::new(move |d| {
                log::warn!("{d}");
                b.push(d);
            }),
            error: Rc::new(move |d| {
                log::error!("{d}");
                c.push(d);
            }),
            warnings: Cell::new(0),
            errors: Cell::new(0),
        };
        (reporter, collected)
    }

    /// Replaces the info callback.
    pub fn with_info(mut self, f: impl Fn(&Diagnostic) + 'static) -> Self {
        self.info = Rc::new(f);
        self
    }

    /// Replaces the warning callback.
    pub fn with_warning(mut self, f: impl Fn(&Diagnostic) + 'static) -> Self {
        self.warning = Rc::new(f);
        self
    }

    /// Replaces the error callback.
    pub fn with_error(mut self, f: impl Fn(&Diagnostic) + 'static) -> Self {
        self.error = Rc::new(f);
        self
    }

    /// Sends a diagnostic to the callback of its severity.
    pub fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => (self.info)(&diagnostic),
            Severity::Warning => {
                self.warnings.set(self.warnings.get() + 1);
                (self.warning)(&diagnostic);
            }
            Severity::Error => {
                self.errors.set(self.errors.get() + 1);
                (self.error)(&diagnostic);
            }
        }
    }

    #[inline]
    fn emit(&self, severity: Severity, category: Category, location: &Location, message: String) {
        self.report(Diagnostic {
            severity,
            category,
            location: location.clone(),
            message,
        });
    }

    /// Reports an informational message.
    pub fn info(&self, category: Category, location: &Location, message: impl Into<String>) {
        self.emit(Severity::Info, category, location, message.into());
    }

    /// Reports a warning.
    pub fn warn(&self, category: Category, location: &Location, message: impl Into<String>) {
        self.emit(Severity::Warning, category, location, message.into());
    }

    /// Reports an error.
    pub fn error(&self, category: Category, location: &Location, message: impl Into<String>) {
        self.emit(Severity::Error, category, location, message.into());
    }

    /// Number of errors reported so far.
    #[inline]
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// Number of warnings reported so far.
    #[inline]
    pub fn warning_count(&self) -> usize {
        self.warnings.get()
    }

    /// Resets the counters, the callbacks are kept.
    pub fn reset_counts(&self) {
        self.errors.set(0);
        self.warnings.set(0);
    }
}

impl Default for Reporter {
    /// See [`Reporter::strict`].
    #[inline]
    fn default() -> Self {
        Self::strict()
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("warnings", &self.warnings.get())
            .field("errors", &self.errors.get())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Collected

/// Diagnostics kept by a [`Reporter::collecting`] reporter.
#[derive(Clone, Default)]
pub struct Collected(Rc<RefCell<Vec<Diagnostic>>>);

impl Collected {
    fn push(&self, diagnostic: &Diagnostic) {
        self.0.borrow_mut().push(diagnostic.clone());
    }

    /// Every diagnostic, in report order.
    pub fn all(&self) -> Vec<Diagnostic> {
        self.0.borrow().clone()
    }

    /// Only the errors.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.of(Severity::Error)
    }

    /// Only the warnings.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.of(Severity::Warning)
    }

    fn of(&self, severity: Severity) -> Vec<Diagnostic> {
        self.0
            .borrow()
            .iter()
            .filter(|d| d.severity == severity)
            .cloned()
            .collect()
    }

    /// Returns `true` if an error message contains `needle`.
    pub fn has_error(&self, needle: &str) -> bool {
        self.0
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error && d.message.contains(needle))
    }

    /// Forgets everything collected so far.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl fmt::Debug for Collected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Category, Location, Reporter, Severity};

    #[test]
    fn counts_by_severity() {
        let (reporter, collected) = Reporter::collecting();
        let at = Location::new("test", None);
        reporter.info(Category::Structural, &at, "one");
        reporter.warn(Category::Shape, &at, "two");
        reporter.error(Category::Reference, &at, "three");

        assert_eq!(reporter.warning_count(), 1);
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(collected.all().len(), 3);
        assert_eq!(collected.errors()[0].category, Category::Reference);
        assert_eq!(collected.warnings()[0].severity, Severity::Warning);
        assert_eq!(collected.errors()[0].to_string(), "test:???: three");
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn strict_panics_on_error() {
        let reporter = Reporter::strict();
        reporter.error(Category::Shape, &Location::default(), "boom");
    }

    #[test]
    fn strict_tolerates_warnings() {
        let reporter = Reporter::strict();
        reporter.warn(Category::Shape, &Location::default(), "careful");
        assert_eq!(reporter.warning_count(), 1);
    }
}
