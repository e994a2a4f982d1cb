//! Per-call script and argument set

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// One unit of work: an optional script plus its arguments.
///
/// Values are converted to text when added; `None` values passed through
/// [`Invocation::arg_opt`] are skipped. An invocation is immutable once handed
/// to the runner, so argument sets are never shared between calls.
///
/// # Example
///
/// ```rust
/// use pyrunner::Invocation;
///
/// let invocation = Invocation::new("render.py")
///     .arg(42)
///     .arg("Second \"quoted\" example")
///     .arg_opt(None::<&str>);
///
/// assert_eq!(invocation.arguments(), ["42", "Second \"quoted\" example"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    script: Option<PathBuf>,
    arguments: Vec<String>,
}

impl Invocation {
    /// Invocation of `script`.
    #[must_use]
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: Some(script.into()),
            arguments: Vec::new(),
        }
    }

    /// Invocation of the bare interpreter, with no script.
    #[must_use]
    pub fn bare() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arg(mut self, value: impl Display) -> Self {
        self.arguments.push(value.to_string());
        self
    }

    /// Add `value` if present; `None` is skipped.
    #[must_use]
    pub fn arg_opt<T: Display>(self, value: Option<T>) -> Self {
        match value {
            Some(v) => self.arg(v),
            None => self,
        }
    }

    #[must_use]
    pub fn args<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        self.arguments
            .extend(values.into_iter().map(|v| v.to_string()));
        self
    }

    #[must_use]
    pub fn script(&self) -> Option<&Path> {
        self.script.as_deref()
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}
