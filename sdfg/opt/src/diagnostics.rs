use sdfg_utils::Error;

/// Accumulates non-fatal findings across analysis calls.
///
/// Analysis passes take this collector by reference instead of writing to
/// any process-wide sink; loop reports from path expansion land here as
/// warnings while the enclosing traversal continues.
#[derive(Default, Debug)]
pub struct DiagnosticContext {
    errors: Vec<Error>,
    warnings: Vec<Error>,
}

impl DiagnosticContext {
    /// Report an `error`.
    pub fn err(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Report a `warning`.
    pub fn warning(&mut self, warning: Error) {
        self.warnings.push(warning)
    }

    pub fn warning_iter(&self) -> impl Iterator<Item = &Error> {
        self.warnings.iter()
    }

    pub fn errors_iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    /// Number of combinational-loop warnings collected so far.
    pub fn loop_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.is_loop()).count()
    }
}
