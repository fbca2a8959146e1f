use crate::error::{EvaluationError, ShellError};

/// Cut a trace at the first line that names an internal frame.
///
/// Lines are kept in order from the top; the first line containing any of `markers`
/// and everything after it is dropped. A trace without such a line is returned as is.
pub fn sanitize<S: AsRef<str>>(lines: &[S], markers: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .take_while(|line| !markers.iter().any(|marker| line.contains(marker)))
        .map(str::to_string)
        .collect()
}

/// Apply [`sanitize`] to the trace of an evaluation error; other errors pass through.
pub(crate) fn sanitize_error(err: ShellError, markers: &[&str]) -> ShellError {
    match err {
        ShellError::Evaluation(EvaluationError {
            kind,
            message,
            trace,
        }) => ShellError::Evaluation(EvaluationError {
            kind,
            message,
            trace: sanitize(&trace, markers),
        }),
        other => other,
    }
}
