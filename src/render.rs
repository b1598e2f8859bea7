//! Terminal presentation of a [`SubmissionState`].
//!
//! The response slot is written progressively: each update prints only the
//! text appended since the previous one. The error slot and the pending
//! status go to a separate writer (stderr in the binary).

use std::io::{self, Write};

use crate::state::SubmissionState;

/// Status line shown while a submission is pending.
pub const PENDING_LABEL: &str = "Thinking...";

/// Renders state updates to a pair of writers.
#[derive(Debug)]
pub struct TerminalView<O, E> {
    out: O,
    err: E,
    /// Response text already written to `out`.
    printed: String,
    showed_pending: bool,
    showed_error: bool,
}

impl TerminalView<io::Stdout, io::Stderr> {
    /// View over the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalView<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            printed: String::new(),
            showed_pending: false,
            showed_error: false,
        }
    }

    /// Bring the terminal in line with `state`.
    pub fn update(&mut self, state: &SubmissionState) -> io::Result<()> {
        if state.is_pending && !self.showed_pending {
            writeln!(self.err, "{PENDING_LABEL}")?;
            self.err.flush()?;
            self.showed_pending = true;
            self.printed.clear();
            self.showed_error = false;
        }

        let text = state.response_text.as_str();
        if let Some(suffix) = text.strip_prefix(self.printed.as_str()) {
            if !suffix.is_empty() {
                self.out.write_all(suffix.as_bytes())?;
                self.out.flush()?;
                self.printed.push_str(suffix);
            }
        } else {
            // Not an extension of what is on screen: start a fresh block.
            writeln!(self.out)?;
            self.out.write_all(text.as_bytes())?;
            self.out.flush()?;
            self.printed = text.to_string();
        }

        if !state.is_pending {
            if self.showed_pending && !self.printed.is_empty() {
                writeln!(self.out)?;
                self.out.flush()?;
            }
            self.showed_pending = false;
        }

        if let Some(error) = &state.error_text
            && !self.showed_error
        {
            writeln!(self.err, "Error: {error}")?;
            self.err.flush()?;
            self.showed_error = true;
        }

        Ok(())
    }

    /// Consume the view and return its writers.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(text: &str) -> SubmissionState {
        SubmissionState {
            is_pending: true,
            response_text: text.into(),
            ..SubmissionState::default()
        }
    }

    #[test]
    fn prints_only_new_suffixes() {
        let mut view = TerminalView::new(Vec::new(), Vec::new());
        view.update(&pending("")).unwrap();
        view.update(&pending("Hel")).unwrap();
        view.update(&pending("Hello, ")).unwrap();
        view.update(&pending("Hello, world")).unwrap();
        let mut done = pending("Hello, world");
        done.is_pending = false;
        view.update(&done).unwrap();

        let (out, err) = view.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "Hello, world\n");
        assert_eq!(String::from_utf8(err).unwrap(), "Thinking...\n");
    }

    #[test]
    fn error_is_shown_once_after_partial_text() {
        let mut view = TerminalView::new(Vec::new(), Vec::new());
        view.update(&pending("part")).unwrap();
        let mut failed = pending("part");
        failed.is_pending = false;
        failed.error_text = Some("connection reset".into());
        view.update(&failed).unwrap();
        view.update(&failed).unwrap();

        let (out, err) = view.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "part\n");
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Thinking...\nError: connection reset\n"
        );
    }

    #[test]
    fn diverging_text_is_reprinted() {
        let mut view = TerminalView::new(Vec::new(), Vec::new());
        view.update(&pending("abc")).unwrap();
        view.update(&pending("xyz")).unwrap();

        let (out, _) = view.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "abc\nxyz");
    }
}
