//! Rich error reporting using codespan-reporting.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use crate::parser::ParseError;

/// A source file database for codespan-reporting.
pub struct SourceDb {
    files: SimpleFiles<String, String>,
    file_id: usize,
}

impl SourceDb {
    /// Create a new source database with a single file.
    pub fn new(name: String, source: String) -> Self {
        let mut files = SimpleFiles::new();
        let file_id = files.add(name, source);
        Self { files, file_id }
    }

    /// Build the diagnostic for a parse error.
    pub fn parse_diagnostic(&self, err: &ParseError) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(format!("failed to parse Go source: {}", err.message))
            .with_labels(vec![
                Label::primary(self.file_id, err.span()).with_message("error occurs here")
            ])
    }

    /// Report a parse error with source context on stderr.
    pub fn report_parse_error(&self, err: &ParseError, color: ColorChoice) {
        let writer = StandardStream::stderr(color);
        let config = term::Config::default();
        let _ = term::emit(
            &mut writer.lock(),
            &config,
            &self.files,
            &self.parse_diagnostic(err),
        );
    }
}
