//! Diagnostic rendering for build errors.

use ariadne::{Color, Label, Report, ReportKind, Source};
use tomldoc_parse::{ParseErrorKind, Span};

use crate::BuildError;

impl BuildError {
    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range = to_range(self.span());

        match self {
            BuildError::Parse(err) => {
                let report = Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(err.kind.to_string())
                    .with_label(
                        Label::new((filename, range))
                            .with_message(parse_label(&err.kind))
                            .with_color(Color::Red),
                    );
                match parse_help(&err.kind) {
                    Some(help) => report.with_help(help),
                    None => report,
                }
            }

            BuildError::Decode(err) => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message("invalid literal")
                .with_label(
                    Label::new((filename, range))
                        .with_message(&err.message)
                        .with_color(Color::Red),
                ),

            BuildError::TableRedefined { key, previous, .. } => with_previous(
                Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(format!("table `{key}` is defined more than once"))
                    .with_label(
                        Label::new((filename, range))
                            .with_message("redefined here")
                            .with_color(Color::Red),
                    )
                    .with_help("a table header may appear only once; use [[...]] for arrays of tables"),
                filename,
                *previous,
            ),

            BuildError::DuplicateKey { key, previous, .. } => with_previous(
                Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(format!("duplicate key `{key}`"))
                    .with_label(
                        Label::new((filename, range))
                            .with_message("duplicate key")
                            .with_color(Color::Red),
                    )
                    .with_help("each key must appear only once in a table"),
                filename,
                *previous,
            ),

            BuildError::NotATable { key, .. } => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(format!("`{key}` is not a table"))
                .with_label(
                    Label::new((filename, range))
                        .with_message(format!("`{key}` already holds a value"))
                        .with_color(Color::Red),
                ),

            BuildError::KeyCollision { key, .. } => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(format!("`{key}` conflicts with an existing definition"))
                .with_label(
                    Label::new((filename, range))
                        .with_message("conflicting definition")
                        .with_color(Color::Red),
                ),

            BuildError::UnexpectedExpression { kind, .. } => {
                Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(format!("unexpected {kind}"))
                    .with_label(
                        Label::new((filename, range))
                            .with_message("not allowed here")
                            .with_color(Color::Red),
                    )
            }
        }
    }
}

fn to_range(span: Span) -> std::ops::Range<usize> {
    span.start as usize..span.end as usize
}

fn with_previous<'a>(
    report: ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)>,
    filename: &'a str,
    previous: Option<Span>,
) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
    match previous {
        Some(previous) => report.with_label(
            Label::new((filename, to_range(previous)))
                .with_message("first defined here")
                .with_color(Color::Blue),
        ),
        None => report,
    }
}

fn parse_label(kind: &ParseErrorKind) -> String {
    match kind {
        ParseErrorKind::UnexpectedToken { found, .. } => format!("unexpected {found}"),
        ParseErrorKind::UnterminatedString => "string starts here".to_string(),
        ParseErrorKind::InvalidEscape(_) => "invalid escape".to_string(),
        ParseErrorKind::ExpectedKey => "expected a key here".to_string(),
        ParseErrorKind::ExpectedValue => "expected a value here".to_string(),
        ParseErrorKind::NewlineInInlineTable => "inline table continues past the line".to_string(),
        _ => kind.to_string(),
    }
}

fn parse_help(kind: &ParseErrorKind) -> Option<&'static str> {
    match kind {
        ParseErrorKind::InvalidEscape(_) => Some(
            "valid escapes are: \\b, \\t, \\n, \\f, \\r, \\\", \\\\, \\uXXXX, \\UXXXXXXXX",
        ),
        ParseErrorKind::InvalidBareKey => {
            Some("bare keys may only contain A-Z, a-z, 0-9, '_' and '-'; quote other keys")
        }
        ParseErrorKind::NewlineInInlineTable => Some("inline tables must fit on one line"),
        ParseErrorKind::InvalidValue => Some(
            "values are strings, numbers, booleans, date-times, arrays or inline tables",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use facet_testhelpers::test;

    fn render(source: &str) -> String {
        let err = parse(source).unwrap_err();
        let rendered = err.render("test.toml", source);
        String::from_utf8(strip_ansi_escapes::strip(rendered)).unwrap()
    }

    #[test]
    fn test_table_redefined_points_at_both() {
        let out = render("[a]\nx = 1\n[a]\n");
        assert!(out.contains("table `a` is defined more than once"), "{out}");
        assert!(out.contains("redefined here"), "{out}");
        assert!(out.contains("first defined here"), "{out}");
        assert!(out.contains("test.toml"), "{out}");
    }

    #[test]
    fn test_duplicate_key() {
        let out = render("x = 1\nx = 2\n");
        assert!(out.contains("duplicate key `x`"), "{out}");
        assert!(out.contains("first defined here"), "{out}");
    }

    #[test]
    fn test_decode_error() {
        let out = render("n = 1__000\n");
        assert!(out.contains("invalid literal"), "{out}");
        assert!(
            out.contains("number must have at least one digit between underscores"),
            "{out}"
        );
    }

    #[test]
    fn test_parse_error_with_help() {
        let out = render("a = \"\\q\"\n");
        assert!(out.contains("invalid escape sequence"), "{out}");
        assert!(out.contains("valid escapes are"), "{out}");
    }

    #[test]
    fn test_not_a_table() {
        let out = render("a = 1\n[a.b]\n");
        assert!(out.contains("`a` is not a table"), "{out}");
    }
}
