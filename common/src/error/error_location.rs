use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location as PanicLocation;

/// Source position captured where an error was raised.
///
/// Build it from `Location::caller()` inside a `#[track_caller]` function to
/// record the caller's position instead of the constructor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl ErrorLocation {
    pub const fn from(location: &'static PanicLocation<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl Display for ErrorLocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "[{}:{}:{}]", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorLocation;

    /// **VALUE**: Verifies the Display format used in every error message.
    ///
    /// **BUG THIS CATCHES**: Would catch if the `[file:line:column]` suffix
    /// changed shape and broke log scraping.
    #[test]
    fn given_location_when_displayed_then_formats_file_line_column() {
        // GIVEN: A fixed location
        let location = ErrorLocation {
            file: "src/shell.rs",
            line: 12,
            column: 5,
        };

        // WHEN: Formatting
        let text = location.to_string();

        // THEN: Bracketed file:line:column
        assert_eq!(text, "[src/shell.rs:12:5]");
    }
}
