pub mod ask;
pub mod init;
pub mod log;
pub mod query;
pub mod schema;
pub mod session;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Dim metadata line when writing to a terminal, plain text otherwise.
pub(crate) fn status_line(text: &str) -> String {
    if std::io::stdout().is_terminal() {
        format!("{}", text.dimmed())
    } else {
        text.to_string()
    }
}
