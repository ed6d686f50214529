/// Formats a runner `::error::` command, which marks the step failed in the
/// run summary. Newlines would end the command early, so they are escaped.
pub fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
