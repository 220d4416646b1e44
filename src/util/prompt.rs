use std::io::{self, BufRead, Write};

/// Ask a yes/no question and read one line of answer.
///
/// Only an explicit "y" or "yes" (any case) counts; an empty line or end of
/// input means no.
pub fn confirm(
    question: &str,
    mut input: impl BufRead,
    mut output: impl Write,
) -> io::Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
