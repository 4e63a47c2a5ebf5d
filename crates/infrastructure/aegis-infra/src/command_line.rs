use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("Unbalanced quotes in command: {0}")]
    Unbalanced(String),
    #[error("Command is empty")]
    Empty,
}

#[cfg(target_os = "windows")]
fn split_command_windows(cmd: &str) -> Option<Vec<String>> {
    // Windows paths use backslashes heavily; treating `\` as an escape (POSIX shlex)
    // breaks paths like `C:\Epic\UE_5.3` into `C:EpicUE_5.3`. Only double-quote
    // grouping and whitespace splitting apply here.
    let mut parts = Vec::<String>::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in cmd.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    parts.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return None;
    }

    if !current.is_empty() || quoted {
        parts.push(current);
    }

    Some(parts)
}

/// Split an edited command line into an argument vector.
///
/// Space-delimited and quote-aware. A command with no words is an error since
/// there would be nothing to launch.
pub fn split_command(cmd: &str) -> Result<Vec<String>, TokenizeError> {
    #[cfg(target_os = "windows")]
    let parts = split_command_windows(cmd);
    #[cfg(not(target_os = "windows"))]
    let parts = shlex::split(cmd);

    let parts = parts.ok_or_else(|| TokenizeError::Unbalanced(cmd.to_string()))?;
    if parts.is_empty() {
        return Err(TokenizeError::Empty);
    }
    Ok(parts)
}

#[cfg(target_os = "windows")]
fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        "\"\"".to_string()
    } else if arg.chars().any(|c| c.is_whitespace()) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

/// Render an argument vector as a single line that [`split_command`] turns back
/// into the same vector.
pub fn join_command(argv: &[String]) -> String {
    #[cfg(target_os = "windows")]
    {
        argv.iter()
            .map(|a| quote_arg(a))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[cfg(not(target_os = "windows"))]
    {
        match shlex::try_join(argv.iter().map(String::as_str)) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Cannot quote command for display: {e}");
                argv.join(" ")
            }
        }
    }
}
