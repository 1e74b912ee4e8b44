//! Slash-command parsing for issue comments.

use regex::Regex;
use std::sync::LazyLock;

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)").expect("valid mention regex")
});

/// A recognized slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Claim the work item, optionally with named teammates.
    Start { teammates: Vec<String> },
    /// Give up the work item.
    Stop,
}

/// Parse the leading slash command of a comment, if any.
///
/// Only the first non-empty line is considered; anything that does not
/// start with a known command is not a command at all.
#[must_use]
pub fn parse(body: &str) -> Option<Command> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;

    if let Some(rest) = strip_command(line, "/start") {
        let mut teammates: Vec<String> = Vec::new();
        for capture in MENTION.captures_iter(rest) {
            let login = capture[1].to_string();
            if !teammates.iter().any(|t| t.eq_ignore_ascii_case(&login)) {
                teammates.push(login);
            }
        }
        return Some(Command::Start { teammates });
    }
    if strip_command(line, "/stop").is_some() {
        return Some(Command::Stop);
    }
    None
}

/// The remainder of `line` if it begins with `command` as a whole word.
fn strip_command<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(command)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}
