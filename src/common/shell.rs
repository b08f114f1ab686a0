//! Shell quoting helpers.
//!
//! Commands are passed around as argv vectors. The only places a command turns
//! into shell source are `sh -c` scripts and terminal `--command=` arguments,
//! and every token that ends up there goes through [`shell_quote`].

/// Escape a string for use in a shell command
///
/// The string is quoted only if necessary (i.e. if it contains characters
/// that have special meaning in the shell). Single quotes are used, so nothing
/// inside the result is expanded.
///
/// ```ignore
/// assert_eq!(shell_quote("simple"), "simple");
/// assert_eq!(shell_quote("has spaces"), "'has spaces'");
/// assert_eq!(shell_quote("has'quote"), "'has'\\''quote'");
/// ```
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    let plain = |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ',' | '+')
    };
    if s.chars().all(plain) {
        return s.to_string();
    }

    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Quote every element of `argv` and join them with spaces.
pub fn shell_join<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join several commands into one `cmd1 && cmd2` script.
///
/// Each command is quoted on its own, so the `&&` operators are the only
/// unquoted shell syntax in the result.
pub fn and_then_script<S: AsRef<str>>(commands: &[&[S]]) -> String {
    commands
        .iter()
        .map(|argv| shell_join(argv))
        .collect::<Vec<_>>()
        .join(" && ")
}
