/// Color support with NO_COLOR and CLICOLOR environment variable handling
///
/// Implements the NO_COLOR standard (https://no-color.org/) and traditional
/// CLICOLOR conventions for disabling terminal colors.
///
/// **Environment Variables**:
/// - `NO_COLOR`: If set (to any value), disable colors
/// - `CLICOLOR`: If set to 0, disable colors
/// - `CLICOLOR_FORCE`: If set to non-zero, force colors even when not a TTY
use colored::control;

/// Decide whether terminal output should be colored.
///
/// `stdout_is_tty` is passed in so the policy can be checked without a terminal.
fn colors_enabled(
    no_color: Option<String>,
    clicolor: Option<String>,
    clicolor_force: Option<String>,
    stdout_is_tty: bool,
) -> bool {
    if no_color.is_some() {
        return false;
    }
    if clicolor_force.is_some_and(|v| v != "0") {
        return true;
    }
    if clicolor.is_some_and(|v| v == "0") {
        return false;
    }
    stdout_is_tty
}

/// Configure `colored` for the whole process. Call early in main().
pub fn init_colors() {
    let enabled = colors_enabled(
        std::env::var("NO_COLOR").ok(),
        std::env::var("CLICOLOR").ok(),
        std::env::var("CLICOLOR_FORCE").ok(),
        std::io::IsTerminal::is_terminal(&std::io::stdout()),
    );
    control::set_override(enabled);
}
