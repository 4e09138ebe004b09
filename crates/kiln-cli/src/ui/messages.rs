//! Status message functions for terminal output.

use owo_colors::OwoColorize;

use super::paint;

pub fn success(message: &str) {
    eprintln!("{} {}", paint("✓", |s| s.green().bold().to_string()), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", paint("ℹ", |s| s.blue().bold().to_string()), message);
}

pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        paint("⚠", |s| s.yellow().bold().to_string()),
        paint(message, |s| s.yellow().to_string())
    );
}

pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        paint("✗", |s| s.red().bold().to_string()),
        paint(message, |s| s.red().to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages_do_not_panic() {
        success("Success message");
        info("Info message");
        warning("Warning message");
        error("Error message");
    }
}
