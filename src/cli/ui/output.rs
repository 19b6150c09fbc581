use console::style;

use crate::ai::preflight::PreflightResult;

/// Styled status lines for command output
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// One line per check, then any recommendations
    pub fn preflight(&self, result: &PreflightResult) {
        for check in &result.checks {
            if check.passed {
                self.success(&check.message);
            } else {
                self.error(&check.message);
            }
        }
        if !result.recommendations.is_empty() {
            self.section("Recommendations");
            for rec in &result.recommendations {
                println!("  {}", rec);
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
