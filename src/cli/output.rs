//! Colored output helpers for CLI
//!
//! Renders research progress, the final answer and its sources.

use crate::types::Source;
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the name and version line
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n  {} {} {}\n",
                "deepest".bright_cyan().bold(),
                "iterative web research".bright_white(),
                version.dimmed()
            );
        } else {
            println!("\n  deepest - iterative web research {}\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print the answer body, indented
    pub fn answer(&self, text: &str) {
        for line in text.lines() {
            println!("  {}", line);
        }
    }

    /// Print the cited sources as a numbered list
    pub fn sources(&self, sources: &[Source]) {
        if sources.is_empty() {
            self.warning("The answer cites no sources");
            return;
        }
        for (i, source) in sources.iter().enumerate() {
            let number = format!("[{}]", i + 1);
            if self.colored {
                println!(
                    "    {} {} {}",
                    number.dimmed(),
                    source.title.bright_white(),
                    source.url.bright_cyan()
                );
            } else {
                println!("    {}", source_line(i, source));
            }
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }
}

/// Plain rendering of one source, numbered from 1
pub fn source_line(index: usize, source: &Source) -> String {
    format!("[{}] {} {}", index + 1, source.title, source.url)
}
