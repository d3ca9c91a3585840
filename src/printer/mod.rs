//! Printers: terminal text and HTML markup.

use owo_colors::OwoColorize;

use crate::output::{render, render_plain, OUTPUT_BANNER};

pub struct OutputPrinter {
    pub html: bool,
    pub color: bool,
}

impl OutputPrinter {
    pub fn print(&self, text: &str) {
        if self.html {
            println!("{}", render(text));
            return;
        }
        let text = render_plain(text);
        if !self.color {
            println!("{}", text);
            return;
        }
        for line in text.lines() {
            if line == OUTPUT_BANNER {
                println!("{}", line.cyan());
            } else if line.starts_with("Execution completed in") {
                println!("{}", line.green());
            } else if line.starts_with("Compilation failed") || line.starts_with("Error") {
                println!("{}", line.red());
            } else {
                println!("{}", line);
            }
        }
    }

    /// Progress and status lines go to stderr so stdout stays the program output.
    pub fn status(&self, text: &str) {
        if self.color {
            eprintln!("{}", text.yellow());
        } else {
            eprintln!("{}", text);
        }
    }
}
