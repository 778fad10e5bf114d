use std::io::{self, Write};

use supports_color::Stream;

pub struct Printer {
    pub use_color: bool,
}

impl Printer {
    pub fn new(no_color: bool) -> Self {
        let use_color = !no_color && supports_color::on(Stream::Stdout).is_some();
        Self { use_color }
    }

    #[allow(dead_code)]
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn line(&self, message: &str) {
        println!("{}", message);
    }

    pub fn error(&self, message: &str) {
        self.print_prefix("[-]", "red", message);
    }

    pub fn farewell(&self) {
        println!("Bye");
        let _ = io::stdout().flush();
    }

    pub fn listing(&self, names: &[String]) {
        if names.is_empty() {
            self.paint("gray", "(empty)");
            return;
        }
        for name in names {
            self.paint("blue", name);
        }
    }

    /// Overwrites the current terminal line with a leaf's frame.
    pub fn frame(&self, frame: &str) {
        print!("\r{}", frame);
        let _ = io::stdout().flush();
    }

    pub fn end_frame(&self) {
        println!();
    }

    pub fn header(&self, title: &str) {
        if self.use_color {
            println!("\x1b[1;36m{}\x1b[0m", title); // Bold cyan
            println!("\x1b[90m{}\x1b[0m", "─".repeat(title.chars().count()));
        } else {
            println!("{}", title);
            println!("{}", "─".repeat(title.chars().count()));
        }
    }

    pub fn print_prefix(&self, prefix: &str, color: &str, message: &str) {
        if self.use_color {
            println!("{}{}\x1b[0m {}", color_code(color), prefix, message);
        } else {
            println!("{} {}", prefix, message);
        }
    }

    fn paint(&self, color: &str, text: &str) {
        if self.use_color {
            println!("{}{}\x1b[0m", color_code(color), text);
        } else {
            println!("{}", text);
        }
    }
}

fn color_code(color: &str) -> &'static str {
    match color {
        "green" => "\x1b[32m",
        "red" => "\x1b[31m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "gray" => "\x1b[90m",
        _ => "\x1b[0m",
    }
}
