use std::fmt::Write;

use crate::{context::ScopeRef, scope::Sub, term, Context, Flag};

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

/// Word-wrapping text buffer with independent left and right margins.
///
/// The left margin is applied lazily: whenever text is written while the
/// cursor is behind it, leading spaces are dropped and the line is padded.
/// Moving the left margin past the cursor therefore starts a second column.
#[derive(Debug)]
pub struct HelpWriter {
    buf: String,
    cursor: usize,
    left_margin: usize,
    right_margin: usize,
}

impl HelpWriter {
    pub fn new(width: usize) -> HelpWriter {
        HelpWriter { buf: String::new(), cursor: 0, left_margin: 0, right_margin: width }
    }

    pub fn set_margins(&mut self, left: usize, right: usize) {
        self.left_margin = left;
        self.right_margin = right;
    }

    pub fn set_left_margin(&mut self, left: usize) {
        self.left_margin = left;
    }

    pub fn margins(&self) -> (usize, usize) {
        (self.left_margin, self.right_margin)
    }

    /// Column of the next character on the current line.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn write(&mut self, text: &str) {
        if self.right_margin <= self.left_margin {
            self.left_margin = 0;
            self.right_margin = term::DEFAULT_WIDTH;
        }
        let mut rest = text;
        while !rest.is_empty() {
            if self.cursor < self.left_margin {
                rest = rest.trim_start_matches(' ');
                if rest.is_empty() {
                    break;
                }
                // Blank lines stay blank.
                if !rest.starts_with('\n') {
                    let pad = self.left_margin - self.cursor;
                    w!(self.buf, "{:pad$}", "");
                    self.cursor = self.left_margin;
                    continue;
                }
            }

            let room = self.right_margin.saturating_sub(self.cursor);
            if room == 0 {
                self.newline();
                continue;
            }

            let window = prefix(rest, room);
            if let Some(idx) = window.find('\n') {
                self.push(&rest[..idx]);
                self.newline();
                rest = &rest[idx + 1..];
                continue;
            }
            if window.len() == rest.len() {
                self.push(rest);
                break;
            }
            // The window ends exactly on a word boundary.
            match rest[window.len()..].chars().next() {
                Some(' ') => {
                    self.push(window);
                    rest = &rest[window.len() + 1..];
                    continue;
                }
                Some('\n') => {
                    self.push(window);
                    self.newline();
                    rest = &rest[window.len() + 1..];
                    continue;
                }
                _ => (),
            }
            if let Some(idx) = window.rfind(' ') {
                self.push(&rest[..=idx]);
                rest = &rest[idx + 1..];
                continue;
            }

            let word = rest.split([' ', '\n']).next().unwrap_or(rest);
            let line = self.right_margin - self.left_margin;
            if word.chars().count() > line {
                // Does not fit on any line, split it where the line ends.
                self.push(window);
                rest = &rest[window.len()..];
            } else {
                self.newline();
            }
        }
    }

    pub fn writeln(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    /// Ends the current line, dropping trailing spaces.
    pub fn newline(&mut self) {
        let len = self.buf.trim_end_matches(' ').len();
        self.buf.truncate(len);
        self.buf.push('\n');
        self.cursor = 0;
    }

    pub fn finish(self) -> String {
        self.buf
    }

    fn push(&mut self, text: &str) {
        self.buf.push_str(text);
        self.cursor += text.chars().count();
    }
}

/// The first `n` characters of `text`.
fn prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Width of the left column in two-column sections.
pub(crate) fn column_width(width: usize) -> usize {
    (width * 3 / 10).min(35)
}

impl<'c, 'a> ScopeRef<'c, 'a> {
    /// `Usage: prog cmd [flags] {subcommands}` for this scope.
    pub fn usage(&self, width: usize) -> String {
        let mut hw = HelpWriter::new(width);
        self.write_usage(&mut hw, width);
        hw.finish()
    }

    /// Usage followed by description, commands and flags of this scope.
    pub fn help(&self, width: usize) -> String {
        let mut hw = HelpWriter::new(width);
        self.write_usage(&mut hw, width);

        let description = match self.command() {
            Some(cmd) => cmd.description.as_str(),
            None => self.ctx.app.description.as_str(),
        };
        if !description.is_empty() {
            hw.set_margins(0, width);
            hw.writeln("\nDescription:");
            hw.set_left_margin(2);
            hw.writeln(description);
        }

        let column = column_width(width);
        let commands = self.data().commands.clone();
        if !commands.is_empty() {
            hw.set_margins(0, width);
            hw.writeln("\nCommands:");
            for (name, sub) in commands {
                let usage = match sub {
                    Sub::Declared(cmd) => cmd.usage.as_str(),
                    Sub::Help => "Show help for command given as argument",
                };
                write_row(&mut hw, name, usage, column, width);
            }
        }

        let (required, optional): (Vec<&Flag>, Vec<&Flag>) =
            self.flags().into_iter().partition(|it| it.is_required());
        for (title, flags) in [("Required flags", required), ("Optional flags", optional)] {
            if flags.is_empty() {
                continue;
            }
            hw.set_margins(0, width);
            hw.writeln(&format!("\n{title}:"));
            for flag in flags {
                let mut left = format!("--{}", flag.name());
                if let Some(short) = flag.short_alias() {
                    w!(left, "/-{short}");
                }
                if let Some(metavar) = flag.display_metavar() {
                    w!(left, " {metavar}");
                }
                write_row(&mut hw, &left, &flag.display_usage(), column, width);
            }
        }
        hw.finish()
    }

    fn write_usage(&self, hw: &mut HelpWriter, width: usize) {
        let mut exec = self.ctx.app.name.clone();
        let mut path = Vec::new();
        let mut cursor = Some(*self);
        while let Some(scope) = cursor {
            if let Some(cmd) = scope.command() {
                path.push(cmd.name.as_str());
            }
            cursor = scope.parent();
        }
        for name in path.iter().rev() {
            w!(exec, " {name}");
        }

        let head = format!("Usage: {exec}");
        hw.set_margins(0, width);
        hw.write(&head);
        let indent = head.chars().count();
        if indent < width {
            hw.set_left_margin(indent);
        }

        let (required, optional): (Vec<&Flag>, Vec<&Flag>) =
            self.flags().into_iter().partition(|it| it.is_required());
        let flags =
            required.iter().map(|it| (it, true)).chain(optional.iter().map(|it| (it, false)));
        for (flag, is_required) in flags {
            let mut word = match flag.short_alias() {
                Some(short) => format!("-{short}"),
                None => format!("--{}", flag.name()),
            };
            if let Some(metavar) = flag.display_metavar() {
                w!(word, " {metavar}");
            }
            let word = if is_required { format!(" {word}") } else { format!(" [{word}]") };
            self.write_word(hw, &word);
        }

        let names = self.command_names().collect::<Vec<_>>();
        if !names.is_empty() {
            let (open, close) = if self.has_action() { ('[', ']') } else { ('{', '}') };
            let word = format!(" {open}{}{close}", names.join(","));
            self.write_word(hw, &word);
        }
        hw.write("\n");
    }

    fn write_word(&self, hw: &mut HelpWriter, word: &str) {
        let (_, right) = hw.margins();
        if hw.cursor() + word.chars().count() > right {
            hw.newline();
        }
        hw.write(word);
    }
}

/// `  left      right`, with `right` starting at `column` and wrapping there.
fn write_row(hw: &mut HelpWriter, left: &str, right: &str, column: usize, width: usize) {
    hw.set_margins(2, width);
    hw.write(&format!("{left}  "));
    hw.set_left_margin(column);
    if hw.cursor() > column {
        hw.newline();
    }
    hw.writeln(right);
}

impl Context<'_> {
    /// Usage of the innermost scope.
    pub fn usage(&self, width: usize) -> String {
        self.scope().usage(width)
    }

    /// Full help of the innermost scope.
    pub fn help(&self, width: usize) -> String {
        self.scope().help(width)
    }
}
