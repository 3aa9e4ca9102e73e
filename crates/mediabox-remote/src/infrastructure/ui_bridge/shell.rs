//! Line parser for the interactive shell.
//!
//! Lines starting with `:` are shell directives; everything else is a
//! command for the box, passed on exactly as typed (minus the line ending).

/// One parsed line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    /// `:connect [host]`.  Without a host the last saved host is used.
    Connect(Option<String>),
    /// `:disconnect`
    Disconnect,
    /// `:status`
    Status,
    /// `:quit` or `:exit`
    Quit,
    /// `:help`, or an unknown directive.
    Help,
    /// Anything else: a command for the box.
    Command(String),
    /// A blank line.
    Empty,
}

impl ShellInput {
    /// Parses one line read from stdin.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return ShellInput::Empty;
        }

        let Some(directive) = line.trim_start().strip_prefix(':') else {
            return ShellInput::Command(line.to_string());
        };

        let mut words = directive.split_whitespace();
        match words.next() {
            Some("connect" | "c") => ShellInput::Connect(words.next().map(str::to_string)),
            Some("disconnect" | "d") => ShellInput::Disconnect,
            Some("status" | "s") => ShellInput::Status,
            Some("quit" | "exit" | "q") => ShellInput::Quit,
            _ => ShellInput::Help,
        }
    }
}

/// Text printed for `:help`.
pub const HELP: &str = "\
:connect [host]   open the link (defaults to the last host)
:disconnect       close the link
:status           show connection state
:quit             disconnect and exit
anything else     sent to the box as one command";
