/// Interactive commands read from stdin
use crate::error::{CliError, Result};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    TogglePlayPause,
    ToggleLoop,
    Stop,
    Play,
    Volume(f32),
    Like,
    Search(String),
    /// Play the n-th result of the last search (1-based)
    Pick(usize),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
n            next song
p            previous song
t            toggle play/pause
r            play (resume or restart)
l            toggle loop
s            stop
v <0-1>      set volume
k            like/unlike current song
f <query>    search the library
g <n>        play result n of the last search
i            show status
q            quit";

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        let command = match word.to_ascii_lowercase().as_str() {
            "n" | "next" => Command::Next,
            "p" | "prev" | "previous" => Command::Previous,
            "t" | "toggle" => Command::TogglePlayPause,
            "r" | "play" => Command::Play,
            "l" | "loop" => Command::ToggleLoop,
            "s" | "stop" => Command::Stop,
            "k" | "like" => Command::Like,
            "i" | "status" => Command::Status,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            "v" | "volume" => {
                let volume = rest
                    .parse::<f32>()
                    .map_err(|_| CliError::InvalidArgument(format!("volume '{rest}'")))?;
                Command::Volume(volume)
            }
            "f" | "find" | "search" => Command::Search(rest.to_string()),
            "g" | "go" => {
                let n = rest
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| CliError::InvalidArgument(format!("result number '{rest}'")))?;
                Command::Pick(n)
            }
            _ => return Err(CliError::UnknownCommand(line.to_string())),
        };
        Ok(command)
    }
}
