//! Line commands for driving a board from a terminal.

use std::fmt::Write as _;
use std::path::PathBuf;

use soundy_core::{AudioBackend, BoardController, BoardError, Redraw, SoundKey, UiEvent};

pub const HELP: &str = "\
commands:
  boards                 list boards (* marks the current one)
  board <name>           switch to a board
  add-board <name>       create a board
  del-board <name>       delete a board and stop its sounds
  add <name> = <path>    add a sound to the current board
  del <name>             delete a sound from the current board
  edit <name> = <new name> = <path>
                         rename a sound or point it at another file
  play <name>            play a sound once
  loop <name>            start or stop looping a sound
  stop <name>            stop a sound
  ls                     show the current board
  help                   show this help
  quit                   stop everything and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Boards,
    Board(String),
    AddBoard(String),
    DelBoard(String),
    Add { name: String, path: PathBuf },
    Del(String),
    Edit {
        sound: String,
        name: String,
        path: PathBuf,
    },
    Play(String),
    Loop(String),
    Stop(String),
    Ls,
    Help,
    Quit,
}

/// Parse one input line. Blank lines give `None`.
pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let arg = |usage: &str| -> anyhow::Result<String> {
        if rest.is_empty() {
            anyhow::bail!("usage: {usage}");
        }
        Ok(rest.to_string())
    };

    let command = match word {
        "boards" => Command::Boards,
        "board" => Command::Board(arg("board <name>")?),
        "add-board" => Command::AddBoard(arg("add-board <name>")?),
        "del-board" => Command::DelBoard(arg("del-board <name>")?),
        "add" => {
            let Some((name, path)) = rest.split_once('=') else {
                anyhow::bail!("usage: add <name> = <path>");
            };
            let path = path.trim();
            if path.is_empty() {
                anyhow::bail!("usage: add <name> = <path>");
            }
            Command::Add {
                name: name.trim().to_string(),
                path: PathBuf::from(path),
            }
        }
        "del" => Command::Del(arg("del <name>")?),
        "edit" => {
            let mut parts = rest.splitn(3, '=').map(str::trim);
            let (Some(sound), Some(name), Some(path)) = (parts.next(), parts.next(), parts.next())
            else {
                anyhow::bail!("usage: edit <name> = <new name> = <path>");
            };
            if sound.is_empty() || path.is_empty() {
                anyhow::bail!("usage: edit <name> = <new name> = <path>");
            }
            Command::Edit {
                sound: sound.to_string(),
                name: name.to_string(),
                path: PathBuf::from(path),
            }
        }
        "play" => Command::Play(arg("play <name>")?),
        "loop" => Command::Loop(arg("loop <name>")?),
        "stop" => Command::Stop(arg("stop <name>")?),
        "ls" => Command::Ls,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => anyhow::bail!("unknown command '{other}', try 'help'"),
    };
    Ok(Some(command))
}

/// The event a command raises, with sound names resolved on `board`.
pub fn to_event(command: Command, board: &str) -> Option<UiEvent> {
    let key = |sound: String| SoundKey::new(board, sound);
    Some(match command {
        Command::Board(name) => UiEvent::SelectBoard(name),
        Command::AddBoard(name) => UiEvent::AddBoard(name),
        Command::DelBoard(name) => UiEvent::DeleteBoard(name),
        Command::Add { name, path } => UiEvent::AddSound { name, path },
        Command::Del(sound) => UiEvent::DeleteSound {
            board: board.to_string(),
            sound,
        },
        Command::Edit { sound, name, path } => UiEvent::EditSound {
            board: board.to_string(),
            sound,
            name,
            path,
        },
        Command::Play(sound) => UiEvent::Play(key(sound)),
        Command::Loop(sound) => UiEvent::ToggleLoop(key(sound)),
        Command::Stop(sound) => UiEvent::Stop(key(sound)),
        Command::Boards | Command::Ls | Command::Help | Command::Quit => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command against the controller, returning what to print.
pub fn execute<B: AudioBackend>(
    controller: &mut BoardController<B>,
    command: Command,
) -> (Flow, String) {
    match command {
        Command::Help => return (Flow::Continue, HELP.to_string()),
        Command::Quit => {
            controller.shutdown();
            return (Flow::Quit, String::new());
        }
        Command::Boards => return (Flow::Continue, render_boards(controller)),
        Command::Ls => return (Flow::Continue, render_board(controller)),
        _ => {}
    }

    let board = controller.store().current_board_name().to_string();
    let Some(event) = to_event(command, &board) else {
        return (Flow::Continue, String::new());
    };

    let output = match controller.handle(event) {
        Ok(Redraw::Boards) => format!("{}{}", render_boards(controller), render_board(controller)),
        Ok(Redraw::Sounds) => render_board(controller),
        Ok(Redraw::Nothing) => String::new(),
        Err(e) => describe_error(controller, &e),
    };
    (Flow::Continue, output)
}

fn describe_error<B: AudioBackend>(controller: &BoardController<B>, err: &BoardError) -> String {
    if err.state_changed() {
        // the change stands; only the disk copy is behind
        format!("warning: {err}\n{}", render_board(controller))
    } else {
        format!("error: {err}\n")
    }
}

pub fn render_boards<B: AudioBackend>(controller: &BoardController<B>) -> String {
    let store = controller.store();
    let mut out = String::new();
    for board in store.boards() {
        let marker = if board.name() == store.current_board_name() {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, "{marker} {} ({})", board.name(), board.sounds().len());
    }
    out
}

/// The current board, one sound per line with its playback marker.
pub fn render_board<B: AudioBackend>(controller: &BoardController<B>) -> String {
    let board = controller.store().current_board();
    let mut out = format!("== {} ==\n", board.name());
    if board.is_empty() {
        out.push_str("  (no sounds)\n");
        return out;
    }

    let width = board.sounds().iter().map(|s| s.name().len()).max().unwrap_or(0);
    for sound in board.sounds() {
        let state = controller.state_of(&SoundKey::of(board.name(), sound));
        let marker = if state.is_looping {
            "[loop]"
        } else if state.is_playing {
            "[play]"
        } else {
            ""
        };
        let line = format!("  {:width$}  {marker}", sound.name());
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}
