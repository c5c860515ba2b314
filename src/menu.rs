use std::{
    fmt::Display,
    io::{self, Write},
};

use colored::Colorize;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

mod terminal;

pub use terminal::{select, TerminalSession};

pub const TITLE: &str = "Choose a Makefile target:";
pub const FOOTER: &str = "Press q to quit.";

/// Input understood by the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuEvent {
    Up,
    Down,
    Confirm,
    Quit,
    Other,
}

impl MenuEvent {
    /// Maps a terminal key to a menu event.
    ///
    /// Only presses count, releases and repeats map to [`MenuEvent::Other`].
    pub fn from_key(key: &KeyEvent) -> Self {
        if key.kind != KeyEventKind::Press {
            return Self::Other;
        }

        match key.code {
            // raw mode delivers ctrl-c as a key
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Up | KeyCode::Char('k') => Self::Up,
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => Self::Down,
            KeyCode::Enter => Self::Confirm,
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuState {
    Browsing,
    /// Holds the index of the chosen item
    Confirmed(usize),
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("Cannot show a menu without items")]
    Empty,
    #[error("Terminal error: {0:#}")]
    Terminal(#[from] anyhow::Error),
}

/// Single selection list with a wrapping cursor.
///
/// Moving up from the first item selects the last one and moving down from
/// the last item selects the first one.
#[derive(Debug, Clone)]
pub struct Menu<T> {
    items: Vec<T>,
    cursor: usize,
    state: MenuState,
}

impl<T> Menu<T> {
    pub fn new(items: Vec<T>) -> Result<Self, MenuError> {
        if items.is_empty() {
            return Err(MenuError::Empty);
        }
        Ok(Self {
            items,
            cursor: 0,
            state: MenuState::Browsing,
        })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state != MenuState::Browsing
    }

    /// Applies one event, returns `true` if anything changed.
    pub fn handle(&mut self, event: MenuEvent) -> bool {
        if self.is_done() {
            return false;
        }

        let len = self.items.len();
        match event {
            MenuEvent::Up => self.cursor = (self.cursor + len - 1) % len,
            MenuEvent::Down => self.cursor = (self.cursor + 1) % len,
            MenuEvent::Confirm => self.state = MenuState::Confirmed(self.cursor),
            MenuEvent::Quit => self.state = MenuState::Cancelled,
            MenuEvent::Other => return false,
        }
        true
    }

    /// Applies events until the menu reaches a final state or they run out.
    pub fn feed(&mut self, events: impl IntoIterator<Item = MenuEvent>) -> MenuState {
        for event in events {
            if self.is_done() {
                break;
            }
            self.handle(event);
        }
        self.state
    }

    pub fn selected(&self) -> Option<&T> {
        match self.state {
            MenuState::Confirmed(index) => self.items.get(index),
            _ => None,
        }
    }

    pub fn into_selected(mut self) -> Option<T> {
        match self.state {
            MenuState::Confirmed(index) => Some(self.items.swap_remove(index)),
            _ => None,
        }
    }
}

impl<T: Display> Menu<T> {
    /// Writes the browsing frame.
    ///
    /// Lines end with `\r\n` since the terminal is in raw mode while browsing.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{}\r\n\r\n", TITLE.bold())?;
        for (i, item) in self.items.iter().enumerate() {
            if i == self.cursor {
                write!(out, "{}\r\n", format!("> {item}").cyan().bold())?;
            } else {
                write!(out, "  {item}\r\n")?;
            }
        }
        write!(out, "\r\n{}\r\n", FOOTER.bright_black())?;
        Ok(())
    }

    /// Writes the final line for a confirmed menu, nothing otherwise.
    pub fn render_confirmation(&self, out: &mut impl Write) -> io::Result<()> {
        if let Some(item) = self.selected() {
            writeln!(out, "You selected: {}", item.to_string().green().bold())?;
        }
        Ok(())
    }
}
