use std::{
    fmt::Display,
    io::{self, Write},
};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{self, Event},
    execute, queue,
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::menu::{Menu, MenuError, MenuEvent};

/// Raw mode on the alternate screen, restored when dropped
pub struct TerminalSession<W: Write> {
    out: W,
}

impl<W: Write> TerminalSession<W> {
    pub fn enter(out: W) -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;

        // from here on, drop takes care of leaving raw mode
        let mut session = Self { out };
        execute!(session.out, EnterAlternateScreen, cursor::Hide)
            .context("Failed to enter the alternate screen")?;

        Ok(session)
    }

    pub fn draw<T: Display>(&mut self, menu: &Menu<T>) -> anyhow::Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::All)
        )?;
        menu.render(&mut self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Runs the menu on the terminal until the user confirms or quits.
///
/// Returns the chosen item, or `None` if the user quit.
pub fn select<T: Display>(mut menu: Menu<T>) -> Result<Option<T>, MenuError> {
    {
        let mut session = TerminalSession::enter(io::stdout())?;
        session.draw(&menu)?;

        while !menu.is_done() {
            let event = match event::read().context("Failed to read terminal event")? {
                Event::Key(key) => MenuEvent::from_key(&key),
                Event::Resize(..) => {
                    session.draw(&menu)?;
                    continue;
                }
                _ => continue,
            };

            if menu.handle(event) && !menu.is_done() {
                session.draw(&menu)?;
            }
        }
    }

    // the session is gone, print on the regular screen
    menu.render_confirmation(&mut io::stdout())
        .context("Failed to write to stdout")?;

    Ok(menu.into_selected())
}
