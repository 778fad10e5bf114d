use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::{
    Cmd, ConditionalEventHandler, DefaultEditor, Event as EditorEvent, EventContext,
    EventHandler, KeyCode, KeyEvent, Modifiers, RepeatCount,
};

use crate::core::error::ShellError;
use crate::core::event::{Event, Key};
use crate::shell::LineSource;

/// F1 aborts the line being edited and leaves a mark, so the interrupt that
/// follows is reported as a help request instead of a kill.
struct HelpKey {
    pressed: Arc<AtomicBool>,
}

impl ConditionalEventHandler for HelpKey {
    fn handle(
        &self,
        _evt: &EditorEvent,
        _n: RepeatCount,
        _positive: bool,
        _ctx: &EventContext,
    ) -> Option<Cmd> {
        self.pressed.store(true, Ordering::SeqCst);
        Some(Cmd::Interrupt)
    }
}

/// Consumes the F1 mark, if any.
fn interrupted(help: &AtomicBool) -> Event {
    if help.swap(false, Ordering::SeqCst) {
        Event::Key(Key::Help)
    } else {
        Event::Key(Key::Interrupt)
    }
}

/// Line editor front end. Turns each finished line, F1, or an interrupt into
/// an event for the controller. History lives in memory for the session only.
pub struct Repl {
    editor: DefaultEditor,
    help: Arc<AtomicBool>,
}

impl Repl {
    pub fn new() -> Result<Self, ShellError> {
        let mut editor = DefaultEditor::new()?;
        let help = Arc::new(AtomicBool::new(false));
        editor.bind_sequence(
            KeyEvent(KeyCode::F(1), Modifiers::NONE),
            EventHandler::Conditional(Box::new(HelpKey {
                pressed: help.clone(),
            })),
        );
        Ok(Self { editor, help })
    }
}

impl LineSource for Repl {
    fn read_event(&mut self, prompt: &str) -> Result<Event, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Event::Submit(line))
            }
            Err(ReadlineError::Interrupted) => Ok(interrupted(&self.help)),
            Err(ReadlineError::Eof) => Ok(Event::Key(Key::Eof)),
            Err(err) => Err(err.into()),
        }
    }
}
