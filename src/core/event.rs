use std::fmt;

/// Discrete key presses the controller cares about.
///
/// The rustyline front end (`repl.rs`) produces `Interrupt`, `Eof` and
/// `Help`; it does its own line editing and hands over whole lines as
/// `Event::Submit`. `Escape`, `Enter`, `Backspace` and `Char` are for a
/// raw key driver that feeds the controller keystroke by keystroke, which is
/// how the controller tests drive its input buffer.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Interrupt, // Ctrl+C
    Escape,
    Eof, // Ctrl+D
    Help, // F1
    Enter,
    Backspace,
    Char(char),
}

impl Key {
    /// Keys that end the session no matter what mode we are in.
    pub fn is_kill(&self) -> bool {
        matches!(self, Key::Interrupt | Key::Escape | Key::Eof)
    }
}

/// Result of a background job, delivered back through the event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub label: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(Key),
    /// A finished line; carries the text buffer contents at submit time.
    Submit(String),
    Tick,
    Completed(Completion),
}

impl Event {
    pub fn is_kill(&self) -> bool {
        matches!(self, Event::Key(key) if key.is_kill())
    }
}

/// Work that would block the event loop. Runs off-thread and comes back as
/// `Event::Completed` carrying `label` and the returned string.
pub struct Job {
    pub label: String,
    work: Box<dyn FnOnce() -> String + Send>,
}

impl Job {
    pub fn new(label: impl Into<String>, work: impl FnOnce() -> String + Send + 'static) -> Self {
        Self {
            label: label.into(),
            work: Box::new(work),
        }
    }

    pub fn run(self) -> Event {
        let output = (self.work)();
        Event::Completed(Completion {
            label: self.label,
            output,
        })
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Side effects requested by the controller or a leaf. The shell runtime
/// carries them out in order.
#[derive(Debug)]
pub enum Effect {
    /// One-shot line printed above the prompt.
    Println(String),
    /// Sorted children of a menu.
    Listing(Vec<String>),
    /// Print the farewell and stop the session.
    Farewell,
    Spawn(Job),
}

impl Effect {
    pub fn println(line: impl Into<String>) -> Self {
        Effect::Println(line.into())
    }
}
