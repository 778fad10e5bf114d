//! The event loop. One event is processed completely, effects included,
//! before the next is taken. Blocking work runs on worker threads and comes
//! back as an event through the same queue.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::core::controller::{Controller, Mode};
use crate::core::error::ShellError;
use crate::core::event::{Effect, Event};
use crate::output::Printer;

/// Where submitted lines come from.
pub trait LineSource {
    fn read_event(&mut self, prompt: &str) -> Result<Event, ShellError>;
}

pub struct Shell<S: LineSource> {
    controller: Controller,
    source: S,
    printer: Printer,
    tick: Duration,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    outstanding: usize,
    fresh_handoff: bool,
    framed: bool,
}

impl<S: LineSource> Shell<S> {
    pub fn new(controller: Controller, source: S, printer: Printer, tick: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            controller,
            source,
            printer,
            tick,
            tx,
            rx,
            outstanding: 0,
            fresh_handoff: false,
            framed: false,
        }
    }

    /// Handle for posting events from outside the loop (signal handlers).
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Runs until the session quits. An error means the session hit a fatal
    /// condition and was not shut down normally.
    pub fn run(&mut self) -> Result<(), ShellError> {
        while !self.controller.is_quitting() {
            let event = self.next_event()?;
            if matches!(event, Event::Completed(_)) {
                self.outstanding = self.outstanding.saturating_sub(1);
            }

            let was_handoff = self.controller.mode() == Mode::Handoff;
            let effects = self.controller.update(event)?;
            let handoff = self.controller.mode() == Mode::Handoff;
            if handoff && !was_handoff {
                self.fresh_handoff = true;
            }
            if !handoff {
                self.end_frame();
            }

            self.apply(effects);
        }
        Ok(())
    }

    fn next_event(&mut self) -> Result<Event, ShellError> {
        if let Ok(event) = self.rx.try_recv() {
            return Ok(event);
        }

        match self.controller.mode() {
            Mode::Handoff if self.fresh_handoff => {
                // let the leaf act before anything is read
                self.fresh_handoff = false;
                Ok(Event::Tick)
            }
            Mode::Handoff if self.outstanding > 0 => {
                let frame = self.controller.render()?;
                self.printer.frame(&frame);
                self.framed = true;
                match self.rx.recv_timeout(self.tick) {
                    Ok(event) => Ok(event),
                    Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                        Ok(Event::Tick)
                    }
                }
            }
            Mode::Handoff => {
                let frame = self.controller.render()?;
                self.source.read_event(&frame)
            }
            _ => {
                let frame = self.controller.render()?;
                let mut lines = frame.lines();
                let prompt = lines.next().unwrap_or_default().to_string();
                for line in lines {
                    self.printer.error(line);
                }
                self.source.read_event(&prompt)
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        if !effects.is_empty() {
            self.end_frame();
        }
        for effect in effects {
            match effect {
                Effect::Println(line) => self.printer.line(&line),
                Effect::Listing(names) => self.printer.listing(&names),
                Effect::Farewell => self.printer.farewell(),
                Effect::Spawn(job) => {
                    debug!(label = %job.label, "spawning background job");
                    self.outstanding += 1;
                    let tx = self.tx.clone();
                    thread::spawn(move || {
                        // the loop may already be gone after a kill
                        let _ = tx.send(job.run());
                    });
                }
            }
        }
    }

    fn end_frame(&mut self) {
        if self.framed {
            self.printer.end_frame();
            self.framed = false;
        }
    }
}
