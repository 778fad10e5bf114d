use std::collections::HashMap;
use std::rc::Rc;

use crate::core::controller::Mode;
use crate::core::event::{Effect, Event};

/// A leaf is an invocable command.
///
/// While active it supplants the controller: every event except a kill key is
/// handed to `on_event` and the frame comes from `render`. A leaf must call
/// [`ControllerHandle::return_to_controller`] exactly once when it is done.
pub trait Leaf {
    fn name(&self) -> &str;

    fn on_event(&mut self, ctl: &mut ControllerHandle<'_>, event: &Event) -> Vec<Effect>;

    fn render(&mut self, ctl: &ControllerHandle<'_>) -> String;
}

/// Builds a fresh leaf for each invocation.
pub type LeafFactory = Rc<dyn Fn() -> Box<dyn Leaf>>;

/// The slice of controller state a running leaf may see and touch.
pub struct ControllerHandle<'a> {
    mode: &'a mut Mode,
    position: &'a str,
    returns: u32,
}

impl<'a> ControllerHandle<'a> {
    pub(crate) fn new(mode: &'a mut Mode, position: &'a str) -> Self {
        Self {
            mode,
            position,
            returns: 0,
        }
    }

    /// Path of the menu the leaf was invoked from.
    pub fn position(&self) -> &str {
        self.position
    }

    pub fn mode(&self) -> Mode {
        *self.mode
    }

    /// Hand control back to the controller.
    pub fn return_to_controller(&mut self) {
        self.returns += 1;
        if *self.mode == Mode::Handoff {
            *self.mode = Mode::Returning;
        }
    }

    pub(crate) fn returns(&self) -> u32 {
        self.returns
    }
}

/// Maps leaf binding names (as used in a tree specification) to factories.
#[derive(Default, Clone)]
pub struct LeafRegistry {
    factories: HashMap<String, LeafFactory>,
}

impl LeafRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, binding: &str, factory: F)
    where
        F: Fn() -> Box<dyn Leaf> + 'static,
    {
        self.factories
            .insert(binding.to_lowercase(), Rc::new(factory));
    }

    pub fn get(&self, binding: &str) -> Option<LeafFactory> {
        self.factories.get(&binding.to_lowercase()).cloned()
    }

    pub fn bindings(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }
}
