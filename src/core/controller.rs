//! The controller owns the session: where we are in the tree, which mode we
//! are in, and which leaf (if any) currently has control.
//!
//! Every event goes through [`Controller::update`]. Kill keys are checked
//! first in every mode. While a leaf is in handoff the controller does not
//! interpret anything itself, it only forwards the event and watches for the
//! leaf to return.

use std::fmt;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::dispatch::{Dispatcher, Resolution};
use crate::core::error::ShellError;
use crate::core::event::{Effect, Event, Key};
use crate::core::input::InputBuffer;
use crate::core::leaf::{ControllerHandle, Leaf};
use crate::core::tree::{MenuTree, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Prompting, // default; the controller handles input alone
    Handoff,   // a leaf is in control
    Returning, // the leaf is done and the controller takes over this tick
    Quitting,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Prompting => "prompting",
            Mode::Handoff => "handoff",
            Mode::Returning => "returning",
            Mode::Quitting => "quitting",
        };
        write!(f, "{}", s)
    }
}

struct ActiveLeaf {
    instance: Uuid,
    leaf: Box<dyn Leaf>,
}

pub struct Controller {
    tree: MenuTree,
    dispatcher: Dispatcher,
    position: NodeId,
    mode: Mode,
    active: Option<ActiveLeaf>,
    pending_input_error: Option<ShellError>,
    input: InputBuffer,
}

impl Controller {
    pub fn new(tree: MenuTree) -> Self {
        let dispatcher = Dispatcher::new();
        for id in dispatcher.shadowed(&tree) {
            warn!(
                path = tree.path(id),
                "child name collides with a built-in and cannot be reached"
            );
        }

        let position = tree.root();
        Self {
            tree,
            dispatcher,
            position,
            mode: Mode::Prompting,
            active: None,
            pending_input_error: None,
            input: InputBuffer::new(),
        }
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn position(&self) -> NodeId {
        self.position
    }

    /// Present working menu.
    pub fn pwd(&self) -> &str {
        self.tree.path(self.position)
    }

    pub fn is_quitting(&self) -> bool {
        self.mode == Mode::Quitting
    }

    pub fn active_leaf(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.leaf.name())
    }

    #[allow(dead_code)]
    pub fn active_instance(&self) -> Option<Uuid> {
        self.active.as_ref().map(|active| active.instance)
    }

    pub fn pending_input_error(&self) -> Option<&ShellError> {
        self.pending_input_error.as_ref()
    }

    #[allow(dead_code)]
    pub fn input(&self) -> &str {
        self.input.value()
    }

    /// Process one event. An `Err` is always fatal: the state machine was
    /// driven into an inconsistent state and the session must not continue.
    pub fn update(&mut self, event: Event) -> Result<Vec<Effect>, ShellError> {
        self.check_consistency()?;

        if event.is_kill() {
            return Ok(self.quit());
        }

        let effects = match self.mode {
            Mode::Quitting => {
                debug!(?event, "session is quitting, event ignored");
                Vec::new()
            }
            Mode::Handoff => self.forward(&event)?,
            Mode::Prompting => self.interpret(event)?,
            Mode::Returning => {
                return Err(self.fail("returning mode observed outside a leaf update"));
            }
        };

        self.check_consistency()?;
        Ok(effects)
    }

    /// The current frame. In handoff this is the leaf's output alone.
    /// Otherwise it is the prompt, followed on the next line by the pending
    /// input error, which is cleared once shown. A handoff with no leaf to
    /// draw is a consistency break and fails like any other.
    pub fn render(&mut self) -> Result<String, ShellError> {
        let mode = self.mode;
        let frame = match mode {
            Mode::Handoff => {
                let Some(active) = self.active.as_mut() else {
                    return Err(self.fail("handoff frame requested without an active leaf"));
                };
                let path = self.tree.path(self.position);
                let handle = ControllerHandle::new(&mut self.mode, path);
                active.leaf.render(&handle)
            }
            Mode::Prompting => {
                let mut frame = format!("{} > {}", self.tree.name(self.position), self.input.value());
                if let Some(err) = self.pending_input_error.take() {
                    frame.push('\n');
                    frame.push_str(&err.to_string());
                }
                frame
            }
            Mode::Returning | Mode::Quitting => String::new(),
        };
        Ok(frame)
    }

    fn quit(&mut self) -> Vec<Effect> {
        if self.mode == Mode::Quitting {
            return Vec::new();
        }
        if let Some(active) = self.active.take() {
            info!(leaf = active.leaf.name(), instance = %active.instance, "abandoning active leaf");
        }
        info!(path = self.pwd(), "kill key received, quitting");
        self.mode = Mode::Quitting;
        vec![Effect::Farewell]
    }

    fn forward(&mut self, event: &Event) -> Result<Vec<Effect>, ShellError> {
        let Some(active) = self.active.as_mut() else {
            return Err(self.fail("handoff without an active leaf"));
        };
        debug!(leaf = active.leaf.name(), ?event, "handing event to active leaf");

        let path = self.tree.path(self.position);
        let mut handle = ControllerHandle::new(&mut self.mode, path);
        let effects = active.leaf.on_event(&mut handle, event);
        let returns = handle.returns();

        if returns > 1 {
            let message = format!(
                "leaf '{}' returned control {} times",
                active.leaf.name(),
                returns
            );
            return Err(self.fail(&message));
        }
        if self.mode == Mode::Returning {
            self.finish_return()?;
        }
        Ok(effects)
    }

    fn finish_return(&mut self) -> Result<(), ShellError> {
        let Some(done) = self.active.take() else {
            return Err(self.fail("return signalled but no leaf is active"));
        };
        info!(leaf = done.leaf.name(), instance = %done.instance, "returning from command");
        self.mode = Mode::Prompting;
        Ok(())
    }

    fn interpret(&mut self, event: Event) -> Result<Vec<Effect>, ShellError> {
        match event {
            Event::Key(Key::Help) => Ok(vec![Effect::Listing(
                self.tree.list_children(self.position).to_vec(),
            )]),
            Event::Key(Key::Enter) => {
                let line = self.input.value().to_string();
                self.submit(&line)
            }
            Event::Key(Key::Backspace) => {
                self.input.pop();
                Ok(Vec::new())
            }
            Event::Key(Key::Char(c)) => {
                self.input.push(c);
                Ok(Vec::new())
            }
            Event::Key(_) | Event::Tick => Ok(Vec::new()),
            Event::Submit(line) => {
                // the buffer limit applies to pasted lines too
                self.input.set(&line);
                let line = self.input.value().to_string();
                self.submit(&line)
            }
            Event::Completed(completion) => {
                debug!(label = %completion.label, "completion arrived with no leaf to take it");
                Ok(Vec::new())
            }
        }
    }

    fn submit(&mut self, line: &str) -> Result<Vec<Effect>, ShellError> {
        debug!(line, "user hit enter");
        self.pending_input_error = None;

        let token = line.trim();
        if token.is_empty() {
            self.input.reset();
            return Ok(Vec::new());
        }
        if let Err(err) = self.input.validate(token) {
            debug!(%err, "input rejected");
            self.set_input_error(err);
            return Ok(Vec::new());
        }
        self.input.reset();

        match self.dispatcher.resolve(&self.tree, self.position, token) {
            Resolution::Builtin(builtin) => {
                let outcome = self.dispatcher.execute(builtin, &self.tree, self.position);
                self.position = outcome.position;
                if outcome.quit {
                    info!("quit requested");
                    self.mode = Mode::Quitting;
                }
                Ok(outcome.effects)
            }
            Resolution::Navigate(child) => {
                self.position = child;
                info!(path = self.pwd(), "changed menu");
                Ok(vec![Effect::println(self.pwd())])
            }
            Resolution::Invoke(command) => self.invoke(command),
            Resolution::NotFound => {
                let err = ShellError::NoSuchChild {
                    menu: self.tree.name(self.position).to_string(),
                    token: token.to_string(),
                };
                debug!(%err, "no child found");
                self.set_input_error(err);
                Ok(Vec::new())
            }
        }
    }

    fn invoke(&mut self, command: NodeId) -> Result<Vec<Effect>, ShellError> {
        let factory = match self.tree.node(command).kind() {
            NodeKind::Command { leaf } => leaf.clone(),
            NodeKind::Menu { .. } => {
                return Err(self.fail("menu node dispatched as a command"));
            }
        };

        // fresh instance per call so no state leaks between runs
        let leaf = factory();
        let instance = Uuid::new_v4();
        info!(
            leaf = leaf.name(),
            %instance,
            path = self.tree.path(command),
            "found local command, handing off"
        );
        self.active = Some(ActiveLeaf { instance, leaf });
        self.mode = Mode::Handoff;
        Ok(Vec::new())
    }

    fn set_input_error(&mut self, err: ShellError) {
        debug_assert!(err.is_user_error());
        self.pending_input_error = Some(err);
    }

    fn check_consistency(&self) -> Result<(), ShellError> {
        let handoff = self.mode == Mode::Handoff;
        if self.active.is_some() == handoff {
            return Ok(());
        }
        let leaf = self.active_leaf().unwrap_or("none");
        let message = format!(
            "active command ({}) and mode ({}) are inconsistent",
            leaf, self.mode
        );
        Err(self.fail(&message))
    }

    fn fail(&self, message: &str) -> ShellError {
        error!(mode = %self.mode, path = self.pwd(), "{}", message);
        ShellError::violation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::CHAR_LIMIT;
    use crate::core::leaf::LeafRegistry;
    use crate::core::tree::NodeSpec;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Records every event and returns once it sees "done".
    struct Recorder {
        seen: Rc<RefCell<Vec<Event>>>,
    }

    impl Leaf for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_event(&mut self, ctl: &mut ControllerHandle<'_>, event: &Event) -> Vec<Effect> {
            self.seen.borrow_mut().push(event.clone());
            if *event == Event::Submit("done".to_string()) {
                ctl.return_to_controller();
                return vec![Effect::println("recorder finished")];
            }
            Vec::new()
        }

        fn render(&mut self, ctl: &ControllerHandle<'_>) -> String {
            format!("recording in {}", ctl.position())
        }
    }

    /// Breaks the contract by returning twice.
    struct Stutter;

    impl Leaf for Stutter {
        fn name(&self) -> &str {
            "stutter"
        }

        fn on_event(&mut self, ctl: &mut ControllerHandle<'_>, _event: &Event) -> Vec<Effect> {
            ctl.return_to_controller();
            ctl.return_to_controller();
            Vec::new()
        }

        fn render(&mut self, _ctl: &ControllerHandle<'_>) -> String {
            String::new()
        }
    }

    struct Fixture {
        controller: Controller,
        seen: Rc<RefCell<Vec<Event>>>,
        built: Rc<Cell<u32>>,
    }

    fn fixture() -> Fixture {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let built = Rc::new(Cell::new(0));

        let mut registry = LeafRegistry::new();
        let leaf_seen = seen.clone();
        let leaf_built = built.clone();
        registry.register("recorder", move || {
            leaf_built.set(leaf_built.get() + 1);
            Box::new(Recorder {
                seen: leaf_seen.clone(),
            })
        });
        registry.register("stutter", || Box::new(Stutter));

        let spec = NodeSpec::menu(
            "root",
            vec![
                NodeSpec::menu("menuA", vec![NodeSpec::command("cmdX", "recorder")]),
                NodeSpec::menu(
                    "admin",
                    vec![NodeSpec::menu(
                        "system",
                        vec![NodeSpec::command("broken", "stutter")],
                    )],
                ),
                NodeSpec::command("help", "recorder"),
            ],
        );
        let tree = MenuTree::build(&spec, &registry).unwrap();
        Fixture {
            controller: Controller::new(tree),
            seen,
            built,
        }
    }

    fn submit(controller: &mut Controller, line: &str) -> Vec<Effect> {
        let effects = controller.update(Event::Submit(line.to_string())).unwrap();
        assert_invariant(controller);
        effects
    }

    fn assert_invariant(controller: &Controller) {
        assert_eq!(
            controller.active_leaf().is_some(),
            controller.mode() == Mode::Handoff
        );
    }

    fn printed(effects: &[Effect]) -> Vec<String> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Println(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_navigate_then_invoke() {
        let mut f = fixture();
        let effects = submit(&mut f.controller, "menua");
        assert_eq!(f.controller.pwd(), "root/menuA");
        assert_eq!(printed(&effects), vec!["root/menuA"]);
        assert_eq!(f.controller.mode(), Mode::Prompting);

        let effects = submit(&mut f.controller, "cmdx");
        assert!(effects.is_empty());
        assert_eq!(f.controller.mode(), Mode::Handoff);
        assert_eq!(f.controller.active_leaf(), Some("recorder"));
        assert_eq!(f.built.get(), 1);
    }

    #[test]
    fn test_unknown_child_sets_error() {
        let mut f = fixture();
        let effects = submit(&mut f.controller, "nonexistent");
        assert!(effects.is_empty());
        assert_eq!(f.controller.mode(), Mode::Prompting);
        assert_eq!(f.controller.position(), f.controller.tree().root());
        let err = f.controller.pending_input_error().unwrap();
        assert!(matches!(
            err,
            ShellError::NoSuchChild { menu, token } if menu == "root" && token == "nonexistent"
        ));
    }

    #[test]
    fn test_up_from_two_levels_deep() {
        let mut f = fixture();
        submit(&mut f.controller, "admin");
        submit(&mut f.controller, "system");
        assert_eq!(f.controller.pwd(), "root/admin/system");

        let effects = submit(&mut f.controller, "up");
        assert_eq!(f.controller.pwd(), "root/admin");
        assert_eq!(printed(&effects), vec!["root/admin"]);

        submit(&mut f.controller, "..");
        assert_eq!(f.controller.pwd(), "root");
        let effects = submit(&mut f.controller, "up");
        assert!(effects.is_empty());
        assert_eq!(f.controller.pwd(), "root");
    }

    #[test]
    fn test_handoff_forwards_everything_but_kill() {
        let mut f = fixture();
        submit(&mut f.controller, "menua");
        submit(&mut f.controller, "cmdx");

        for line in ["help", "quit", "up", "exit"] {
            let effects = submit(&mut f.controller, line);
            assert!(effects.is_empty());
            assert_eq!(f.controller.mode(), Mode::Handoff);
        }
        f.controller.update(Event::Key(Key::Help)).unwrap();
        assert_eq!(f.seen.borrow().len(), 5);
        assert_eq!(f.seen.borrow()[0], Event::Submit("help".to_string()));
        assert_eq!(f.controller.pwd(), "root/menuA");

        let effects = f.controller.update(Event::Key(Key::Interrupt)).unwrap();
        assert!(matches!(effects.as_slice(), [Effect::Farewell]));
        assert_eq!(f.controller.mode(), Mode::Quitting);
        assert!(f.controller.active_leaf().is_none());
        assert_invariant(&f.controller);
        assert_eq!(f.seen.borrow().len(), 5);
    }

    #[test]
    fn test_leaf_return_restores_prompting() {
        let mut f = fixture();
        submit(&mut f.controller, "menua");
        submit(&mut f.controller, "cmdx");
        let before = f.controller.position();

        let effects = submit(&mut f.controller, "done");
        assert_eq!(printed(&effects), vec!["recorder finished"]);
        assert_eq!(f.controller.mode(), Mode::Prompting);
        assert!(f.controller.active_leaf().is_none());
        assert_eq!(f.controller.position(), before);

        // back under controller interpretation
        submit(&mut f.controller, "up");
        assert_eq!(f.controller.pwd(), "root");
    }

    #[test]
    fn test_each_invocation_gets_fresh_leaf() {
        let mut f = fixture();
        submit(&mut f.controller, "menua");
        submit(&mut f.controller, "cmdx");
        let first = f.controller.active_instance().unwrap();
        submit(&mut f.controller, "done");
        submit(&mut f.controller, "cmdx");
        let second = f.controller.active_instance().unwrap();
        assert_ne!(first, second);
        assert_eq!(f.built.get(), 2);
    }

    #[test]
    fn test_double_return_is_fatal() {
        let mut f = fixture();
        submit(&mut f.controller, "admin");
        submit(&mut f.controller, "system");
        submit(&mut f.controller, "broken");
        let err = f.controller.update(Event::Tick).unwrap_err();
        assert!(matches!(err, ShellError::ContractViolation(_)));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_builtin_shadows_child() {
        let mut f = fixture();
        let effects = submit(&mut f.controller, "help");
        assert_eq!(f.controller.mode(), Mode::Prompting);
        assert!(f.controller.active_leaf().is_none());
        match effects.as_slice() {
            [Effect::Listing(names)] => assert_eq!(names, &vec!["admin", "help", "menuA"]),
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn test_help_is_idempotent() {
        let mut f = fixture();
        let listing = |effects: Vec<Effect>| match effects.as_slice() {
            [Effect::Listing(names)] => names.clone(),
            other => panic!("unexpected effects: {:?}", other),
        };
        let first = listing(f.controller.update(Event::Key(Key::Help)).unwrap());
        let second = listing(f.controller.update(Event::Key(Key::Help)).unwrap());
        let third = listing(submit(&mut f.controller, "help"));
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_quit_and_exit_builtins() {
        for verb in ["quit", "exit", "EXIT"] {
            let mut f = fixture();
            let effects = submit(&mut f.controller, verb);
            assert!(matches!(effects.as_slice(), [Effect::Farewell]));
            assert!(f.controller.is_quitting());

            // no further input accepted
            let effects = submit(&mut f.controller, "menua");
            assert!(effects.is_empty());
            assert_eq!(f.controller.pwd(), "root");
            let effects = f.controller.update(Event::Key(Key::Escape)).unwrap();
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn test_invalid_characters_rejected() {
        let mut f = fixture();
        submit(&mut f.controller, "menu a");
        assert!(matches!(
            f.controller.pending_input_error(),
            Some(ShellError::InvalidInput { .. })
        ));
        assert_eq!(f.controller.input(), "menu a");
        assert_eq!(f.controller.pwd(), "root");
    }

    #[test]
    fn test_submitted_line_cut_at_limit() {
        let mut f = fixture();
        // the stray digit sits past the limit and is dropped before validation
        let line = format!("menua{}1", " ".repeat(CHAR_LIMIT - 5));
        let effects = submit(&mut f.controller, &line);
        assert!(f.controller.pending_input_error().is_none());
        assert_eq!(printed(&effects), vec!["root/menuA"]);
    }

    #[test]
    fn test_handoff_render_without_leaf_is_fatal() {
        let mut f = fixture();
        f.controller.mode = Mode::Handoff;
        let err = f.controller.render().unwrap_err();
        assert!(matches!(err, ShellError::ContractViolation(_)));
    }

    #[test]
    fn test_empty_submit_is_noop() {
        let mut f = fixture();
        let effects = submit(&mut f.controller, "   ");
        assert!(effects.is_empty());
        assert!(f.controller.pending_input_error().is_none());
        assert_eq!(f.controller.pwd(), "root");
    }

    #[test]
    fn test_key_editing_and_enter() {
        let mut f = fixture();
        for c in "menuaz".chars() {
            f.controller.update(Event::Key(Key::Char(c))).unwrap();
        }
        f.controller.update(Event::Key(Key::Backspace)).unwrap();
        assert_eq!(f.controller.render().unwrap(), "root > menua");

        let effects = f.controller.update(Event::Key(Key::Enter)).unwrap();
        assert_eq!(printed(&effects), vec!["root/menuA"]);
        assert_eq!(f.controller.input(), "");
    }

    #[test]
    fn test_error_rendered_exactly_once() {
        let mut f = fixture();
        assert_eq!(f.controller.render().unwrap(), "root > ");
        submit(&mut f.controller, "nonexistent");
        assert_eq!(
            f.controller.render().unwrap(),
            "root > \nroot has no child 'nonexistent'"
        );
        assert_eq!(f.controller.render().unwrap(), "root > ");
    }

    #[test]
    fn test_error_cleared_by_next_submit() {
        let mut f = fixture();
        submit(&mut f.controller, "nonexistent");
        submit(&mut f.controller, "menua");
        assert!(f.controller.pending_input_error().is_none());
    }

    #[test]
    fn test_handoff_renders_leaf_only() {
        let mut f = fixture();
        submit(&mut f.controller, "menua");
        submit(&mut f.controller, "cmdx");
        assert_eq!(f.controller.render().unwrap(), "recording in root/menuA");
    }

    #[test]
    fn test_completion_without_leaf_is_dropped() {
        let mut f = fixture();
        let effects = f
            .controller
            .update(Event::Completed(crate::core::event::Completion {
                label: "late".to_string(),
                output: "ignored".to_string(),
            }))
            .unwrap();
        assert!(effects.is_empty());
        assert_eq!(f.controller.mode(), Mode::Prompting);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Prompting.to_string(), "prompting");
        assert_eq!(Mode::Handoff.to_string(), "handoff");
        assert_eq!(Mode::Returning.to_string(), "returning");
        assert_eq!(Mode::Quitting.to_string(), "quitting");
    }
}
