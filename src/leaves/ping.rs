use crate::core::event::{Effect, Event};
use crate::core::leaf::{ControllerHandle, Leaf};

pub struct PingCmd;

impl Leaf for PingCmd {
    fn name(&self) -> &str {
        "ping"
    }

    fn on_event(&mut self, ctl: &mut ControllerHandle<'_>, _event: &Event) -> Vec<Effect> {
        ctl.return_to_controller();
        vec![Effect::println("I ping, therefore I am alive")]
    }

    fn render(&mut self, _ctl: &ControllerHandle<'_>) -> String {
        ".".to_string()
    }
}
