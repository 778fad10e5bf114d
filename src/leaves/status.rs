//! Determines and reports on the current system status.

use chrono::Utc;

use crate::core::event::{Effect, Event};
use crate::core::leaf::{ControllerHandle, Leaf};

pub struct StatusCmd {
    dots: String, // placeholder while waiting for the first event
}

impl StatusCmd {
    pub fn new() -> Self {
        Self {
            dots: String::new(),
        }
    }
}

impl Leaf for StatusCmd {
    fn name(&self) -> &str {
        "status"
    }

    fn on_event(&mut self, ctl: &mut ControllerHandle<'_>, _event: &Event) -> Vec<Effect> {
        ctl.return_to_controller();
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        vec![Effect::println(format!("Status: All is well ({})", now))]
    }

    // only visible momentarily, the report goes out as a printed line
    fn render(&mut self, _ctl: &ControllerHandle<'_>) -> String {
        self.dots.push('.');
        self.dots.clone()
    }
}
