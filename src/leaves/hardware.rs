//! Probes the host off the event thread and reports once the probe comes back.

use std::thread;

use uuid::Uuid;

use crate::core::event::{Effect, Event, Job};
use crate::core::leaf::{ControllerHandle, Leaf};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Probing,
}

pub struct HardwareCmd {
    stage: Stage,
    frame: usize,
    /// Unique per instance, so a probe left over from an earlier run is
    /// never mistaken for ours.
    job_label: String,
}

impl HardwareCmd {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            frame: 0,
            job_label: format!("hardware-{}", Uuid::new_v4()),
        }
    }
}

fn probe() -> String {
    let cpus = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    format!(
        "Hardware: {} logical CPUs, {}/{}",
        cpus,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

impl Leaf for HardwareCmd {
    fn name(&self) -> &str {
        "hardware"
    }

    fn on_event(&mut self, ctl: &mut ControllerHandle<'_>, event: &Event) -> Vec<Effect> {
        match (self.stage, event) {
            (Stage::Idle, _) => {
                tracing::debug!(from = ctl.position(), "probing hardware");
                self.stage = Stage::Probing;
                vec![Effect::Spawn(Job::new(self.job_label.clone(), probe))]
            }
            (Stage::Probing, Event::Completed(done)) if done.label == self.job_label => {
                ctl.return_to_controller();
                vec![Effect::println(done.output.clone())]
            }
            (Stage::Probing, _) => {
                self.frame = (self.frame + 1) % SPINNER.len();
                Vec::new()
            }
        }
    }

    fn render(&mut self, _ctl: &ControllerHandle<'_>) -> String {
        match self.stage {
            Stage::Idle => "probing hardware".to_string(),
            Stage::Probing => format!("probing hardware {}", SPINNER[self.frame]),
        }
    }
}
