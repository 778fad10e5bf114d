//! Commands shipped with the shell and the demo tree that uses them.

mod hardware;
mod ping;
mod status;

pub use hardware::HardwareCmd;
pub use ping::PingCmd;
pub use status::StatusCmd;

use crate::core::leaf::LeafRegistry;
use crate::core::tree::NodeSpec;

pub fn registry() -> LeafRegistry {
    let mut registry = LeafRegistry::new();
    registry.register("status", || Box::new(StatusCmd::new()));
    registry.register("ping", || Box::new(PingCmd));
    registry.register("hardware", || Box::new(HardwareCmd::new()));
    registry
}

/// root
/// |-- admin
/// |    |-- users
/// |    |-- system
/// |         |-- status
/// |         |-- hardware
/// |-- search
/// |-- ping
pub fn default_tree() -> NodeSpec {
    NodeSpec::menu(
        "root",
        vec![
            NodeSpec::menu(
                "admin",
                vec![
                    NodeSpec::menu("users", vec![]),
                    NodeSpec::menu(
                        "system",
                        vec![
                            NodeSpec::command("status", "status"),
                            NodeSpec::command("hardware", "hardware"),
                        ],
                    ),
                ],
            ),
            NodeSpec::menu("search", vec![]),
            NodeSpec::command("ping", "ping"),
        ],
    )
}
