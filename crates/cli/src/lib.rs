//! Slotlist batch driver
//!
//! Non-interactive front end for the `slotlist` arena and lists: parses a
//! command script, runs it against one shared arena, and reports the final
//! state.
//!
//! # Modules
//!
//! - `config`: TOML configuration (capacity, eviction policy, report format)
//! - `script`: command script parser
//! - `engine`: executes commands, including evict-and-retry on a full arena
//! - `report`: end-of-run summary as text or JSON

pub mod config;
pub mod engine;
pub mod report;
pub mod script;

pub use config::{EvictionPolicy, ReportFormat, SlotlistConfig};
pub use engine::Engine;
pub use report::Report;
pub use script::{Command, ScriptLine, parse_script};

use slotlist::NodeArena;

/// Outcome of running a script end to end
#[derive(Debug)]
pub struct RunOutput {
    /// Lines printed by the script's commands
    pub lines: Vec<String>,
    /// Final arena and list state
    pub report: Report,
    /// First failing command, if the script stopped early
    pub error: Option<String>,
}

/// Parse and run `source` against a fresh arena built from `config`.
///
/// Parse errors are returned as `Err`; a command failure still produces a
/// report of the state reached before it.
pub fn run_source(source: &str, config: &SlotlistConfig) -> Result<RunOutput, String> {
    let script = parse_script(source)?;
    let arena = NodeArena::shared(config.capacity);
    let mut engine = Engine::new(&arena, config.eviction);

    let mut lines = Vec::new();
    let error = engine.run(&script, |line| lines.push(line)).err();
    let report = engine.report();
    Ok(RunOutput {
        lines,
        report,
        error,
    })
}
