//! End-of-run report
//!
//! Snapshot of the arena occupancy and every named list, rendered as
//! human-readable text or JSON.

use crate::config::ReportFormat;
use serde::Serialize;
use slotlist::{ArenaStats, SlotIndex};
use std::collections::BTreeMap;

/// One list's contents and the slots holding them
#[derive(Debug, Clone, Serialize)]
pub struct ListReport {
    pub values: Vec<String>,
    pub slots: Vec<SlotIndex>,
}

/// Collected state for the report
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub arena: ArenaStats,
    pub free_slots: Vec<SlotIndex>,
    pub lists: BTreeMap<String, ListReport>,
    pub commands: usize,
    pub evictions: usize,
}

impl Report {
    pub fn render(&self, format: ReportFormat) -> Result<String, String> {
        match format {
            ReportFormat::Human => Ok(self.render_human()),
            ReportFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| format!("Failed to encode report: {}", e)),
        }
    }

    fn render_human(&self) -> String {
        let mut out = String::new();
        out.push_str("=== slotlist report ===\n");
        out.push_str(&format!(
            "arena: capacity {}, used {}, free {}\n",
            self.arena.capacity, self.arena.used, self.arena.free
        ));
        out.push_str(&format!(
            "commands: {}, evictions: {}\n",
            self.commands, self.evictions
        ));
        for (name, list) in &self.lists {
            let slots: Vec<String> = list.slots.iter().map(|s| s.to_string()).collect();
            out.push_str(&format!(
                "{}: [{}] (slots {})\n",
                name,
                list.values.join(", "),
                slots.join(" ")
            ));
        }
        out
    }
}
