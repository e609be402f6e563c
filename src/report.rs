//! Plain-text summary of a design for `yardplan inspect`.

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;

use std::fmt::Write as _;

use planner::doc::Design;
use planner::render::{fence_label, scale_label, tree_diameter};

/// Multi-line summary: location, scale, every fence and tree, then notes.
pub fn summarize(design: &Design) -> String {
    let mut out = String::new();
    let address = if design.address().is_empty() { "(none)" } else { design.address() };
    let map = if design.map_loaded() { "map loaded" } else { "no map" };
    // Writing into a String never fails.
    _ = writeln!(out, "Address: {address} ({map})");
    _ = writeln!(out, "{}", scale_label(design.scale()).unwrap_or_else(|| "Scale: uncalibrated".to_owned()));

    _ = writeln!(out, "Fences ({}):", design.fences().len());
    for fence in design.fences() {
        _ = writeln!(out, "  #{} {} ({:.1} px)", fence.id, fence_label(fence), fence.pixel_length());
    }

    _ = writeln!(out, "Trees ({}):", design.trees().len());
    for tree in design.trees() {
        _ = writeln!(out, "  #{} {}: {} across", tree.id, tree.name, tree_diameter(tree, design.scale()));
    }

    if !design.notes().is_empty() {
        _ = writeln!(out, "Notes:");
        for line in design.notes().lines() {
            _ = writeln!(out, "  {line}");
        }
    }
    out.truncate(out.trim_end().len());
    out
}
