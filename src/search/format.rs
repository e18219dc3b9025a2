//! Plain-text rendering of search results for agents.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::store::{Hit, Record};

/// Returned when a search matches nothing.
pub const NO_RESULTS: &str = "No results found.";

/// Fields shown for a channel description, in order.
pub const DESCRIPTION_FIELDS: [&str; 6] = [
    "platform_name",
    "system",
    "device",
    "channame",
    "chanunits",
    "description",
];

/// Characters of manual content shown per excerpt.
pub const EXCERPT_CHARS: usize = 500;

/// Renders hits as `[i] | field: value | ...`, one per line.
///
/// Fields without a meaningful value are left out.
#[must_use]
pub fn fields(hits: &[Hit], names: &[&str]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut parts = vec![format!("[{}]", i + 1)];
            parts.extend(
                names
                    .iter()
                    .filter(|name| hit.record.has_value(name))
                    .map(|name| format!("{name}: {}", hit.record.text(name))),
            );
            parts.join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered(hits: &[Hit], render: impl Fn(usize, &Record) -> String) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| render(i + 1, &hit.record))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whether a dependency record is computed from other channels.
#[must_use]
pub fn is_derived(record: &Record) -> bool {
    record.int("input_count") > 0
}

/// Renders dependency hits with their inputs and outputs.
#[must_use]
pub fn dependencies(hits: &[Hit]) -> String {
    numbered(hits, |i, r| {
        let node_type = if is_derived(r) { "DERIVED" } else { "RAW" };
        let mut out = format!(
            "[{i}] {} | {} ({node_type})\n    Device: {} | Units: {}",
            r.text("platform_name"),
            r.text("name"),
            r.text("device"),
            r.text("units"),
        );
        if r.has_value("inputs") {
            let _ = write!(out, "\n    <- Inputs: {}", r.text("inputs"));
        }
        if r.has_value("outputs") {
            let _ = write!(out, "\n    -> Outputs: {}", r.text("outputs"));
        }
        out
    })
}

/// Renders sensor location and coordinate-frame hits.
#[must_use]
pub fn coordinates(hits: &[Hit]) -> String {
    numbered(hits, |i, r| {
        format!(
            "[{i}] {} | Sensor: {}\n    Location: X={}, Y={}, Z={}\n    Coord System: +X={}, +Y={}, +Z={}\n    Platform Heading: {}° from True North\n    Lat/Lon: {}, {}",
            r.text("platform_name"),
            r.text("sensor_name"),
            r.text_or("x", "N/A"),
            r.text_or("y", "N/A"),
            r.text_or("z", "N/A"),
            r.text("coord_system_x"),
            r.text("coord_system_y"),
            r.text("coord_system_z"),
            r.text_or("heading_deg", "N/A"),
            r.text("latitude"),
            r.text("longitude"),
        )
    })
}

/// Renders O&M manual excerpts.
#[must_use]
pub fn oandm(hits: &[Hit]) -> String {
    numbered(hits, |i, r| {
        let content: String = r.text("content").chars().take(EXCERPT_CHARS).collect();
        format!(
            "[{i}] {} | {}\n    (Chunk {} of {})\n    Content: {content}...",
            r.text("platform_name"),
            r.text("document_name"),
            r.int("chunk_id") + 1,
            r.text_or("total_chunks", "?"),
        )
    })
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim)
}

/// Renders the full lineage of one dependency record.
#[must_use]
pub fn lineage(r: &Record) -> String {
    let mut out = format!(
        "Channel: {}\nPlatform: {} ({})\nSystem: {}\nDevice: {}\nUnits: {}\nCategory: {}\nType: {}",
        r.text_or("name", "Unknown"),
        r.text("platform_name"),
        r.text("platform_alias"),
        r.text("system"),
        r.text("device"),
        r.text("units"),
        r.text("category"),
        if is_derived(r) { "DERIVED" } else { "RAW/MEASURED" },
    );

    if r.has_value("inputs") {
        out.push_str("\n\nUpstream Inputs (this channel is derived from):");
        for input in split_list(&r.text("inputs")) {
            let _ = write!(out, "\n  <- {input}");
        }
    } else {
        out.push_str("\n\nUpstream Inputs: None (raw sensor data)");
    }

    if r.has_value("outputs") {
        out.push_str("\n\nDownstream Outputs (channels derived from this):");
        for output in split_list(&r.text("outputs")) {
            let _ = write!(out, "\n  -> {output}");
        }
    } else {
        out.push_str("\n\nDownstream Outputs: None (terminal channel)");
    }

    out
}

/// Renders the platform inventory; keys are already sorted.
#[must_use]
pub fn platforms(inventory: &BTreeMap<String, Vec<&str>>) -> String {
    let mut out = format!("Available Platforms:\n{}", "-".repeat(50));
    for (platform, tables) in inventory {
        let _ = write!(out, "\n{platform}: [{}]", tables.join(", "));
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap_or_else(|e| panic!("{e}"))
    }

    fn hit(value: Value) -> Hit {
        Hit {
            id: 1,
            record: record(value),
            distance: 0.0,
        }
    }

    #[test]
    fn test_empty_hits_render_no_results() {
        assert_eq!(fields(&[], &DESCRIPTION_FIELDS), "No results found.");
        assert_eq!(dependencies(&[]), "No results found.");
        assert_eq!(coordinates(&[]), "No results found.");
        assert_eq!(oandm(&[]), "No results found.");
    }

    #[test]
    fn test_fields_skips_empty_values() {
        let hits = [
            hit(json!({
                "platform_name": "Constitution",
                "system": "",
                "device": "6DOF",
                "channame": "ROLL_RATE",
                "chanunits": "deg/s",
                "description": "Body roll rate",
                "extra": "ignored"
            })),
            hit(json!({"channame": "WSPD"})),
        ];
        assert_eq!(
            fields(&hits, &DESCRIPTION_FIELDS),
            "[1] | platform_name: Constitution | device: 6DOF | channame: ROLL_RATE | chanunits: deg/s | description: Body roll rate\n[2] | channame: WSPD"
        );
    }

    #[test]
    fn test_dependencies_derived_and_raw() {
        let hits = [
            hit(json!({
                "platform_name": "Atlantis", "name": "WSPD_TRUE", "device": "Met",
                "units": "m/s", "input_count": 2, "inputs": "WSPD_REL, HEADING", "outputs": ""
            })),
            hit(json!({"platform_name": "Atlantis", "name": "HEADING", "input_count": 0, "outputs": "WSPD_TRUE"})),
        ];
        assert_eq!(
            dependencies(&hits),
            "[1] Atlantis | WSPD_TRUE (DERIVED)\n    Device: Met | Units: m/s\n    <- Inputs: WSPD_REL, HEADING\n\n\
             [2] Atlantis | HEADING (RAW)\n    Device:  | Units: \n    -> Outputs: WSPD_TRUE"
        );
    }

    #[test]
    fn test_coordinates_defaults() {
        let hits = [hit(json!({
            "platform_name": "Atlantis", "sensor_name": "GPS", "x": 1.5, "y": -2,
            "coord_system_x": "Bow", "coord_system_y": "Port", "coord_system_z": "Up",
            "latitude": 41.5, "longitude": -70.6
        }))];
        assert_eq!(
            coordinates(&hits),
            "[1] Atlantis | Sensor: GPS\n    Location: X=1.5, Y=-2, Z=N/A\n    Coord System: +X=Bow, +Y=Port, +Z=Up\n    Platform Heading: N/A° from True North\n    Lat/Lon: 41.5, -70.6"
        );
    }

    #[test]
    fn test_oandm_truncates_and_numbers_chunks() {
        let long = "a".repeat(600);
        let hits = [
            hit(json!({"platform_name": "P", "document_name": "Manual.pdf", "chunk_id": 2, "total_chunks": 9, "content": long})),
            hit(json!({"platform_name": "P", "document_name": "Other.pdf", "content": "short"})),
        ];
        let out = oandm(&hits);
        assert!(out.starts_with("[1] P | Manual.pdf\n    (Chunk 3 of 9)\n    Content: "));
        assert!(out.contains(&format!("Content: {}...\n\n", "a".repeat(500))));
        assert!(out.ends_with("[2] P | Other.pdf\n    (Chunk 1 of ?)\n    Content: short..."));
    }

    #[test]
    fn test_oandm_truncation_respects_char_boundaries() {
        let content = "é".repeat(501);
        let out = oandm(&[hit(json!({"content": content}))]);
        assert!(out.ends_with(&format!("Content: {}...", "é".repeat(500))));
    }

    #[test]
    fn test_lineage_derived() {
        let r = record(json!({
            "name": "WSPD_TRUE", "platform_name": "Atlantis", "platform_alias": "AT",
            "system": "Met", "device": "Anemometer", "units": "m/s", "category": "Wind",
            "input_count": 2, "inputs": "WSPD_REL,HEADING", "outputs": ""
        }));
        assert_eq!(
            lineage(&r),
            "Channel: WSPD_TRUE\nPlatform: Atlantis (AT)\nSystem: Met\nDevice: Anemometer\nUnits: m/s\nCategory: Wind\nType: DERIVED\n\n\
             Upstream Inputs (this channel is derived from):\n  <- WSPD_REL\n  <- HEADING\n\n\
             Downstream Outputs: None (terminal channel)"
        );
    }

    #[test]
    fn test_lineage_raw_with_outputs() {
        let r = record(json!({"platform_name": "Atlantis", "outputs": "A, B"}));
        let out = lineage(&r);
        assert!(out.starts_with("Channel: Unknown\n"));
        assert!(out.contains("Type: RAW/MEASURED"));
        assert!(out.contains("Upstream Inputs: None (raw sensor data)"));
        assert!(out.ends_with("Downstream Outputs (channels derived from this):\n  -> A\n  -> B"));
    }

    #[test]
    fn test_platforms_listing() {
        let mut inventory = BTreeMap::new();
        inventory.insert("Constitution".to_string(), vec!["desc", "depe"]);
        inventory.insert("Atlantis".to_string(), vec!["coor"]);
        assert_eq!(
            platforms(&inventory),
            format!(
                "Available Platforms:\n{}\nAtlantis: [coor]\nConstitution: [desc, depe]",
                "-".repeat(50)
            )
        );
    }
}
