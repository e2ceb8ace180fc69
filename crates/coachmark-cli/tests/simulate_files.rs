#![forbid(unsafe_code)]

//! End-to-end `simulate` and `place` runs over files on disk.

use std::io::Write;
use std::path::PathBuf;

use coachmark_cli::place::{PlaceArgs, run_place};
use coachmark_cli::simulate::{SimulateArgs, run_simulate};
use coachmark_core::geometry::{Rect, Size};
use coachmark_layout::Side;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create");
    file.write_all(contents.as_bytes()).expect("write");
    path
}

fn run(args: &SimulateArgs) -> Vec<Value> {
    let mut out = Vec::new();
    run_simulate(args, &mut out).expect("simulate");
    String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

fn fixture(dir: &TempDir, script: &str, config: Option<(&str, &str)>) -> SimulateArgs {
    let steps = write(
        dir,
        "steps.json",
        r##"[
            {"title": "tour.welcome"},
            {"target": "#upload", "title": "tour.upload", "interactive": true},
            {"target": "#missing", "title": "tour.missing"}
        ]"##,
    );
    let layout = write(
        dir,
        "layout.json",
        r##"{"#upload": {"top": 300.0, "left": 400.0, "width": 100.0, "height": 40.0}}"##,
    );
    let script = write(dir, "script.txt", script);
    SimulateArgs {
        steps,
        layout: Some(layout),
        script,
        config: config.map(|(name, body)| write(dir, name, body)),
        viewport: Size::new(1280.0, 800.0),
        progress_steps: 5,
    }
}

#[test]
fn unresolvable_last_step_completes_the_tour() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lines = run(&fixture(&dir, "open\nnext\nwait 50\nclick 450 320\nwait 50\n", None));

    assert_eq!(lines.len(), 6);
    assert_eq!(lines[2]["anchor"]["resolved"]["left"], 400.0);
    assert_eq!(lines[3]["consumed"], true);
    assert_eq!(lines[4]["events"][0]["type"], "completed");
    assert_eq!(lines[4]["events"][0]["reason"], "skipped");
    assert_eq!(lines[4]["phase"], "completed");

    let summary = &lines[5]["summary"];
    assert_eq!(summary["completed"], 1);
    assert_eq!(summary["cancelled"], 0);
    assert_eq!(summary["view"], Value::Null);
}

#[test]
fn json_config_disables_skipping() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = fixture(
        &dir,
        r#"["open", "jump 2", "wait 10"]"#,
        Some(("tour.json", r#"{"skip_unresolved": false, "settle_delay_ms": 10}"#)),
    );
    let lines = run(&args);

    assert_eq!(lines[2]["anchor"], "missing");
    assert_eq!(lines[2]["placement"]["side"], "center");
    let view = &lines[3]["summary"]["view"];
    assert_eq!(view["progress"], "3 / 3");
    assert_eq!(view["highlight"], Value::Null);
}

#[test]
fn invalid_toml_config_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = fixture(&dir, "open\n", Some(("tour.toml", "highlight_padding = -1.0\n")));
    let mut out = Vec::new();
    let err = run_simulate(&args, &mut out).unwrap_err();
    assert!(err.to_string().contains("highlight_padding"), "{err}");
    assert!(out.is_empty());
}

#[test]
fn bad_script_line_is_a_usage_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = fixture(&dir, "open\nteleport\n", None);
    let err = run_simulate(&args, &mut Vec::new()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn place_prints_clamped_placement() {
    let args = PlaceArgs {
        anchor: Some(Rect::new(10.0, 10.0, 40.0, 20.0)),
        tooltip: Size::new(200.0, 100.0),
        side: Side::Top,
        viewport: Size::new(800.0, 600.0),
        gap: 16.0,
        margin: 16.0,
        arrow_size: 8.0,
    };
    let mut out = Vec::new();
    run_place(&args, &mut out).expect("place");
    let value: Value = serde_json::from_slice(&out).expect("json");
    // No room above; flips below.
    assert_eq!(value["placement"]["side"], "bottom");
    assert_eq!(value["placement"]["tooltip_top"], 46.0);
    assert_eq!(value["placement"]["tooltip_left"], 16.0);
}
