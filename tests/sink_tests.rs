//! On-disk format of the JSONL compliance sink.

use std::fs;

use mlperf_hooks_rs::sink::MLLOG_PREFIX;
use mlperf_hooks_rs::{EventSink, JsonlSink, Metadata};
use serde_json::Value;
use tempfile::TempDir;

fn read_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn parse_line(line: &str) -> Value {
    let json = line.strip_prefix(MLLOG_PREFIX).expect("missing MLLOG prefix");
    serde_json::from_str(json).unwrap()
}

#[test]
fn every_record_is_one_prefixed_json_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("compliance.log");
    let mut sink = JsonlSink::create(Some(path.as_path())).unwrap();

    sink.start("run_start", Some(Value::String(String::new())), None)
        .unwrap();
    sink.event("seed", Some(1234.into()), None).unwrap();
    let mut metadata = Metadata::new();
    metadata.insert("status".to_string(), "success".into());
    sink.end("run_stop", Some(0.05.into()), Some(metadata))
        .unwrap();

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 3);

    let start = parse_line(&lines[0]);
    assert_eq!(start["event_type"], "INTERVAL_START");
    assert_eq!(start["key"], "run_start");
    assert_eq!(start["value"], "");
    assert_eq!(start["namespace"], "");
    assert!(start["time_ms"].as_i64().unwrap() > 0);

    let event = parse_line(&lines[1]);
    assert_eq!(event["event_type"], "POINT_IN_TIME");
    assert_eq!(event["key"], "seed");
    assert_eq!(event["value"], 1234);

    let stop = parse_line(&lines[2]);
    assert_eq!(stop["event_type"], "INTERVAL_END");
    assert_eq!(stop["value"], 0.05);
    assert_eq!(stop["metadata"]["status"], "success");
}

#[test]
fn absent_value_and_metadata_serialize_as_null() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("compliance.log");
    let mut sink = JsonlSink::create(Some(path.as_path())).unwrap();

    sink.event("run_stop", None, None).unwrap();

    let record = parse_line(&read_lines(&path)[0]);
    assert!(record["value"].is_null());
    assert!(record["metadata"].is_null());
}

#[test]
fn reopening_appends_rather_than_truncates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("compliance.log");

    {
        let mut sink = JsonlSink::create(Some(path.as_path())).unwrap();
        sink.event("seed", Some(1.into()), None).unwrap();
    }
    {
        let mut sink = JsonlSink::create(Some(path.as_path())).unwrap();
        sink.event("seed", Some(2.into()), None).unwrap();
    }

    assert_eq!(read_lines(&path).len(), 2);
}

#[test]
fn sink_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("compliance.log");
    let sink = JsonlSink::create(Some(path.as_path())).unwrap();
    assert_eq!(sink.path(), path);
}

#[test]
fn timestamps_are_non_decreasing_across_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("compliance.log");
    let mut sink = JsonlSink::create(Some(path.as_path())).unwrap();

    for step in 0..5 {
        sink.event("train_loss", Some(f64::from(step).into()), None)
            .unwrap();
    }

    let lines = read_lines(&path);
    let times: Vec<i64> = lines
        .iter()
        .map(|line| parse_line(line)["time_ms"].as_i64().unwrap())
        .collect();
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
}
