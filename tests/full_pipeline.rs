use std::path::Path;

use dsfp::{
    analyze, golden, load_reference, write_collection, AnalyzeOptions, DsfpConfig, PipelineError,
    UsedEntries,
};
use serde_json::{json, Value};

fn reference_rows() -> Vec<Value> {
    (0..1000)
        .map(|i| json!({ "instruction": format!("task {i}"), "output": i }))
        .collect()
}

/// 1000 reference records; 50 participants who all submit positions 0..50.
fn scenario(root: &Path) -> Vec<Value> {
    let reference = reference_rows();
    let data = root.join("data");
    write_collection(&data.join("eval_data/data.jsonl"), &reference).unwrap();
    for uid in 0..50 {
        write_collection(
            &data.join(format!("miner_{uid}/data.jsonl")),
            &reference[..50],
        )
        .unwrap();
    }
    reference
}

#[test]
fn golden_scenario_end_to_end() -> Result<(), PipelineError> {
    let tmp = tempfile::tempdir().unwrap();
    let reference = scenario(tmp.path());
    let data = tmp.path().join("data");
    let output = tmp.path().join("golden_dataset/data.jsonl");

    let mut cfg = DsfpConfig::default();
    cfg.golden.target_size = 100;
    cfg.golden.seed = Some(99);

    let analysis = analyze(
        &data,
        &data.join("eval_data/data.jsonl"),
        &cfg,
        &AnalyzeOptions::default(),
    )?;
    assert_eq!(analysis.analyzed_count, 50);
    assert_eq!(analysis.min_count, 25);
    assert_eq!(analysis.golden.len(), 50);
    assert!(analysis.golden.iter().all(|g| g.count == 50 && g.position < 50));
    assert_eq!(analysis.analysis.unique_hashes(), 1);
    assert_eq!(analysis.analysis.contiguous_count(), 50);

    let outcome = golden(
        &data,
        &data.join("eval_data/data.jsonl"),
        &output,
        &cfg,
        &AnalyzeOptions::default(),
    )?;
    let sel = &outcome.selection;
    assert_eq!(sel.len(), 100);
    assert_eq!(sel.golden_unique, 0);
    assert_eq!(sel.golden_reused, 50);
    assert_eq!(sel.filled, 50);
    assert_eq!(sel.shortfall, 0);
    assert!(sel.positions[..50].iter().all(|&p| p < 50));
    assert!(sel.positions[50..].iter().all(|&p| (50..1000).contains(&p)));

    let written = load_reference(&output)?;
    assert_eq!(written.len(), 100);
    assert_eq!(written.distinct_len(), 100);
    let participants_used = UsedEntries::from_collections([&dsfp::Collection::from_records(
        "miner",
        reference[..50].to_vec(),
    )]);
    let reused = written
        .fingerprints()
        .iter()
        .filter(|fp| participants_used.contains(fp))
        .count();
    assert_eq!(reused, 50);

    assert_eq!(outcome.verification.max_overlap, 50);
    assert!(outcome.verification.passes());
    Ok(())
}

#[test]
fn golden_respects_reused_cap_at_default_size() -> Result<(), PipelineError> {
    let tmp = tempfile::tempdir().unwrap();
    let reference = reference_rows();
    let data = tmp.path().join("data");
    write_collection(&data.join("eval_data/data.jsonl"), &reference).unwrap();
    for uid in 0..10 {
        write_collection(
            &data.join(format!("miner_{uid}/data.jsonl")),
            &reference[..200],
        )
        .unwrap();
    }

    let mut cfg = DsfpConfig::default();
    cfg.golden.seed = Some(1);
    let outcome = golden(
        &data,
        &data.join("eval_data/data.jsonl"),
        &tmp.path().join("out.jsonl"),
        &cfg,
        &AnalyzeOptions::default(),
    )?;

    assert_eq!(outcome.golden_available, 200);
    assert_eq!(outcome.selection.len(), 250);
    assert_eq!(outcome.selection.golden_reused, 80);
    assert_eq!(outcome.selection.filled, 170);
    assert_eq!(outcome.verification.max_overlap, 80);
    Ok(())
}
