//! Integration tests for userlist-gen
//!
//! These run the full pipeline against temporary directories.

use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use userlist_gen::cancel::CancelToken;
use userlist_gen::error::{MergeError, PipelineError};
use userlist_gen::membership::{Category, MembershipTable};
use userlist_gen::merge::merge_files;
use userlist_gen::pipeline::{Phase, Pipeline};
use userlist_gen::record::{parse_line, Record, Score};
use userlist_gen::sample::{target_count, SamplingStrategy};
use userlist_gen::PipelineConfig;

const PROBS: [f64; 7] = [0.25, 0.35, 0.25, 0.06, 0.03, 0.04, 0.02];

fn config(output: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::new(MembershipTable::new(PROBS).unwrap(), output);
    config.users = 1000;
    config.shards = 4;
    config.max_workers = 4;
    config.sampling_rate = 0.1;
    config.strategy = SamplingStrategy::ExactCount;
    config.seed = 20240611;
    config
}

fn read_records(path: &Path) -> Vec<Record> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| parse_line(line).unwrap())
        .collect()
}

fn assert_sorted_desc(records: &[Record]) {
    for pair in records.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "{} before {}",
            pair[0].to_line(),
            pair[1].to_line()
        );
    }
}

#[test]
fn test_end_to_end_exact_sampling() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");

    let report = Pipeline::new(config(&out)).unwrap().run().unwrap();
    assert_eq!(report.identifiers, 1000);
    assert!(report.work_removed);
    assert!(!out.join("work").exists());

    let mut all_ids = HashSet::new();
    for category in Category::ALL {
        let list = read_records(&out.join(format!("list{}.tsv", category.number())));
        assert!(!list.is_empty());
        assert_sorted_desc(&list);
        assert_eq!(list.len() as u64, report.category(category).list_rows);

        // an identifier appears at most once per list
        let ids: HashSet<_> = list.iter().map(|r| r.identifier.clone()).collect();
        assert_eq!(ids.len(), list.len());
        all_ids.extend(ids);

        let sample = read_records(&out.join(format!("sample{}.tsv", category.number())));
        assert_eq!(sample.len() as u64, target_count(0.1, list.len() as u64));
        assert_eq!(sample.len() as u64, report.category(category).sample_rows);

        // sample rows come from the list, in list order
        let mut it = list.iter();
        for row in &sample {
            assert!(it.any(|r| r == row), "{} not in list order", row.to_line());
        }
    }

    // every identifier belongs to at least one category
    assert_eq!(all_ids.len(), 1000);
}

#[test]
fn test_end_to_end_bernoulli_sampling() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");
    let mut cfg = config(&out);
    cfg.users = 20_000;
    cfg.strategy = SamplingStrategy::Bernoulli;
    cfg.sampling_rate = 0.5;

    let report = Pipeline::new(cfg).unwrap().run().unwrap();

    for category in &report.categories {
        let expected = category.list_rows as f64 * 0.5;
        let sd = (category.list_rows as f64 * 0.25).sqrt();
        let found = category.sample_rows as f64;
        assert!(
            (found - expected).abs() < 5.0 * sd,
            "category {}: {} rows, expected about {}",
            category.category,
            found,
            expected
        );
    }
}

#[test]
fn test_category_sizes_track_probabilities() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");
    let mut cfg = config(&out);
    cfg.users = 50_000;

    let report = Pipeline::new(cfg.clone()).unwrap().run().unwrap();

    for category in Category::ALL {
        let p = cfg.table.category_probability(category);
        let expected = p * 50_000.0;
        let sd = (50_000.0 * p * (1.0 - p)).sqrt();
        let found = report.category(category).list_rows as f64;
        assert!((found - expected).abs() < 5.0 * sd);
    }
}

#[test]
fn test_missing_shard_fails_merge() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");
    let pipeline = Pipeline::new(config(&out)).unwrap();
    let missing = pipeline.layout().shard_file(1, Category::Two);

    let mut phases = Vec::new();
    let err = pipeline
        .run_with(|phase| {
            if phase == Phase::Merge {
                fs::remove_file(&missing).unwrap();
            }
            phases.push(phase);
        })
        .unwrap_err();

    assert!(matches!(err, PipelineError::Merge(MergeError::Open { .. })));
    assert_eq!(phases.last(), Some(&Phase::Failed));
    assert!(!phases.contains(&Phase::Sample));

    for category in Category::ALL {
        assert!(!out.join(format!("sample{}.tsv", category.number())).exists());
    }
    assert!(!out.join("list2.tsv").exists());
    assert!(out.join("work").join("t0").join("list2.tsv").exists());
}

#[test]
fn test_merge_is_idempotent() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");
    let mut cfg = config(&out);
    cfg.keep_work = true;

    let pipeline = Pipeline::new(cfg).unwrap();
    let inputs: Vec<PathBuf> = (0..4)
        .map(|id| pipeline.layout().shard_file(id, Category::One))
        .collect();
    pipeline.run().unwrap();

    let cancel = CancelToken::new();
    let first = dir.path().join("first.tsv");
    let second = dir.path().join("second.tsv");
    merge_files(&inputs, &first, &cancel).unwrap();
    merge_files(&inputs, &second, &cancel).unwrap();

    let merged = fs::read_to_string(&first).unwrap();
    assert_eq!(merged, fs::read_to_string(&second).unwrap());
    assert_eq!(merged, fs::read_to_string(out.join("list1.tsv")).unwrap());
}

#[test]
fn test_derived_p123() {
    let table = MembershipTable::complete([0.25, 0.35, 0.25, 0.06, 0.03, 0.04]).unwrap();
    assert!((table.probabilities()[6] - 0.02).abs() < 1e-9);

    assert!(MembershipTable::complete([0.5, 0.5, 0.1, 0.0, 0.0, 0.0]).is_err());
}

fn write_sorted(path: &Path, file: usize, mut scores: Vec<u16>) -> Vec<String> {
    scores.sort_unstable_by(|a, b| b.cmp(a));
    let lines: Vec<String> = scores
        .into_iter()
        .enumerate()
        .map(|(row, s)| Record::new(format!("F{}R{}", file, row), Score::from_millis(s)).to_line())
        .collect();

    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content).unwrap();
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn merge_preserves_rows_and_order(
        files in prop::collection::vec(prop::collection::vec(0u16..=1000, 0..40), 1..6)
    ) {
        let dir = tempdir().unwrap();
        let mut inputs = Vec::new();
        let mut expected = Vec::new();

        for (i, scores) in files.into_iter().enumerate() {
            let path = dir.path().join(format!("in{}.tsv", i));
            expected.extend(write_sorted(&path, i, scores));
            inputs.push(path);
        }

        let dest = dir.path().join("merged.tsv");
        let rows = merge_files(&inputs, &dest, &CancelToken::new()).unwrap();
        prop_assert_eq!(rows as usize, expected.len());

        let merged = read_records(&dest);
        for pair in merged.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }

        let mut got: Vec<String> = merged.iter().map(Record::to_line).collect();
        got.sort();
        expected.sort();
        prop_assert_eq!(got, expected);
    }
}
