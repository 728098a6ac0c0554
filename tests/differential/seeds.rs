//! Seed handling and determinism.

use kvformat::{FileType, RunContext};

use crate::common::{run_clean, run_recorded, small_config, VARIANTS};

#[test]
fn test_same_seed_same_operation_log() {
    for file_type in VARIANTS {
        let mut config = small_config(file_type, 2024);
        config.logging = true;
        let first = run_recorded(config.clone());
        let second = run_recorded(config);
        assert_eq!(first.messages, second.messages);
        assert_eq!(first.progress, second.progress);
    }
}

#[test]
fn test_different_seeds_diverge() {
    let mut a = small_config(FileType::Var, 1);
    let mut b = small_config(FileType::Var, 2);
    a.logging = true;
    b.logging = true;
    assert_ne!(run_recorded(a).messages, run_recorded(b).messages);
}

#[test]
fn test_unseeded_run_reports_its_seed() {
    let mut config = small_config(FileType::Row, 0);
    config.seed = None;
    let ctx = RunContext::new(config.clone()).unwrap();
    let seed = ctx.seed();

    config.seed = Some(seed);
    let summary = run_clean(config);
    assert_eq!(summary.seed, seed);
}

#[test]
fn test_many_seeds_run_clean() {
    for seed in 0..8 {
        for file_type in VARIANTS {
            let mut config = small_config(file_type, seed);
            config.rows = 60;
            config.ops = 150;
            run_clean(config);
        }
    }
}
