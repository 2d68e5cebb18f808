// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;
use crate::shim::address::Address;
use crate::shim::sector::SectorSize;
use crate::test_utils::{MockChain, MockProver, mock_comm_r};
use crate::utils::parse_sector_numbers;
use fvm_shared4::version::NetworkVersion;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::time::Duration;
use tempfile::TempDir;

const MINER: u64 = 1000;

struct Harness {
    _dir: TempDir,
    store: SectorStore,
    destination: SectorStore,
    prover: Arc<MockProver>,
    chain: Arc<MockChain>,
}

impl Harness {
    fn new(
        prover: impl FnOnce(MockProver) -> MockProver,
        chain: impl FnOnce(MockChain) -> MockChain,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = SectorStore::new(dir.path().join("work"));
        let destination = SectorStore::new(dir.path().join("storage"));
        store.ensure_type_dirs().unwrap();
        destination.ensure_type_dirs().unwrap();
        Self {
            prover: Arc::new(prover(MockProver::new(store.clone()))),
            chain: Arc::new(chain(MockChain::new(Address::new_id(MINER)))),
            store,
            destination,
            _dir: dir,
        }
    }

    fn plain() -> Self {
        Self::new(|it| it, |it| it)
    }

    fn template() -> SectorTemplate {
        SectorTemplate::new(MINER, SectorSize::_2KiB, NetworkVersion::V21)
    }

    fn redo(&self, parallel: usize) -> Redo<MockProver, MockChain> {
        Redo::new(
            self.prover.clone(),
            self.chain.clone(),
            Self::template(),
            self.store.clone(),
            NonZeroUsize::new(parallel).unwrap(),
        )
        .with_destination(Some(self.destination.clone()))
    }

    fn path(&self, store: &SectorStore, path_type: PathType, number: SectorNumber) -> PathBuf {
        store.sector_path(path_type, &Self::template().sector(number))
    }

    fn relocated(&self, number: SectorNumber) -> bool {
        self.path(&self.destination, PathType::Sealed, number).is_file()
            && self.path(&self.destination, PathType::Cache, number).is_dir()
    }
}

#[tokio::test]
async fn matching_sectors_are_sealed_and_relocated() {
    let harness = Harness::plain();
    let report = harness.redo(2).run(parse_sector_numbers("5,7")).await;

    for number in [5, 7] {
        assert_eq!(report.outcome(number), Some(&SectorOutcome::Sealed));
        assert!(harness.relocated(number));
        // only the filler-backed roles move; finalize already dropped the unsealed copy
        assert!(!harness.path(&harness.store, PathType::Sealed, number).exists());
        assert!(!harness.path(&harness.store, PathType::Unsealed, number).exists());
        assert!(!harness.path(&harness.destination, PathType::Unsealed, number).exists());
        let relocations = &report.sectors[&number].relocations;
        assert_eq!(relocations.len(), 2);
        assert!(relocations.iter().all(|it| it.error.is_none()));
    }
    assert_eq!(
        report.summary().to_string(),
        "2 sealed, 0 mismatched, 0 failed, 0 cancelled, 0 skipped, 0 relocation failures"
    );
}

#[tokio::test]
async fn malformed_ids_are_skipped() {
    let harness = Harness::plain();
    let report = harness.redo(1).run(parse_sector_numbers("5,abc,7")).await;

    assert_eq!(report.skipped, vec!["abc".to_owned()]);
    assert_eq!(report.sectors.len(), 2);
    assert_eq!(report.outcome(5), Some(&SectorOutcome::Sealed));
    assert_eq!(report.outcome(7), Some(&SectorOutcome::Sealed));
}

#[tokio::test]
async fn mismatching_sector_is_not_relocated() {
    let harness = Harness::new(|it| it.with_wrong_comm_r(9), |it| it);
    let report = harness.redo(2).run(parse_sector_numbers("8,9")).await;

    assert_eq!(report.outcome(8), Some(&SectorOutcome::Sealed));
    let Some(SectorOutcome::Mismatch { computed, on_chain }) = report.outcome(9) else {
        panic!("expected a mismatch: {report:?}");
    };
    assert_eq!(on_chain, &mock_comm_r(9).to_string());
    assert_ne!(computed, on_chain);
    assert!(report.sectors[&9].relocations.is_empty());
    assert!(!harness.relocated(9));
    // the mismatching replica stays in the working store
    assert!(harness.path(&harness.store, PathType::Sealed, 9).is_file());
    assert!(harness.relocated(8));
}

#[tokio::test]
async fn missing_on_chain_comm_r_is_a_mismatch() {
    let harness = Harness::new(|it| it, |it| it.with_comm_r(3, None));
    let report = harness.redo(1).run(parse_sector_numbers("3")).await;

    match report.outcome(3) {
        Some(SectorOutcome::Mismatch { on_chain, .. }) => assert_eq!(on_chain, NO_COMM_R),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!harness.relocated(3));
}

#[tokio::test]
async fn stages_run_in_order() {
    let harness = Harness::plain();
    harness.redo(3).run(parse_sector_numbers("1,2,3")).await;

    for number in 1..=3 {
        assert_eq!(
            harness.prover.calls_for(number),
            vec![
                Stage::AddPiece,
                Stage::PreCommit1,
                Stage::PreCommit2,
                Stage::Finalize
            ]
        );
    }
}

#[tokio::test]
async fn failed_stage_is_isolated_to_its_sector() {
    let harness = Harness::new(|it| it.failing_at(2, Stage::PreCommit1), |it| it);
    let report = harness.redo(2).run(parse_sector_numbers("1,2,3")).await;

    match report.outcome(2) {
        Some(SectorOutcome::Failed { stage, error }) => {
            assert_eq!(*stage, Stage::PreCommit1);
            assert!(error.contains("mock pre-commit-1 failure"), "{error}");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
        harness.prover.calls_for(2),
        vec![Stage::AddPiece, Stage::PreCommit1]
    );
    assert!(!harness.relocated(2));
    assert_eq!(report.outcome(1), Some(&SectorOutcome::Sealed));
    assert_eq!(report.outcome(3), Some(&SectorOutcome::Sealed));
}

#[tokio::test]
async fn finalize_failure_prevents_relocation() {
    let harness = Harness::new(|it| it.failing_at(4, Stage::Finalize), |it| it);
    let report = harness.redo(1).run(parse_sector_numbers("4")).await;

    assert!(matches!(
        report.outcome(4),
        Some(SectorOutcome::Failed {
            stage: Stage::Finalize,
            ..
        })
    ));
    assert!(report.sectors[&4].relocations.is_empty());
    assert!(!harness.relocated(4));
}

#[tokio::test]
async fn status_failure_skips_the_prover() {
    let harness = Harness::new(|it| it, |it| it.with_failing_status(6));
    let report = harness.redo(1).run(parse_sector_numbers("6,7")).await;

    assert!(matches!(
        report.outcome(6),
        Some(SectorOutcome::Failed {
            stage: Stage::Status,
            ..
        })
    ));
    assert!(harness.prover.calls_for(6).is_empty());
    assert_eq!(report.outcome(7), Some(&SectorOutcome::Sealed));
    assert_eq!(harness.chain.calls("sector_status"), 2);
}

#[tokio::test]
async fn relocation_failure_keeps_the_sealing_result() {
    let harness = Harness::plain();
    // a file where the sealed directory should be
    let storage = harness.destination.root().to_path_buf();
    std::fs::remove_dir_all(storage.join("sealed")).unwrap();
    std::fs::write(storage.join("sealed"), b"in the way").unwrap();

    let report = harness.redo(1).run(parse_sector_numbers("5")).await;

    assert_eq!(report.outcome(5), Some(&SectorOutcome::Sealed));
    let relocations = &report.sectors[&5].relocations;
    let failed = relocations
        .iter()
        .filter(|it| it.error.is_some())
        .map(|it| it.path_type)
        .collect::<Vec<_>>();
    assert_eq!(failed, vec![PathType::Sealed]);
    assert!(harness.path(&harness.destination, PathType::Cache, 5).is_dir());
    assert_eq!(report.summary().relocation_failures, 1);
}

#[tokio::test]
async fn no_destination_leaves_artifacts_in_place() {
    let harness = Harness::plain();
    let report = harness
        .redo(1)
        .with_destination(None)
        .run(parse_sector_numbers("5"))
        .await;

    assert_eq!(report.outcome(5), Some(&SectorOutcome::Sealed));
    assert!(report.sectors[&5].relocations.is_empty());
    assert!(harness.path(&harness.store, PathType::Sealed, 5).is_file());
    assert!(harness.path(&harness.store, PathType::Cache, 5).is_dir());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn phase2_is_serialized_across_the_batch() {
    let harness = Harness::new(|it| it.with_delay(Duration::from_millis(20)), |it| it);
    let report = harness.redo(4).run(parse_sector_numbers("1,2,3,4,5,6")).await;

    assert_eq!(report.summary().sealed, 6);
    assert_eq!(harness.prover.phase2.max(), 1);
    assert!(harness.prover.phase1.max() <= 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn phase1_slot_is_released_before_phase2() {
    // with a single phase 1 slot, the second sector only gets through phase 1
    // if the first gives its slot back before running phase 2
    let harness = Harness::new(|it| it.with_phase2_awaiting_other_phase1(), |it| it);
    let report = harness.redo(1).run(parse_sector_numbers("1,2")).await;

    assert_eq!(report.summary().sealed, 2, "{report:?}");
    assert_eq!(harness.prover.phase1.max(), 1);
    assert_eq!(harness.prover.phase2.max(), 1);
}

#[tokio::test]
async fn cancelled_batch_does_no_work() {
    let harness = Harness::plain();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = harness
        .redo(2)
        .with_cancellation(cancel)
        .run(parse_sector_numbers("1,2"))
        .await;

    assert_eq!(report.outcome(1), Some(&SectorOutcome::Cancelled));
    assert_eq!(report.outcome(2), Some(&SectorOutcome::Cancelled));
    assert!(harness.prover.calls().is_empty());
    assert_eq!(harness.chain.calls("sector_status"), 0);
    assert_eq!(report.summary().cancelled, 2);
}

#[quickcheck]
fn phase1_never_exceeds_its_capacity(sectors: u8, parallel: u8) -> TestResult {
    let sectors = u64::from(sectors % 8) + 1;
    let parallel = usize::from(parallel % 4) + 1;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();
    let harness = Harness::new(|it| it.with_delay(Duration::from_millis(2)), |it| it);
    let report = runtime.block_on(
        harness
            .redo(parallel)
            .with_destination(None)
            .run(SectorNumbers {
                numbers: (0..sectors).collect(),
                skipped: vec![],
            }),
    );
    TestResult::from_bool(
        report.summary().sealed == sectors as usize
            && harness.prover.phase1.max() <= parallel
            && harness.prover.phase2.max() == 1,
    )
}
