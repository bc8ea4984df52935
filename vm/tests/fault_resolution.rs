use vm::{
    disk::MemoryDisk,
    fault::{Eviction, FaultOutcome},
    mmu::{AddressSpace, Mmu},
    page_replacer::{FIFOPageReplacer, RandomPageReplacer, ReplacementPolicy},
    page_table::PageState,
    programs::Program,
    stats::FaultStats,
    VmError,
};

const PAGE: usize = 64;

fn fifo_mmu(npages: usize, nframes: usize) -> Mmu<FIFOPageReplacer, MemoryDisk> {
    Mmu::new(npages, nframes, PAGE, FIFOPageReplacer::new(), MemoryDisk::new(npages, PAGE)).unwrap()
}

#[test]
fn fifo_trace_over_four_pages_two_frames() {
    let mut mmu = fifo_mmu(4, 2);

    let trace: Vec<FaultOutcome> = [0, 1, 2, 0, 3]
        .into_iter()
        .map(|page| mmu.handle_page_fault(page).unwrap())
        .collect();

    assert_eq!(
        trace,
        vec![
            FaultOutcome::Loaded { frame: 0, evicted: None },
            FaultOutcome::Loaded { frame: 1, evicted: None },
            FaultOutcome::Loaded {
                frame: 0,
                evicted: Some(Eviction { page: 0, written_back: false }),
            },
            FaultOutcome::Loaded {
                frame: 1,
                evicted: Some(Eviction { page: 1, written_back: false }),
            },
            FaultOutcome::Loaded {
                frame: 0,
                evicted: Some(Eviction { page: 2, written_back: false }),
            },
        ]
    );
    assert_eq!(
        mmu.stats(),
        FaultStats { faults: 5, disk_reads: 5, disk_writes: 0 }
    );
    assert_eq!(mmu.page_table().get(3).unwrap(), PageState::PresentClean { frame: 0 });
    assert_eq!(mmu.page_table().get(0).unwrap(), PageState::PresentClean { frame: 1 });
    mmu.check_consistency().unwrap();
}

#[test]
fn same_trace_through_reads() {
    let mut mmu = fifo_mmu(4, 2);

    for page in [0, 1, 2, 0, 3] {
        mmu.read(page * PAGE).unwrap();
    }

    assert_eq!(
        mmu.stats(),
        FaultStats { faults: 5, disk_reads: 5, disk_writes: 0 }
    );
}

#[test]
fn fifo_reuses_first_frame_after_n_misses() {
    let frames = 5;
    let mut mmu = fifo_mmu(16, frames);

    let first = mmu.handle_page_fault(0).unwrap().frame();
    for page in 1..frames {
        mmu.handle_page_fault(page).unwrap();
    }

    assert_eq!(mmu.handle_page_fault(frames).unwrap().frame(), first);
}

#[test]
fn dirty_eviction_writes_before_reading() {
    let mut mmu = fifo_mmu(3, 1);

    mmu.write(0, 7).unwrap();
    let before = mmu.stats();

    mmu.read(PAGE).unwrap();
    let after = mmu.stats();

    assert_eq!(after.disk_writes, before.disk_writes + 1);
    assert_eq!(after.disk_reads, before.disk_reads + 1);
    assert_eq!(mmu.disk().block(0).unwrap()[0], 7);
}

#[test]
fn workloads_keep_tables_consistent() {
    for policy in [ReplacementPolicy::Fifo, ReplacementPolicy::Random] {
        for program in [Program::Scan, Program::Focus, Program::Sort] {
            let mut mmu = Mmu::new(
                8,
                3,
                PAGE,
                policy.build(Some(11)),
                MemoryDisk::new(8, PAGE),
            )
            .unwrap();

            program.run(&mut mmu).unwrap();

            mmu.check_consistency().unwrap();
            let stats = mmu.stats();
            assert!(stats.faults >= stats.disk_reads);
            assert!(stats.disk_reads >= 8, "{:?} {:?}", policy, program);
        }
    }
}

#[test]
fn workload_result_does_not_depend_on_frame_count() {
    let run = |frames| {
        let mut mmu = Mmu::new(
            6,
            frames,
            PAGE,
            RandomPageReplacer::seeded(3),
            MemoryDisk::new(6, PAGE),
        )
        .unwrap();

        Program::Sort.run(&mut mmu).unwrap()
    };

    assert_eq!(run(1), run(6));
}

#[test]
fn all_frames_resident_means_no_evictions() {
    let mut mmu = fifo_mmu(4, 4);

    Program::Scan.run(&mut mmu).unwrap();

    // um fault de leitura e um de upgrade por página
    assert_eq!(
        mmu.stats(),
        FaultStats { faults: 8, disk_reads: 4, disk_writes: 0 }
    );
}

#[test]
fn unknown_policy_is_rejected() {
    assert!(matches!(
        "custom".parse::<ReplacementPolicy>(),
        Err(VmError::UnknownPolicy(_))
    ));
}
