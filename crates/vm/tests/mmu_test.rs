use proptest::prelude::*;
use types::{Mode, Pid};
use vm::{Frame, MemoryFault, Mmu};

const MEMORY_SIZE: usize = 768;
const FRAME_SIZE: usize = 256;

fn all_frames() -> Vec<Frame> {
    (0..MEMORY_SIZE / FRAME_SIZE)
        .map(|i| Frame::new(i * FRAME_SIZE, (i + 1) * FRAME_SIZE - 1))
        .collect()
}

/// Free frames plus mapped frames must be exactly the full set, no duplicates.
fn assert_partitioned(mmu: &Mmu) {
    let mut seen: Vec<Frame> = mmu.free_frames().copied().collect();
    seen.extend(mmu.mappings().map(|(_, frame)| *frame));
    seen.sort();
    assert_eq!(seen, all_frames());
}

#[test]
fn init_partitions_memory_in_address_order() {
    let mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    let free: Vec<Frame> = mmu.free_frames().copied().collect();
    assert_eq!(free, all_frames());
    assert_eq!(mmu.max_frames(), 3);
    assert_eq!(mmu.mode(), Mode::Kernel);
    println!("✅ frames: {:?}", free);
}

#[test]
fn allocate_on_full_memory_leaves_free_list_alone() {
    let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    for pid in 0..3 {
        let frame = mmu.allocate(Pid(pid)).unwrap();
        assert_eq!(frame.base, pid as usize * FRAME_SIZE);
    }
    assert_eq!(mmu.free_frame_count(), 0);

    assert_eq!(mmu.allocate(Pid(3)), Err(MemoryFault::OutOfMemory));
    assert_eq!(mmu.free_frame_count(), 0);
    assert!(mmu.frame_of(Pid(3)).is_none());
    assert_partitioned(&mmu);
}

#[test]
fn allocate_twice_for_same_pid_is_rejected() {
    let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    mmu.allocate(Pid(7)).unwrap();
    assert_eq!(mmu.allocate(Pid(7)), Err(MemoryFault::AlreadyMapped(Pid(7))));
    assert_eq!(mmu.free_frame_count(), 2);
}

#[test]
fn deallocate_is_idempotent_and_reuses_last_freed_frame() {
    let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    mmu.allocate(Pid(0)).unwrap();
    let middle = mmu.allocate(Pid(1)).unwrap();

    mmu.set_mode(Mode::Kernel);
    mmu.write(middle.base + 3, 0xAB).unwrap();

    assert_eq!(mmu.deallocate(Pid(1)), Some(middle));
    assert_eq!(mmu.deallocate(Pid(1)), None);
    assert_eq!(mmu.free_frame_count(), 2);
    assert_partitioned(&mmu);

    // Cleared on release.
    assert_eq!(mmu.read(middle.base + 3).unwrap(), 0);

    // LIFO reuse: the frame just released comes back before the untouched one.
    assert_eq!(mmu.allocate(Pid(2)).unwrap(), middle);
}

#[test]
fn user_mode_addresses_are_relative_to_the_frame() {
    let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    mmu.allocate(Pid(0)).unwrap();
    let frame = mmu.allocate(Pid(1)).unwrap();

    mmu.set_active(Some(Pid(1)));
    mmu.set_mode(Mode::User);
    mmu.write(0x10, 0x42).unwrap();
    assert_eq!(mmu.read(0x10).unwrap(), 0x42);
    assert_eq!(mmu.translate(0x10).unwrap(), frame.base + 0x10);

    mmu.set_mode(Mode::Kernel);
    assert_eq!(mmu.read(frame.base + 0x10).unwrap(), 0x42);
}

#[test]
fn access_outside_the_frame_is_a_violation() {
    let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    mmu.allocate(Pid(0)).unwrap();
    let frame = mmu.allocate(Pid(1)).unwrap();
    mmu.allocate(Pid(2)).unwrap();

    mmu.set_mode(Mode::Kernel);
    mmu.write(frame.limit + 1, 0x77).unwrap();

    mmu.set_active(Some(Pid(1)));
    mmu.set_mode(Mode::User);

    let past_limit = frame.len();
    assert_eq!(
        mmu.write(past_limit, 0x11),
        Err(MemoryFault::AccessViolation {
            pid: Pid(1),
            address: frame.limit + 1
        })
    );
    assert_eq!(
        mmu.range_check(frame.base - 1),
        Err(MemoryFault::AccessViolation {
            pid: Pid(1),
            address: frame.base - 1
        })
    );
    assert!(mmu.range_check(frame.base).is_ok());
    assert!(mmu.range_check(frame.limit).is_ok());

    // The neighbouring frame was not touched.
    mmu.set_mode(Mode::Kernel);
    assert_eq!(mmu.read(frame.limit + 1).unwrap(), 0x77);
}

#[test]
fn user_mode_without_active_process_fails() {
    let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    mmu.allocate(Pid(0)).unwrap();
    mmu.set_mode(Mode::User);
    assert_eq!(mmu.read(0), Err(MemoryFault::NoActiveProcess));
    assert_eq!(mmu.range_check(0), Err(MemoryFault::NoActiveProcess));
}

#[test]
fn frames_can_be_saved_loaded_and_transferred() {
    let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
    let frame = mmu.allocate(Pid(4)).unwrap();
    mmu.load_frame(Pid(4), &[1, 2, 3]).unwrap();

    let image = mmu.read_frame(Pid(4)).unwrap();
    assert_eq!(image.len(), FRAME_SIZE);
    assert_eq!(&image[..4], &[1, 2, 3, 0]);

    assert_eq!(mmu.transfer(Pid(4), Pid(9)).unwrap(), frame);
    assert!(mmu.frame_of(Pid(4)).is_none());
    assert_eq!(mmu.frame_of(Pid(9)), Some(frame));
    assert_eq!(mmu.read_frame(Pid(9)).unwrap(), image);

    let too_big = vec![0u8; FRAME_SIZE + 1];
    assert!(matches!(
        mmu.load_frame(Pid(9), &too_big),
        Err(MemoryFault::ImageTooLarge { .. })
    ));
    assert_partitioned(&mmu);
}

proptest! {
    #[test]
    fn free_and_mapped_frames_always_partition_memory(
        ops in proptest::collection::vec((any::<bool>(), 0u32..6), 0..64)
    ) {
        let mut mmu = Mmu::new(MEMORY_SIZE, FRAME_SIZE);
        for (alloc, pid) in ops {
            let free_before = mmu.free_frame_count();
            if alloc {
                match mmu.allocate(Pid(pid)) {
                    Ok(_) => prop_assert_eq!(mmu.free_frame_count(), free_before - 1),
                    Err(_) => prop_assert_eq!(mmu.free_frame_count(), free_before),
                }
            } else {
                let released = mmu.deallocate(Pid(pid));
                let expected = free_before + usize::from(released.is_some());
                prop_assert_eq!(mmu.free_frame_count(), expected);
            }

            let mut seen: Vec<Frame> = mmu.free_frames().copied().collect();
            seen.extend(mmu.mappings().map(|(_, frame)| *frame));
            seen.sort();
            prop_assert_eq!(seen, all_frames());
        }
    }
}
