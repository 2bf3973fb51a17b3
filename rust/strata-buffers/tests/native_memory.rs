use std::{
    cell::Cell,
    ptr::NonNull,
    rc::Rc,
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use strata_accountant::config::{AccountantConfig, BackoffPolicy};
use strata_buffers::{Buffer, ByteOrder, ErrorKind, MemoryAccountant, NativeAllocation};

fn accountant(max: u64, backoff: BackoffPolicy) -> Arc<MemoryAccountant> {
    Arc::new(MemoryAccountant::new(
        AccountantConfig::with_max_capacity(max).backoff(backoff),
    ))
}

#[test]
fn test_cafebabe_scenario() {
    let mut buf = Buffer::<u8>::allocate_native(8).unwrap();
    assert_eq!(buf.order(), ByteOrder::native());
    buf.put_u32_at(0, 0xcafe_babe).unwrap();
    buf.set_order(ByteOrder::LittleEndian);
    buf.put_u32_at(4, 1).unwrap();

    buf.set_order(ByteOrder::BigEndian);
    let first_be = buf.get_u32_at(0).unwrap();
    let second_be = buf.get_u32_at(4).unwrap();
    buf.set_order(ByteOrder::LittleEndian);
    let first_le = buf.get_u32_at(0).unwrap();
    let second_le = buf.get_u32_at(4).unwrap();

    assert_eq!(first_be, first_le.swap_bytes());
    assert_eq!(second_be, second_le.swap_bytes());
    assert_eq!(second_le, 1);
    assert_eq!(second_be, 0x0100_0000);
    match ByteOrder::native() {
        ByteOrder::BigEndian => assert_eq!(first_be, 0xcafe_babe),
        ByteOrder::LittleEndian => assert_eq!(first_le, 0xcafe_babe),
    }

    let raw: Vec<u8> = (0..8).map(|i| buf.get_at(i).unwrap()).collect();
    assert_eq!(raw[4..], [1u8, 0, 0, 0]);
    assert_eq!(raw[..4], 0xcafe_babeu32.to_ne_bytes());
}

#[test]
fn test_concurrent_allocations_bounded() {
    const THREADS: usize = 24;
    const CAPACITY: usize = 64;
    const MAX: u64 = 1000;

    let acc = accountant(MAX, BackoffPolicy::none());
    let barrier = Arc::new(Barrier::new(THREADS));
    let successes = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let acc = acc.clone();
            let barrier = barrier.clone();
            let successes = successes.clone();
            thread::spawn(move || {
                let result = Buffer::<u8>::allocate_native_in(CAPACITY, &acc);
                match &result {
                    Ok(_) => {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => {
                        assert!(matches!(e.kind(), ErrorKind::OutOfMemory { limit: MAX, .. }));
                    }
                }
                // Hold every successful allocation until all threads have tried.
                barrier.wait();
                drop(result);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(successes.load(Ordering::SeqCst), (MAX as usize) / CAPACITY);
    assert_eq!(acc.count(), 0);
    assert_eq!(acc.reserved(), 0);
    assert_eq!(acc.total_capacity(), 0);
}

#[test]
fn test_released_memory_is_reusable() {
    let acc = accountant(256, BackoffPolicy::none());
    for _ in 0..50 {
        let buffers: Vec<_> = (0..4)
            .map(|_| Buffer::<u8>::allocate_native_in(64, &acc).unwrap())
            .collect();
        assert!(Buffer::<u8>::allocate_native_in(1, &acc).is_err());
        drop(buffers);
        assert_eq!(acc.total_capacity(), 0);
    }
}

#[test]
fn test_views_keep_allocation_alive() {
    let acc = accountant(1 << 20, BackoffPolicy::none());
    let mut bytes = Buffer::<u8>::allocate_native_in(64, &acc).unwrap();
    bytes.set_position(8).unwrap();
    let view = bytes.as_f64_buffer();
    let slice = view.slice_at(2, 3).unwrap();
    drop(bytes);
    drop(view);
    assert_eq!(acc.count(), 1);
    assert_eq!(slice.get_at(0).unwrap(), 0.0);
    drop(slice);
    assert_eq!(acc.count(), 0);
}

#[test]
fn test_reservation_waits_for_concurrent_release() {
    let acc = accountant(
        100,
        BackoffPolicy {
            initial_delay: Duration::from_millis(5),
            max_sleeps: 8,
        },
    );
    let holder = {
        let acc = acc.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let handle = thread::spawn(move || {
            let buf = Buffer::<u8>::allocate_native_in(80, &acc).unwrap();
            ready_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(30));
            drop(buf);
        });
        ready_rx.recv().unwrap();
        handle
    };
    let buf = Buffer::<u8>::allocate_native_in(50, &acc).unwrap();
    assert_eq!(buf.capacity(), 50);
    holder.join().unwrap();
}

#[test]
fn test_reclaimer_frees_memory() {
    thread_local! {
        static PARKED: Cell<Option<Buffer<u8>>> = const { Cell::new(None) };
    }
    let acc = accountant(100, BackoffPolicy::none());
    PARKED.with(|p| p.set(Some(Buffer::<u8>::allocate_native_in(90, &acc).unwrap())));
    acc.set_reclaimer(|| PARKED.with(|p| drop(p.take())));

    let buf = Buffer::<u8>::allocate_native_in(90, &acc).unwrap();
    assert_eq!(acc.count(), 1);
    drop(buf);
    acc.clear_reclaimer();
}

#[test]
fn test_external_allocation() {
    let released = Rc::new(Cell::new(false));
    let mut backing = vec![0u8; 16];
    let address = NonNull::new(backing.as_mut_ptr()).unwrap();
    let flag = released.clone();
    let allocation =
        unsafe { NativeAllocation::from_raw_parts(address, 16, move |_, _| flag.set(true)) };

    let mut buf = Buffer::<u8>::from_native(allocation);
    assert!(buf.is_native());
    buf.set_order(ByteOrder::BigEndian);
    buf.put_u16_at(2, 0x0102).unwrap();
    let view = buf.as_u16_buffer();
    drop(buf);
    assert!(!released.get());
    assert_eq!(view.get_at(1).unwrap(), 0x0102);
    drop(view);
    assert!(released.get());
    assert_eq!(backing[2..4], [1u8, 2]);
}
