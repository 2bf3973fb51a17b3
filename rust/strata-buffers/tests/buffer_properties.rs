use strata_buffers::{Buffer, ByteOrder, CopyPolicy, Element, ErrorKind};

fn check_invariant<T: Element>(buf: &Buffer<T>) {
    if let Some(mark) = buf.mark_value() {
        assert!(mark <= buf.position());
    }
    assert!(buf.position() <= buf.limit());
    assert!(buf.limit() <= buf.capacity());
}

#[test]
fn test_random_navigation_preserves_invariant() {
    fastrand::seed(725361);
    for _ in 0..100 {
        let capacity = fastrand::usize(0..40);
        let mut buf = Buffer::<u16>::allocate(capacity).unwrap();
        for _ in 0..300 {
            match fastrand::u8(0..9) {
                0 => {
                    let position = fastrand::usize(0..=capacity + 2);
                    let ok = position <= buf.limit();
                    assert_eq!(buf.set_position(position).is_ok(), ok);
                }
                1 => {
                    let limit = fastrand::usize(0..=capacity + 2);
                    let ok = limit <= capacity;
                    assert_eq!(buf.set_limit(limit).is_ok(), ok);
                }
                2 => {
                    buf.mark();
                }
                3 => {
                    let expected = buf.mark_value();
                    match buf.reset() {
                        Ok(buf) => assert_eq!(Some(buf.position()), expected),
                        Err(e) => {
                            assert!(expected.is_none());
                            assert!(matches!(e.kind(), ErrorKind::InvalidMark));
                        }
                    }
                }
                4 => {
                    buf.clear();
                }
                5 => {
                    buf.flip();
                }
                6 => {
                    buf.rewind();
                }
                7 => {
                    let _ = buf.get();
                }
                _ => {
                    let _ = buf.put(fastrand::u16(..));
                }
            }
            check_invariant(&buf);
        }
    }
}

macro_rules! round_trip_test {
    ($name:ident, $ty:ty, [$($value:expr),* $(,)?]) => {
        #[test]
        fn $name() {
            let values: Vec<$ty> = vec![$($value),*];
            let width = std::mem::size_of::<$ty>();

            let mut heap = Buffer::<$ty>::allocate(values.len()).unwrap();
            for &value in &values {
                heap.put(value).unwrap();
                heap.set_position(heap.position() - 1).unwrap();
                assert!(heap.get().unwrap().content_eq(&value));
            }

            for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
                let mut bytes = Buffer::<u8>::allocate(values.len() * width + 1).unwrap();
                bytes.set_order(order);
                bytes.set_position(1).unwrap();
                let mut view = bytes.view::<$ty>();
                assert_eq!(view.order(), order);
                for &value in &values {
                    view.put(value).unwrap();
                    view.set_position(view.position() - 1).unwrap();
                    assert!(view.get().unwrap().content_eq(&value));

                    bytes.put_value(value).unwrap();
                    bytes.set_position(bytes.position() - width).unwrap();
                    assert!(bytes.get_value::<$ty>().unwrap().content_eq(&value));
                }
            }
        }
    };
}

round_trip_test!(test_round_trip_i8, i8, [0, 1, -1, i8::MIN, i8::MAX]);
round_trip_test!(test_round_trip_u8, u8, [0, 1, 0x80, u8::MAX]);
round_trip_test!(test_round_trip_i16, i16, [0, 1, -1, 0x1234, i16::MIN, i16::MAX]);
round_trip_test!(test_round_trip_u16, u16, [0, 1, 0x8001, u16::MAX]);
round_trip_test!(test_round_trip_i32, i32, [0, -1, 0x1234_5678, i32::MIN, i32::MAX]);
round_trip_test!(test_round_trip_u32, u32, [0, 1, 0xcafe_babe, u32::MAX]);
round_trip_test!(test_round_trip_i64, i64, [0, -1, 0x0102_0304_0506_0708, i64::MIN, i64::MAX]);
round_trip_test!(test_round_trip_u64, u64, [0, 1, 0x8000_0000_0000_0001, u64::MAX]);
round_trip_test!(
    test_round_trip_f32,
    f32,
    [0.0, -0.0, 1.5, f32::MIN, f32::MAX, f32::MIN_POSITIVE, f32::INFINITY, f32::NEG_INFINITY, f32::NAN]
);
round_trip_test!(
    test_round_trip_f64,
    f64,
    [0.0, -0.0, -2.25, f64::MIN, f64::MAX, f64::EPSILON, f64::INFINITY, f64::NEG_INFINITY, f64::NAN]
);

#[test]
fn test_alias_sharing() {
    let mut buf = Buffer::wrap((0i32..16).collect());
    buf.set_position(4).unwrap();
    let mut slice = buf.slice();
    let mut dup = buf.duplicate();

    slice.put(-4).unwrap();
    assert_eq!(buf.get_at(4).unwrap(), -4);
    assert_eq!(dup.get_at(4).unwrap(), -4);

    dup.put_at(10, -10).unwrap();
    assert_eq!(slice.get_at(6).unwrap(), -10);

    buf.put_at(15, -15).unwrap();
    assert_eq!(slice.get_at(11).unwrap(), -15);
    assert_eq!(buf.as_read_only().get_at(15).unwrap(), -15);
}

fn bulk_matches_element_wise<T: Element>(values: &[T], policy: CopyPolicy, order: ByteOrder) {
    let width = std::mem::size_of::<T>();
    let mut bulk_bytes = Buffer::<u8>::allocate(values.len() * width + 3).unwrap();
    bulk_bytes.set_order(order);
    bulk_bytes.set_position(3).unwrap();
    let mut each_bytes = Buffer::<u8>::allocate(values.len() * width + 3).unwrap();
    each_bytes.set_order(order);
    each_bytes.set_position(3).unwrap();

    let mut bulk = bulk_bytes.view::<T>();
    let mut each = each_bytes.view::<T>();
    let offset = values.len() / 3;
    let length = values.len() - offset;

    strata_buffers::set_copy_policy(policy);
    bulk.put_bulk(values, offset, length).unwrap();
    for value in &values[offset..] {
        each.put(*value).unwrap();
    }
    assert_eq!(bulk.position(), each.position());
    bulk_bytes.rewind();
    each_bytes.rewind();
    assert_eq!(bulk_bytes, each_bytes);

    bulk.flip();
    let mut read = vec![T::default(); values.len()];
    bulk.get_bulk(&mut read, offset, length).unwrap();
    for (got, expected) in read[offset..].iter().zip(&values[offset..]) {
        assert!(got.content_eq(expected));
    }
    strata_buffers::set_copy_policy(CopyPolicy::default());
}

#[test]
fn test_bulk_equivalence_both_regimes() {
    fastrand::seed(91177);
    let small: Vec<u32> = (0..5).map(|_| fastrand::u32(..)).collect();
    let large: Vec<u32> = (0..3000).map(|_| fastrand::u32(..)).collect();
    let floats: Vec<f64> = (0..700).map(|_| fastrand::f64() * 1e6 - 5e5).collect();
    let policies = [
        CopyPolicy::default(),
        CopyPolicy::new(0, 20).unwrap(),
        CopyPolicy::new(usize::MAX, 1).unwrap(),
    ];
    for policy in policies {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            bulk_matches_element_wise(&small, policy, order);
            bulk_matches_element_wise(&large, policy, order);
            bulk_matches_element_wise(&floats, policy, order);
        }
    }
}

#[test]
fn test_compaction_property() {
    fastrand::seed(4401);
    for _ in 0..200 {
        let capacity = fastrand::usize(1..64);
        let values: Vec<i64> = (0..capacity).map(|_| fastrand::i64(..)).collect();
        let mut buf = Buffer::wrap(values);
        let limit = fastrand::usize(0..=capacity);
        buf.set_limit(limit).unwrap();
        buf.set_position(fastrand::usize(0..=limit)).unwrap();
        let before = buf.to_vec();

        buf.compact().unwrap();
        assert_eq!(buf.position(), before.len());
        assert_eq!(buf.limit(), buf.capacity());
        assert!(buf.mark_value().is_none());
        let mut head = vec![0i64; before.len()];
        buf.get_bulk_at(0, &mut head).unwrap();
        assert_eq!(head, before);
    }
}

#[test]
fn test_put_buffer_across_orders() {
    let mut src_bytes = Buffer::<u8>::allocate(4 * 100).unwrap();
    src_bytes.set_order(ByteOrder::BigEndian);
    let mut src = src_bytes.view::<i32>();
    for i in 0..100 {
        src.put(i * 7919 - 300_000).unwrap();
    }
    src.flip();

    let mut dst_bytes = Buffer::<u8>::allocate(4 * 100).unwrap();
    dst_bytes.set_order(ByteOrder::LittleEndian);
    let mut dst = dst_bytes.view::<i32>();
    dst.put_buffer(&mut src).unwrap();
    assert!(!src.has_remaining());

    src.rewind();
    dst.flip();
    assert_eq!(src, dst);
    assert_eq!(dst_bytes.get_i32_at(4).unwrap(), 7919 - 300_000);
}
