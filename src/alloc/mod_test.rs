use super::*;

fn pool(size: usize) -> Vec<u8> {
    vec![0u8; size]
}

#[test]
fn single_alloc_free_round_trip() {
    let mut buf = pool(1024);
    let mut tlsf = Tlsf::new(&mut buf).unwrap();

    let a = tlsf.alloc(32, VmId::new(1)).unwrap();
    let stats = tlsf.stats(None);
    assert!(stats.used >= 32);

    tlsf.free(a);
    let stats = tlsf.stats(None);
    assert_eq!(stats.used, 0);
    assert_eq!(stats.free_blocks, 1);
}

#[test]
fn split_produces_independent_blocks() {
    let mut buf = pool(1024);
    let mut tlsf = Tlsf::new(&mut buf).unwrap();

    let a = tlsf.alloc(16, VmId::new(1)).unwrap();
    let b = tlsf.alloc(16, VmId::new(1)).unwrap();
    assert_ne!(a, b);

    unsafe {
        tlsf.write::<u32>(a, 0xAAAA_AAAA);
        tlsf.write::<u32>(b, 0xBBBB_BBBB);
        assert_eq!(tlsf.read::<u32>(a), 0xAAAA_AAAA);
        assert_eq!(tlsf.read::<u32>(b), 0xBBBB_BBBB);
    }
}

#[test]
fn freeing_neighbors_coalesces_to_original_pool() {
    let mut buf = pool(512);
    let original = {
        let tlsf = Tlsf::new(&mut buf).unwrap();
        tlsf.stats(None).free
    };

    let mut tlsf = Tlsf::new(&mut buf).unwrap();
    let a = tlsf.alloc(20, VmId::new(1)).unwrap();
    let b = tlsf.alloc(20, VmId::new(1)).unwrap();
    let c = tlsf.alloc(20, VmId::new(1)).unwrap();

    tlsf.free(b);
    tlsf.free(a);
    tlsf.free(c);

    let stats = tlsf.stats(None);
    assert_eq!(stats.used, 0);
    assert_eq!(stats.free_blocks, 1);
    assert_eq!(stats.free, original);
}

#[test]
fn free_all_reclaims_only_matching_vm_id() {
    let mut buf = pool(1024);
    let mut tlsf = Tlsf::new(&mut buf).unwrap();

    let task = VmId::new(2);
    let other = VmId::new(3);
    let _a = tlsf.alloc(16, task).unwrap();
    let _b = tlsf.alloc(16, task).unwrap();
    let kept = tlsf.alloc(16, other).unwrap();

    tlsf.free_all(task);

    let stats = tlsf.stats(Some(other));
    assert_eq!(stats.vm_used, 16);
    assert_eq!(tlsf.vm_id_of(kept), other);
}

#[test]
fn realloc_grow_preserves_payload_and_moves_address() {
    let mut buf = pool(256);
    let mut tlsf = Tlsf::new(&mut buf).unwrap();

    let a = tlsf.alloc(4, VmId::new(1)).unwrap();
    unsafe { tlsf.write::<u32>(a, 0x1234_5678) };

    let b = tlsf.realloc(a, 64, VmId::new(1)).unwrap();
    assert_eq!(unsafe { tlsf.read::<u32>(b) }, 0x1234_5678);
}

#[test]
fn out_of_memory_when_pool_exhausted() {
    let mut buf = pool(32);
    let mut tlsf = Tlsf::new(&mut buf).unwrap();
    assert!(tlsf.alloc(1024, VmId::new(1)).is_err());
}

#[test]
fn pool_too_small_is_rejected() {
    let mut buf = pool(2);
    assert_eq!(Tlsf::new(&mut buf).unwrap_err(), AllocError::PoolTooSmall);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Alloc(u16),
        Free(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u16..200).prop_map(Op::Alloc),
            (0usize..16).prop_map(Op::Free),
        ]
    }

    proptest! {
        /// After any sequence of alloc/free operations, free + used must
        /// always reconstruct the original pool size: the allocator never
        /// leaks or fabricates bytes.
        #[test]
        fn pool_size_is_conserved(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut buf = vec![0u8; 4096];
            let mut tlsf = Tlsf::new(&mut buf).unwrap();
            let total = tlsf.stats(None).total;

            let mut live: Vec<Addr> = Vec::new();
            for op in ops {
                match op {
                    Op::Alloc(n) => {
                        if let Ok(addr) = tlsf.alloc(n as usize, VmId::new(1)) {
                            live.push(addr);
                        }
                    }
                    Op::Free(idx) => {
                        if !live.is_empty() {
                            let addr = live.swap_remove(idx % live.len());
                            tlsf.free(addr);
                        }
                    }
                }
                let stats = tlsf.stats(None);
                prop_assert_eq!(stats.used + stats.free, total);
            }
        }
    }
}
