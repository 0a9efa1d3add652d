use super::*;

#[test]
fn released_texture_is_reused_for_same_size() {
    let pool = TexturePool::default();
    {
        let lease = pool.request_texture(8, 8).unwrap();
        assert_eq!(lease.width(), 8);
        assert_eq!(pool.stats().leased_textures, 1);
    }
    let stats = pool.stats();
    assert_eq!(stats.leased_textures, 0);
    assert_eq!(stats.retained_textures, 1);

    let _again = pool.request_texture(8, 8).unwrap();
    let stats = pool.stats();
    assert_eq!(stats.alloc_textures, 1);
    assert_eq!(stats.reused_textures, 1);
    assert_eq!(stats.retained_textures, 0);
}

#[test]
fn different_sizes_do_not_share_textures() {
    let pool = TexturePool::default();
    drop(pool.request_texture(8, 8).unwrap());
    let _other = pool.request_texture(8, 4).unwrap();
    assert_eq!(pool.stats().alloc_textures, 2);
    assert_eq!(pool.stats().reused_textures, 0);
}

#[test]
fn recycled_contents_are_not_cleared() {
    let pool = TexturePool::default();
    {
        let mut lease = pool.request_texture(2, 2).unwrap();
        lease.data_mut().fill(7);
    }
    let lease = pool.request_texture(2, 2).unwrap();
    assert!(lease.data().iter().all(|&b| b == 7));
}

#[test]
fn per_size_retention_cap_drops_extra_textures() {
    let pool = TexturePool::new(PoolOpts {
        max_retained_per_size: 1,
        ..PoolOpts::default()
    });
    let a = pool.request_texture(4, 4).unwrap();
    let b = pool.request_texture(4, 4).unwrap();
    drop(a);
    drop(b);
    let stats = pool.stats();
    assert_eq!(stats.retained_textures, 1);
    assert_eq!(stats.dropped_on_release, 1);
}

#[test]
fn leased_budget_rejects_requests() {
    let pool = TexturePool::new(PoolOpts {
        max_leased_bytes: Some(4 * 4 * 4),
        ..PoolOpts::default()
    });
    let first = pool.request_texture(4, 4).unwrap();
    assert!(pool.request_texture(1, 1).is_err());
    drop(first);
    assert!(pool.request_texture(1, 1).is_ok());
}

#[test]
fn zero_dimensions_are_rejected() {
    let pool = TexturePool::default();
    assert!(pool.request_texture(0, 4).is_err());
    assert!(pool.request_texture(4, 0).is_err());
}

#[test]
fn detach_ends_lease_and_recycle_makes_texture_reusable() {
    let pool = TexturePool::default();
    let tex = pool.request_texture(3, 3).unwrap().detach();
    assert_eq!(tex.width(), 3);
    let stats = pool.stats();
    assert_eq!(stats.leased_textures, 0);
    assert_eq!(stats.retained_textures, 0);

    pool.recycle(tex);
    let _lease = pool.request_texture(3, 3).unwrap();
    assert_eq!(pool.stats().reused_textures, 1);
}

#[test]
fn pool_is_shareable_across_threads() {
    let pool = std::sync::Arc::new(TexturePool::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            std::thread::spawn(move || {
                for _ in 0..16 {
                    let mut lease = pool.request_texture(16, 16).unwrap();
                    lease.clear();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(pool.stats().leased_textures, 0);
    assert!(pool.stats().alloc_textures <= 4);
}
