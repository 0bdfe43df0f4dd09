use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn key(n: u32) -> TextureKey {
    TextureKey::RectBg { radius: 4, size: n }
}

#[test]
fn lru_evicts_least_recently_touched() {
    let freed = Arc::new(AtomicUsize::new(0));
    let mut c: TextureCache<u32> = TextureCache::new(2, 1024);
    for n in 0..3 {
        let f = freed.clone();
        let ev = c.put_with_free(
            key(n),
            n,
            TextureFlags::MANAGED,
            Box::new(move |_, _| {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        );
        if n == 2 {
            assert_eq!(ev, vec![Evicted { key: key(0), texture: 0, managed: true }]);
        }
    }
    assert_eq!(freed.load(Ordering::SeqCst), 1);
    assert_eq!(c.get(&key(1)), Some(1));
    c.put(key(3), 3, TextureFlags::BORROWED);
    assert!(c.peek(&key(2)).is_none());
    assert_eq!(c.peek(&key(1)), Some(&1));
    assert_eq!(c.stats().evictions, 2);
}

#[test]
fn key_kinds_do_not_collide() {
    let mut c: TextureCache<u32> = TextureCache::new(8, 1024);
    c.put(TextureKey::RectBg { radius: 3, size: 4 }, 1, TextureFlags::MANAGED);
    c.put(
        TextureKey::RectShadow { radius: 3, size: 4, blur: 0 },
        2,
        TextureFlags::MANAGED,
    );
    assert_eq!(c.get(&TextureKey::RectBg { radius: 3, size: 4 }), Some(1));
    assert_eq!(c.len(), 2);
}

#[test]
fn replacing_a_key_hands_back_the_old_texture() {
    let mut c: TextureCache<u32> = TextureCache::new(4, 1024);
    c.put(key(1), 10, TextureFlags::MANAGED);
    let ev = c.put(key(1), 11, TextureFlags::MANAGED);
    assert_eq!(ev.len(), 1);
    assert_eq!(ev[0].texture, 10);
    assert_eq!(c.len(), 1);
}

#[test]
fn pinned_entries_survive_pressure() {
    let mut c: TextureCache<u32> = TextureCache::new(1, 1024);
    c.put(key(1), 1, TextureFlags { managed: true, pinned: true });
    let ev = c.put(key(2), 2, TextureFlags::MANAGED);
    assert!(ev.is_empty());
    assert_eq!(c.len(), 2);
    assert!(c.peek(&key(1)).is_some());
    assert!(c.peek(&key(2)).is_some());

    assert!(c.set_pinned(&key(1), false));
    let ev = c.trim();
    assert_eq!(ev.len(), 1);
    assert_eq!(ev[0].key, key(1));
    c.put(key(3), 3, TextureFlags::MANAGED);
    assert!(c.peek(&key(2)).is_none());
    assert_eq!(c.clear().len(), 1);
}

#[test]
fn insert_never_evicts_its_own_entry() {
    let mut c: TextureCache<u32> = TextureCache::new(2, 1024);
    c.put(key(1), 1, TextureFlags { managed: true, pinned: true });
    c.put(key(2), 2, TextureFlags { managed: true, pinned: true });
    for n in 3..6 {
        let ev = c.put(key(n), n, TextureFlags::MANAGED);
        assert_eq!(c.peek(&key(n)), Some(&n));
        if n > 3 {
            assert_eq!(ev.len(), 1);
            assert_eq!(ev[0].key, key(n - 1));
        }
    }
    assert_eq!(c.len(), 3);
    c.set_pinned(&key(1), false);
    c.set_pinned(&key(2), false);
    assert_eq!(c.trim().len(), 1);
    assert_eq!(c.len(), 2);
}

#[test]
fn scratch_sizes_round_up_and_are_reused() {
    let mut c: TextureCache<u32> = TextureCache::new(8, 256);
    let mut created = 0;
    let a = c
        .get_scratch(0, 30, 5, |w, h| {
            created += 1;
            Ok(w * 1000 + h)
        })
        .unwrap();
    assert_eq!((a.width, a.height, a.texture), (32, 8, 32_008));
    let b = c.get_scratch(0, 17, 7, |_, _| Ok(0)).unwrap();
    assert_eq!(b.texture, a.texture);
    assert_eq!(created, 1);

    assert!(c.get_scratch(0, 300, 1, |_, _| Ok(0)).is_err());
    let len = c.len();
    assert!(c.get_scratch(1, 4, 4, |_, _| Err(BlitError::alloc("full"))).is_err());
    assert_eq!(c.len(), len);
}

#[test]
fn remove_where_filters_by_key() {
    let mut c: TextureCache<u32> = TextureCache::new(8, 64);
    let img = |n| TextureKey::Image {
        source: SourceId(n),
        color: Rgba8::BLACK,
        recolor_opa: 0,
        frame_id: 0,
    };
    c.put(img(1), 1, TextureFlags::MANAGED);
    c.put(img(2), 2, TextureFlags::MANAGED);
    c.put(key(1), 3, TextureFlags::MANAGED);
    let gone = c.remove_where(
        |k| matches!(k, TextureKey::Image { source, .. } if *source == SourceId(1)),
    );
    assert_eq!(gone.len(), 1);
    assert_eq!(c.len(), 2);
}
