#![cfg(test)]

use std::{cell::Cell, rc::Rc};

use super::*;

/// Library stand-in that counts how many times it has been released.
struct Tracked {
    name: &'static str,
    released: Rc<Cell<usize>>,
}

impl Tracked {
    fn new(name: &'static str, released: &Rc<Cell<usize>>) -> Self {
        Self {
            name,
            released: Rc::clone(released),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

#[test]
fn test_lookup_is_pure() {
    let released = Rc::new(Cell::new(0));
    let mut cache = LibraryCache::new();
    cache.insert("a.metallib", Tracked::new("a", &released));

    assert_eq!(cache.lookup("a.metallib").map(|lib| lib.name), Some("a"));
    assert!(cache.lookup("b.metallib").is_none());
    assert_eq!(cache.metrics(), CacheMetrics { size: 1, hits: 0, misses: 0 });
}

#[test]
fn test_get_or_try_insert_builds_once() {
    let released = Rc::new(Cell::new(0));
    let builds = Cell::new(0);
    let mut cache = LibraryCache::new();

    let first: *const Tracked = cache
        .get_or_try_insert_with("k", || {
            builds.set(builds.get() + 1);
            Ok::<_, ()>(Tracked::new("k", &released))
        })
        .expect("build succeeds");
    let second: *const Tracked = cache
        .get_or_try_insert_with("k", || {
            builds.set(builds.get() + 1);
            Ok::<_, ()>(Tracked::new("k2", &released))
        })
        .expect("cached");

    assert_eq!(builds.get(), 1);
    assert!(std::ptr::eq(first, second));
    assert_eq!(cache.metrics(), CacheMetrics { size: 1, hits: 1, misses: 1 });
}

#[test]
fn test_hit_on_long_inline_key_keeps_the_stored_key() {
    let released = Rc::new(Cell::new(0));
    let mut cache = LibraryCache::new();
    let program = format!("kernel void k(){{}}\n{}", "// comment\n".repeat(10_000));

    cache
        .get_or_try_insert_with(&program, || Ok::<_, ()>(Tracked::new("k", &released)))
        .expect("build succeeds");
    let stored = cache.keys().next().expect("one key").as_ptr();

    for _ in 0..3 {
        let lib = cache
            .get_or_try_insert_with(&program, || Err(()))
            .expect("hit never builds");
        assert_eq!(lib.name, "k");
    }
    assert_eq!(cache.keys().next().map(str::as_ptr), Some(stored));
    assert_eq!(cache.metrics(), CacheMetrics { size: 1, hits: 3, misses: 1 });
    assert_eq!(released.get(), 0);
}

#[test]
fn test_failed_build_is_not_cached() {
    let released = Rc::new(Cell::new(0));
    let mut cache: LibraryCache<Tracked> = LibraryCache::new();

    let err = cache.get_or_try_insert_with("k", || Err("boom")).err();
    assert_eq!(err, Some("boom"));
    assert!(cache.is_empty());

    let lib = cache
        .get_or_try_insert_with("k", || Ok::<_, &str>(Tracked::new("k", &released)))
        .expect("retry succeeds");
    assert_eq!(lib.name, "k");
    assert_eq!(cache.metrics().misses, 2);
}

#[test]
fn test_insert_releases_replaced_library() {
    let released = Rc::new(Cell::new(0));
    let mut cache = LibraryCache::new();
    cache.insert("k", Tracked::new("old", &released));
    let current = cache.insert("k", Tracked::new("new", &released));

    assert_eq!(current.name, "new");
    assert_eq!(released.get(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_drop_releases_every_library_once() {
    let released = Rc::new(Cell::new(0));
    {
        let mut cache = LibraryCache::new();
        cache.insert("a", Tracked::new("a", &released));
        cache.insert("b", Tracked::new("b", &released));
        cache.insert("c", Tracked::new("c", &released));
        assert_eq!(released.get(), 0);
    }
    assert_eq!(released.get(), 3);
}

#[test]
fn test_iteration_is_key_ordered() {
    let released = Rc::new(Cell::new(0));
    let mut cache = LibraryCache::new();
    cache.insert("shaders/b.metallib", Tracked::new("b", &released));
    cache.insert("kernel void z(){}", Tracked::new("inline", &released));
    cache.insert("shaders/a.metallib", Tracked::new("a", &released));

    let keys: Vec<&str> = cache.keys().collect();
    assert_eq!(keys, ["kernel void z(){}", "shaders/a.metallib", "shaders/b.metallib"]);
    let names: Vec<&str> = cache.libraries().map(|lib| lib.name).collect();
    assert_eq!(names, ["inline", "a", "b"]);
    assert!(cache.contains("shaders/a.metallib"));
}
