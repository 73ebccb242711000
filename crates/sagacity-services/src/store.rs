// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Keyed in-memory record store.
//!
//! One store per record type, keyed by the opaque subject identifier. The
//! map lock is held only to locate or insert an entry; all work against a
//! record runs under that entry's own lock. Lookup-or-create and
//! read-modify-write are therefore atomic per subject, and a long
//! mutation on one subject never blocks access to another.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Entry<T> = Arc<Mutex<T>>;

#[derive(Debug, Default)]
pub struct SubjectStore<T> {
    inner: Mutex<HashMap<String, Entry<T>>>,
}

impl<T> SubjectStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` against the subject's record, or `None` if absent.
    pub fn read<R>(&self, subject: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        let entry = self.inner.lock().get(subject).map(Arc::clone)?;
        let record = entry.lock();
        Some(f(&record))
    }

    /// Atomic lookup-or-create followed by a mutation under the entry's
    /// lock. `f` receives the record and whether it was just created.
    ///
    /// Creation sticks even when `f` reports an error, matching the
    /// observed accumulate semantics: a subject's record exists from its
    /// first write attempt onward.
    pub fn mutate_or_create<R>(
        &self,
        subject: &str,
        create: impl FnOnce() -> T,
        f: impl FnOnce(&mut T, bool) -> R,
    ) -> R {
        let (entry, created) = {
            let mut map = self.inner.lock();
            let created = !map.contains_key(subject);
            let entry = map
                .entry(subject.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(create())));
            (Arc::clone(entry), created)
        };
        let mut record = entry.lock();
        f(&mut record, created)
    }

    /// Replaces the subject's record wholesale.
    pub fn put(&self, subject: &str, value: T) {
        self.inner
            .lock()
            .insert(subject.to_string(), Arc::new(Mutex::new(value)));
    }

    /// Removes the subject's record, reporting whether one existed.
    pub fn remove(&self, subject: &str) -> bool {
        self.inner.lock().remove(subject).is_some()
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.inner.lock().contains_key(subject)
    }
}
