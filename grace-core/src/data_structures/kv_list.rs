use std::cmp::Ordering as KeyOrdering;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicIsize, AtomicPtr, Ordering};

use crossbeam_utils::Backoff;
use grace_rcu::{Buffered, Flavor, Rcu, RcuGuard};
use log::warn;

use crate::data_structures::internal::{KvNode, MarkedPtr, NodeBox, NodePtr, OwnedNode};
use crate::data_structures::statistics::{Counters, ListStatistics};
use crate::data_structures::{
    ExemptPtr, GlobalNodeAllocator, Iter, KeyComparator, NaturalOrder, NodeAllocator, RawPtr,
};
use crate::error::Result;

/// Lock-free ordered key/value list after Michael's 'High Performance Dynamic
/// Lock-Free Hash Tables and List-Based Sets', reclaimed through a
/// read-copy-update domain.
///
// =============================================================================
// LIST INVARIANTS
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│  30  │───► NULL
// └──────┘    └──────┘    └──────┘    └──────┘
//
// 1. Keys are strictly increasing along the chain, removed nodes included.
// 2. No two active nodes share a key.
// 3. The mark bit lives in a node's own `next` field. Once set, the field
//    never changes again, so nothing can be linked behind a node that is
//    being removed.
// 4. Every traversal runs inside a read-side critical section. A node
//    unlinked during the section stays readable until the section ends.
//
// =============================================================================
// REMOVE (mark, then unlink)
// =============================================================================
//
// Before:     pred ──────► curr ──────► next
//
// Mark:       pred ──────► curr ──╳───► next       curr.next = next | MARK
//
//   The thread whose mark CAS succeeds owns curr from now on. Nobody else
//   will retire it.
//
// Unlink:     pred ─────────────────────► next
//                          curr ──╳───► next
//
//   If CAS(pred.next, curr, next) fails, pred was marked itself or a node
//   was inserted in front of curr. The owner then searches for curr's key
//   from the head. A search never steps over a marked node without
//   unlinking it, so once it returns curr is unreachable and can be handed
//   to the reclamation domain.
//
// =============================================================================
// SEARCH
// =============================================================================
//
// Writers search from the head and help: a marked node in the way is snipped
// with CAS(pred.next, curr, next). A lost CAS restarts from the head.
// Readers (contains, find, get, iter) skip marked nodes and never write.
//
pub struct KvList<K, V, F = Buffered, C = NaturalOrder, A = GlobalNodeAllocator>
where
    F: Flavor,
    A: NodeAllocator,
{
    head: AtomicPtr<KvNode<K, V>>,
    // Signed, an erase may be counted before the insert it undoes.
    len: AtomicIsize,
    rcu: Rcu<F>,
    comparator: C,
    allocator: A,
    counters: Counters,
    _owns: PhantomData<*const KvNode<K, V>>,
}

unsafe impl<K, V, F, C, A> Send for KvList<K, V, F, C, A>
where
    K: Send + Sync,
    V: Send + Sync,
    F: Flavor,
    C: Send,
    A: NodeAllocator,
{
}

unsafe impl<K, V, F, C, A> Sync for KvList<K, V, F, C, A>
where
    K: Send + Sync,
    V: Send + Sync,
    F: Flavor,
    C: Sync,
    A: NodeAllocator,
{
}

/// Result of [`KvList::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The key was present, the functor ran on the existing value.
    Updated,
    /// The key was absent, a node with a default value was linked and the
    /// functor ran on it.
    Inserted,
    /// The key was absent and insertion was not allowed.
    Absent,
}

impl UpdateOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, UpdateOutcome::Absent)
    }

    pub fn is_inserted(self) -> bool {
        matches!(self, UpdateOutcome::Inserted)
    }
}

// Location of a key: `curr` is the first active node whose key is not less
// than the target, `pred` the link pointing at it.
//
struct Position<'a, K, V> {
    pred: &'a AtomicPtr<KvNode<K, V>>,
    curr: NodePtr<K, V>,
    found: bool,
}

impl<K, V, F> KvList<K, V, F>
where
    K: Ord,
    F: Flavor,
{
    pub fn new(rcu: Rcu<F>) -> Self {
        Self::with_parts(rcu, NaturalOrder, GlobalNodeAllocator)
    }
}

impl<K, V, F, C> KvList<K, V, F, C>
where
    F: Flavor,
    C: KeyComparator<K>,
{
    pub fn with_comparator(rcu: Rcu<F>, comparator: C) -> Self {
        Self::with_parts(rcu, comparator, GlobalNodeAllocator)
    }
}

impl<K, V, F, C, A> KvList<K, V, F, C, A>
where
    F: Flavor,
    A: NodeAllocator,
{
    pub fn with_parts(rcu: Rcu<F>, comparator: C, allocator: A) -> Self {
        KvList {
            head: AtomicPtr::new(ptr::null_mut()),
            len: AtomicIsize::new(0),
            rcu,
            comparator,
            allocator,
            counters: Counters::default(),
            _owns: PhantomData,
        }
    }

    /// The reclamation domain nodes of this list are retired to.
    pub fn rcu(&self) -> &Rcu<F> {
        &self.rcu
    }

    /// Number of active entries. Approximate while writers are running.
    pub fn size(&self) -> usize {
        self.len.load(Ordering::Relaxed).max(0) as usize
    }

    pub fn statistics(&self) -> ListStatistics {
        self.counters.snapshot()
    }
}

impl<K, V, F, C, A> KvList<K, V, F, C, A>
where
    K: Send + 'static,
    V: Send + 'static,
    F: Flavor,
    C: KeyComparator<K>,
    A: NodeAllocator,
{
    // =========================================================================
    // Insertion
    // =========================================================================

    /// Links `key` with `value`. Returns false if the key is already present.
    /// Allocation failure is logged and reported as false, use
    /// [`try_insert`](Self::try_insert) to tell the two apart.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.report_insert(self.try_insert(key, value))
    }

    pub fn try_insert(&self, key: K, value: V) -> Result<bool> {
        let node = self.allocate(key, value)?;
        Ok(self.link(node).is_some())
    }

    /// Links `key` with `V::default()`.
    pub fn insert_default(&self, key: K) -> bool
    where
        V: Default,
    {
        self.report_insert(self.try_insert_default(key))
    }

    pub fn try_insert_default(&self, key: K) -> Result<bool>
    where
        V: Default,
    {
        self.try_insert(key, V::default())
    }

    /// Links `key` with `V::default()` and runs `f` on the entry once it is
    /// reachable. Other threads may see the default value before `f` runs,
    /// so `f` initializes through interior mutability.
    pub fn insert_with<Func>(&self, key: K, f: Func) -> bool
    where
        V: Default,
        Func: FnOnce(&K, &V),
    {
        self.report_insert(self.try_insert_with(key, f))
    }

    pub fn try_insert_with<Func>(&self, key: K, f: Func) -> Result<bool>
    where
        V: Default,
        Func: FnOnce(&K, &V),
    {
        let node = self.allocate(key, V::default())?;

        // Keeps the node alive between linking and `f`.
        let _guard = self.rcu.read_lock();
        match self.link(node) {
            Some(linked) => {
                let node = unsafe { linked.as_ref() };
                f(node.key(), node.value());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Links `key` with a value built from `args`.
    pub fn emplace<Args>(&self, key: K, args: Args) -> bool
    where
        V: From<Args>,
    {
        self.report_insert(self.try_emplace(key, args))
    }

    pub fn try_emplace<Args>(&self, key: K, args: Args) -> Result<bool>
    where
        V: From<Args>,
    {
        self.try_insert(key, V::from(args))
    }

    fn allocate(&self, key: K, value: V) -> Result<NodeBox<'_, K, V, A>> {
        NodeBox::new(&self.allocator, key, value).inspect_err(|_| {
            self.counters.on_allocation_failure();
        })
    }

    fn report_insert(&self, result: Result<bool>) -> bool {
        match result {
            Ok(inserted) => inserted,
            Err(err) => {
                warn!("insert failed: {}", err);
                false
            }
        }
    }

    // Links `node` in key order. On a duplicate key the node is dropped,
    // which frees it since it was never reachable.
    //
    fn link(&self, node: NodeBox<'_, K, V, A>) -> Option<NonNull<KvNode<K, V>>> {
        let _guard = self.rcu.read_lock();
        let backoff = Backoff::new();

        loop {
            let position = unsafe { self.search(self.seek(node.key())) };
            if position.found {
                self.counters.on_insert_failure();
                return None;
            }

            node.set_next(position.curr);

            match position.pred.compare_exchange(
                position.curr,
                node.as_ptr(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.len.fetch_add(1, Ordering::Relaxed);
                    self.counters.on_insert();
                    return Some(node.publish());
                }
                Err(_) => {
                    // Another writer changed the link, or pred got marked.
                    self.counters.on_cas_retry();
                    backoff.spin();
                }
            }
        }
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Runs `f(false, value)` on the value of `key` if present. Otherwise, if
    /// `allow_insert` is set, links `key` with `V::default()` and runs
    /// `f(true, value)` on the new node.
    ///
    /// The functor runs inside a critical section while other writers may
    /// link around the node. It must not block and must not remove entries.
    pub fn update<Func>(&self, key: K, f: Func, allow_insert: bool) -> UpdateOutcome
    where
        V: Default,
        Func: FnOnce(bool, &V),
    {
        match self.try_update(key, f, allow_insert) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("update failed: {}", err);
                UpdateOutcome::Absent
            }
        }
    }

    pub fn try_update<Func>(&self, key: K, f: Func, allow_insert: bool) -> Result<UpdateOutcome>
    where
        V: Default,
        Func: FnOnce(bool, &V),
    {
        {
            let _guard = self.rcu.read_lock();
            let position = unsafe { self.search(self.seek(&key)) };
            if position.found {
                f(false, unsafe { &*position.curr }.value());
                self.counters.on_update();
                return Ok(UpdateOutcome::Updated);
            }
        }

        if !allow_insert {
            return Ok(UpdateOutcome::Absent);
        }

        let node = self.allocate(key, V::default())?;

        let _guard = self.rcu.read_lock();
        let backoff = Backoff::new();

        loop {
            let position = unsafe { self.search(self.seek(node.key())) };
            if position.found {
                // A concurrent insert of the same key won the race.
                f(false, unsafe { &*position.curr }.value());
                self.counters.on_update();
                return Ok(UpdateOutcome::Updated);
            }

            node.set_next(position.curr);

            match position.pred.compare_exchange(
                position.curr,
                node.as_ptr(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.len.fetch_add(1, Ordering::Relaxed);
                    self.counters.on_update_insert();
                    let linked = node.publish();
                    f(true, unsafe { linked.as_ref() }.value());
                    return Ok(UpdateOutcome::Inserted);
                }
                Err(_) => {
                    self.counters.on_cas_retry();
                    backoff.spin();
                }
            }
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes `key`. Returns whether it was present.
    ///
    /// Panics inside a read-side critical section, retiring may wait for a
    /// grace period.
    pub fn erase(&self, key: &K) -> bool {
        self.erase_with(key, |_, _| {})
    }

    /// Removes `key` and runs `f` on the removed entry before the node is
    /// retired.
    pub fn erase_with<Func>(&self, key: &K, f: Func) -> bool
    where
        Func: FnOnce(&K, &V),
    {
        self.erase_by_with(key, |k, key| self.comparator.compare(k, key), f)
    }

    /// Removes the entry that `cmp` reports equal to `key`.
    ///
    /// `cmp(entry_key, key)` must order the entries the same way the list's
    /// comparator does, otherwise the search stops at the wrong place.
    pub fn erase_by<Q, Cmp>(&self, key: &Q, cmp: Cmp) -> bool
    where
        Q: ?Sized,
        Cmp: Fn(&K, &Q) -> KeyOrdering,
    {
        self.erase_by_with(key, cmp, |_, _| {})
    }

    /// [`erase_by`](Self::erase_by) running `f` on the removed entry before
    /// the node is retired.
    pub fn erase_by_with<Q, Cmp, Func>(&self, key: &Q, cmp: Cmp, f: Func) -> bool
    where
        Q: ?Sized,
        Cmp: Fn(&K, &Q) -> KeyOrdering,
        Func: FnOnce(&K, &V),
    {
        self.assert_can_reclaim();

        match self.unlink(|k| cmp(k, key)) {
            Some(node) => {
                f(node.get().key(), node.get().value());
                self.counters.on_erase();
                self.retire(node);
                true
            }
            None => {
                self.counters.on_erase_failure();
                false
            }
        }
    }

    /// Removes `key` and returns the node to the caller. The node is retired
    /// once the returned handle is released.
    pub fn extract(&self, key: &K) -> Option<ExemptPtr<K, V, F, A>> {
        self.extract_by(key, |k, key| self.comparator.compare(k, key))
    }

    /// [`extract`](Self::extract) with a search key of another type, see
    /// [`erase_by`](Self::erase_by).
    pub fn extract_by<Q, Cmp>(&self, key: &Q, cmp: Cmp) -> Option<ExemptPtr<K, V, F, A>>
    where
        Q: ?Sized,
        Cmp: Fn(&K, &Q) -> KeyOrdering,
    {
        let node = self.unlink(|k| cmp(k, key))?;
        self.counters.on_extract();
        Some(ExemptPtr::new(
            node,
            self.rcu.clone(),
            self.allocator.clone(),
        ))
    }

    /// Removes every entry.
    ///
    /// Panics inside a read-side critical section.
    pub fn clear(&self) {
        self.assert_can_reclaim();

        while let Some(node) = self.unlink_first() {
            self.counters.on_erase();
            self.retire(node);
        }
    }

    fn assert_can_reclaim(&self) {
        assert!(
            !self.rcu.is_locked(),
            "removal inside a read-side critical section of the list's domain"
        );
    }

    fn retire(&self, node: OwnedNode<K, V>) {
        let allocator = self.allocator.clone();

        // SAFETY: the deferred action runs after a grace period.
        self.rcu.defer(move || unsafe { node.destroy(&allocator) });
    }

    fn unlink<P>(&self, seek: P) -> Option<OwnedNode<K, V>>
    where
        P: Fn(&K) -> KeyOrdering,
    {
        let _guard = self.rcu.read_lock();
        let backoff = Backoff::new();

        loop {
            let position = unsafe { self.search(&seek) };
            if !position.found {
                return None;
            }

            match unsafe { self.remove_node(Some(position.pred), position.curr) } {
                Some(node) => return Some(node),
                None => backoff.spin(),
            }
        }
    }

    fn unlink_first(&self) -> Option<OwnedNode<K, V>> {
        let _guard = self.rcu.read_lock();
        let backoff = Backoff::new();

        loop {
            let first = unsafe { self.first_active() };
            if first.is_null() {
                return None;
            }

            // The predecessor is unknown, the helping search finishes the unlink.
            match unsafe { self.remove_node(None, first) } {
                Some(node) => return Some(node),
                None => backoff.spin(),
            }
        }
    }

    // Marks `curr` and makes sure it is unlinked. Returns None if the mark
    // was lost to a concurrent writer, the caller retries.
    //
    // Safety: must run inside a critical section, `curr` must have been
    // reached in it.
    //
    unsafe fn remove_node(
        &self,
        pred: Option<&AtomicPtr<KvNode<K, V>>>,
        curr: NodePtr<K, V>,
    ) -> Option<OwnedNode<K, V>> {
        let node = unsafe { &*curr };
        let next = MarkedPtr::new(node.load_next());
        if next.is_marked() {
            // Another remover owns it.
            return None;
        }

        if node
            .next()
            .compare_exchange(
                next.as_raw(),
                next.marked().as_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            self.counters.on_cas_retry();
            return None;
        }

        // The mark made this thread the owner.
        //
        let unlinked = pred.is_some_and(|pred| {
            pred.compare_exchange(curr, next.as_raw(), Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        });
        if !unlinked {
            unsafe { self.search_unlinking(self.seek(node.key()), curr) };
        }

        self.len.fetch_sub(1, Ordering::Relaxed);

        // SAFETY: curr is unreachable now and this thread marked it.
        Some(unsafe { OwnedNode::from_unlinked(NonNull::new_unchecked(curr)) })
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn contains(&self, key: &K) -> bool {
        self.find_map(key, |_, _| ()).is_some()
    }

    /// Runs `f` on the entry of `key` while the critical section is still
    /// open. Returns whether the key was present.
    pub fn find<Func>(&self, key: &K, f: Func) -> bool
    where
        Func: FnOnce(&K, &V),
    {
        self.find_map(key, f).is_some()
    }

    /// Maps the entry of `key` through `f`.
    pub fn find_map<R, Func>(&self, key: &K, f: Func) -> Option<R>
    where
        Func: FnOnce(&K, &V) -> R,
    {
        self.find_map_by(key, |k, key| self.comparator.compare(k, key), f)
    }

    /// Whether an entry that `cmp` reports equal to `key` is present.
    ///
    /// `cmp(entry_key, key)` must order the entries the same way the list's
    /// comparator does.
    pub fn contains_by<Q, Cmp>(&self, key: &Q, cmp: Cmp) -> bool
    where
        Q: ?Sized,
        Cmp: Fn(&K, &Q) -> KeyOrdering,
    {
        self.find_map_by(key, cmp, |_, _| ()).is_some()
    }

    pub fn find_by<Q, Cmp, Func>(&self, key: &Q, cmp: Cmp, f: Func) -> bool
    where
        Q: ?Sized,
        Cmp: Fn(&K, &Q) -> KeyOrdering,
        Func: FnOnce(&K, &V),
    {
        self.find_map_by(key, cmp, f).is_some()
    }

    pub fn find_map_by<Q, Cmp, R, Func>(&self, key: &Q, cmp: Cmp, f: Func) -> Option<R>
    where
        Q: ?Sized,
        Cmp: Fn(&K, &Q) -> KeyOrdering,
        Func: FnOnce(&K, &V) -> R,
    {
        let _guard = self.rcu.read_lock();
        let node = unsafe { self.locate(|k| cmp(k, key)) };

        if node.is_null() {
            self.counters.on_find_failure();
            None
        } else {
            self.counters.on_find();
            let node = unsafe { &*node };
            Some(f(node.key(), node.value()))
        }
    }

    /// Borrows the entry of `key` for as long as `guard` stays open.
    ///
    /// Panics if `guard` belongs to another domain or the calling thread is
    /// outside a critical section of this list's domain.
    pub fn get<'g>(&'g self, key: &K, guard: &'g RcuGuard<'_, F>) -> Option<RawPtr<'g, K, V>> {
        self.get_by(key, |k, key| self.comparator.compare(k, key), guard)
    }

    /// [`get`](Self::get) with a search key of another type, see
    /// [`contains_by`](Self::contains_by).
    pub fn get_by<'g, Q, Cmp>(
        &'g self,
        key: &Q,
        cmp: Cmp,
        guard: &'g RcuGuard<'_, F>,
    ) -> Option<RawPtr<'g, K, V>>
    where
        Q: ?Sized,
        Cmp: Fn(&K, &Q) -> KeyOrdering,
    {
        self.assert_protected(guard);

        let node = unsafe { self.locate(|k| cmp(k, key)) };
        if node.is_null() {
            self.counters.on_find_failure();
            None
        } else {
            self.counters.on_find();
            Some(RawPtr::new(unsafe { &*node }))
        }
    }

    /// Active entries in key order, for as long as `guard` stays open.
    ///
    /// Panics under the same conditions as [`get`](Self::get).
    pub fn iter<'g>(&'g self, guard: &'g RcuGuard<'_, F>) -> Iter<'g, K, V> {
        self.assert_protected(guard);
        Iter::new(self.head.load(Ordering::Acquire))
    }

    fn assert_protected(&self, guard: &RcuGuard<'_, F>) {
        assert!(
            guard.protects(&self.rcu),
            "guard belongs to another reclamation domain"
        );
        assert!(
            self.rcu.is_locked(),
            "borrowing from the list outside a read-side critical section"
        );
    }

    pub fn empty(&self) -> bool {
        let _guard = self.rcu.read_lock();
        unsafe { self.first_active() }.is_null()
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    fn seek<'k>(&'k self, key: &'k K) -> impl Fn(&K) -> KeyOrdering + 'k {
        move |k| self.comparator.compare(k, key)
    }

    // Writer search with helping, see the SEARCH section above. `seek`
    // orders an entry's key against the target.
    //
    // Safety: must run inside a critical section. The returned references
    // are valid until it ends.
    //
    unsafe fn search<'a, P>(&'a self, seek: P) -> Position<'a, K, V>
    where
        P: Fn(&K) -> KeyOrdering,
    {
        unsafe { self.search_unlinking(seek, ptr::null_mut()) }
    }

    // Search run by the remover of `own`. Snipping `own` on the way is not
    // helping.
    //
    unsafe fn search_unlinking<'a, P>(&'a self, seek: P, own: NodePtr<K, V>) -> Position<'a, K, V>
    where
        P: Fn(&K) -> KeyOrdering,
    {
        let backoff = Backoff::new();

        'retry: loop {
            let mut pred: &'a AtomicPtr<KvNode<K, V>> = &self.head;
            let mut curr = pred.load(Ordering::Acquire);

            loop {
                if curr.is_null() {
                    return Position {
                        pred,
                        curr,
                        found: false,
                    };
                }

                let node: &'a KvNode<K, V> = unsafe { &*curr };
                let next = MarkedPtr::new(node.load_next());

                if next.is_marked() {
                    match pred.compare_exchange(
                        curr,
                        next.as_ptr(),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    ) {
                        Ok(_) => {
                            if curr != own {
                                self.counters.on_help_unlink();
                            }
                            curr = next.as_ptr();
                            continue;
                        }
                        Err(_) => {
                            // pred got marked or changed under us.
                            self.counters.on_cas_retry();
                            backoff.spin();
                            continue 'retry;
                        }
                    }
                }

                match seek(node.key()) {
                    KeyOrdering::Less => {
                        pred = node.next();
                        curr = next.as_raw();
                    }
                    ordering => {
                        return Position {
                            pred,
                            curr,
                            found: ordering == KeyOrdering::Equal,
                        };
                    }
                }
            }
        }
    }

    // Read-only lookup, skips removed nodes without unlinking them.
    //
    // Safety: must run inside a critical section.
    //
    unsafe fn locate<P>(&self, seek: P) -> NodePtr<K, V>
    where
        P: Fn(&K) -> KeyOrdering,
    {
        let mut curr = self.head.load(Ordering::Acquire);

        while !curr.is_null() {
            let node = unsafe { &*curr };
            let next = MarkedPtr::new(node.load_next());

            if !next.is_marked() {
                match seek(node.key()) {
                    KeyOrdering::Less => {}
                    KeyOrdering::Equal => return curr,
                    KeyOrdering::Greater => return ptr::null_mut(),
                }
            }

            curr = next.as_ptr();
        }

        ptr::null_mut()
    }

    // Safety: must run inside a critical section.
    //
    unsafe fn first_active(&self) -> NodePtr<K, V> {
        let mut curr = self.head.load(Ordering::Acquire);

        while !curr.is_null() {
            let next = MarkedPtr::new(unsafe { &*curr }.load_next());
            if !next.is_marked() {
                return curr;
            }
            curr = next.as_ptr();
        }

        ptr::null_mut()
    }
}

impl<K, V, F> Default for KvList<K, V, F>
where
    K: Ord,
    F: Flavor,
{
    /// A list reclaimed through the shared domain of flavor `F`.
    fn default() -> Self {
        Self::new(Rcu::shared())
    }
}

impl<K, V, F, C, A> fmt::Debug for KvList<K, V, F, C, A>
where
    F: Flavor,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvList")
            .field("size", &self.size())
            .field("rcu", &self.rcu)
            .finish()
    }
}

impl<K, V, F, C, A> Drop for KvList<K, V, F, C, A>
where
    F: Flavor,
    A: NodeAllocator,
{
    fn drop(&mut self) {
        // No reader can hold a reference into the list anymore: every
        // handle borrows it.
        //
        let mut curr = *self.head.get_mut();
        while !curr.is_null() {
            let next = MarkedPtr::new(unsafe { &*curr }.load_next());

            // A marked node belongs to its remover, which retires it.
            if !next.is_marked() {
                unsafe { KvNode::destroy(NonNull::new_unchecked(curr), &self.allocator) };
            }

            curr = next.as_ptr();
        }
    }
}
