use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a list's operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStatistics {
    pub inserts: u64,
    pub insert_failures: u64,
    pub updates: u64,
    pub update_inserts: u64,
    pub erases: u64,
    pub erase_failures: u64,
    pub extracts: u64,
    pub finds: u64,
    pub find_failures: u64,
    /// CAS attempts lost to a concurrent writer and retried.
    pub cas_retries: u64,
    /// Logically removed nodes unlinked by a search other than their
    /// remover's own.
    pub help_unlinks: u64,
    pub allocation_failures: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    inserts: AtomicU64,
    insert_failures: AtomicU64,
    updates: AtomicU64,
    update_inserts: AtomicU64,
    erases: AtomicU64,
    erase_failures: AtomicU64,
    extracts: AtomicU64,
    finds: AtomicU64,
    find_failures: AtomicU64,
    cas_retries: AtomicU64,
    help_unlinks: AtomicU64,
    allocation_failures: AtomicU64,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        impl Counters {
            $(
                #[inline]
                pub(crate) fn $name(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*

            pub(crate) fn snapshot(&self) -> ListStatistics {
                ListStatistics {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }
        }
    };
}

counter! {
    on_insert => inserts,
    on_insert_failure => insert_failures,
    on_update => updates,
    on_update_insert => update_inserts,
    on_erase => erases,
    on_erase_failure => erase_failures,
    on_extract => extracts,
    on_find => finds,
    on_find_failure => find_failures,
    on_cas_retry => cas_retries,
    on_help_unlink => help_unlinks,
    on_allocation_failure => allocation_failures,
}
