use grace_core::common_tests::kv_list_core_tests;
use grace_core::data_structures::KvList;
use grace_rcu::{Buffered, Flavor, Instant, Rcu, Threaded};
use rstest::rstest;
use serial_test::serial;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_basic_operations<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_basic_operations(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_update_outcomes<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_update_outcomes(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_extract<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_extract(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_concurrent_inserts<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_concurrent_inserts(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_concurrent_same_key<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_concurrent_same_key(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_concurrent_updates<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_concurrent_updates(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_reader_survives_erase<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_reader_survives_erase(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_grace_period_delays_destruction<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_grace_period_delays_destruction(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::new())]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_iteration_order<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_core_tests::test_iteration_order(rcu);
}

// Lists built with Default share the process-wide domain of their flavor.
#[rstest]
#[serial]
#[case::instant(KvList::<u32, u32, Instant>::default())]
#[case::buffered(KvList::<u32, u32, Buffered>::default())]
#[case::threaded(KvList::<u32, u32, Threaded>::default())]
fn test_default_list_uses_shared_domain<F: Flavor>(#[case] list: KvList<u32, u32, F>) {
    assert!(list.rcu().same_domain(&Rcu::<F>::shared()));

    assert!(list.insert(1, 10));
    assert!(list.erase(&1));
    list.rcu().synchronize();
    assert!(list.empty());
}
