use grace_core::common_tests::kv_list_stress_tests;
use grace_rcu::{Buffered, Flavor, Instant, Rcu, RcuConfig, Threaded};
use rstest::rstest;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Forces frequent grace periods under load.
fn small_buffer() -> RcuConfig {
    RcuConfig::default().with_buffer_capacity(8)
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::with_config(small_buffer()))]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_mixed_operations_stay_sorted<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_stress_tests::test_mixed_operations_stay_sorted(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::with_config(small_buffer()))]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_insert_erase_churn<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_stress_tests::test_insert_erase_churn(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::with_config(small_buffer()))]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_extract_has_single_winner<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_stress_tests::test_extract_has_single_winner(rcu);
}

#[rstest]
#[case::instant(Rcu::<Instant>::new())]
#[case::buffered(Rcu::<Buffered>::with_config(small_buffer()))]
#[case::threaded(Rcu::<Threaded>::new())]
fn test_disjoint_writers_match_model<F: Flavor>(#[case] rcu: Rcu<F>) {
    init_logging();
    kv_list_stress_tests::test_disjoint_writers_match_model(rcu);
}
