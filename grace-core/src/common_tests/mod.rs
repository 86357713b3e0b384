//! Test bodies shared by the integration tests of every reclamation flavor.

pub mod kv_list_stress_tests;
