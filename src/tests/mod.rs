mod invariant_tests;
mod proptest_tests;
mod scenario_tests;
