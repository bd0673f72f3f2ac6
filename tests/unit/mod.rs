mod fanout_tests;
mod property_tests;
mod scenario_tests;
mod test_helpers;
mod validation_tests;
