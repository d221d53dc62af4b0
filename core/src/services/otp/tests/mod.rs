
mod engine_tests;
