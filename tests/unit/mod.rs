/// Unit tests for the public library surface
mod basic_tests;
