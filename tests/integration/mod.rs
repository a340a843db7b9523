//! Integration tests exercising the library as a whole

mod lifecycle_tests;
