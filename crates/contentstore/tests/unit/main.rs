//! Unit tests for the content store API.

mod detail_test;
mod discriminators_test;
mod find_test;
mod store_test;
