//! Integration tests for tei-sync
//!
//! These tests run the publisher against wiremock servers and check the
//! files it leaves in temporary site trees.

mod collection_tests;
mod common;
mod transform_tests;
