//! Integration tests

mod config_test;
mod dashboard_test;
mod feed_test;
