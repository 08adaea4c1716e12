//! Integration tests for the Candlepin policy engine.

mod helpers;

mod autobind_test;
mod compliance_test;
mod quantity_test;
mod validation_test;
