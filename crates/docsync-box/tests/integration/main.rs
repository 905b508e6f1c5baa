//! Integration tests for docsync-box
//!
//! Uses wiremock to simulate the Box API and verifies listing, metadata,
//! download and token handling end to end.


mod test_auth;
mod test_source_tree;
