//! Scenario tests for the sensitivity pipeline
//!
//! Tests are organized by topic:
//! - `fixtures` - synthetic tower network and stub models shared by all tests
//! - `assembly` - stratification, masking and co-indexing of driver data
//! - `pipeline` - sampling, evaluation, analysis and export end to end

pub(crate) mod fixtures;

mod pipeline;
