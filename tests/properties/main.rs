//! Property tests for the pure helpers.

mod origin_tests;
mod path_tests;
mod tag_tests;
