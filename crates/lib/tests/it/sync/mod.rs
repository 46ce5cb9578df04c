//! Set/component synchronization tests

mod policy;
mod recursion;
mod scenarios;
