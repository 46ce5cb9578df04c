//! Catalog integration tests

mod items;
mod sets;
mod version;
