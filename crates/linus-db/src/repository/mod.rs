//! # Repositories
//!
//! One repository per aggregate, each holding a pool handle. Every
//! repository reads through a private `…Row` struct (`FromRow`, snake_case
//! columns) and converts to the linus-core type before returning, so money
//! in minor units and rates in basis points never leak out as raw integers.
//!
//! Multi-row writes (bulk upsert, sale commit, held-invoice take, user
//! create) run in a single transaction.

pub mod held;
pub mod product;
pub mod sale;
pub mod settings;
pub mod user;
