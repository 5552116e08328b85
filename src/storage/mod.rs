//! Storage module - persistent node state

pub mod db;

pub use db::*;
