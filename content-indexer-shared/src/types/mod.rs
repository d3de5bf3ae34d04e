//! This module defines the core data structures used across the content indexer.

pub mod content_item;
pub mod descriptor;
pub mod document;
pub mod field_layout;
pub mod fields;
pub mod field_value;
pub mod outcome;
