//! Core types for the direct-line allocator

pub mod allocation;
pub mod tick;
