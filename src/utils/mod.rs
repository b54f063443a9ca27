// src/utils/mod.rs

pub mod codes;
pub mod files;
