// src/models/mod.rs

pub mod quiz;
pub mod roadmap;
pub mod user;
