// src/handlers/mod.rs

pub mod auth;
pub mod quiz;
pub mod roadmap;
pub mod topic;
