// src/pipeline/mod.rs
//
// Orchestration of the generation pipelines (research -> generate ->
// extract -> validate -> persist) and of the quiz scoring engine.
// Handlers stay thin; everything with failure-handling logic lives here.

pub mod quiz;
pub mod roadmap;
