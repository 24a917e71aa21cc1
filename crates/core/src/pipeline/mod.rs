pub mod anonymization_pipeline;
pub mod batch_manifest;
pub mod batch_runner;
pub mod pipeline_logger;
