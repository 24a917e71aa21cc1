pub mod audio;
pub mod evaluation;
pub mod pipeline;
pub mod shared;
