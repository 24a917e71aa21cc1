pub mod equal_error_rate;
pub mod evaluation_record;
pub mod report_writer;
pub mod word_error_rate;
