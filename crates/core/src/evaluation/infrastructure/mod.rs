pub mod csv_report_writer;
pub mod json_report_writer;
pub mod report_writer_factory;
