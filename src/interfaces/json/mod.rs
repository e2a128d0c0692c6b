pub mod job_reader;
