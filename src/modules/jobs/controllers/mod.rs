pub mod job_controller;
