pub mod jobs;
pub mod traces;
