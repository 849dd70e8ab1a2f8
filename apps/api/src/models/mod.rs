pub mod announcement;
pub mod assignment;
pub mod course;
pub mod rubric;
pub mod student;
pub mod submission;
