pub mod faculty;
pub mod salary;
