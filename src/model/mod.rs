pub mod month;
pub mod role;
pub mod salary;
pub mod user;
