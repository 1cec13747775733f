pub mod company;
pub mod vacancy;
