pub mod capture;
pub mod compose;
pub mod fetch;
pub mod shared;
