pub mod candidates;
pub mod extract;
pub mod inventory;
pub mod review;
