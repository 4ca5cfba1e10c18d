pub mod account;
pub mod like;
pub mod listing;
