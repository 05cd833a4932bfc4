pub mod attachment;
pub mod bug;
pub mod comment;
pub mod profile;
pub mod search;
pub mod utils;
