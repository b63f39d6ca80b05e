pub mod analyst;
pub mod news;
pub mod prompt;
