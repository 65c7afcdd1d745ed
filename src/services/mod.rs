pub mod accounts;
pub mod books;
pub mod candidates;
pub mod completion;
pub mod discussions;
pub mod favorites;
pub mod likes;
pub mod recommendations;
pub mod taxonomy;
