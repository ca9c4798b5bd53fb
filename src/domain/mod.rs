pub mod feedback;
pub mod record;
pub mod store;
pub mod todo;
