pub mod catalog;
pub mod evaluate;
pub mod expand;
pub mod predict;
pub mod summary;
pub mod validate;
