// Data structures and types

pub mod model;

pub use model::Model;
