pub mod order;
pub mod slot;
pub mod vocabulary;
