pub mod controller;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod input;
pub mod leaf;
pub mod tree;
