//! Route handlers

pub mod login;
pub mod pages;
pub mod upload;

pub use login::*;
pub use pages::*;
pub use upload::*;
