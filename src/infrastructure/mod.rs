pub mod config;
pub mod openai;
pub mod repository;
pub mod stripe;
pub mod webhook;

pub use config::*;
pub use openai::*;
pub use repository::*;
pub use stripe::*;
pub use webhook::*;
