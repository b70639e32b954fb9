pub mod account;
pub mod checkout;
pub mod generation;

pub use account::*;
pub use checkout::*;
pub use generation::*;
