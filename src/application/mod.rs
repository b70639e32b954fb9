pub mod generate;
pub mod payments;

pub use generate::*;
pub use payments::*;
