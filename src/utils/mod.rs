pub mod amount;
pub mod helpers;

pub use amount::{TokenAmount, MAX_DECIMALS};
