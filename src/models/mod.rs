pub mod common;
pub mod order;
pub mod pagination;
pub mod product;
pub mod review;
pub mod transaction;
pub mod user;

pub use common::*;
pub use order::*;
pub use pagination::*;
pub use product::*;
pub use review::*;
pub use transaction::*;
pub use user::*;
