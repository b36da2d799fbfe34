pub mod auth;
pub mod order;
pub mod product;
pub mod review;
pub mod transaction;
pub mod user;

pub use auth::auth_config;
pub use order::order_config;
pub use product::product_config;
pub use review::review_config;
pub use transaction::transaction_config;
pub use user::user_config;
