pub mod order_items;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod transactions;
pub mod users;

pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use products as product_entity;
pub use reviews as review_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;

pub use orders::OrderStatus;
pub use transactions::{PaymentMethod, TransactionStatus};
