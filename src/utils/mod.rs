pub mod code_generator;
pub mod data_uri;
pub mod jwt;
pub mod password;
pub mod validation;

pub use code_generator::generate_otp;
pub use data_uri::{mime_for_extension, to_data_uri};
pub use jwt::*;
pub use password::*;
pub use validation::*;
