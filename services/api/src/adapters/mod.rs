pub mod db;
pub mod s3;
pub mod stripe;

pub use db::DbAdapter;
pub use s3::S3MediaAdapter;
pub use stripe::StripeAdapter;
