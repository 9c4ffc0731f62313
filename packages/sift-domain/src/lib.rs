pub mod auth;
pub mod citation;
pub mod intent;
pub mod keyword;
pub mod loose;
pub mod message;
pub mod policy;
pub mod predicate;
pub mod request;
pub mod result;
