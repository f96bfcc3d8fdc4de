//! Data model shared by the directory resolver and the policy engine.

pub mod ca;
pub mod names;
pub mod policy;
pub mod request;
pub mod result;
pub mod token;
