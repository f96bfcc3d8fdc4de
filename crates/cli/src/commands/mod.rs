pub mod check_policy;
pub mod evaluate;
pub mod init;
pub mod resolve;
