pub mod init;
pub mod learn;
pub mod sessions;
