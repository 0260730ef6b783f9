pub mod groupdb;
pub mod logindb;
pub mod sessiondb;
