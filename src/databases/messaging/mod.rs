pub mod messagedb;
