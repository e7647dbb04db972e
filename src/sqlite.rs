pub mod connection;
pub mod error;
pub mod record;
pub mod row;
pub mod snapshot;
pub mod sql;
