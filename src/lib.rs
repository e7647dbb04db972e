pub mod config;
pub mod harness;
pub mod sqlite;

#[cfg(test)]
mod test_support;
