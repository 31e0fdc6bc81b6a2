pub mod metrics;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;
