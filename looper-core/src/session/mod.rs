pub mod context;
pub mod looper;
pub mod recording;
pub mod recording_set;

#[cfg(test)]
pub(crate) mod test_support;
