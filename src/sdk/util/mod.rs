pub mod debounce;
pub mod log;
pub mod rate_limit;
