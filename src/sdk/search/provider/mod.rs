pub mod fallback;
pub mod mock;
pub mod remote;
pub mod types;

pub use fallback::FallbackCarparkSource;
pub use mock::MockCarparkSource;
pub use remote::RemoteCarparkSource;
