pub mod azure;
pub mod mock;
pub mod normalize;

pub use azure::AzureOcrClient;
pub use mock::MockOcrProvider;
