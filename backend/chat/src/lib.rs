pub mod context;
pub mod gemini;
pub mod mock;

pub use context::render_prompt;
pub use gemini::GeminiChatClient;
pub use mock::MockChatProvider;
