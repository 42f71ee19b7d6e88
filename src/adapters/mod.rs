// Adapters layer: concrete implementations of the domain ports.

pub mod ollama;
pub mod process;

pub use ollama::OllamaClient;
pub use process::SystemCommandRunner;
