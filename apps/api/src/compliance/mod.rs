pub mod assembly;
pub mod handlers;
pub mod normalize;
pub mod prompts;
pub mod scanner;
pub mod sections;
