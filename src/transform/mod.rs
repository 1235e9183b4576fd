pub mod fence;
pub mod prompt;

pub use fence::finalize_text;
pub use prompt::build_outbound_prompt;
