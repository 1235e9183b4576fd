/// Appended to the prompt when the caller wants machine-readable output.
pub const STRUCTURED_OUTPUT_INSTRUCTION: &str = "\n\nIMPORTANT: Respond ONLY with a valid JSON object, without any introductory or concluding text.";

pub fn build_outbound_prompt(prompt: &str, wants_structured_output: bool) -> String {
    if wants_structured_output {
        format!("{}{}", prompt, STRUCTURED_OUTPUT_INSTRUCTION)
    } else {
        prompt.to_string()
    }
}
