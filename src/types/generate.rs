use serde::{Deserialize, Serialize};

/// Body of `POST /generate`.
///
/// Every field is defaulted so that a missing model or prompt surfaces as an
/// `invalid_request` from the dispatcher instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub is_json_output: bool,
}

/// One logical request to generate a completion, covering all of its retries.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub model_name: String,
    pub prompt: String,
    pub wants_structured_output: bool,
}

impl DispatchRequest {
    pub fn new(model_name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            prompt: prompt.into(),
            wants_structured_output: false,
        }
    }

    pub fn with_structured_output(mut self, wants: bool) -> Self {
        self.wants_structured_output = wants;
        self
    }
}

impl From<GenerateRequest> for DispatchRequest {
    fn from(req: GenerateRequest) -> Self {
        Self::new(req.model_name, req.prompt).with_structured_output(req.is_json_output)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Model that produced the text, which differs from the requested one
    /// after a fallback.
    pub model: String,
    pub attempts: usize,
}
