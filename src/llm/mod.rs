//! Text generation collaborator
//!
//! The pipeline only needs `generate(system_prompt, user_content) -> text`;
//! [`ChatCompletionsClient`] provides it over any OpenAI-compatible
//! chat-completions endpoint (Groq by default).

pub mod client;

pub use client::ChatCompletionsClient;

use async_trait::async_trait;

use crate::error::GenerationError;

/// Prefix some generators put in front of an error message returned as text
pub const ERROR_TEXT_PREFIX: &str = "Error generating";

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GenerationError>;
}

/// Treat empty replies and error-string replies as failures
pub fn check_reply(reply: String) -> Result<String, GenerationError> {
    if reply.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    if reply.trim_start().starts_with(ERROR_TEXT_PREFIX) {
        return Err(GenerationError::ErrorText(reply.trim().to_string()));
    }
    Ok(reply)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reply() {
        assert_eq!(check_reply("ok".to_string()).unwrap(), "ok");
        assert!(matches!(
            check_reply("  \n".to_string()),
            Err(GenerationError::EmptyResponse)
        ));
        assert!(matches!(
            check_reply("Error generating Groq OSS response: 429".to_string()),
            Err(GenerationError::ErrorText(_))
        ));
    }
}
