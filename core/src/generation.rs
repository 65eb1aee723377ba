//! Answer generation traits.

use alloc::string::String;
use core::future::Future;

/// Produces text from a fixed instruction block plus a per-call prompt.
///
/// This is the seam between the retrieval pipeline and whatever language
/// model actually writes the answer. The pipeline assembles the retrieved
/// context into the prompt; the instruction block is configuration handed
/// through unchanged. Timeouts and retries live in the implementation, not
/// in the callers.
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for `prompt` under the given `instructions`.
    fn generate(
        &self,
        instructions: &str,
        prompt: &str,
    ) -> impl Future<Output = crate::Result<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    struct EchoGenerator;

    impl TextGenerator for EchoGenerator {
        async fn generate(&self, instructions: &str, prompt: &str) -> crate::Result {
            Ok(format!("{instructions}|{prompt}"))
        }
    }

    #[tokio::test]
    async fn generator_receives_both_parts() {
        let generator = EchoGenerator;
        let out = generator.generate("be brief", "what is rust?").await.unwrap();
        assert_eq!(out, "be brief|what is rust?");
    }
}
