/// Entity-extraction and summarization errors (LLM collaborator).
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("LLM request failed: {message}")]
    RequestFailed { message: String },

    #[error("LLM returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("LLM output could not be parsed: {reason}")]
    UnparsableOutput { reason: String },
}
