pub mod tts_repository;
pub mod volcengine_tts_repository;

pub use tts_repository::{
    AudioEncoding, SynthesisRequest, SynthesisSession, TtsRepository, TtsRepositoryError,
};
pub use volcengine_tts_repository::VolcengineTtsRepository;
