//! Service modules: inference, identity and the Beli import pipeline

pub mod gemini_client;
pub mod identity;
pub mod import_pipeline;

pub use gemini_client::{GeminiClient, GeminiError, InferenceClient, MediaPart, RemoteFile};
pub use identity::{
    AdminSession, AuthContext, GoogleTokenVerifier, IdentityError, IdentityVerifier,
    VerifiedIdentity,
};
pub use import_pipeline::{ImportOutcome, ImportPipeline, PipelineError, UploadedFile};
