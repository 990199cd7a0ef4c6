//! LLM Provider Clients and Abstractions
//!
//! This module provides the capability ports the research loop talks to and
//! their HTTP implementations.
//!
//! # Architecture
//!
//! - [`LLMClient`] - free-text and JSON-schema constrained completions
//! - [`GroundedSearchClient`] - completions grounded by Google Search
//! - [`Provider`] - tagged provider selection, resolved once per step
//! - [`LLMClientFactoryTrait`] - builds clients for a [`Provider`]; the HTTP
//!   implementation is [`LLMClientFactory`], tests inject mocks
//!
//! # Supported Providers
//!
//! - Gemini (`google`) - structured output and search grounding
//! - OpenAI and any OpenAI-compatible server (`openai`, `custom`) - JSON mode
//!
//! # Example
//!
//! ```ignore
//! use deepest::llm::{generate_structured, LLMClientFactory, LLMClientFactoryTrait};
//!
//! let provider = config.llm_provider_for(ModelRole::Reflection)?;
//! let client = LLMClientFactory::new().create_client(&provider)?;
//! let reflection: Reflection = generate_structured(client.as_ref(), &prompt).await?;
//! ```

/// Core LLM client traits, provider enum and structured-output helpers.
pub mod client;
/// Google Gemini REST client.
pub mod gemini;
/// OpenAI-compatible chat completions client.
pub mod openai;

pub use client::{
    generate_structured, GroundedResponse, GroundedSearchClient, GroundingChunk,
    GroundingSupport, LLMClient, LLMClientFactory, LLMClientFactoryTrait, ModelParams, Provider,
};
