//! Wire types for every surface zimage speaks.
//!
//! Downstream: the OpenAI-compatible envelopes under [`openai`] and the native
//! `/api` shapes under [`native`]. Upstream: provider REST bodies ([`gitee`],
//! [`modelscope`]), Gradio queue calls ([`gradio`]) and the SSE terminal scanner
//! ([`sse`]). No behavior lives here beyond (de)serialization helpers.

pub mod gitee;
pub mod gradio;
pub mod modelscope;
pub mod native;
pub mod openai;
pub mod sse;
pub mod video;
