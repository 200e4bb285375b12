//! End-to-end tests: real WebSocket server in once mode, bot over mock LLM and mock portals.

mod common;
mod dataset_flow;
mod greeting;
mod invalid_json;
mod ping;
