// tests/integration/main.rs

#[path = "../common/mod.rs"]
mod common;

mod dispatch_flow;
mod text_sources;
