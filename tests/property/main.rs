// tests/property/main.rs

mod change_filter;
mod line_splitter;
