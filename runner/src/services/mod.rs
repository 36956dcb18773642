//! Runner services: provider adapters and CSV input/output

pub mod csv_source;
pub mod csv_writer;
pub mod gemini;
pub mod http;
pub mod openai;

#[cfg(test)]
pub mod tests;

pub use csv_source::{detect_delimiter, load_rows, parse_rows};
pub use csv_writer::{columns_for, OutputColumn, ResultWriter};
pub use gemini::GeminiClient;
pub use http::SYSTEM_INSTRUCTION;
pub use openai::OpenAiClient;
