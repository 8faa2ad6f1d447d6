pub mod db;
pub mod generator_llm;
pub mod ingest;

pub use db::PgStore;
pub use generator_llm::OpenAiGeneratorAdapter;
