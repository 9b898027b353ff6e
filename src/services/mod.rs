pub mod matcher;
pub mod merger;
pub mod pipeline;
