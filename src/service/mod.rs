pub mod analyzer;
pub mod billing;
pub mod evaluate;
pub mod local_engine;
pub mod stats;
pub mod uci;
