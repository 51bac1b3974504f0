//! respcheck-runner: contract loading, fixture loading and check execution

pub mod contract;
pub mod loader;
pub mod pipeline;

pub use contract::{ComponentRegistry, ContractError, ContractIndex};
pub use loader::DirFixtureLoader;
pub use pipeline::{ContractRunner, RunOutput, RunnerError, check};
