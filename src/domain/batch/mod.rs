pub mod assembler;
pub mod dto;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod model;
pub mod registry;
pub mod service;

pub use assembler::{assemble, AssemblyError, BatchReport, FailedTask, SucceededTask};
pub use error::BatchError;
pub use executor::BatchExecutor;
pub use limiter::{Limiter, LimiterError, LimiterPermit, MAX_LIMITER_CAPACITY};
pub use model::{Credentials, Outcome, Task, TaskFailure, VoiceSettings, DEFAULT_VOICE_TYPE};
pub use registry::{LimiterRegistry, LimiterSummary, Registration, MAX_REGISTERED_CAPACITY};
pub use service::{
    BatchCommand, BatchExecution, BatchService, BatchServiceApi, BatchServiceConfig, LimiterMode,
    LimiterScope, LimiterStatus,
};
