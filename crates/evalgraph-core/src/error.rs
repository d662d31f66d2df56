use crate::{ComponentId, ConfigError, EntityId, OperationId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalGraphError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(OperationId),

    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("Entity {entity} already owns a component {key}")]
    DuplicateComponent { entity: EntityId, key: String },

    #[error("Graph is full: more than u32::MAX {0}")]
    CapacityExceeded(&'static str),

    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EvalGraphError>;
