use ecson_doc::PathError;
use thiserror::Error;

/// A specialized Result type for op validation and application.
pub type OpResult<T> = Result<T, OpError>;

/// Why an op was rejected. Every variant except the batch/rollback ones is
/// raised before the document is touched.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("entity already exists: {0}")]
    EntityExists(String),

    #[error("parent entity not found: {0}")]
    ParentNotFound(String),

    #[error("'{0}' is reserved and cannot be used as an entity id")]
    ReservedId(String),

    #[error("cannot {action} the root entity '{id}'")]
    RootImmutable { id: String, action: &'static str },

    #[error("entity '{id}' still has {count} children; delete them first")]
    HasChildren { id: String, count: usize },

    #[error("circular reparent: {entity} is an ancestor of {new_parent}")]
    CircularReparent { entity: String, new_parent: String },

    #[error("entity '{0}' is detached from the tree")]
    Detached(String),

    #[error("entity '{child}' already has parent '{parent}'")]
    AlreadyAttached { child: String, parent: String },

    #[error("'{child}' is not a child of '{parent}'")]
    NotAChild { parent: String, child: String },

    #[error("entity '{entity}' has no component of type '{component_type}'")]
    ComponentNotFound {
        entity: String,
        component_type: String,
    },

    #[error("component type must not be empty")]
    EmptyComponentType,

    #[error("entity '{entity}' already has singleton component '{component_type}'")]
    SingletonViolation {
        entity: String,
        component_type: String,
    },

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("asset already exists: {0}")]
    AssetExists(String),

    #[error("animation track '{track}' not found on entity '{entity}'")]
    TrackNotFound { entity: String, track: String },

    #[error("no keyframe at time {time} in track '{track}'")]
    KeyframeNotFound { track: String, time: f64 },

    #[error("a keyframe already exists at time {time} in track '{track}'")]
    KeyframeExists { track: String, time: f64 },

    #[error("invalid property path: {0}")]
    Path(#[from] PathError),

    #[error("invalid value for '{path}': {message}")]
    InvalidValue { path: String, message: String },

    #[error("op version {version} is newer than supported version {supported}")]
    UnsupportedVersion { version: u32, supported: u32 },

    #[error("no migration registered for {op_type} from version {version}")]
    MissingMigration { op_type: String, version: u32 },

    #[error("migrating {op_type} from version {version} failed: {message}")]
    MigrationFailed {
        op_type: String,
        version: u32,
        message: String,
    },

    #[error("unknown op type '{0}'")]
    UnknownOpType(String),

    #[error("malformed {op_type} payload: {message}")]
    MalformedPayload { op_type: String, message: String },

    #[error("sub-op {index} ({op_type}) failed: {source}")]
    BatchFailed {
        index: usize,
        op_type: &'static str,
        #[source]
        source: Box<OpError>,
    },

    #[error("rollback failed after '{cause}': {source}")]
    RollbackFailed {
        cause: String,
        #[source]
        source: Box<OpError>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OpError {
    /// The innermost error, looking through batch wrappers.
    pub fn root_cause(&self) -> &OpError {
        match self {
            OpError::BatchFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
