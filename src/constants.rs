/// Default locations of the three declarative documents, relative to the project root
pub const CONFIG_FILE_PATH: &str = "config/config.yaml";
pub const PARAMS_FILE_PATH: &str = "params.yaml";
pub const SCHEMA_FILE_PATH: &str = "schema.yaml";

// Environment variables that override the document locations (also read from `.env`)
pub const CONFIG_PATH_ENV: &str = "PIPELINE_CONFIG";
pub const PARAMS_PATH_ENV: &str = "PIPELINE_PARAMS";
pub const SCHEMA_PATH_ENV: &str = "PIPELINE_SCHEMA";

/// Top-level key naming the artifacts root in the base config
pub const ARTIFACTS_ROOT_KEY: &str = "artifacts_root";
/// Used when the base config does not declare an artifacts root
pub const DEFAULT_ARTIFACTS_ROOT: &str = "artifacts";

/// Schema key holding the expected dataset columns
pub const SCHEMA_COLUMNS_KEY: &str = "columns";

/// File read back by the ingestion stage when no name is given
pub const DEFAULT_DATA_FILE_NAME: &str = "gsearch_jobs.csv";

/// Log directory and file prefix used by `logging::init_logging`
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "pipeline.log";
