pub mod uri;

pub use uri::{
    REDACTED_PASSWORD, database_from_uri, extract_host_from_uri, redact_uri_password,
    validate_mongodb_uri,
};
