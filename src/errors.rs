use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while resolving, provisioning, parsing, or
/// assembling a document.
///
/// Per error-handling design, `CatalogMiss`, `ProvisionFailure`, and
/// `MalformedAsset` are *recoverable*: the offending resource is dropped and
/// the rest of the request proceeds. `Validation`, `DispatchMiss`, and
/// `IoFatal` abort the whole request. [`Error::is_fatal`] encodes that split
/// so callers don't have to match on every variant.
#[derive(Error, Debug)]
pub enum Error {
    #[error("request failed validation: {0}")]
    Validation(String),

    #[error("no catalog entry for {lang_code}/{resource_type}/{book_code}")]
    CatalogMiss {
        lang_code: String,
        resource_type: String,
        book_code: String,
    },

    #[error("failed to provision {lang_code}/{resource_type} after {attempts} attempts: {source}")]
    ProvisionFailure {
        lang_code: String,
        resource_type: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("malformed asset for {lang_code}/{resource_type}/{book_code}: {reason}")]
    MalformedAsset {
        lang_code: String,
        resource_type: String,
        book_code: String,
        reason: String,
    },

    #[error(
        "no dispatch entry for presence bits {presence:?}, layout {layout}, chunk {chunk} (this is a bug)"
    )]
    DispatchMiss {
        presence: [bool; 5],
        layout: String,
        chunk: String,
    },

    #[error("fatal I/O failure writing output: {0}")]
    IoFatal(#[from] std::io::Error),

    #[error("catalog file not found or unreadable at {0}")]
    CatalogUnavailable(PathBuf),

    #[error("could not parse template")]
    TemplateParse,

    #[error("asset was not found: {0}")]
    AssetFileNotFound(String),

    #[error(transparent)]
    Render(#[from] handlebars::RenderError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    HttpError(#[from] Box<ureq::Error>),

    #[error("asset path escaped its resource root: {0}")]
    PathEscape(#[from] std::path::StripPrefixError),
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::HttpError(Box::new(e))
    }
}

impl Error {
    /// Whether this error should abort the whole request, as opposed to
    /// being captured in a per-resource status record and shrugged off.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::DispatchMiss { .. }
                | Error::IoFatal(_)
                | Error::CatalogUnavailable(_)
                | Error::TemplateParse
        )
    }
}
