//! Exception translator
//!
//! Classifies [`BackendError`]s reported by client handles into [`DaoError`]s.
//! Every backend call made by a DAO goes through one of these functions.

use crate::api::Id;
use crate::error::{BackendError, BackendErrorKind, CallKind, DaoError};

/// Classify a backend failure for the given dialect.
pub fn translate(err: BackendError, kind: CallKind) -> DaoError {
    match err.kind {
        BackendErrorKind::DuplicateKey => DaoError::UniqueConstraint {
            message: err.message.clone(),
            source: err,
        },
        BackendErrorKind::ResultWindowTooLarge => DaoError::Overload(err.message),
        _ => DaoError::RemoteCall {
            kind,
            message: err.message.clone(),
            source: err,
        },
    }
}

/// Same as [`translate`], attributing version conflicts to `id`.
pub fn translate_for_id(err: BackendError, kind: CallKind, id: &Id) -> DaoError {
    match err.kind {
        BackendErrorKind::VersionConflict => DaoError::VersionConflict {
            id: id.to_string(),
            message: err.message.clone(),
            source: err,
        },
        _ => translate(err, kind),
    }
}
