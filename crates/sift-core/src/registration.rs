// SPDX-License-Identifier: Apache-2.0
//! Action-status registration resolution.
//!
//! Stores that feed snapshots into the engine register handlers per action
//! *status* (`open`, `resolve`, ...), and several statuses have historical
//! aliases (`done` for `resolve`, `error` for `reject`, ...). This module
//! resolves a registration table against a status name, accepting either
//! spelling, and fails loudly on a name that is neither — an invalid status
//! is a programmer error, not a lookup miss.

use std::collections::BTreeMap;

use thiserror::Error;

/// Lifecycle status of a dispatched action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// Created but not yet started.
    Inactive,
    /// Started and outstanding.
    Open,
    /// Progress while outstanding.
    Update,
    /// Completed successfully.
    Resolve,
    /// Completed with failure.
    Reject,
    /// Aborted before completion.
    Cancel,
}

impl Status {
    /// Parses a status from its canonical name or alias.
    ///
    /// Unknown names are a programmer error and fail immediately with a
    /// message naming the offending value.
    pub fn parse(name: &str) -> Result<Self, RegistrationError> {
        match name {
            "inactive" => Ok(Status::Inactive),
            "open" => Ok(Status::Open),
            "update" | "loading" => Ok(Status::Update),
            "resolve" | "done" => Ok(Status::Resolve),
            "reject" | "error" => Ok(Status::Reject),
            "cancel" | "cancelled" => Ok(Status::Cancel),
            other => Err(RegistrationError::InvalidStatus {
                status: other.to_owned(),
            }),
        }
    }

    /// The canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Status::Inactive => "inactive",
            Status::Open => "open",
            Status::Update => "update",
            Status::Resolve => "resolve",
            Status::Reject => "reject",
            Status::Cancel => "cancel",
        }
    }

    /// The accepted alias, where one exists; the canonical name otherwise.
    pub fn alias(self) -> &'static str {
        match self {
            Status::Inactive => "inactive",
            Status::Open => "open",
            Status::Update => "loading",
            Status::Resolve => "done",
            Status::Reject => "error",
            Status::Cancel => "cancelled",
        }
    }
}

/// Errors raised while resolving registrations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The status name matches no known status or alias.
    #[error("[INVALID_STATUS] invalid action status {status}")]
    InvalidStatus {
        /// The offending name as given by the caller.
        status: String,
    },
}

/// Looks a handler up in a per-status registration table.
///
/// The table may key the handler under the canonical name or its alias;
/// both resolve. A valid status with no registered handler yields
/// `Ok(None)` — absence is not an error. An invalid status name is.
pub fn resolve<'t, V>(
    registrations: &'t BTreeMap<String, V>,
    status: &str,
) -> Result<Option<&'t V>, RegistrationError> {
    let status = Status::parse(status)?;
    Ok(registrations
        .get(status.name())
        .or_else(|| registrations.get(status.alias())))
}

/// Resolves a handler from an action-keyed registration pool.
///
/// `pool` maps an action identifier to its per-status table; the nested
/// table is then resolved with [`resolve`]. A missing action yields
/// `Ok(None)`.
pub fn get_registration<'t, V>(
    pool: &'t BTreeMap<String, BTreeMap<String, V>>,
    action: &str,
    status: &str,
) -> Result<Option<&'t V>, RegistrationError> {
    match pool.get(action) {
        Some(registrations) => resolve(registrations, status),
        None => {
            // Still validate the status: a typo'd status should fail loudly
            // even when the action has no registrations yet.
            Status::parse(status)?;
            Ok(None)
        }
    }
}
