// Copyright 2025 Hookforge (https://github.com/hookforge)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Plugin lifecycle error types.

use crate::event::InvalidPluginName;
use crate::store::StoreError;
use thiserror::Error;

/// Result type for lifecycle operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors surfaced by the lifecycle manager.
///
/// These are structural precondition failures, surfaced synchronously to the
/// caller of the operation. Handler failures during a lifecycle dispatch are
/// never errors of the operation; they are collected in the dispatch report.
/// Nothing here is fatal to the hosting process.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin already installed: {0}")]
    AlreadyInstalled(String),

    #[error("plugin not installed: {0}")]
    NotInstalled(String),

    #[error(transparent)]
    InvalidPluginName(#[from] InvalidPluginName),

    #[error("version store error: {0}")]
    Store(#[from] StoreError),
}
