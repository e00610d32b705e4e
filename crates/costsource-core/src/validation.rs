//! Request validation shared by plugin implementations.
//!
//! Malformed requests are answered with [`StatusCode::InvalidArgument`]
//! before any backend work happens.
//!
//! [`StatusCode::InvalidArgument`]: crate::StatusCode::InvalidArgument

use crate::Status;
use crate::types::{
    ActualCostRequest, PricingSpecRequest, ProjectedCostRequest, RecommendationsRequest,
    ResourceDescriptor, SupportsRequest,
};

/// Largest page a recommendations request may ask for.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Returns `true` when `code` looks like an ISO-4217 code (three ASCII
/// uppercase letters).
///
/// # Examples
///
/// ```
/// use costsource_core::is_valid_currency;
///
/// assert!(is_valid_currency("USD"));
/// assert!(!is_valid_currency("usd"));
/// assert!(!is_valid_currency("EURO"));
/// ```
#[must_use]
pub fn is_valid_currency(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

impl ResourceDescriptor {
    /// Checks that provider and resource type are present.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` status naming the missing field.
    pub fn validate(&self) -> Result<(), Status> {
        if self.provider.trim().is_empty() {
            return Err(Status::invalid_argument("resource.provider is required"));
        }
        if self.resource_type.trim().is_empty() {
            return Err(Status::invalid_argument(
                "resource.resource_type is required",
            ));
        }
        Ok(())
    }
}

impl SupportsRequest {
    /// Validates the embedded resource descriptor.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` status when the descriptor is incomplete.
    pub fn validate(&self) -> Result<(), Status> {
        self.resource.validate()
    }
}

impl ProjectedCostRequest {
    /// Validates the embedded resource descriptor.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` status when the descriptor is incomplete.
    pub fn validate(&self) -> Result<(), Status> {
        self.resource.validate()
    }
}

impl PricingSpecRequest {
    /// Validates the embedded resource descriptor.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` status when the descriptor is incomplete.
    pub fn validate(&self) -> Result<(), Status> {
        self.resource.validate()
    }
}

impl ActualCostRequest {
    /// Checks the resource id and that the window is not empty or inverted.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` status for an empty resource id or when
    /// `end` is not after `start`.
    pub fn validate(&self) -> Result<(), Status> {
        if self.resource_id.trim().is_empty() {
            return Err(Status::invalid_argument("resource_id is required"));
        }
        if self.end <= self.start {
            return Err(Status::invalid_argument(format!(
                "end ({}) must be after start ({})",
                self.end.to_rfc3339(),
                self.start.to_rfc3339()
            )));
        }
        Ok(())
    }
}

impl RecommendationsRequest {
    /// Checks the page size bound.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` status when `page_size` exceeds
    /// [`MAX_PAGE_SIZE`].
    pub fn validate(&self) -> Result<(), Status> {
        if self.page_size > MAX_PAGE_SIZE {
            return Err(Status::invalid_argument(format!(
                "page_size {} exceeds maximum of {MAX_PAGE_SIZE}",
                self.page_size
            )));
        }
        Ok(())
    }
}
