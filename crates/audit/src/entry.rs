use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use maison_core::{AuditLogId, Clock, DomainError, DomainResult, Entity, IdGenerator};

/// Actor recorded when an administrative action does not name one.
pub const SYSTEM_ADMIN_ACTOR: &str = "admin@maison.co";

/// Area of the system an audit entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditCategory {
    Product,
    Order,
    User,
    System,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Product => "product",
            AuditCategory::Order => "order",
            AuditCategory::User => "user",
            AuditCategory::System => "system",
        }
    }
}

impl FromStr for AuditCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(AuditCategory::Product),
            "order" => Ok(AuditCategory::Order),
            "user" => Ok(AuditCategory::User),
            "system" => Ok(AuditCategory::System),
            _ => Err(DomainError::invalid("invalid category")),
        }
    }
}

impl core::fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "info",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Critical => "critical",
        }
    }
}

impl FromStr for AuditSeverity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(AuditSeverity::Info),
            "warning" => Ok(AuditSeverity::Warning),
            "critical" => Ok(AuditSeverity::Critical),
            _ => Err(DomainError::invalid("invalid severity")),
        }
    }
}

impl core::fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted audit entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub action: String,
    pub category: AuditCategory,
    /// Free-text actor: an email, a user name, or `system`.
    pub user: String,
    pub details: String,
    pub severity: AuditSeverity,
    pub timestamp: DateTime<Utc>,
}

impl Entity for AuditLog {
    type Id = AuditLogId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Audit entry before it is stamped with an identifier and a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub id: Option<AuditLogId>,
    pub action: String,
    pub category: AuditCategory,
    pub user: String,
    pub details: String,
    pub severity: AuditSeverity,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewAuditEntry {
    pub fn new(
        action: impl Into<String>,
        category: AuditCategory,
        user: impl Into<String>,
        details: impl Into<String>,
        severity: AuditSeverity,
    ) -> Self {
        Self {
            id: None,
            action: action.into(),
            category,
            user: user.into(),
            details: details.into(),
            severity,
            timestamp: None,
        }
    }

    pub fn with_id(mut self, id: AuditLogId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Field rules for entries submitted directly by a client.
    ///
    /// Entries built by services are trusted and skip this check.
    pub fn validate(&self) -> DomainResult<()> {
        if self.action.trim().is_empty() {
            return Err(DomainError::invalid("action is required"));
        }
        if self.user.trim().is_empty() {
            return Err(DomainError::invalid("user is required"));
        }
        if self.details.trim().is_empty() {
            return Err(DomainError::invalid("details are required"));
        }
        Ok(())
    }

    /// Trim text fields and fill in a generated id and the current time where
    /// the caller supplied none.
    pub fn stamp<G, C>(self, ids: &G, clock: &C) -> AuditLog
    where
        G: IdGenerator + ?Sized,
        C: Clock + ?Sized,
    {
        AuditLog {
            id: self.id.unwrap_or_else(|| ids.audit_log_id()),
            action: self.action.trim().to_string(),
            category: self.category,
            user: self.user.trim().to_string(),
            details: self.details.trim().to_string(),
            severity: self.severity,
            timestamp: self.timestamp.unwrap_or_else(|| clock.now()),
        }
    }
}
