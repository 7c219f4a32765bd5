//! Per-session access gate and upload snapshot.
//!
//! A `Session` starts locked. Once the shared secret has been accepted it
//! stays authenticated for its lifetime. It owns at most one ingested upload;
//! a new upload replaces the previous one.

use crate::config::SchemaConfig;
use crate::error::FunnelError;
use crate::io::RawTable;
use crate::pipeline::{ConnectivityReport, Dataset};

/// Shared-secret check. An unset secret leaves the gate open.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    secret: Option<String>,
}

impl AccessGate {
    /// Gate requiring `secret`, or an open gate for `None`.
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Check whether the gate lets everyone through.
    pub fn is_open(&self) -> bool {
        self.secret.is_none()
    }

    fn accepts(&self, supplied: Option<&str>) -> bool {
        match (&self.secret, supplied) {
            (None, _) => true,
            (Some(secret), Some(supplied)) => secret == supplied,
            (Some(_), None) => false,
        }
    }
}

/// State owned by one user session.
#[derive(Debug, Default)]
pub struct Session {
    authenticated: bool,
    dataset: Option<Dataset>,
}

impl Session {
    /// New, unauthenticated session with no upload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the gate has been passed.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Try the supplied secret against the gate.
    ///
    /// An already-authenticated session stays authenticated regardless of input.
    pub fn login(&mut self, gate: &AccessGate, supplied: Option<&str>) -> Result<(), FunnelError> {
        if self.authenticated {
            return Ok(());
        }
        if gate.accepts(supplied) {
            self.authenticated = true;
            tracing::debug!("Session authenticated");
            Ok(())
        } else {
            Err(FunnelError::AuthenticationFailure)
        }
    }

    /// Fail unless the gate has been passed.
    pub fn require_authenticated(&self) -> Result<(), FunnelError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(FunnelError::AuthenticationFailure)
        }
    }

    /// Ingest a new upload, discarding any previous one.
    ///
    /// `None` means nothing was uploaded. A failed ingest leaves the session
    /// with no dataset.
    pub fn upload(
        &mut self,
        table: Option<&RawTable>,
        schema: &SchemaConfig,
    ) -> Result<&Dataset, FunnelError> {
        self.require_authenticated()?;
        self.dataset = None;
        let table = table.ok_or(FunnelError::MissingFile)?;
        let mapping = schema.resolve(table);
        Ok(self.dataset.insert(Dataset::ingest(table, mapping)?))
    }

    /// The current upload.
    pub fn dataset(&self) -> Result<&Dataset, FunnelError> {
        self.require_authenticated()?;
        self.dataset.as_ref().ok_or(FunnelError::MissingFile)
    }

    /// Recompute the report for a campaign selection.
    ///
    /// `None` picks the selector default.
    pub fn select(&self, campaign: Option<&str>) -> Result<ConnectivityReport, FunnelError> {
        let dataset = self.dataset()?;
        let report = match campaign {
            Some(c) => dataset.report(Some(c)),
            None => dataset.report(dataset.default_campaign().as_deref()),
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Cell;
    use crate::schema::SchemaPreset;

    fn create_test_table(campaign: &str) -> RawTable {
        RawTable::new(
            ["Leadid", "Attempt", "Campaign", "1-Con/Non Con", "2-Con/Non Con", "Status"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vec![vec![
                Cell::Int(1),
                Cell::Int(1),
                Cell::text(campaign),
                Cell::text("Connect"),
                Cell::Empty,
                Cell::text("Closed"),
            ]],
        )
    }

    #[test]
    fn test_login_with_wrong_secret_fails() {
        let gate = AccessGate::new(Some("s3cret".to_string()));
        let mut session = Session::new();

        assert!(matches!(
            session.login(&gate, Some("nope")),
            Err(FunnelError::AuthenticationFailure)
        ));
        assert!(matches!(
            session.login(&gate, None),
            Err(FunnelError::AuthenticationFailure)
        ));
        assert!(!session.is_authenticated());

        session.login(&gate, Some("s3cret")).unwrap();
        assert!(session.is_authenticated());
        // Flag holds for the session lifetime
        session.login(&gate, Some("nope")).unwrap();
    }

    #[test]
    fn test_open_gate() {
        let gate = AccessGate::default();
        assert!(gate.is_open());
        let mut session = Session::new();
        session.login(&gate, None).unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_upload_requires_authentication() {
        let mut session = Session::new();
        let table = create_test_table("X");
        assert!(matches!(
            session.upload(Some(&table), &SchemaConfig::default()),
            Err(FunnelError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_missing_upload() {
        let mut session = Session::new();
        session.login(&AccessGate::default(), None).unwrap();
        assert!(matches!(session.dataset(), Err(FunnelError::MissingFile)));
        assert!(matches!(
            session.upload(None, &SchemaConfig::default()),
            Err(FunnelError::MissingFile)
        ));
        assert!(matches!(session.select(None), Err(FunnelError::MissingFile)));
    }

    #[test]
    fn test_new_upload_replaces_previous() {
        let mut session = Session::new();
        session.login(&AccessGate::default(), None).unwrap();

        session.upload(Some(&create_test_table("First")), &SchemaConfig::default()).unwrap();
        assert_eq!(session.select(None).unwrap().campaign.as_deref(), Some("First"));

        session.upload(Some(&create_test_table("Second")), &SchemaConfig::default()).unwrap();
        let dataset = session.dataset().unwrap();
        assert_eq!(dataset.campaigns(), vec!["Second"]);

        // A rejected upload clears the snapshot
        let bad = RawTable::new(vec!["Leadid".to_string()], vec![]);
        assert!(session.upload(Some(&bad), &SchemaConfig::default()).is_err());
        assert!(matches!(session.dataset(), Err(FunnelError::MissingFile)));
    }

    #[test]
    fn test_select_recomputes_per_campaign() {
        let mut session = Session::new();
        session.login(&AccessGate::default(), None).unwrap();
        session.upload(Some(&create_test_table("X")), &SchemaConfig::preset(SchemaPreset::LeadStatus)).unwrap();

        let x = session.select(Some("X")).unwrap();
        assert_eq!(x.first_attempt.total, 1);
        assert_eq!(x.first_attempt.rate, 100.0);

        let other = session.select(Some("Z")).unwrap();
        assert_eq!(other.first_attempt.total, 0);
    }
}
