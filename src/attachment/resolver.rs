//! Attachment resolution.
//!
//! Static URIs come from configuration, dynamic ones from a provider
//! invoked per report. A reference that cannot be read is dropped with a
//! warning; it never prevents the remaining references from resolving
//! and never aborts the report.

use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::error::AttachmentError;
use crate::logging::structured::LogContext;
use crate::report::Report;

/// Where an attachment reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentOrigin {
    Static,
    Provided,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub uri: String,
    pub origin: AttachmentOrigin,
}

impl AttachmentRef {
    pub fn provided(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            origin: AttachmentOrigin::Provided,
        }
    }

    pub fn configured(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            origin: AttachmentOrigin::Static,
        }
    }
}

/// Attachment contents, read when the report is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub name: String,
    pub uri: String,
    pub bytes: Vec<u8>,
}

impl ResolvedAttachment {
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes.as_slice())
    }
}

/// Supplies per-report attachment references.
pub trait AttachmentProvider: Send + Sync {
    fn attachments(&self, report: &Report) -> Result<Vec<AttachmentRef>, AttachmentError>;
}

/// Provider that adds nothing beyond the configured URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttachmentProvider;

impl AttachmentProvider for NoAttachmentProvider {
    fn attachments(&self, _report: &Report) -> Result<Vec<AttachmentRef>, AttachmentError> {
        Ok(Vec::new())
    }
}

/// Outcome of resolving one report's attachments.
#[derive(Debug, Default)]
pub struct AttachmentResolution {
    pub attachments: Vec<ResolvedAttachment>,
    pub failures: Vec<AttachmentError>,
}

pub struct AttachmentResolver {
    configured: Vec<AttachmentRef>,
    provider: Arc<dyn AttachmentProvider>,
}

impl AttachmentResolver {
    pub fn new(configured_uris: &[String], provider: Arc<dyn AttachmentProvider>) -> Self {
        Self {
            configured: configured_uris
                .iter()
                .map(|u| AttachmentRef::configured(u.clone()))
                .collect(),
            provider,
        }
    }

    /// Configured references first, then provided ones; duplicates dropped.
    /// A failing provider leaves only the configured references.
    pub fn references(&self, report: &Report, ctx: &LogContext) -> Vec<AttachmentRef> {
        self.collect(report, ctx).0
    }

    fn collect(
        &self,
        report: &Report,
        ctx: &LogContext,
    ) -> (Vec<AttachmentRef>, Option<AttachmentError>) {
        let mut refs = self.configured.clone();
        let provider_error = match self.provider.attachments(report) {
            Ok(provided) => {
                refs.extend(provided);
                None
            }
            Err(e) => {
                log::warn!("{} ATTACHMENT_PROVIDER_FAILED error={}", ctx, e);
                Some(e)
            }
        };

        let mut seen = HashSet::new();
        refs.retain(|r| seen.insert(r.uri.clone()));
        (refs, provider_error)
    }

    pub fn resolve(&self, report: &Report, ctx: &LogContext) -> AttachmentResolution {
        let mut resolution = AttachmentResolution::default();
        let (refs, provider_error) = self.collect(report, ctx);
        resolution.failures.extend(provider_error);

        for reference in refs {
            match open_attachment(&reference.uri) {
                Ok(attachment) => {
                    log::debug!(
                        "{} ATTACHMENT_RESOLVED name={} bytes={} origin={:?}",
                        ctx,
                        attachment.name,
                        attachment.bytes.len(),
                        reference.origin
                    );
                    resolution.attachments.push(attachment);
                }
                Err(e) => {
                    log::warn!("{} ATTACHMENT_DROPPED error={}", ctx, e);
                    resolution.failures.push(e);
                }
            }
        }
        resolution
    }
}

/// Read a `file:` URI or a bare filesystem path.
pub fn open_attachment(uri: &str) -> Result<ResolvedAttachment, AttachmentError> {
    let path = uri_to_path(uri)?;
    let bytes = fs::read(&path).map_err(|source| AttachmentError::Unreadable {
        uri: uri.to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| uri.to_string());

    Ok(ResolvedAttachment {
        name,
        uri: uri.to_string(),
        bytes,
    })
}

fn uri_to_path(uri: &str) -> Result<PathBuf, AttachmentError> {
    let unsupported = |reason: &str| AttachmentError::UnsupportedUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };

    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| unsupported("not a local file path")),
        // Windows drive letters parse as a one-letter scheme
        Ok(url) if url.scheme().len() == 1 => Ok(PathBuf::from(uri)),
        Ok(url) => Err(unsupported(&format!("scheme {} not supported", url.scheme()))),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(PathBuf::from(uri)),
        Err(e) => Err(unsupported(&e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CapturedReport, ReportFields, ReportStatus};
    use std::io::Read;

    struct FixedProvider(Result<Vec<AttachmentRef>, String>);

    impl AttachmentProvider for FixedProvider {
        fn attachments(&self, _report: &Report) -> Result<Vec<AttachmentRef>, AttachmentError> {
            self.0.clone().map_err(AttachmentError::Provider)
        }
    }

    fn report() -> Report {
        Report::new(
            CapturedReport::new(ReportFields::new(), 1, false),
            ReportStatus::Approved,
        )
    }

    #[test]
    fn test_resolves_file_uri_and_bare_path() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("app.log");
        fs::write(&log_path, b"line one\n").unwrap();
        let file_uri = Url::from_file_path(&log_path).unwrap().to_string();

        let by_uri = open_attachment(&file_uri).unwrap();
        assert_eq!(by_uri.name, "app.log");
        assert_eq!(by_uri.bytes, b"line one\n");

        let by_path = open_attachment(log_path.to_str().unwrap()).unwrap();
        let mut text = String::new();
        by_path.reader().read_to_string(&mut text).unwrap();
        assert_eq!(text, "line one\n");
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = open_attachment("https://example.com/log.txt").unwrap_err();
        assert!(matches!(err, AttachmentError::UnsupportedUri { .. }));
    }

    #[test]
    fn test_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        fs::write(&present, b"ok").unwrap();
        let missing = dir.path().join("missing.txt");

        let resolver = AttachmentResolver::new(
            &[missing.to_string_lossy().into_owned()],
            Arc::new(FixedProvider(Ok(vec![AttachmentRef::provided(
                present.to_string_lossy().into_owned(),
            )]))),
        );

        let resolution = resolver.resolve(&report(), &LogContext::new("test"));
        assert_eq!(resolution.attachments.len(), 1);
        assert_eq!(resolution.attachments[0].name, "present.txt");
        assert_eq!(resolution.failures.len(), 1);
    }

    #[test]
    fn test_provider_failure_keeps_configured_refs() {
        let resolver = AttachmentResolver::new(
            &["/var/log/a.log".to_string()],
            Arc::new(FixedProvider(Err("boom".to_string()))),
        );
        let refs = resolver.references(&report(), &LogContext::new("test"));
        assert_eq!(refs, vec![AttachmentRef::configured("/var/log/a.log")]);
    }

    #[test]
    fn test_provider_failure_counts_as_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("configured.txt");
        fs::write(&configured, b"ok").unwrap();
        let resolver = AttachmentResolver::new(
            &[configured.to_string_lossy().into_owned()],
            Arc::new(FixedProvider(Err("credentials expired".to_string()))),
        );

        let resolution = resolver.resolve(&report(), &LogContext::new("test"));

        assert_eq!(resolution.attachments.len(), 1);
        assert_eq!(resolution.failures.len(), 1);
        assert!(matches!(
            &resolution.failures[0],
            AttachmentError::Provider(reason) if reason == "credentials expired"
        ));
    }

    #[test]
    fn test_duplicate_refs_are_dropped() {
        let resolver = AttachmentResolver::new(
            &["/tmp/a.log".to_string()],
            Arc::new(FixedProvider(Ok(vec![
                AttachmentRef::provided("/tmp/a.log"),
                AttachmentRef::provided("/tmp/b.log"),
            ]))),
        );
        let refs = resolver.references(&report(), &LogContext::new("test"));
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].origin, AttachmentOrigin::Static);
        assert_eq!(refs[1], AttachmentRef::provided("/tmp/b.log"));
    }
}
