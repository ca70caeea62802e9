//! Sender that writes reports to the log.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::SenderError;
use crate::logging::structured::LogContext;
use crate::sender::registry::SenderFactory;
use crate::sender::traits::{ReportPayload, ReportSender};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSender;

impl LogSender {
    /// One `NAME=value` line per field, in report order.
    pub fn render(payload: &ReportPayload) -> String {
        let mut out = String::new();
        for entry in payload.fields.iter() {
            out.push_str(&entry.name);
            out.push('=');
            out.push_str(&entry.value.render());
            out.push('\n');
        }
        for attachment in &payload.attachments {
            out.push_str(&format!(
                "ATTACHMENT={} bytes={}\n",
                attachment.name,
                attachment.bytes.len()
            ));
        }
        out
    }
}

impl ReportSender for LogSender {
    fn name(&self) -> &str {
        "log"
    }

    fn send(&self, payload: &ReportPayload) -> Result<(), SenderError> {
        log::info!(
            "{} REPORT_LOGGED fields={} attachments={}\n{}",
            LogContext::for_report(&payload.report_id),
            payload.fields.len(),
            payload.attachments.len(),
            Self::render(payload)
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSenderFactory;

impl SenderFactory for LogSenderFactory {
    fn name(&self) -> &str {
        "log"
    }

    fn create(&self, _config: &CoreConfig) -> Option<Arc<dyn ReportSender>> {
        Some(Arc::new(LogSender))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::ResolvedAttachment;
    use crate::report::{CapturedReport, Report, ReportFields, ReportStatus};

    #[test]
    fn test_render_follows_field_order() {
        let mut fields = ReportFields::new();
        fields.push("STACK_TRACE", "boom");
        fields.push("APP_VERSION_CODE", 3i64);
        let report = Report::new(CapturedReport::new(fields, 3, false), ReportStatus::Approved);
        let payload = ReportPayload::new(
            &report,
            vec![ResolvedAttachment {
                name: "app.log".to_string(),
                uri: "/tmp/app.log".to_string(),
                bytes: vec![0; 4],
            }],
        );

        assert_eq!(
            LogSender::render(&payload),
            "STACK_TRACE=boom\nAPP_VERSION_CODE=3\nATTACHMENT=app.log bytes=4\n"
        );
        assert!(LogSender.send(&payload).is_ok());
    }

    #[test]
    fn test_factory_always_enabled() {
        let sender = LogSenderFactory.create(&CoreConfig::default()).unwrap();
        assert_eq!(sender.name(), "log");
    }
}
