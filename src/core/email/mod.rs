// Email delivery modules
pub mod html;

use std::fs;
use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{ReportError, SummaryResult};

pub use html::render_email_html;

/// SMTP account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    /// Relay host, e.g. "smtp.gmail.com"
    pub host: String,
    /// STARTTLS submission port
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// From address
    pub account: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_smtp_port() -> u16 {
    587
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.account.is_empty() && !self.password.is_empty()
    }
}

/// 邮件发送器：一次调用 = 一封邮件（HTML 摘要正文 + PDF 附件）。
///
/// 认证失败、连接失败都映射为 `Delivery` 并直接上抛 —— 不重试，
/// 由调用方（CLI）把错误呈现给用户。发送失败不影响已写出的 PDF。
pub struct EmailSender {
    config: SmtpConfig,
}

impl EmailSender {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Send the cleaned report to one recipient.
    ///
    /// The attachment filename is the original document's filename, so the
    /// recipient sees the familiar report name rather than a temp path.
    pub fn send_report(
        &self,
        recipient: &str,
        pdf_path: &Path,
        summary: Option<&SummaryResult>,
        original_filename: &str,
    ) -> Result<(), ReportError> {
        let to: Mailbox = recipient.parse().map_err(|e| {
            ReportError::InvalidConfig(format!("无效的收件人地址 {}: {}", recipient, e))
        })?;
        let from: Mailbox = self.config.account.parse().map_err(|e| {
            ReportError::InvalidConfig(format!("无效的发件人地址 {}: {}", self.config.account, e))
        })?;

        let pdf_data = fs::read(pdf_path)?;
        let html_body = render_email_html(summary, original_filename);

        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| ReportError::Delivery(format!("附件 MIME 类型错误: {}", e)))?;
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(format!("Research Report - {}", original_filename))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(html_body))
                    .singlepart(
                        Attachment::new(original_filename.to_string()).body(pdf_data, pdf_type),
                    ),
            )
            .map_err(|e| ReportError::Delivery(format!("邮件构建失败: {}", e)))?;

        let mailer = self.transport()?;
        mailer
            .send(&message)
            .map_err(|e| ReportError::Delivery(format!("邮件发送失败: {}", e)))?;

        info!(recipient, "email sent");
        Ok(())
    }

    /// Probe the SMTP relay: connect and authenticate, send nothing
    pub fn test_connection(&self) -> Result<bool, ReportError> {
        let mailer = self.transport()?;
        mailer
            .test_connection()
            .map_err(|e| ReportError::Delivery(format!("SMTP 连接测试失败: {}", e)))
    }

    fn transport(&self) -> Result<SmtpTransport, ReportError> {
        let relay = SmtpTransport::starttls_relay(&self.config.host)
            .map_err(|e| ReportError::Delivery(format!("SMTP 中继配置错误: {}", e)))?;
        Ok(relay
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build())
    }
}
