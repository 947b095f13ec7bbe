//! Outgoing email: message rendering and the delivery seam.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use url::Url;

use smartquota_clients::{Client, confirmation_token};
use smartquota_core::Email;

use crate::config::{ApiConfig, SmtpConfig};

const SENDER_NAME: &str = "SmartQuota";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Email,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
#[error("email delivery failed: {0}")]
pub struct MailError(pub String);

/// Delivers rendered messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name of the delivery mechanism, for startup logs.
    fn transport(&self) -> &'static str;

    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;

    /// Check that the transport is reachable.
    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }
}

/// SMTP mailer when credentials are configured, log delivery otherwise.
pub fn from_config(config: &ApiConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    Ok(match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => Arc::new(LogMailer),
    })
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .with_context(|| format!("invalid EMAIL_HOST `{}`", config.host))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        let address: Address = config
            .user
            .parse()
            .with_context(|| format!("EMAIL_USER `{}` is not an email address", config.user))?;

        Ok(Self {
            transport,
            from: Mailbox::new(Some(SENDER_NAME.to_string()), address),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn transport(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let to: Address = message.to.as_str().parse().map_err(|e| MailError(format!("{e}")))?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to))
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)
            .map_err(|e| MailError(e.to_string()))?;

        self.transport.send(email).await.map_err(|e| MailError(e.to_string()))?;
        Ok(())
    }

    async fn verify(&self) -> Result<(), MailError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError("SMTP server did not accept the connection".to_string())),
            Err(e) => Err(MailError(e.to_string())),
        }
    }
}

/// Development delivery: the message is written to the log instead of sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn transport(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            from = SENDER_NAME,
            to = %message.to,
            subject = %message.subject,
            body = %message.html,
            "email (log delivery)"
        );
        Ok(())
    }
}

/// Absolute links embedded in emails and HTML pages.
#[derive(Debug, Clone)]
pub struct Links {
    public_base: Url,
    frontend_base: Url,
    frontend_url: Url,
}

fn link(base: &Url, path: &str, query: &[(&str, &str)]) -> String {
    let mut url = base.join(path).unwrap_or_else(|_| base.clone());
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url.into()
}

impl Links {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            public_base: config.public_base_url.clone(),
            frontend_base: config.frontend_base.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    pub fn confirm_by_email(&self, email: &Email) -> String {
        link(&self.public_base, "cliente/confirmar", &[("email", email.as_str())])
    }

    pub fn confirm_by_token(&self, email: &Email) -> String {
        link(&self.public_base, "cliente/confirmar", &[("token", &confirmation_token(email))])
    }

    pub fn login_after_confirm(&self) -> String {
        link(&self.frontend_base, "login.html", &[("confirmed", "1")])
    }

    pub fn reset_password(&self, token: &str) -> String {
        link(&self.frontend_url, "reset.html", &[("token", token)])
    }
}

/// Minimal escaping for text interpolated into HTML.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn confirmation_email(client: &Client, links: &Links) -> EmailMessage {
    let by_email = escape_html(&links.confirm_by_email(&client.email));
    let by_token = escape_html(&links.confirm_by_token(&client.email));
    let name = escape_html(&client.name);

    let html = format!(
        r#"<div style="font-family:Arial,sans-serif;line-height:1.6;color:#333">
  <h2>Olá {name},</h2>
  <p>Obrigado por se cadastrar no <strong>SmartQuota</strong>.</p>
  <p>Clique no botão abaixo para confirmar seu email:</p>
  <p><a href="{by_email}" target="_blank" rel="noopener">Confirmar Cadastro</a></p>
  <p>Se preferir, você também pode usar este link alternativo:</p>
  <p><a href="{by_token}" target="_blank" rel="noopener">{by_token}</a></p>
  <p style="font-size:12px;color:#666">Se você não solicitou este cadastro, ignore este email.</p>
</div>"#
    );

    EmailMessage {
        to: client.email.clone(),
        subject: "Confirmação de Cadastro - SmartQuota".to_string(),
        html,
    }
}

pub fn reset_email(client: &Client, token: &str, links: &Links) -> EmailMessage {
    let reset = escape_html(&links.reset_password(token));
    let name = escape_html(client.first_name());

    let html = format!(
        r#"<div style="font-family:Arial,sans-serif;line-height:1.6;color:#333">
  <h2>Olá {name},</h2>
  <p>Recebemos um pedido para redefinir a senha da sua conta SmartQuota.</p>
  <p><a href="{reset}" target="_blank" rel="noopener">Redefinir senha</a></p>
  <p>O link expira em 1 hora. Se você não fez este pedido, ignore este email.</p>
</div>"#
    );

    EmailMessage {
        to: client.email.clone(),
        subject: "Redefinição de Senha - SmartQuota".to_string(),
        html,
    }
}
