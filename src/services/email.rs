use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::env;

pub async fn send_admin_credentials_email(recipient: &str, password: &str) -> Result<()> {
    let smtp_email = env::var("SMTP_EMAIL").context("SMTP_EMAIL must be set")?;
    let smtp_password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD must be set")?;
    let smtp_server = env::var("SMTP_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string());
    let smtp_port: u16 = env::var("SMTP_PORT")
        .unwrap_or_else(|_| "587".to_string())
        .parse()
        .context("Invalid SMTP_PORT")?;

    let email = Message::builder()
        .from(Mailbox::new(None, smtp_email.parse()?))
        .to(Mailbox::new(None, recipient.parse()?))
        .subject("Your Admin Account Has Been Created")
        .body(format!(
            "Hello Admin,\n\nYour admin account has been created.\n\nLogin Email: {}\nPassword: {}",
            recipient, password
        ))?;

    let creds = Credentials::new(smtp_email, smtp_password);

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_server)?
        .port(smtp_port)
        .credentials(creds)
        .build();

    mailer.send(email).await.context("Failed to send admin email")?;

    println!("Admin credentials sent to email: {}", recipient);

    Ok(())
}
