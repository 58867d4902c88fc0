//! Transactional email.
//!
//! Messages are rendered from Askama templates into a plain-text and an HTML
//! part. With SMTP configured they go out over STARTTLS; without it the
//! rendered message is logged. Delivery runs in a spawned task so a mail
//! failure never fails the request that triggered it.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Order, OrderItem};

const STORE_NAME: &str = "E-Commerce";

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    name: &'a str,
    store_name: &'a str,
    shop_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
    store_name: &'a str,
    shop_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order_number: &'a str,
    lines: &'a [OrderItem],
    subtotal: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    order_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    order_number: &'a str,
    lines: &'a [OrderItem],
    subtotal: Decimal,
    tax: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    order_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Clone)]
struct Smtp {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Notification service. Cheap to clone.
#[derive(Clone)]
pub struct NotificationService {
    smtp: Option<Smtp>,
    base_url: String,
}

impl NotificationService {
    /// Build the service; `None` config means log-only delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay or sender address is invalid.
    pub fn new(config: Option<&EmailConfig>, base_url: &str) -> Result<Self, NotificationError> {
        let smtp = config.map(Smtp::new).transpose()?;
        if smtp.is_none() {
            tracing::info!("SMTP not configured; emails will be logged only");
        }

        Ok(Self {
            smtp,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Log-only service.
    #[must_use]
    pub fn disabled(base_url: &str) -> Self {
        Self {
            smtp: None,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render the welcome email.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Template` if rendering fails.
    pub fn render_welcome(&self, to: &str, name: &str) -> Result<RenderedEmail, NotificationError> {
        let shop_url = format!("{}/api/v1/products", self.base_url);
        let html = WelcomeHtml {
            name,
            store_name: STORE_NAME,
            shop_url: &shop_url,
        }
        .render()?;
        let text = WelcomeText {
            name,
            store_name: STORE_NAME,
            shop_url: &shop_url,
        }
        .render()?;

        Ok(RenderedEmail {
            to: to.to_string(),
            subject: format!("Welcome to {STORE_NAME}"),
            text,
            html,
        })
    }

    /// Render the order confirmation email.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Template` if rendering fails.
    pub fn render_order_confirmation(
        &self,
        to: &str,
        name: &str,
        order: &Order,
    ) -> Result<RenderedEmail, NotificationError> {
        let order_url = format!("{}/api/v1/orders/{}", self.base_url, order.id);
        let html = OrderConfirmationHtml {
            name,
            order_number: &order.order_number,
            lines: &order.items,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping_cost: order.shipping_cost,
            total: order.total,
            order_url: &order_url,
        }
        .render()?;
        let text = OrderConfirmationText {
            name,
            order_number: &order.order_number,
            lines: &order.items,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping_cost: order.shipping_cost,
            total: order.total,
            order_url: &order_url,
        }
        .render()?;

        Ok(RenderedEmail {
            to: to.to_string(),
            subject: format!("Order confirmation {}", order.order_number),
            text,
            html,
        })
    }

    /// Render the password reset email for a reset token.
    ///
    /// No route issues reset tokens; this is library surface for callers of
    /// `bazaar-api` that own the token flow and pass the result to
    /// [`Self::deliver`] or [`Self::spawn`].
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Template` if rendering fails.
    pub fn render_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_token: &str,
    ) -> Result<RenderedEmail, NotificationError> {
        let reset_url = format!("{}/reset-password?token={reset_token}", self.base_url);
        let html = PasswordResetHtml {
            name,
            reset_url: &reset_url,
        }
        .render()?;
        let text = PasswordResetText {
            name,
            reset_url: &reset_url,
        }
        .render()?;

        Ok(RenderedEmail {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            text,
            html,
        })
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Deliver a rendered message, or log it when SMTP is not configured.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn deliver(&self, email: &RenderedEmail) -> Result<(), NotificationError> {
        let Some(smtp) = &self.smtp else {
            tracing::info!(to = %email.to, subject = %email.subject, "Email (not sent, SMTP disabled)");
            tracing::debug!(body = %email.text, "Email body");
            return Ok(());
        };

        let message = Message::builder()
            .from(smtp.from.clone())
            .to(email
                .to
                .parse()
                .map_err(|_| NotificationError::InvalidAddress(email.to.clone()))?)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        smtp.mailer.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }

    /// Render and deliver in a background task; failures are only logged.
    pub fn spawn<F>(&self, kind: &'static str, render: F)
    where
        F: FnOnce(&Self) -> Result<RenderedEmail, NotificationError>,
    {
        let email = match render(self) {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(error = %e, kind, "Failed to render email");
                return;
            }
        };

        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.deliver(&email).await {
                tracing::error!(error = %e, kind, to = %email.to, "Failed to send email");
            }
        });
    }
}

impl Smtp {
    fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        let from_address = format!("{} <{}>", config.from_name, config.from_email);
        let from = from_address
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(from_address.clone()))?;

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{OrderId, OrderItemId, OrderPaymentStatus, OrderStatus, ProductId, UserId};
    use chrono::DateTime;

    use super::*;

    fn order() -> Order {
        let at = DateTime::from_timestamp(0, 0).unwrap();
        Order {
            id: OrderId::new(5),
            user_id: UserId::new(2),
            order_number: "ORD-1700000000".to_string(),
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            subtotal: Decimal::new(2000, 2),
            tax: Decimal::new(200, 2),
            shipping_cost: Decimal::new(1000, 2),
            total: Decimal::new(3200, 2),
            shipping_address: "Address ID: 1".to_string(),
            billing_address: "Address ID: 1".to_string(),
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                order_id: OrderId::new(5),
                product_id: ProductId::new(3),
                quantity: 2,
                price: Decimal::new(1000, 2),
                subtotal: Decimal::new(2000, 2),
                created_at: at,
            }],
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_welcome_renders_name() {
        let service = NotificationService::disabled("http://localhost:8080/");
        let email = service.render_welcome("jane@example.com", "Jane").unwrap();

        assert_eq!(email.subject, "Welcome to E-Commerce");
        assert!(email.text.contains("Hi Jane"));
        assert!(email.text.contains("http://localhost:8080/api/v1/products"));
        assert!(email.html.contains("Welcome, Jane!"));
    }

    #[test]
    fn test_html_escapes_name() {
        let service = NotificationService::disabled("http://localhost:8080");
        let email = service.render_welcome("x@example.com", "<b>x</b>").unwrap();

        assert!(!email.html.contains("<b>x</b>"));
        assert!(email.text.contains("<b>x</b>"));
    }

    #[test]
    fn test_order_confirmation_lists_lines_and_total() {
        let service = NotificationService::disabled("http://localhost:8080");
        let email = service
            .render_order_confirmation("john@example.com", "John", &order())
            .unwrap();

        assert_eq!(email.subject, "Order confirmation ORD-1700000000");
        assert!(email.text.contains("Product #3 x 2"));
        assert!(email.text.contains("Total:    $32.00"));
        assert!(email.text.contains("http://localhost:8080/api/v1/orders/5"));
        assert!(email.html.contains("ORD-1700000000"));
    }

    #[test]
    fn test_password_reset_link() {
        let service = NotificationService::disabled("https://shop.example.com");
        let email = service
            .render_password_reset("jane@example.com", "Jane", "abc123")
            .unwrap();

        assert!(
            email
                .text
                .contains("https://shop.example.com/reset-password?token=abc123")
        );
    }

    #[tokio::test]
    async fn test_deliver_without_smtp_is_ok() {
        let service = NotificationService::disabled("http://localhost:8080");
        let email = service.render_welcome("jane@example.com", "Jane").unwrap();
        assert!(service.deliver(&email).await.is_ok());
    }
}
