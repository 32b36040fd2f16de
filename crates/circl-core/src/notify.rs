//! Transactional email: template rendering, delivery through the configured
//! email function, and an `email_logs` row for every attempt.

use std::time::Duration;

use askama::Template;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::EmailConfig;
use crate::error::{CirclError, Result};
use crate::insights::{NetworkAnalysis, RecommendationSet};
use crate::model::{upcoming, EmailKind, EmailLog, EmailStatus, Keystone};
use crate::secure::SecureClient;
use crate::storage::StorageBackend;

/// Request accepted by the email function.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[serde(rename = "type")]
    pub kind: EmailKind,
    pub to: String,
    pub user_id: Uuid,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Wire body: the request plus the rendered message.
#[derive(Serialize)]
struct Delivery<'a> {
    #[serde(flatten)]
    request: &'a EmailRequest,
    from: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn list<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

const ONBOARDING_STEPS: [&str; 3] = [
    "Run `circl import contacts.csv` to bring in your network",
    "Log calls and meetings with `circl log`",
    "Check `circl insights` for weekly suggestions",
];

#[derive(Template)]
#[template(path = "email/onboarding.html")]
struct OnboardingEmail<'a> {
    name: &'a str,
    steps: &'a [&'a str],
}

#[derive(Template)]
#[template(path = "email/reconnect_reminder.html")]
struct ReconnectEmail<'a> {
    name: &'a str,
    people: &'a [String],
}

#[derive(Template)]
#[template(path = "email/weekly_digest.html")]
struct DigestEmail<'a> {
    name: &'a str,
    overdue: &'a [String],
    events: &'a [String],
    suggestions: &'a [String],
}

#[derive(Template)]
#[template(path = "email/security_notification.html")]
struct SecurityEmail<'a> {
    name: &'a str,
    event: &'a str,
    details: &'a [String],
}

/// Plain-text alternative to the HTML body.
struct TextBody(String);

impl TextBody {
    fn new(name: &str) -> Self {
        Self(format!("Hi {name},\n\n"))
    }

    fn para(&mut self, s: &str) {
        self.0.push_str(s);
        self.0.push_str("\n\n");
    }

    fn section(&mut self, heading: Option<&str>, items: &[String]) {
        if items.is_empty() {
            return;
        }
        if let Some(h) = heading {
            self.0.push_str(h);
            self.0.push('\n');
        }
        for i in items {
            self.0.push_str("- ");
            self.0.push_str(i);
            self.0.push('\n');
        }
        self.0.push('\n');
    }

    fn finish(mut self) -> String {
        self.para("Arlo, your Circl assistant");
        self.0.trim_end().to_string() + "\n"
    }
}

/// Render the subject and bodies for a request. Missing data fields fall
/// back to neutral wording.
pub fn render(request: &EmailRequest) -> Result<RenderedEmail> {
    let data = &request.data;
    let name = str_field(data, "name").unwrap_or("there");
    let mut text = TextBody::new(name);

    let (subject, html) = match request.kind {
        EmailKind::Onboarding => {
            let html = OnboardingEmail {
                name,
                steps: &ONBOARDING_STEPS,
            }
            .render()?;
            text.para("Welcome to Circl! Import your contacts from a CSV file, sort them into inner, middle and outer circles, and Arlo will remind you who to reach out to.");
            let steps: Vec<String> = ONBOARDING_STEPS.iter().map(|s| s.to_string()).collect();
            text.section(None, &steps);
            ("Welcome to Circl".to_string(), html)
        }
        EmailKind::ReconnectReminder => {
            let contacts = list(data, "contacts");
            let people: Vec<String> = contacts
                .iter()
                .filter_map(|c| {
                    let n = str_field(c, "name")?;
                    Some(match c.get("days").and_then(Value::as_i64) {
                        Some(d) => format!("{n} (last contact {d} days ago)"),
                        None => n.to_string(),
                    })
                })
                .collect();
            let subject = match people.len() {
                0 => "Time to reconnect".to_string(),
                1 => format!(
                    "Time to reconnect with {}",
                    contacts.iter().find_map(|c| str_field(c, "name")).unwrap_or("a friend")
                ),
                n => format!("{n} people you haven't talked to in a while"),
            };
            let html = ReconnectEmail { name, people: &people }.render()?;
            text.para("A few people in your circles are overdue for a hello:");
            text.section(None, &people);
            (subject, html)
        }
        EmailKind::WeeklyDigest => {
            let overdue: Vec<String> = list(data, "overdue")
                .iter()
                .filter_map(|c| {
                    Some(format!(
                        "{} ({} circle, {} days)",
                        str_field(c, "name")?,
                        str_field(c, "circle").unwrap_or("outer"),
                        c.get("days").and_then(Value::as_i64).unwrap_or_default()
                    ))
                })
                .collect();
            let events: Vec<String> = list(data, "upcoming")
                .iter()
                .filter_map(|k| Some(format!("{}: {}", str_field(k, "date")?, str_field(k, "title")?)))
                .collect();
            let suggestions: Vec<String> = list(data, "suggestions")
                .iter()
                .filter_map(|s| Some(format!("{}: {}", str_field(s, "contactName")?, str_field(s, "suggestion")?)))
                .collect();

            let html = DigestEmail {
                name,
                overdue: &overdue,
                events: &events,
                suggestions: &suggestions,
            }
            .render()?;
            text.para("Here is your week in Circl.");
            text.section(Some("Overdue"), &overdue);
            text.section(Some("Coming up"), &events);
            text.section(Some("Arlo suggests"), &suggestions);
            if overdue.is_empty() && events.is_empty() && suggestions.is_empty() {
                text.para("You're all caught up. Nice work!");
            }
            ("Your weekly Circl digest".to_string(), html)
        }
        EmailKind::SecurityNotification => {
            let event = str_field(data, "event").unwrap_or("A security-relevant change");
            let mut details = Vec::new();
            if let Some(t) = str_field(data, "time") {
                details.push(format!("Time: {t}"));
            }
            if let Some(ip) = str_field(data, "ip") {
                details.push(format!("IP address: {ip}"));
            }
            let html = SecurityEmail {
                name,
                event,
                details: &details,
            }
            .render()?;
            text.para(&format!("{event} on your Circl account."));
            text.section(None, &details);
            text.para("If this wasn't you, secure your account right away.");
            ("Security alert for your Circl account".to_string(), html)
        }
    };

    Ok(RenderedEmail {
        subject,
        html,
        text: text.finish(),
    })
}

/// Data for a weekly digest built from the current network state.
pub fn digest_data(
    name: Option<&str>,
    network: &NetworkAnalysis<'_>,
    keystones: &[Keystone],
    recommendations: &RecommendationSet,
    today: NaiveDate,
) -> Value {
    let overdue: Vec<Value> = network
        .overdue()
        .map(|i| {
            json!({
                "name": i.contact.name(),
                "circle": i.contact.circle().as_str(),
                "days": i.analysis.days_since_last_contact,
            })
        })
        .collect();
    let upcoming: Vec<Value> = upcoming(keystones, today, 7)
        .into_iter()
        .map(|(k, date)| json!({ "title": k.title, "date": date.to_string() }))
        .collect();
    let suggestions: Vec<Value> = recommendations
        .items()
        .iter()
        .map(|r| json!({ "contactName": r.contact_name, "suggestion": r.suggestion }))
        .collect();
    json!({
        "name": name,
        "overdue": overdue,
        "upcoming": upcoming,
        "suggestions": suggestions,
    })
}

/// Sends rendered email through the configured HTTP function.
pub struct EmailService {
    config: EmailConfig,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.enabled && self.config.endpoint.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Render, send, and log one email.
    ///
    /// Delivery problems are recorded as `failed` (or `skipped` when email is
    /// not configured) in the returned log; only a failure to write the log
    /// itself is an error.
    pub async fn send<B: StorageBackend>(
        &self,
        client: &SecureClient<B>,
        request: &EmailRequest,
    ) -> Result<EmailLog> {
        let log = EmailLog::new(client.user_id(), request.kind, &request.to, EmailStatus::Skipped);
        let log = if !self.is_configured() {
            tracing::debug!(kind = %request.kind, "email not configured, skipping");
            log.with_error("email delivery is not configured")
        } else {
            match self.deliver(request).await {
                Ok(()) => {
                    tracing::info!(kind = %request.kind, "email sent");
                    EmailLog {
                        status: EmailStatus::Sent,
                        ..log
                    }
                }
                Err(e) => {
                    tracing::warn!(kind = %request.kind, error = %e, "email delivery failed");
                    EmailLog {
                        status: EmailStatus::Failed,
                        ..log
                    }
                    .with_error(e.to_string())
                }
            }
        };
        client.log_email(&log).await?;
        Ok(log)
    }

    async fn deliver(&self, request: &EmailRequest) -> Result<()> {
        let endpoint = self.config.endpoint.as_deref().unwrap_or_default();
        let rendered = render(request)?;
        let body = Delivery {
            request,
            from: &self.config.from,
            subject: &rendered.subject,
            html: &rendered.html,
            text: &rendered.text,
        };

        let mut req = self.client.post(endpoint).json(&body);
        if let Some(key) = self.config.api_key.as_deref() {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CirclError::Email(format!("email function returned {status}: {text}")));
        }
        Ok(())
    }
}
