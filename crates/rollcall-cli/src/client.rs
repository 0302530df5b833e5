//! Async HTTP client wrapping the rollcall JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use rollcall_core::{
  analytics::{DateBucket, FollowUp, Tally, Trend, report::Attendee},
  presence::{PresenceFields, PresenceFilter, PresenceRecord, Service},
  sheet::Mutation,
  staff::{LoginEvent, Session},
  subject::{Subject, SubjectKind},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Connection settings for the rollcall API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub pin:      String,
}

/// Roster narrowing shared by most read endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RosterQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kind:    Option<SubjectKind>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub service: Option<Service>,
}

/// `GET /analytics/subjects/:id/badges` response.
#[derive(Debug, Deserialize)]
pub struct BadgeReport {
  pub full_name: String,
  pub status:    rollcall_core::analytics::VisitStatus,
  pub stats:     rollcall_core::analytics::SubjectStats,
  pub badges:    Vec<rollcall_core::analytics::Badge>,
}

#[derive(Debug, Deserialize)]
pub struct DateReport {
  pub date:      NaiveDate,
  pub attendees: Vec<Attendee>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockState {
  locked: bool,
}

#[derive(Serialize)]
struct MarkBody<'a> {
  service: Service,
  #[serde(flatten)]
  fields:  &'a PresenceFields,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the rollcall JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req.basic_auth(&self.config.username, Some(&self.config.pin))
  }

  /// Send `req`, turning a non-2xx status into an error carrying the
  /// server's message.
  async fn send(&self, what: &str, req: RequestBuilder) -> Result<Response> {
    let resp = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<ErrorBody>()
      .await
      .map(|b| b.error)
      .unwrap_or_else(|_| status.to_string());
    Err(anyhow!("{what} → {status}: {message}"))
  }

  async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
  where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
  {
    let what = format!("GET {path}");
    tracing::debug!(%path, "request");
    let resp = self
      .send(&what, self.client.get(self.url(path)).query(query))
      .await?;
    resp
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `POST /api/login`
  pub async fn login(&self) -> Result<Session> {
    let body = serde_json::json!({
      "username": self.config.username,
      "pin": self.config.pin,
    });
    let resp = self
      .send("POST /login", self.client.post(self.url("/login")).json(&body))
      .await?;
    resp.json().await.context("deserialising session")
  }

  /// `GET /api/logins`
  pub async fn logins(&self, limit: usize) -> Result<Vec<LoginEvent>> {
    self.get_json("/logins", &[("limit", limit)]).await
  }

  // ── Roster and presence ───────────────────────────────────────────────────

  /// `GET /api/subjects`
  pub async fn list_subjects(&self, kind: SubjectKind) -> Result<Vec<Subject>> {
    let query = RosterQuery { kind: Some(kind), service: None };
    self.get_json("/subjects", &query).await
  }

  /// `GET /api/presence`
  pub async fn list_presence(&self, filter: &PresenceFilter) -> Result<Vec<PresenceRecord>> {
    self.get_json("/presence", filter).await
  }

  /// Send one sheet edit to the server.
  pub async fn apply(&self, mutation: &Mutation) -> Result<()> {
    let key = mutation.key();
    let path = format!("/presence/{}/{}", key.subject_id, key.date);
    tracing::debug!(%path, ?mutation, "apply");
    match mutation {
      Mutation::Upsert { fields, .. } => {
        let body = MarkBody { service: key.service, fields };
        let req = self.client.put(self.url(&path)).json(&body);
        self.send(&format!("PUT {path}"), req).await?;
      }
      Mutation::Delete { .. } => {
        let req = self
          .client
          .delete(self.url(&path))
          .query(&[("service", key.service.to_string())]);
        self.send(&format!("DELETE {path}"), req).await?;
      }
    }
    Ok(())
  }

  // ── Lock ──────────────────────────────────────────────────────────────────

  /// `GET /api/lock`
  pub async fn is_locked(&self) -> Result<bool> {
    let state: LockState = self.get_json("/lock", &()).await?;
    Ok(state.locked)
  }

  /// `PUT /api/lock`
  pub async fn set_lock(&self, locked: bool) -> Result<bool> {
    let req = self.client.put(self.url("/lock")).json(&LockState { locked });
    let resp = self.send("PUT /lock", req).await?;
    let state: LockState = resp.json().await.context("deserialising lock state")?;
    Ok(state.locked)
  }

  // ── Analytics and reports ─────────────────────────────────────────────────

  /// `GET /api/analytics/tally`
  pub async fn tally(&self, query: RosterQuery) -> Result<Tally> {
    self.get_json("/analytics/tally", &query).await
  }

  /// `GET /api/analytics/follow-up`
  pub async fn follow_up(&self, query: RosterQuery) -> Result<FollowUp> {
    self.get_json("/analytics/follow-up", &query).await
  }

  /// `GET /api/analytics/trend`
  pub async fn trend(&self, query: RosterQuery, window: Option<usize>) -> Result<Trend> {
    #[derive(Serialize)]
    struct TrendQuery {
      #[serde(flatten)]
      roster: RosterQuery,
      #[serde(skip_serializing_if = "Option::is_none")]
      window: Option<usize>,
    }
    self
      .get_json("/analytics/trend", &TrendQuery { roster: query, window })
      .await
  }

  /// `GET /api/analytics/subjects/:id/badges`
  pub async fn badges(&self, subject_id: Uuid) -> Result<BadgeReport> {
    self
      .get_json(&format!("/analytics/subjects/{subject_id}/badges"), &())
      .await
  }

  /// `GET /api/reports`
  pub async fn date_summaries(&self, query: RosterQuery) -> Result<Vec<DateBucket>> {
    self.get_json("/reports", &query).await
  }

  /// `GET /api/reports/:date`
  pub async fn attendees_on(&self, date: NaiveDate, query: RosterQuery) -> Result<DateReport> {
    self.get_json(&format!("/reports/{date}"), &query).await
  }

  /// `GET /api/birthdays`
  pub async fn birthdays(&self, month: Option<u32>, kind: SubjectKind) -> Result<Vec<Subject>> {
    #[derive(Serialize)]
    struct BirthdayQuery {
      #[serde(skip_serializing_if = "Option::is_none")]
      month: Option<u32>,
      kind:  SubjectKind,
    }
    self
      .get_json("/birthdays", &BirthdayQuery { month, kind })
      .await
  }
}
