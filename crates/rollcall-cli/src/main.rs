//! `rollcall` is the check-in kiosk and report client for a rollcall server.
//!
//! # Usage
//!
//! ```
//! rollcall --url http://localhost:8080 --user teacher --pin 1234 kiosk
//! rollcall --config ~/.config/rollcall/config.toml follow-up --roster ushering
//! ```

mod app;
mod client;
mod render;
mod ui;

use std::{io, time::Duration};

use anyhow::{Context, Result, anyhow};
use app::{App, Flow};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig, RosterQuery};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use ratatui::{Terminal, backend::CrosstermBackend};
use rollcall_core::{
  presence::Service,
  staff::Ministry,
  subject::{Subject, SubjectKind},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rollcall", about = "Check-in kiosk and reports for a rollcall server")]
struct Args {
  /// Path to a TOML config file (url, username, pin).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the rollcall server (default: http://localhost:8080).
  #[arg(long, env = "ROLLCALL_URL")]
  url: Option<String>,

  /// Staff username.
  #[arg(long, env = "ROLLCALL_USER")]
  user: Option<String>,

  /// Staff PIN.
  #[arg(long, env = "ROLLCALL_PIN")]
  pin: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Full-screen check-in sheet.
  Kiosk {
    #[command(flatten)]
    scope: Scope,
    /// Date to check in for (default: today).
    #[arg(long)]
    date:  Option<NaiveDate>,
  },
  /// New arrivals and regulars.
  Tally {
    #[command(flatten)]
    scope: Scope,
  },
  /// Subjects absent from each of the last three sessions.
  FollowUp {
    #[command(flatten)]
    scope: Scope,
  },
  /// Present count over the most recent sessions.
  Trend {
    #[command(flatten)]
    scope:  Scope,
    /// Number of dates to show (default: server setting).
    #[arg(long)]
    window: Option<usize>,
  },
  /// Achievement badges for one subject, found by name.
  Badges {
    name:   String,
    #[arg(long, value_enum, default_value_t = Roster::Kids)]
    roster: Roster,
  },
  /// Present count per date, or who attended on `date`.
  Reports {
    date:  Option<NaiveDate>,
    #[command(flatten)]
    scope: Scope,
  },
  /// Birthdays in a month.
  Birthdays {
    /// 1-12 (default: this month).
    #[arg(long)]
    month:  Option<u32>,
    #[arg(long, value_enum, default_value_t = Roster::Kids)]
    roster: Roster,
  },
  /// Show the attendance lock, or turn it on or off.
  Lock { state: Option<Switch> },
  /// Recent staff logins.
  Logins {
    #[arg(long, default_value_t = 50)]
    limit: usize,
  },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct Scope {
  #[arg(long, value_enum, default_value_t = Roster::Kids)]
  roster:  Roster,
  /// e.g. sunday-school, morning-service (default: the roster's usual one).
  #[arg(long, value_parser = parse_service)]
  service: Option<Service>,
}

impl Scope {
  fn kind(self) -> SubjectKind { self.roster.kind() }

  fn query(self) -> RosterQuery {
    RosterQuery { kind: Some(self.kind()), service: self.service }
  }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Roster {
  Kids,
  Ushering,
}

impl Roster {
  fn kind(self) -> SubjectKind {
    match self {
      Self::Kids => Ministry::Kids.roster(),
      Self::Ushering => Ministry::Ushering.roster(),
    }
  }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Switch {
  On,
  Off,
}

fn parse_service(s: &str) -> Result<Service, String> {
  s.replace('-', "_")
    .to_uppercase()
    .parse()
    .map_err(|_| format!("unknown service `{s}`"))
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  pin:      String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .ok_or_else(|| anyhow!("no username given (--user or config file)"))?,
    pin:      args
      .pin
      .or_else(|| (!file_cfg.pin.is_empty()).then(|| file_cfg.pin.clone()))
      .ok_or_else(|| anyhow!("no PIN given (--pin or config file)"))?,
  };

  let client = ApiClient::new(api_config)?;
  let session = client.login().await?;
  tracing::debug!(username = %session.username, role = %session.role, "logged in");

  match args.command {
    Command::Kiosk { scope, date } => {
      let date = date.unwrap_or_else(|| Local::now().date_naive());
      let service = scope.service.unwrap_or_else(|| Service::default_for(scope.kind()));
      run_kiosk(App::new(client, scope.kind(), date, service)).await?;
    }
    Command::Tally { scope } => {
      print!("{}", render::tally(&client.tally(scope.query()).await?));
    }
    Command::FollowUp { scope } => {
      print!("{}", render::follow_up(&client.follow_up(scope.query()).await?));
    }
    Command::Trend { scope, window } => {
      print!("{}", render::trend(&client.trend(scope.query(), window).await?));
    }
    Command::Badges { name, roster } => {
      let roster = client.list_subjects(roster.kind()).await?;
      let subject =
        best_match(&roster, &name).ok_or_else(|| anyhow!("no one matches `{name}`"))?;
      print!("{}", render::badges(&client.badges(subject.subject_id).await?));
    }
    Command::Reports { date: Some(date), scope } => {
      print!("{}", render::attendees(&client.attendees_on(date, scope.query()).await?));
    }
    Command::Reports { date: None, scope } => {
      print!("{}", render::date_summaries(&client.date_summaries(scope.query()).await?));
    }
    Command::Birthdays { month, roster } => {
      print!("{}", render::birthdays(&client.birthdays(month, roster.kind()).await?));
    }
    Command::Lock { state } => {
      let locked = match state {
        Some(s) => client.set_lock(s == Switch::On).await?,
        None => client.is_locked().await?,
      };
      println!("attendance lock is {}", if locked { "on" } else { "off" });
    }
    Command::Logins { limit } => {
      print!("{}", render::logins(&client.logins(limit).await?));
    }
  }

  Ok(())
}

/// The roster subject whose name best matches `query`.
fn best_match<'a>(roster: &'a [Subject], query: &str) -> Option<&'a Subject> {
  let matcher = SkimMatcherV2::default();
  roster
    .iter()
    .filter_map(|s| matcher.fuzzy_match(&s.full_name, query).map(|score| (score, s)))
    .max_by_key(|(score, _)| *score)
    .map(|(_, s)| s)
}

// ─── Kiosk ────────────────────────────────────────────────────────────────────

async fn run_kiosk(mut app: App) -> Result<()> {
  app.reload().await?;

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Restore the terminal even if the loop fails.
  let result = run_event_loop(&mut terminal, &mut app).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // The optimistic edit is on screen now; confirm it with the server.
    if app.has_pending() {
      app.flush().await;
      continue;
    }

    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && app.handle_key(key) == Flow::Quit
    {
      break;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use rollcall_core::subject::NewSubject;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn service_names_accept_kebab_case() {
    assert_eq!(parse_service("sunday-school"), Ok(Service::SundaySchool));
    assert_eq!(parse_service("MORNING_SERVICE"), Ok(Service::MorningService));
    assert!(parse_service("vespers").is_err());
  }

  #[test]
  fn rosters_map_to_subject_kinds() {
    assert_eq!(Roster::Kids.kind(), SubjectKind::Student);
    assert_eq!(Roster::Ushering.kind(), SubjectKind::Member);
  }

  #[test]
  fn best_match_picks_closest_name() {
    let roster: Vec<Subject> = ["Ana Cruz", "Andrea Lim", "Ben Santos"]
      .into_iter()
      .map(|n| NewSubject::new(SubjectKind::Student, n).into_subject(Uuid::new_v4(), Utc::now()))
      .collect();
    assert_eq!(best_match(&roster, "ben").unwrap().full_name, "Ben Santos");
    assert!(best_match(&roster, "xyz").is_none());
  }

  #[test]
  fn args_parse_subcommands() {
    let args = Args::try_parse_from([
      "rollcall", "--user", "usher", "--pin", "3333", "follow-up", "--roster", "ushering",
    ])
    .unwrap();
    assert!(matches!(
      args.command,
      Command::FollowUp { scope: Scope { roster: Roster::Ushering, service: None } }
    ));

    let args = Args::try_parse_from(["rollcall", "lock", "on"]).unwrap();
    assert!(matches!(args.command, Command::Lock { state: Some(Switch::On) }));
  }
}
