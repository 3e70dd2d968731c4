//! Console front end for an operations dashboard.
//!
//! Restores (or creates) a session, checks the access gate the way a
//! protected page would, then loads every section and prints what each
//! source returned.
//!
//! ```text
//! PULSEBOARD_API_URL=https://ops.example.com/api \
//! PULSEBOARD_EMAIL=ops@example.com PULSEBOARD_PASSWORD=... \
//! cargo run -p ops-dashboard
//! ```

use std::sync::Mutex;

use pulseboard::prelude::*;

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Tracks the "current page" of a console app and logs redirects.
struct ConsoleNavigator {
    path: Mutex<String>,
}

impl ConsoleNavigator {
    fn new(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_string()),
        }
    }
}

impl Navigator for ConsoleNavigator {
    fn current_path(&self) -> String {
        self.path
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn navigate(&self, path: &str) {
        tracing::warn!(to = path, "redirected");
        if let Ok(mut current) = self.path.lock() {
            *current = path.to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_section(section: Section, view: &AggregateResult<serde_json::Value>) {
    let status = if view.is_degraded() {
        "partial"
    } else if view.is_error() {
        "failed"
    } else {
        "ok"
    };
    println!("== {section} ({status})");
    for (name, source) in view.iter() {
        match (&source.data, &source.error) {
            (_, Some(e)) => println!("  {name}: error: {}", e.user_message()),
            (Some(data), None) => println!("  {name}: {data}"),
            (None, None) => println!("  {name}: no data"),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), PulseboardError> {
    pulseboard::init_tracing();

    let config = DashboardConfig::from_env()?;
    let mut dashboard = Dashboard::connect(config, ConsoleNavigator::new("/dashboard"))?;
    dashboard.initialize().await;

    if dashboard.gate() == GateDecision::RedirectToLogin {
        let email = std::env::var("PULSEBOARD_EMAIL").unwrap_or_default();
        let password = std::env::var("PULSEBOARD_PASSWORD").unwrap_or_default();
        if email.is_empty() {
            eprintln!("no stored session; set PULSEBOARD_EMAIL and PULSEBOARD_PASSWORD to log in");
            return Ok(());
        }
        if let Err(e) = dashboard.login(&LoginRequest::new(email, password)).await {
            eprintln!("login failed: {}", e.user_message());
            return Ok(());
        }
    }

    match dashboard.gate() {
        GateDecision::RenderChildren => {}
        GateDecision::ShowAccessDenied => {
            eprintln!("access denied: this dashboard is for administrators");
            return Ok(());
        }
        other => {
            eprintln!("cannot show dashboard: {other:?}");
            return Ok(());
        }
    }

    if let Some(user) = dashboard.snapshot().user {
        println!("signed in as {} <{}>", user.name, user.email);
    }

    for section in Section::ALL {
        let mut aggregator = dashboard.section(section);
        aggregator.fetch(None);
        let view = aggregator.settled().await;
        print_section(section, &view);
    }

    Ok(())
}
