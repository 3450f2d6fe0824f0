//! ReadLater RPC Server: JSON over stdin/stdout for the view layer.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"article.open", "params":{"id":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"ui.state", "state":{...}}, {"event":"progress.saved", ...},
//!           {"event":"gesture", ...}

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Instant;

use readlater::app::App;
use readlater::logging;
use readlater::platform;
use readlater::rpc_handler::{handle_method, RateLimiter};
use readlater::types::ui::UiState;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

fn emit(value: &Value) {
    let mut stdout = io::stdout().lock();
    if writeln!(stdout, "{}", value).and_then(|_| stdout.flush()).is_err() {
        error!("stdout closed");
    }
}

fn drain_ui_states(queue: &Rc<RefCell<Vec<UiState>>>) {
    for state in queue.borrow_mut().drain(..) {
        emit(&json!({"event": "ui.state", "state": state}));
    }
}

fn run_timers(app: &mut App) {
    match app.run_timers(Instant::now()) {
        Ok((save, gesture)) => {
            if let Some(save) = save {
                emit(&json!({"event": "progress.saved", "save": save}));
            }
            if let Some(gesture) = gesture {
                emit(&json!({"event": "gesture", "gesture": gesture}));
            }
        }
        Err(e) => warn!(error = %e, "timer work failed"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let data_dir = platform::get_data_dir();
    let mut app = match App::new(&data_dir, None) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to initialize");
            emit(&json!({"event": "fatal", "error": e.to_string()}));
            std::process::exit(1);
        }
    };

    let ui_states: Rc<RefCell<Vec<UiState>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let queue = ui_states.clone();
        app.ui.subscribe(move |state| queue.borrow_mut().push(state.clone()));
    }

    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    info!(data_dir = %data_dir.display(), "rpc server ready");

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = app.next_deadline();
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now))), if deadline.is_some() => {
                run_timers(&mut app);
                drain_ui_states(&ui_states);
                continue;
            }
        };

        let line = match line {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");

        if !rate_limiter.check(method, Instant::now()) {
            emit(&json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&mut app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&response);
        drain_ui_states(&ui_states);
    }

    app.shutdown();
    drain_ui_states(&ui_states);
}
