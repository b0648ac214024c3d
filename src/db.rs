//! Connection negotiation for the primary document store.
//!
//! Produces a usable `mongodb::sync::Database` handle, or signals
//! unavailability, within a time budget appropriate to the caller. Web
//! requests must never stall on a slow database, so interactive
//! negotiations carry both short per-attempt timeouts and a hard
//! wall-clock ceiling. The first successful handle is memoized for the
//! lifetime of the process; failures are never cached, so a later call
//! re-runs the full negotiation.
//!
//! Under a multi-worker deployment each process negotiates on its own.
//! There is deliberately no cross-process coordination.

use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use log::{info, warn};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::sync::{Client, Database};

use crate::config::Config;

/// Interactive negotiations stop starting new attempts past this point.
const INTERACTIVE_CEILING: Duration = Duration::from_secs(3);

/// Who is asking for the connection. Web requests get the aggressive
/// budget; CLI jobs (index creation, seeding) can afford to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    Batch,
}

impl RunMode {
    fn log_prefix(self) -> &'static str {
        match self {
            RunMode::Interactive => "[WEB]",
            RunMode::Batch => "[CLI]",
        }
    }
}

/// One endpoint to try, with its per-attempt timeouts.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub uri: String,
    pub label: &'static str,
    pub connect_timeout: Duration,
    pub selection_timeout: Duration,
}

/// The static, ordered attempt list. The remote primary always comes
/// first; a local instance is only worth trying outside production.
pub fn candidates(cfg: &Config, mode: RunMode) -> Vec<Candidate> {
    let (primary_secs, local_secs) = match mode {
        RunMode::Interactive => (5, 1),
        RunMode::Batch => (15, 3),
    };

    let mut list = vec![Candidate {
        uri: cfg.mongo_uri.clone(),
        label: "primary",
        connect_timeout: Duration::from_secs(primary_secs),
        selection_timeout: Duration::from_secs(primary_secs),
    }];

    if !cfg.production {
        list.push(Candidate {
            uri: "mongodb://localhost:27017".to_string(),
            label: "localhost",
            connect_timeout: Duration::from_secs(local_secs),
            selection_timeout: Duration::from_secs(local_secs),
        });
    }

    list
}

/// Try candidates in order until one dials successfully. Interactive mode
/// gives up once the wall clock passes the ceiling, even if candidates
/// remain. Generic over the dialer so the ordering and budget logic can be
/// exercised without a live server.
pub(crate) fn run_attempts<H>(
    mode: RunMode,
    candidates: &[Candidate],
    mut dial: impl FnMut(&Candidate) -> Result<H, String>,
) -> Option<H> {
    let prefix = mode.log_prefix();
    let start = Instant::now();

    for (i, candidate) in candidates.iter().enumerate() {
        let attempt_start = Instant::now();
        info!(
            "{} store connection attempt {} to {}",
            prefix,
            i + 1,
            candidate.label
        );

        match dial(candidate) {
            Ok(handle) => {
                info!(
                    "{} store connection to {} succeeded in {:?} (total {:?})",
                    prefix,
                    candidate.label,
                    attempt_start.elapsed(),
                    start.elapsed()
                );
                return Some(handle);
            }
            Err(e) => {
                warn!(
                    "{} store connection to {} failed after {:?}: {}",
                    prefix,
                    candidate.label,
                    attempt_start.elapsed(),
                    e
                );
                if mode == RunMode::Interactive && start.elapsed() > INTERACTIVE_CEILING {
                    warn!(
                        "{} stopping connection attempts: exceeded {:?} interactive ceiling",
                        prefix, INTERACTIVE_CEILING
                    );
                    break;
                }
            }
        }
    }

    info!(
        "{} all store connection attempts failed after {:?}",
        prefix,
        start.elapsed()
    );
    None
}

/// Dial a single candidate: parse options, apply its timeouts, connect and
/// verify liveness with a ping before accepting the handle.
fn dial(candidate: &Candidate, db_name: &str) -> Result<Database, String> {
    let mut options = ClientOptions::parse(&candidate.uri).map_err(|e| e.to_string())?;
    options.connect_timeout = Some(candidate.connect_timeout);
    options.server_selection_timeout = Some(candidate.selection_timeout);

    let client = Client::with_options(options).map_err(|e| e.to_string())?;
    let db = client.database(db_name);
    db.run_command(doc! { "ping": 1 }, None)
        .map_err(|e| format!("ping failed: {}", e))?;
    Ok(db)
}

/// Process-wide "first success wins" cache. Explicit rather than a bare
/// global so tests can build their own and reset it between cases.
pub struct Memo<T> {
    slot: Mutex<Option<T>>,
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Memo {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value, or run `init` and cache its success.
    /// A `None` from `init` is returned but never stored.
    pub fn get_or_init_with(&self, init: impl FnOnce() -> Option<T>) -> Option<T> {
        let mut slot = self.slot.lock().expect("connection memo poisoned");
        if let Some(ref v) = *slot {
            return Some(v.clone());
        }
        let fresh = init()?;
        *slot = Some(fresh.clone());
        Some(fresh)
    }

    pub fn reset(&self) {
        *self.slot.lock().expect("connection memo poisoned") = None;
    }
}

impl<T: Clone> Default for Memo<T> {
    fn default() -> Self {
        Memo::new()
    }
}

fn shared_memo() -> &'static Memo<Database> {
    static MEMO: OnceLock<Memo<Database>> = OnceLock::new();
    MEMO.get_or_init(Memo::new)
}

/// Negotiate a handle to the primary store, reusing the process-wide cache.
/// `None` means unavailable, an expected degraded state rather than an error.
pub fn connect(cfg: &Config, mode: RunMode) -> Option<Database> {
    shared_memo().get_or_init_with(|| {
        let list = candidates(cfg, mode);
        run_attempts(mode, &list, |c| dial(c, &cfg.db_name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::thread::sleep;

    fn stub_candidates(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|_| Candidate {
                uri: "mongodb://stub".to_string(),
                label: "stub",
                connect_timeout: Duration::from_millis(10),
                selection_timeout: Duration::from_millis(10),
            })
            .collect()
    }

    #[test]
    fn first_success_wins_and_later_candidates_are_not_dialed() {
        let list = stub_candidates(3);
        let dialed = RefCell::new(0usize);
        let result = run_attempts(RunMode::Batch, &list, |_| {
            *dialed.borrow_mut() += 1;
            Ok::<_, String>(42)
        });
        assert_eq!(result, Some(42));
        assert_eq!(*dialed.borrow(), 1);
    }

    #[test]
    fn attempts_happen_in_declared_order() {
        let list = stub_candidates(3);
        let dialed = RefCell::new(0usize);
        let result = run_attempts(RunMode::Batch, &list, |_| {
            let mut n = dialed.borrow_mut();
            *n += 1;
            if *n < 3 {
                Err("down".to_string())
            } else {
                Ok(*n)
            }
        });
        assert_eq!(result, Some(3));
        assert_eq!(*dialed.borrow(), 3);
    }

    #[test]
    fn all_failures_return_unavailable() {
        let list = stub_candidates(2);
        let result: Option<i32> = run_attempts(RunMode::Batch, &list, |_| Err("down".to_string()));
        assert!(result.is_none());
    }

    #[test]
    fn empty_candidate_list_is_unavailable() {
        let result: Option<i32> = run_attempts(RunMode::Interactive, &[], |_| Ok(1));
        assert!(result.is_none());
    }

    #[test]
    fn interactive_ceiling_stops_before_remaining_candidates() {
        // First attempt stalls past the 3s ceiling; the second must never run.
        let list = stub_candidates(2);
        let dialed = RefCell::new(0usize);
        let started = Instant::now();
        let result: Option<i32> = run_attempts(RunMode::Interactive, &list, |_| {
            *dialed.borrow_mut() += 1;
            sleep(INTERACTIVE_CEILING + Duration::from_millis(100));
            Err("stalled".to_string())
        });
        assert!(result.is_none());
        assert_eq!(*dialed.borrow(), 1);
        // Unavailable within ceiling + one attempt, not ceiling + two.
        assert!(started.elapsed() < 2 * (INTERACTIVE_CEILING + Duration::from_millis(500)));
    }

    #[test]
    fn batch_mode_ignores_the_ceiling() {
        let list = stub_candidates(2);
        let dialed = RefCell::new(0usize);
        let result = run_attempts(RunMode::Batch, &list, |_| {
            let mut n = dialed.borrow_mut();
            *n += 1;
            if *n == 1 {
                sleep(INTERACTIVE_CEILING + Duration::from_millis(100));
                Err("stalled".to_string())
            } else {
                Ok(*n)
            }
        });
        assert_eq!(result, Some(2));
    }

    #[test]
    fn memo_caches_success_without_redialing() {
        let memo: Memo<i32> = Memo::new();
        let calls = RefCell::new(0usize);
        let first = memo.get_or_init_with(|| {
            *calls.borrow_mut() += 1;
            Some(7)
        });
        let second = memo.get_or_init_with(|| {
            *calls.borrow_mut() += 1;
            Some(99)
        });
        assert_eq!(first, Some(7));
        assert_eq!(second, Some(7));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn memo_never_caches_failure() {
        let memo: Memo<i32> = Memo::new();
        let calls = RefCell::new(0usize);
        assert_eq!(
            memo.get_or_init_with(|| {
                *calls.borrow_mut() += 1;
                None
            }),
            None
        );
        assert_eq!(
            memo.get_or_init_with(|| {
                *calls.borrow_mut() += 1;
                Some(5)
            }),
            Some(5)
        );
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn memo_reset_clears_the_cached_handle() {
        let memo: Memo<i32> = Memo::new();
        assert_eq!(memo.get_or_init_with(|| Some(1)), Some(1));
        memo.reset();
        assert_eq!(memo.get_or_init_with(|| Some(2)), Some(2));
    }

    #[test]
    fn production_config_has_no_localhost_candidate() {
        let mut cfg = Config::for_tests(std::path::Path::new("/tmp"));
        cfg.production = true;
        let list = candidates(&cfg, RunMode::Interactive);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].label, "primary");

        cfg.production = false;
        let list = candidates(&cfg, RunMode::Interactive);
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].label, "localhost");
        assert_eq!(list[1].connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn batch_candidates_use_longer_timeouts() {
        let cfg = Config::for_tests(std::path::Path::new("/tmp"));
        let list = candidates(&cfg, RunMode::Batch);
        assert_eq!(list[0].connect_timeout, Duration::from_secs(15));
        assert_eq!(list[1].connect_timeout, Duration::from_secs(3));
    }
}
