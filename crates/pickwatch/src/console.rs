// Line-oriented console presenter.
//
// Turns `DraftEvent`s into printable text and stdin lines into
// `UserCommand`s. Holds no session state of its own.

use std::fmt::Write as _;

use crate::draft::player::Player;
use crate::protocol::{DraftEvent, PickProcessed, UserCommand};
use crate::queue::MoveDirection;
use crate::recommend::RecommendationSet;
use crate::timer::ClockAlert;

pub const HELP: &str = "\
commands:
  panic | p           recommend now
  done                dismiss recommendations
  refresh | r         fetch picks now
  queue <id>          add a player to the pick queue
  unqueue <id>        remove a player from the queue
  up <id> | down <id> move a queued player
  clock [secs]        start the pick clock
  clear               stop the pick clock
  plan                show the draft plan
  target <round> <id> add a plan target
  backup <round> <id> add a plan backup
  unplan <round> <id> drop a player from a round's plan
  regen               rebuild the draft plan
  quit | q            exit";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Parse one input line. `None` for blank or unrecognized input.
pub fn parse_command(line: &str) -> Option<UserCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let arg = words.next();
    let extra = words.next();
    if words.next().is_some() {
        return None;
    }
    if extra.is_some() {
        return parse_plan_edit(&verb, arg, extra);
    }

    match (verb.as_str(), arg) {
        ("panic" | "p", None) => Some(UserCommand::Panic),
        ("done" | "dismiss", None) => Some(UserCommand::DismissPanic),
        ("refresh" | "r", None) => Some(UserCommand::Refresh),
        ("queue", Some(id)) => Some(UserCommand::Enqueue(id.to_string())),
        ("unqueue", Some(id)) => Some(UserCommand::Dequeue(id.to_string())),
        ("up", Some(id)) => Some(UserCommand::Reorder(id.to_string(), MoveDirection::Up)),
        ("down", Some(id)) => Some(UserCommand::Reorder(id.to_string(), MoveDirection::Down)),
        ("clock", None) => Some(UserCommand::StartClock(None)),
        ("clock", Some(secs)) => secs.parse().ok().map(|s| UserCommand::StartClock(Some(s))),
        ("clear", None) => Some(UserCommand::ClearClock),
        ("plan", None) => Some(UserCommand::ShowPlan),
        ("regen", None) => Some(UserCommand::RegeneratePlan),
        ("quit" | "q" | "exit", None) => Some(UserCommand::Quit),
        _ => None,
    }
}

/// `target|backup|unplan <round> <id>`.
fn parse_plan_edit(verb: &str, round: Option<&str>, id: Option<&str>) -> Option<UserCommand> {
    let round: u32 = round?.parse().ok()?;
    let id = id?.to_string();
    match verb {
        "target" => Some(UserCommand::PlanTarget(round, id)),
        "backup" => Some(UserCommand::PlanBackup(round, id)),
        "unplan" => Some(UserCommand::Unplan(round, id)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Render one event. Empty string means nothing worth printing.
pub fn render_event(event: &DraftEvent) -> String {
    match event {
        DraftEvent::PicksProcessed(picks) => picks
            .iter()
            .map(render_pick)
            .collect::<Vec<_>>()
            .join("\n"),
        DraftEvent::TurnChanged {
            is_user_turn,
            estimated,
        } => {
            let suffix = if *estimated { " (estimated)" } else { "" };
            if *is_user_turn {
                format!(">>> YOU ARE ON THE CLOCK{suffix}")
            } else {
                format!("--- turn over{suffix}")
            }
        }
        DraftEvent::ScarcityUpdated(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(pos, snap)| format!("{pos} {} ({})", snap.remaining, snap.level.label()))
                .collect();
            format!("scarcity: {}", parts.join(" | "))
        }
        DraftEvent::TimerTick { remaining_seconds } => {
            // Only print on round numbers; alerts cover the final stretch.
            if *remaining_seconds % 30 == 0 {
                format!("clock: {}", format_clock(*remaining_seconds))
            } else {
                String::new()
            }
        }
        DraftEvent::TimerAlert(alert) => match alert {
            ClockAlert::ThirtySeconds => "clock: 30 seconds left".to_string(),
            ClockAlert::FifteenSeconds => "clock: 15 seconds left".to_string(),
            ClockAlert::FinalSeconds(n) => format!("clock: {n}"),
        },
        DraftEvent::TimerExpired { auto_pick } => match auto_pick {
            Some(p) => format!("!!! time expired, queue suggests {}", player_line(p)),
            None => "!!! time expired, queue is empty".to_string(),
        },
        DraftEvent::RecommendationsReady(set) => render_recommendations(set),
        DraftEvent::PanicDismissed => "recommendations dismissed".to_string(),
        DraftEvent::QueueChanged(players) => {
            if players.is_empty() {
                "queue: (empty)".to_string()
            } else {
                let names: Vec<String> = players
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("{}. {}", i + 1, player_line(p)))
                    .collect();
                format!("queue:\n  {}", names.join("\n  "))
            }
        }
        DraftEvent::PlanUpdated(plan) => {
            if plan.is_empty() {
                return "plan: (empty)".to_string();
            }
            let mut out = String::from("plan:");
            for (round, rp) in plan.rounds() {
                let targets: Vec<&str> = rp.targets.iter().map(|p| p.name.as_str()).collect();
                let backups: Vec<&str> = rp.backups.iter().map(|p| p.name.as_str()).collect();
                let _ = write!(out, "\n  R{round:<2} {}", targets.join(", "));
                if !backups.is_empty() {
                    let _ = write!(out, "  [backup: {}]", backups.join(", "));
                }
            }
            out
        }
        DraftEvent::SyncError { message } => format!("sync error: {message}"),
        DraftEvent::DraftCompleted { total_picks } => {
            format!("draft complete after {total_picks} picks")
        }
    }
}

fn render_pick(processed: &PickProcessed) -> String {
    let pick = &processed.pick;
    let who = match &processed.player {
        Some(p) => player_line(p),
        None => {
            let pos = pick.position.map(|p| p.to_string()).unwrap_or_else(|| "?".into());
            let name = pick.player_name.as_deref().unwrap_or(&pick.player_id);
            format!("{name} ({pos})")
        }
    };
    let mut line = format!("#{:<3} {who}", pick.pick_number);
    let analysis = &processed.analysis;
    if let Some(delta) = analysis.adp_delta {
        let _ = write!(line, "  {} {:+.0}", analysis.verdict.label(), delta);
    }
    if analysis.by_tracked_roster {
        line.push_str("  [yours]");
    }
    if analysis.was_recommended {
        line.push_str("  [recommended]");
    }
    line
}

fn render_recommendations(set: &RecommendationSet) -> String {
    let mut out = format!(
        "=== PANIC: round {}, pick {} ===",
        set.round, set.overall_pick
    );
    if set.using_demo_data {
        out.push_str("\n  (demo data: live player catalog unavailable)");
    }
    if set.roster_estimated {
        out.push_str("\n  (roster needs estimated from round)");
    }
    if set.recommendations.is_empty() {
        out.push_str("\n  no eligible players");
    }
    for (i, rec) in set.recommendations.iter().enumerate() {
        let _ = write!(
            out,
            "\n  {}. {} [{} {}%]\n     {}",
            i + 1,
            player_line(&rec.player),
            rec.strategy.label(),
            rec.confidence,
            rec.reasoning
        );
    }
    out
}

fn player_line(p: &Player) -> String {
    let team = p.team.as_deref().unwrap_or("FA");
    format!("{} {} {} ({})", p.name, p.position, team, p.id)
}

fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
