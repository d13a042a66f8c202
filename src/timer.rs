use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::Exercise;

lazy_static! {
    // "45 segundos", "30segundos", "20 seconds" — digits, optional
    // whitespace, the unit word, optional plural, any case.
    static ref DURATION_RE: Regex = Regex::new(r"(?i)(\d+)\s*(?:segundos?|seconds?)").unwrap();
}

/// Extracts a countdown length from free-text duration. Rep-based text
/// ("3 series de 10 repeticiones") yields None: the exercise is shown as
/// static text with no timer controls.
pub fn parse_duration_seconds(duration: &str) -> Option<u32> {
    DURATION_RE
        .captures(duration)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
}

/// Countdown state for one exercise instance.
///
/// `remaining_seconds` stays within [0, total_seconds], so the derived
/// progress never leaves [0, 100]. Completion is terminal until `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseTimer {
    total_seconds: u32,
    remaining_seconds: u32,
    running: bool,
    completed: bool,
}

impl ExerciseTimer {
    pub fn new(total_seconds: u32) -> Self {
        ExerciseTimer {
            total_seconds,
            remaining_seconds: total_seconds,
            running: false,
            completed: false,
        }
    }

    /// None when the duration text has no parseable countdown.
    pub fn from_exercise(exercise: &Exercise) -> Option<Self> {
        parse_duration_seconds(&exercise.duration).map(Self::new)
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Start/pause flip, ignored once the countdown has completed.
    pub fn toggle(&mut self) {
        if self.completed {
            return;
        }
        self.running = !self.running;
    }

    /// One second elapsed. No-op unless running; reaching zero completes
    /// the countdown and stops the clock.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        if self.remaining_seconds == 0 && !self.completed {
            self.completed = true;
            self.running = false;
        }
    }

    /// Back to the freshly constructed state.
    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.running = false;
        self.completed = false;
        self.remaining_seconds = self.total_seconds;
    }

    pub fn progress_percent(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.total_seconds - self.remaining_seconds) as f64 / self.total_seconds as f64 * 100.0
    }
}

/// Once-per-second pulse driving a running countdown. The producing task
/// is aborted on drop so a discarded card leaves no periodic work behind.
pub struct Ticker {
    rx: mpsc::Receiver<()>,
    task: JoinHandle<()>,
}

impl Ticker {
    pub fn every_second() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval fires immediately; swallow that so the first
            // delivered tick comes one full period after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Ticker { rx, task }
    }

    pub async fn tick(&mut self) {
        // the producer only stops when this half is dropped
        let _ = self.rx.recv().await;
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Exercise;
    use proptest::prelude::*;

    fn countdown_exercise(duration: &str) -> Exercise {
        Exercise {
            name: "Marcha en el sitio".to_string(),
            duration: duration.to_string(),
            description: "Espalda recta".to_string(),
        }
    }

    #[test]
    fn parses_spanish_seconds() {
        assert_eq!(parse_duration_seconds("45 segundos"), Some(45));
        assert_eq!(parse_duration_seconds("1 segundo"), Some(1));
        assert_eq!(parse_duration_seconds("30segundos"), Some(30));
        assert_eq!(parse_duration_seconds("30 SEGUNDOS"), Some(30));
    }

    #[test]
    fn parses_english_seconds() {
        assert_eq!(parse_duration_seconds("20 seconds"), Some(20));
        assert_eq!(parse_duration_seconds("1 second"), Some(1));
    }

    #[test]
    fn rep_based_durations_do_not_parse() {
        assert_eq!(parse_duration_seconds("3 series de 10 repeticiones"), None);
        assert_eq!(parse_duration_seconds("3 sets of 10 reps"), None);
        assert_eq!(parse_duration_seconds("segundos"), None);
        assert_eq!(parse_duration_seconds(""), None);
    }

    #[test]
    fn timer_initializes_stopped_at_full_duration() {
        let timer = ExerciseTimer::from_exercise(&countdown_exercise("45 segundos"))
            .expect("countdown duration should build a timer");
        assert_eq!(timer.total_seconds(), 45);
        assert_eq!(timer.remaining_seconds(), 45);
        assert!(!timer.is_running());
        assert!(!timer.is_completed());
        assert_eq!(timer.progress_percent(), 0.0);
    }

    #[test]
    fn rep_based_exercise_has_no_timer() {
        let exercise = countdown_exercise("3 series de 10 repeticiones");
        assert!(ExerciseTimer::from_exercise(&exercise).is_none());
    }

    #[test]
    fn tick_is_ignored_while_paused() {
        let mut timer = ExerciseTimer::new(10);
        timer.tick();
        assert_eq!(timer.remaining_seconds(), 10);

        timer.toggle();
        timer.tick();
        timer.toggle(); // pause
        timer.tick();
        assert_eq!(timer.remaining_seconds(), 9);
    }

    #[test]
    fn running_out_completes_and_stops() {
        let mut timer = ExerciseTimer::new(3);
        timer.toggle();
        for _ in 0..3 {
            timer.tick();
        }
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(timer.is_completed());
        assert!(!timer.is_running());
        assert_eq!(timer.progress_percent(), 100.0);

        // further ticks change nothing
        timer.tick();
        assert_eq!(timer.remaining_seconds(), 0);
    }

    #[test]
    fn toggle_is_ignored_once_completed() {
        let mut timer = ExerciseTimer::new(1);
        timer.toggle();
        timer.tick();
        assert!(timer.is_completed());

        timer.toggle();
        assert!(!timer.is_running());
        assert!(timer.is_completed());
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut timer = ExerciseTimer::new(5);
        timer.toggle();
        for _ in 0..5 {
            timer.tick();
        }
        assert!(timer.is_completed());

        timer.reset();
        assert_eq!(timer, ExerciseTimer::new(5));
    }

    #[test]
    fn zero_second_timer_reports_zero_progress() {
        let timer = ExerciseTimer::new(0);
        assert_eq!(timer.progress_percent(), 0.0);
    }

    proptest! {
        #[test]
        fn partial_ticking_counts_down_without_completing(
            total in 2u32..600,
            fraction in 1u32..100,
        ) {
            let ticks = (total - 1).min(fraction);
            let mut timer = ExerciseTimer::new(total);
            timer.toggle();
            for _ in 0..ticks {
                timer.tick();
            }
            prop_assert_eq!(timer.remaining_seconds(), total - ticks);
            prop_assert!(!timer.is_completed());
            prop_assert!(timer.is_running());
            let progress = timer.progress_percent();
            prop_assert!((0.0..=100.0).contains(&progress));
        }

        #[test]
        fn reset_after_any_run_is_pristine(total in 1u32..600, ticks in 0u32..700) {
            let mut timer = ExerciseTimer::new(total);
            timer.toggle();
            for _ in 0..ticks {
                timer.tick();
            }
            timer.reset();
            prop_assert_eq!(timer, ExerciseTimer::new(total));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_delivers_one_pulse_per_period() {
        let mut ticker = Ticker::with_period(Duration::from_secs(1));
        for _ in 0..3 {
            ticker.tick().await;
        }
        // reaching here means three pulses arrived under paused time;
        // dropping the ticker aborts the producing task
    }
}
