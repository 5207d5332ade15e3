//! Flat-probability gift draw
//!
//! One uniform sample is compared against the running sum of each gift's
//! absolute drop rate. A session allows a single draw: the result is fixed
//! the moment the draw starts, and only its disclosure waits for the reveal
//! animation.

use crate::catalog::{GiftCatalog, GiftCatalogEntry};
use crate::rng::RandomSource;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Pick the gift for a fixed sample in `[0, 1)`.
///
/// Returns the first entry whose cumulative rate reaches `sample`, or the
/// catalog's fallback entry when the sample lies past the total mass.
pub fn draw_gift_with_sample(catalog: &GiftCatalog, sample: f64) -> &GiftCatalogEntry {
    let mut cumulative = 0.0;
    for gift in catalog.entries() {
        cumulative += gift.drop_rate;
        if sample <= cumulative {
            return gift;
        }
    }
    catalog.fallback()
}

/// Draw one gift using `rng`. Consumes exactly one sample.
pub fn draw_gift<'a>(catalog: &'a GiftCatalog, rng: &mut dyn RandomSource) -> &'a GiftCatalogEntry {
    let sample = rng.next_f64();
    let gift = draw_gift_with_sample(catalog, sample);
    debug!(sample, gift = gift.id, "drew gift");
    gift
}

/// Timing of the reveal animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSchedule {
    pub duration: Duration,
    pub tick: Duration,
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(2000),
            tick: Duration::from_millis(100),
        }
    }
}

impl RevealSchedule {
    /// A schedule that reveals immediately
    pub fn instant() -> Self {
        Self {
            duration: Duration::ZERO,
            tick: Duration::ZERO,
        }
    }

    /// Number of animation frames
    pub fn ticks(&self) -> u32 {
        if self.tick.is_zero() {
            return 0;
        }
        let ticks = self.duration.as_nanos().div_ceil(self.tick.as_nanos());
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
}

/// Cancels a running [`Reveal`] from elsewhere (e.g. when navigating away)
#[derive(Debug, Clone)]
pub struct RevealCancel(Arc<AtomicBool>);

impl RevealCancel {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pending disclosure of an already-decided draw
#[derive(Debug)]
pub struct Reveal {
    schedule: RevealSchedule,
    cancelled: Arc<AtomicBool>,
}

impl Reveal {
    fn new(schedule: RevealSchedule) -> Self {
        Self {
            schedule,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn schedule(&self) -> RevealSchedule {
        self.schedule
    }

    pub fn cancel_handle(&self) -> RevealCancel {
        RevealCancel(Arc::clone(&self.cancelled))
    }

    /// Wait out the schedule, calling `on_tick` with the frame index after
    /// every tick. Stops early once cancelled.
    pub fn run(&self, mut on_tick: impl FnMut(u32)) -> RevealOutcome {
        for frame in 0..self.schedule.ticks() {
            if self.cancelled.load(Ordering::SeqCst) {
                return RevealOutcome::Cancelled;
            }
            std::thread::sleep(self.schedule.tick);
            on_tick(frame);
        }
        if self.cancelled.load(Ordering::SeqCst) {
            RevealOutcome::Cancelled
        } else {
            RevealOutcome::Completed
        }
    }
}

/// Observable state of a [`DrawSession`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawSnapshot {
    #[serde(rename = "isDrawing")]
    pub is_drawing: bool,
    #[serde(rename = "hasDrawn")]
    pub has_drawn: bool,
    pub claimed: bool,
    #[serde(rename = "currentGift")]
    pub current_gift: Option<GiftCatalogEntry>,
}

/// One gift draw per session.
///
/// `begin_draw` fixes the result and starts the reveal; `finish_reveal` (or
/// `complete`) commits it. Repeated calls while drawing or after a commit are
/// no-ops and never consume randomness.
#[derive(Debug, Default)]
pub struct DrawSession {
    schedule: RevealSchedule,
    is_drawing: bool,
    has_drawn: bool,
    claimed: bool,
    pending: Option<GiftCatalogEntry>,
    current_gift: Option<GiftCatalogEntry>,
}

impl DrawSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(schedule: RevealSchedule) -> Self {
        Self {
            schedule,
            ..Self::default()
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn has_drawn(&self) -> bool {
        self.has_drawn
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// The committed gift, `None` until the reveal finishes
    pub fn current_gift(&self) -> Option<&GiftCatalogEntry> {
        self.current_gift.as_ref()
    }

    pub fn snapshot(&self) -> DrawSnapshot {
        DrawSnapshot {
            is_drawing: self.is_drawing,
            has_drawn: self.has_drawn,
            claimed: self.claimed,
            current_gift: self.current_gift.clone(),
        }
    }

    /// Start the draw. The gift is decided now; the returned [`Reveal`]
    /// only paces its disclosure. `None` when a draw is running or done.
    pub fn begin_draw(
        &mut self,
        catalog: &GiftCatalog,
        rng: &mut dyn RandomSource,
    ) -> Option<Reveal> {
        if self.is_drawing || self.has_drawn {
            return None;
        }
        self.pending = Some(draw_gift(catalog, rng).clone());
        self.is_drawing = true;
        Some(Reveal::new(self.schedule))
    }

    /// Commit the pending gift after a full reveal
    pub fn finish_reveal(&mut self) -> Option<&GiftCatalogEntry> {
        if !self.is_drawing {
            return None;
        }
        self.commit();
        self.current_gift.as_ref()
    }

    /// Commit the pending gift without disclosing it; the session stays locked
    pub fn cancel_reveal(&mut self) {
        if self.is_drawing {
            self.commit();
        }
    }

    /// Commit according to how the reveal ended. Returns the gift to disclose,
    /// or `None` if the reveal was cancelled.
    pub fn complete(&mut self, outcome: RevealOutcome) -> Option<&GiftCatalogEntry> {
        match outcome {
            RevealOutcome::Completed => self.finish_reveal(),
            RevealOutcome::Cancelled => {
                self.cancel_reveal();
                None
            }
        }
    }

    /// Draw and commit in one step, skipping the animation
    pub fn draw_now(
        &mut self,
        catalog: &GiftCatalog,
        rng: &mut dyn RandomSource,
    ) -> Option<&GiftCatalogEntry> {
        self.begin_draw(catalog, rng)?;
        self.finish_reveal()
    }

    /// Mark the committed gift as claimed. Returns `true` only for the call
    /// that actually claimed it.
    pub fn claim(&mut self) -> bool {
        if self.claimed {
            return false;
        }
        let Some(gift) = &self.current_gift else {
            return false;
        };
        info!("Gift {} claimed: {}", gift.id, gift.title);
        self.claimed = true;
        true
    }

    fn commit(&mut self) {
        self.current_gift = self.pending.take();
        self.is_drawing = false;
        self.has_drawn = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, GiftRarity};
    use crate::rng::{RngSource, SequenceRandom};

    fn gift(id: u32, rate: f64) -> GiftCatalogEntry {
        GiftCatalogEntry {
            id,
            icon: String::new(),
            title: format!("gift {}", id),
            description: String::new(),
            image: String::new(),
            drop_rate: rate,
            rarity: GiftRarity::Common,
        }
    }

    fn catalog(rates: &[f64]) -> GiftCatalog {
        GiftCatalog::new(
            rates
                .iter()
                .enumerate()
                .map(|(i, r)| gift(i as u32 + 1, *r))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_sample_returns_first() {
        let gifts = GiftCatalog::embedded();
        assert_eq!(draw_gift_with_sample(&gifts, 0.0).id, 1);
    }

    #[test]
    fn test_cumulative_thresholds() {
        let gifts = catalog(&[0.25, 0.25, 0.5]);
        assert_eq!(draw_gift_with_sample(&gifts, 0.25).id, 1);
        assert_eq!(draw_gift_with_sample(&gifts, 0.2501).id, 2);
        assert_eq!(draw_gift_with_sample(&gifts, 0.5).id, 2);
        assert_eq!(draw_gift_with_sample(&gifts, 0.75).id, 3);
        assert_eq!(draw_gift_with_sample(&gifts, 0.999_999).id, 3);
    }

    #[test]
    fn test_just_below_total_returns_last_reachable() {
        let gifts = GiftCatalog::embedded();
        let total = gifts.total_rate();
        assert_eq!(draw_gift_with_sample(&gifts, total - 1e-9).id, 5);
    }

    #[test]
    fn test_default_catalog_tiers() {
        let gifts = GiftCatalog::embedded();
        assert_eq!(draw_gift_with_sample(&gifts, 0.3).id, 2);
        assert_eq!(draw_gift_with_sample(&gifts, 0.5005).id, 3);
        assert_eq!(draw_gift_with_sample(&gifts, 0.505).id, 4);
    }

    #[test]
    fn test_sample_past_total_mass_uses_fallback() {
        let gifts = GiftCatalog::embedded();
        assert_eq!(draw_gift_with_sample(&gifts, 0.9).id, gifts.fallback().id);
        let sparse = catalog(&[0.0, 0.1]);
        assert_eq!(draw_gift_with_sample(&sparse, 0.5).id, 1);
    }

    #[test]
    fn test_same_sample_same_gift() {
        let gifts = GiftCatalog::embedded();
        for r in [0.0, 0.1, 0.26, 0.5009, 0.51, 0.7] {
            assert_eq!(
                draw_gift_with_sample(&gifts, r),
                draw_gift_with_sample(&gifts, r)
            );
        }
        let a = draw_gift(&gifts, &mut RngSource::seeded(5)).id;
        let b = draw_gift(&gifts, &mut RngSource::seeded(5)).id;
        assert_eq!(a, b);
    }

    #[test]
    fn test_session_draws_only_once() {
        let gifts = catalog(&[0.5, 0.5]);
        let mut rng = SequenceRandom::new(vec![0.1, 0.9]);
        let mut session = DrawSession::with_schedule(RevealSchedule::instant());

        let first = session.draw_now(&gifts, &mut rng).cloned();
        assert_eq!(first.as_ref().map(|g| g.id), Some(1));
        assert!(session.draw_now(&gifts, &mut rng).is_none());
        assert_eq!(session.current_gift(), first.as_ref());
        assert_eq!(rng.consumed(), 1);
    }

    #[test]
    fn test_begin_while_drawing_is_noop() {
        let gifts = catalog(&[1.0]);
        let mut rng = SequenceRandom::constant(0.2);
        let mut session = DrawSession::new();

        let reveal = session.begin_draw(&gifts, &mut rng);
        assert!(reveal.is_some());
        assert!(session.is_drawing());
        assert!(session.current_gift().is_none());

        assert!(session.begin_draw(&gifts, &mut rng).is_none());
        assert_eq!(rng.consumed(), 1);

        assert_eq!(session.finish_reveal().map(|g| g.id), Some(1));
        assert!(!session.is_drawing());
        assert!(session.has_drawn());
        assert!(session.finish_reveal().is_none());
    }

    #[test]
    fn test_result_fixed_before_reveal() {
        let gifts = catalog(&[0.5, 0.5]);
        let mut rng = SequenceRandom::new(vec![0.9, 0.1, 0.1]);
        let mut session = DrawSession::with_schedule(RevealSchedule {
            duration: Duration::from_millis(3),
            tick: Duration::from_millis(1),
        });

        let reveal = session.begin_draw(&gifts, &mut rng).unwrap();
        let mut frames = 0;
        let outcome = reveal.run(|_| {
            frames += 1;
        });
        assert_eq!(outcome, RevealOutcome::Completed);
        assert_eq!(frames, 3);
        assert_eq!(session.complete(outcome).map(|g| g.id), Some(2));
        assert_eq!(rng.consumed(), 1);
    }

    #[test]
    fn test_cancelled_reveal_keeps_session_locked() {
        let gifts = catalog(&[1.0]);
        let mut rng = SequenceRandom::constant(0.3);
        let mut session = DrawSession::new();

        let reveal = session.begin_draw(&gifts, &mut rng).unwrap();
        reveal.cancel_handle().cancel();
        let outcome = reveal.run(|_| panic!("cancelled reveal must not tick"));
        assert_eq!(outcome, RevealOutcome::Cancelled);
        assert!(session.complete(outcome).is_none());

        assert!(session.has_drawn());
        assert!(!session.is_drawing());
        assert_eq!(session.current_gift().map(|g| g.id), Some(1));
        assert!(session.begin_draw(&gifts, &mut rng).is_none());
    }

    #[test]
    fn test_claim_is_idempotent() {
        let gifts = catalog(&[1.0]);
        let mut session = DrawSession::new();
        assert!(!session.claim(), "claiming before drawing is a no-op");
        assert!(!session.is_claimed());

        session.draw_now(&gifts, &mut SequenceRandom::constant(0.0));
        assert!(session.claim());
        assert!(!session.claim());
        assert!(session.is_claimed());
        assert_eq!(session.current_gift().map(|g| g.id), Some(1));
    }

    #[test]
    fn test_schedule_ticks() {
        assert_eq!(RevealSchedule::default().ticks(), 20);
        assert_eq!(RevealSchedule::instant().ticks(), 0);
        let odd = RevealSchedule {
            duration: Duration::from_millis(250),
            tick: Duration::from_millis(100),
        };
        assert_eq!(odd.ticks(), 3);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let gifts = catalog(&[1.0]);
        let mut session = DrawSession::new();
        session.draw_now(&gifts, &mut SequenceRandom::constant(0.0));
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["hasDrawn"], true);
        assert_eq!(json["isDrawing"], false);
        assert_eq!(json["currentGift"]["dropRate"], 1.0);
    }
}
