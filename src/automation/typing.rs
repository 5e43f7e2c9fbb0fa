//! Human-like typing into framework-controlled form fields.
//!
//! Bank portals built on reactive frameworks keep field state independently
//! of the raw DOM value; writing `.value` alone is invisible to them and gets
//! overwritten on the next render. The injector writes each keystroke through
//! the framework-bypass setter and dispatches the events a real keystroke
//! would, with a randomized inter-key delay so timing-based bot detection
//! does not see fixed-interval insertion.

use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tracing::debug;

use crate::page::{ElementHandle, Page, SyntheticEvent};

/// Inter-keystroke delay band. The band is sampled uniformly (inclusive)
/// per keystroke; the RNG is supplied by the caller so tests can be
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    min: Duration,
    max: Duration,
}

impl DelayPolicy {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Faster band for credential entry, which draws less scrutiny than
    /// other fields.
    pub fn credentials() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(200))
    }

    /// Zero delay, for tests.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let span_ms = (self.max - self.min).as_millis() as u64;
        self.min + Duration::from_millis(rng.gen_range(0..=span_ms))
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(50), Duration::from_millis(200))
    }
}

/// Type `text` into `field` keystroke by keystroke.
///
/// Completes only after every character is committed and the trailing `blur`
/// has been dispatched. The caller is responsible for resolving the field
/// first; typing into a missing field is the caller's soft-failure to skip.
pub async fn simulate_typing(
    page: &dyn Page,
    field: ElementHandle,
    text: &str,
    delays: &DelayPolicy,
) -> Result<()> {
    let mut rng = StdRng::from_entropy();
    simulate_typing_with_rng(page, field, text, delays, &mut rng).await
}

/// [`simulate_typing`] with a caller-supplied RNG for the keystroke jitter.
pub async fn simulate_typing_with_rng(
    page: &dyn Page,
    field: ElementHandle,
    text: &str,
    delays: &DelayPolicy,
    rng: &mut (impl Rng + Send),
) -> Result<()> {
    debug!(chars = text.chars().count(), "Simulating keystrokes");

    page.focus(field).await?;

    // Clear through the bypass setter and let the framework resync to empty.
    page.set_value(field, "").await?;
    page.dispatch(field, SyntheticEvent::Input).await?;
    page.dispatch(field, SyntheticEvent::Change).await?;

    // Human pause after focusing a field, before the first keystroke.
    sleep(delays.min()).await;

    for ch in text.chars() {
        // Full replacement, not append-only DOM mutation: re-read the current
        // value so controlled-input reconciliation between keystrokes is
        // respected.
        let mut value = page.value(field).await?;
        value.push(ch);
        page.set_value(field, &value).await?;

        page.dispatch(field, SyntheticEvent::BeforeInput { data: ch })
            .await?;
        page.dispatch(field, SyntheticEvent::Input).await?;
        page.dispatch(field, SyntheticEvent::Change).await?;

        sleep(delays.sample(rng)).await;
    }

    // Commit the value the way a user would on tab-out.
    page.dispatch(field, SyntheticEvent::Blur).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::{Action, FakePage};

    #[tokio::test(start_paused = true)]
    async fn typed_value_reaches_dom_and_controlled_state() {
        let page = FakePage::new();
        let field = page.add_input("#user");

        simulate_typing(&page, field, "jdoe42", &DelayPolicy::none())
            .await
            .unwrap();

        assert_eq!(page.value_of(field), "jdoe42");
        // The mirror only syncs on input events, so this proves the
        // bypass-write + dispatch pairing works end to end.
        assert_eq!(page.mirror_of(field), "jdoe42");
    }

    #[tokio::test(start_paused = true)]
    async fn clears_field_before_typing() {
        let page = FakePage::new();
        let field = page.add_input("#user");
        page.set_value(field, "stale").await.unwrap();

        simulate_typing(&page, field, "ab", &DelayPolicy::none())
            .await
            .unwrap();

        let actions = page.actions();
        // First recorded typing action after the seed write is focus, then
        // the clearing write with its resync events.
        assert_eq!(actions[1], Action::Focus(field));
        assert_eq!(actions[2], Action::SetValue(field, String::new()));
        assert_eq!(actions[3], Action::Event(field, SyntheticEvent::Input));
        assert_eq!(actions[4], Action::Event(field, SyntheticEvent::Change));
    }

    #[tokio::test(start_paused = true)]
    async fn per_character_event_order_and_single_blur() {
        let page = FakePage::new();
        let field = page.add_input("#user");

        simulate_typing(&page, field, "xy", &DelayPolicy::none())
            .await
            .unwrap();

        let events = page.events_for(field);
        assert_eq!(
            events,
            vec![
                // clear
                SyntheticEvent::Input,
                SyntheticEvent::Change,
                // 'x'
                SyntheticEvent::BeforeInput { data: 'x' },
                SyntheticEvent::Input,
                SyntheticEvent::Change,
                // 'y'
                SyntheticEvent::BeforeInput { data: 'y' },
                SyntheticEvent::Input,
                SyntheticEvent::Change,
                SyntheticEvent::Blur,
            ]
        );
        let blurs = events
            .iter()
            .filter(|e| **e == SyntheticEvent::Blur)
            .count();
        assert_eq!(blurs, 1);
    }

    #[test]
    fn sampled_delays_stay_within_band() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let policy = DelayPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let d = policy.sample(&mut rng);
            assert!(d >= Duration::from_millis(50));
            assert!(d <= Duration::from_millis(200));
        }
    }

    #[test]
    fn degenerate_band_returns_min() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let policy = DelayPolicy::new(Duration::from_millis(30), Duration::from_millis(30));
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(policy.sample(&mut rng), Duration::from_millis(30));
    }
}
