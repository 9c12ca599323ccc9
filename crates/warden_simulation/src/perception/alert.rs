//! Alert Channel: rate-limited ally calls raised by sighting agents.
//!
//! Доставка идёт через Noise Bus (`NoiseCategory::AllyCall`), приёмник
//! обрабатывает её так же, как высокоприоритетный шум.

use bevy::prelude::*;

#[derive(Component, Debug, Clone, Default)]
pub struct AllyAlerter {
    last_alert_at: Option<f32>,
    pub alerts_sent: u32,
}

impl AllyAlerter {
    pub fn is_ready(&self, now: f32, cooldown: f32) -> bool {
        self.last_alert_at.map_or(true, |last| now - last >= cooldown)
    }

    /// Consumes the cooldown; `false` while still cooling down.
    pub fn try_alert(&mut self, now: f32, cooldown: f32) -> bool {
        if !self.is_ready(now, cooldown) {
            return false;
        }
        self.last_alert_at = Some(now);
        self.alerts_sent += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_alert_per_cooldown_window() {
        let mut alerter = AllyAlerter::default();
        let cooldown = 1.5;

        // Попытки каждые 0.1s в течение 3s
        let sent = (0..30)
            .filter(|step| alerter.try_alert(*step as f32 * 0.1, cooldown))
            .count();

        assert_eq!(sent, 2);
        assert_eq!(alerter.alerts_sent, 2);
    }

    #[test]
    fn test_first_alert_always_allowed() {
        let mut alerter = AllyAlerter::default();
        assert!(alerter.is_ready(0.0, 100.0));
        assert!(alerter.try_alert(0.0, 100.0));
        assert!(!alerter.try_alert(99.0, 100.0));
        assert!(alerter.try_alert(100.0, 100.0));
    }
}
