//! UI session state shared between the simulation and the HUD.
//!
//! The simulation only ever talks to the UI through [`UiSink`]; the HUD reads
//! [`UiSession`] back each frame.

use crate::zones::ZoneId;

/// Setter surface the simulation writes to. Calls are fire-and-forget.
pub trait UiSink {
    fn set_loading(&mut self, loading: bool);
    fn set_active_zone(&mut self, zone: Option<ZoneId>);
    fn set_car_speed(&mut self, speed: f32);
}

/// Seconds the intro loading screen stays up.
pub const LOADING_WARMUP_SECS: f32 = 2.0;

/// Speed units shown per unit of horizontal speed.
const SPEED_DISPLAY_SCALE: f32 = 8.0;

/// User-agent tokens that mark a handheld browser.
const MOBILE_AGENT_TOKENS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Whether a viewport should get the touch layout.
pub fn is_mobile_viewport(width: f32, has_touch: bool, user_agent: &str) -> bool {
    let agent = user_agent.to_ascii_lowercase();
    width < 768.0
        || (has_touch && width < 1024.0)
        || MOBILE_AGENT_TOKENS.iter().any(|token| agent.contains(token))
}

/// Everything the HUD and panels render from.
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct UiSession {
    loading: bool,
    loading_progress: f32,
    loading_elapsed: f32,
    show_instructions: bool,
    active_zone: Option<ZoneId>,
    dismissed_zone: Option<ZoneId>,
    muted: bool,
    is_mobile: bool,
    car_speed: f32,
}

impl Default for UiSession {
    fn default() -> Self {
        Self {
            loading: true,
            loading_progress: 0.0,
            loading_elapsed: 0.0,
            show_instructions: true,
            active_zone: None,
            dismissed_zone: None,
            muted: true,
            is_mobile: false,
            car_speed: 0.0,
        }
    }
}

impl UiSession {
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Percentage in `[0, 100]`.
    pub fn loading_progress(&self) -> f32 {
        self.loading_progress
    }

    pub fn show_instructions(&self) -> bool {
        self.show_instructions
    }

    /// The zone whose panel is open. `None` while the user has dismissed it.
    pub fn active_zone(&self) -> Option<ZoneId> {
        self.active_zone
    }

    pub fn dismissed_zone(&self) -> Option<ZoneId> {
        self.dismissed_zone
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn is_mobile(&self) -> bool {
        self.is_mobile
    }

    pub fn car_speed(&self) -> f32 {
        self.car_speed
    }

    /// Speed gauge reading.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn speed_display(&self) -> u32 {
        (self.car_speed.max(0.0) * SPEED_DISPLAY_SCALE).round() as u32
    }

    /// HUD is hidden behind the loading screen and the instructions.
    pub fn hud_visible(&self) -> bool {
        !self.loading && !self.show_instructions
    }

    /// Raise the loading progress. Progress never moves backward.
    pub fn set_loading_progress(&mut self, progress: f32) {
        if progress.is_finite() {
            self.loading_progress = self.loading_progress.max(progress.clamp(0.0, 100.0));
        }
    }

    /// Advance the intro warm-up. Clears the loading flag once progress hits
    /// 100.
    pub fn tick_loading(&mut self, dt: f32) {
        if !self.loading || !dt.is_finite() {
            return;
        }
        self.loading_elapsed += dt.max(0.0);
        self.set_loading_progress(self.loading_elapsed / LOADING_WARMUP_SECS * 100.0);
        if self.loading_progress >= 100.0 {
            tracing::info!("Loading finished");
            self.set_loading(false);
        }
    }

    /// Skip the loading screen entirely.
    pub fn finish_loading(&mut self) {
        self.loading_progress = 100.0;
        self.set_loading(false);
    }

    pub fn set_show_instructions(&mut self, show: bool) {
        self.show_instructions = show;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn set_is_mobile(&mut self, mobile: bool) {
        self.is_mobile = mobile;
    }

    /// Close the open panel. It stays closed until the vehicle leaves the zone.
    pub fn dismiss_panel(&mut self) {
        if let Some(zone) = self.active_zone.take() {
            self.dismissed_zone = Some(zone);
        }
    }
}

impl UiSink for UiSession {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_active_zone(&mut self, zone: Option<ZoneId>) {
        match zone {
            None => {
                self.active_zone = None;
                self.dismissed_zone = None;
            }
            Some(zone) if self.dismissed_zone == Some(zone) => {}
            Some(zone) => {
                self.dismissed_zone = None;
                self.active_zone = Some(zone);
            }
        }
    }

    fn set_car_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.car_speed = speed;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every setter call in order.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingUi {
        pub loading: Vec<bool>,
        pub zones: Vec<Option<ZoneId>>,
        pub speeds: Vec<f32>,
    }

    impl UiSink for RecordingUi {
        fn set_loading(&mut self, loading: bool) {
            self.loading.push(loading);
        }

        fn set_active_zone(&mut self, zone: Option<ZoneId>) {
            self.zones.push(zone);
        }

        fn set_car_speed(&mut self, speed: f32) {
            self.speeds.push(speed);
        }
    }

    #[test]
    fn test_defaults() {
        let ui = UiSession::default();
        assert!(ui.loading());
        assert!(ui.loading_progress().abs() < f32::EPSILON);
        assert!(ui.show_instructions());
        assert_eq!(ui.active_zone(), None);
        assert!(ui.muted());
        assert!(!ui.is_mobile());
        assert_eq!(ui.speed_display(), 0);
        assert!(!ui.hud_visible());
    }

    #[test]
    fn test_speed_display() {
        let mut ui = UiSession::default();
        ui.set_car_speed(7.0);
        assert_eq!(ui.speed_display(), 56);
        ui.set_car_speed(1.06);
        assert_eq!(ui.speed_display(), 8);
        ui.set_car_speed(f32::NAN);
        assert_eq!(ui.speed_display(), 8);
    }

    #[test]
    fn test_loading_warmup() {
        let mut ui = UiSession::default();
        let mut last = 0.0;
        for _ in 0..60 {
            ui.tick_loading(1.0 / 60.0);
            assert!(ui.loading_progress() >= last);
            last = ui.loading_progress();
        }
        assert!(ui.loading());
        assert!((ui.loading_progress() - 50.0).abs() < 0.1);

        for _ in 0..61 {
            ui.tick_loading(1.0 / 60.0);
        }
        assert!(!ui.loading());
        assert!((ui.loading_progress() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_progress_never_goes_backward() {
        let mut ui = UiSession::default();
        ui.set_loading_progress(40.0);
        ui.set_loading_progress(10.0);
        assert!((ui.loading_progress() - 40.0).abs() < f32::EPSILON);
        ui.set_loading_progress(400.0);
        assert!((ui.loading_progress() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_hud_visibility() {
        let mut ui = UiSession::default();
        ui.finish_loading();
        assert!(!ui.hud_visible());
        ui.set_show_instructions(false);
        assert!(ui.hud_visible());
    }

    #[test]
    fn test_toggle_mute() {
        let mut ui = UiSession::default();
        ui.toggle_mute();
        assert!(!ui.muted());
        ui.toggle_mute();
        assert!(ui.muted());
    }

    #[test]
    fn test_dismissed_panel_stays_closed_until_exit() {
        let mut ui = UiSession::default();
        ui.set_active_zone(Some(ZoneId::Skills));
        ui.dismiss_panel();
        assert_eq!(ui.active_zone(), None);
        assert_eq!(ui.dismissed_zone(), Some(ZoneId::Skills));

        // Re-reporting the same zone does not reopen it.
        ui.set_active_zone(Some(ZoneId::Skills));
        assert_eq!(ui.active_zone(), None);

        // Leaving clears the dismissal; coming back reopens.
        ui.set_active_zone(None);
        ui.set_active_zone(Some(ZoneId::Skills));
        assert_eq!(ui.active_zone(), Some(ZoneId::Skills));
    }

    #[test]
    fn test_switching_zones_clears_dismissal() {
        let mut ui = UiSession::default();
        ui.set_active_zone(Some(ZoneId::About));
        ui.dismiss_panel();
        ui.set_active_zone(Some(ZoneId::Contact));
        assert_eq!(ui.active_zone(), Some(ZoneId::Contact));
        assert_eq!(ui.dismissed_zone(), None);
    }

    #[test]
    fn test_mobile_detection() {
        assert!(is_mobile_viewport(500.0, false, ""));
        assert!(is_mobile_viewport(900.0, true, ""));
        assert!(!is_mobile_viewport(900.0, false, ""));
        assert!(!is_mobile_viewport(1280.0, true, ""));
        assert!(is_mobile_viewport(
            1280.0,
            false,
            "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)"
        ));
        assert!(!is_mobile_viewport(
            1920.0,
            false,
            "Mozilla/5.0 (X11; Linux x86_64)"
        ));
    }
}
