//! Requested photo dimensions
//!
//! Photos are requested at display size times the device pixel ratio, with
//! the ratio capped so high-density screens don't pull oversized payloads.

/// Highest pixel ratio a request is ever scaled by
pub const MAX_PIXEL_RATIO: f64 = 3.0;

/// Ratio assumed when the host reports none (or nonsense)
pub const DEFAULT_PIXEL_RATIO: f64 = 2.0;

/// Viewports at or below this width use the mobile duo card
pub const MOBILE_BREAKPOINT: u32 = 768;

/// Edge of the square leaderboard avatar, in CSS pixels
pub const AVATAR_EDGE: u32 = 48;

/// Pixel dimensions sent as `photoWidth`/`photoHeight`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhotoSize {
    pub width: u32,
    pub height: u32,
}

impl PhotoSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale a display size by the effective pixel ratio, rounding up
    pub fn for_display(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        let ratio = effective_pixel_ratio(device_pixel_ratio);
        Self {
            width: (width as f64 * ratio).ceil() as u32,
            height: (height as f64 * ratio).ceil() as u32,
        }
    }
}

/// Clamp a reported pixel ratio into `[1, MAX_PIXEL_RATIO]`
pub fn effective_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
        return DEFAULT_PIXEL_RATIO;
    }
    device_pixel_ratio.clamp(1.0, MAX_PIXEL_RATIO)
}

/// Where a photo is going to be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTarget {
    /// Square avatar in a leaderboard row
    LeaderboardAvatar,
    /// One of the two cards on the duel screen
    DuoCard { viewport_width: u32 },
}

impl DisplayTarget {
    /// Size in CSS pixels
    pub fn display_size(&self) -> (u32, u32) {
        match self {
            DisplayTarget::LeaderboardAvatar => (AVATAR_EDGE, AVATAR_EDGE),
            DisplayTarget::DuoCard { viewport_width } if *viewport_width <= MOBILE_BREAKPOINT => {
                (400, 400)
            }
            DisplayTarget::DuoCard { .. } => (350, 400),
        }
    }

    pub fn photo_size(&self, device_pixel_ratio: f64) -> PhotoSize {
        let (width, height) = self.display_size();
        PhotoSize::for_display(width, height, device_pixel_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_is_capped() {
        let size = DisplayTarget::LeaderboardAvatar.photo_size(4.0);
        assert_eq!(size, PhotoSize::new(144, 144));
    }

    #[test]
    fn test_fractional_ratio_rounds_up() {
        assert_eq!(PhotoSize::for_display(48, 48, 1.5), PhotoSize::new(72, 72));
        assert_eq!(PhotoSize::for_display(35, 35, 1.1), PhotoSize::new(39, 39));
    }

    #[test]
    fn test_invalid_ratio_uses_default() {
        assert_eq!(effective_pixel_ratio(f64::NAN), DEFAULT_PIXEL_RATIO);
        assert_eq!(effective_pixel_ratio(0.0), DEFAULT_PIXEL_RATIO);
        assert_eq!(effective_pixel_ratio(0.5), 1.0);
    }

    #[test]
    fn test_duo_card_breakpoint() {
        let mobile = DisplayTarget::DuoCard { viewport_width: 768 };
        let desktop = DisplayTarget::DuoCard { viewport_width: 1024 };
        assert_eq!(mobile.photo_size(2.0), PhotoSize::new(800, 800));
        assert_eq!(desktop.photo_size(2.0), PhotoSize::new(700, 800));
    }
}
