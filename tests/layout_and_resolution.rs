//! Split layout and resolution validation integration tests.

use rstest::rstest;

use frame_compositor::config::FrameSettings;
use frame_compositor::graphics::geometry::Point;
use frame_compositor::graphics::resolution::{
    is_valid_resolution, validate_resolution, Resolution, ResolutionCorrection,
};
use frame_compositor::graphics::viewport::{resolve_split_request, SplitLayout};

const DISPLAY: (u32, u32) = (1920, 1080);

#[rstest]
#[case(SplitLayout::new(false, false), 0, (0, 0))]
#[case(SplitLayout::new(true, false), 0, (0, 0))]
#[case(SplitLayout::new(true, false), 1, (0, 270))]
#[case(SplitLayout::new(false, true), 0, (0, 0))]
#[case(SplitLayout::new(false, true), 1, (480, 0))]
#[case(SplitLayout::new(true, true), 0, (0, 0))]
#[case(SplitLayout::new(true, true), 1, (480, 0))]
#[case(SplitLayout::new(true, true), 2, (0, 270))]
#[case(SplitLayout::new(true, true), 3, (480, 270))]
fn screen_offsets_follow_quadrants(
    #[case] layout: SplitLayout,
    #[case] screen: usize,
    #[case] expected: (i32, i32),
) {
    assert_eq!(
        layout.screen_offset(screen, 960, 540),
        Point::new(expected.0, expected.1)
    );
}

#[rstest]
#[case((true, false), (false, false), (true, false))]
#[case((true, false), (false, true), (false, true))]
#[case((false, true), (true, false), (true, false))]
#[case((false, true), (true, true), (true, true))]
#[case((true, true), (true, false), (true, true))]
#[case((false, false), (false, true), (false, false))]
fn split_override_applies_to_single_axis_only(
    #[case] requested: (bool, bool),
    #[case] overrides: (bool, bool),
    #[case] expected: (bool, bool),
) {
    let resolved = resolve_split_request(
        SplitLayout::new(requested.0, requested.1),
        overrides.0,
        overrides.1,
    );
    assert_eq!(resolved, SplitLayout::new(expected.0, expected.1));
}

#[rstest]
#[case(Resolution::new(1366, 768, 1), Resolution::new(1360, 768, 1), Some(ResolutionCorrection::Unsupported))]
#[case(Resolution::new(961, 540, 1), Resolution::new(960, 540, 1), Some(ResolutionCorrection::WidthNotDivisible))]
#[case(Resolution::new(1000, 100, 1), Resolution::new(960, 540, 1), Some(ResolutionCorrection::AbnormalAspect))]
#[case(Resolution::new(1920, 1080, 2), Resolution::new(960, 540, 2), Some(ResolutionCorrection::TooLarge))]
#[case(Resolution::new(1280, 720, 1), Resolution::new(1280, 720, 1), None)]
fn startup_resolution_is_corrected(
    #[case] requested: Resolution,
    #[case] expected: Resolution,
    #[case] correction: Option<ResolutionCorrection>,
) {
    assert_eq!(validate_resolution(requested, DISPLAY), (expected, correction));
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
fn denied_resolution_never_offered(#[case] multiplier: u8) {
    assert!(!is_valid_resolution(1366, 768, multiplier, (8000, 8000)));
}

#[rstest]
#[case(800, 600, 1, true)]
#[case(800, 600, 2, false)]
#[case(960, 540, 1, false)]
#[case(1024, 768, 1, true)]
fn offered_resolutions(
    #[case] width: u32,
    #[case] height: u32,
    #[case] multiplier: u8,
    #[case] valid: bool,
) {
    assert_eq!(is_valid_resolution(width, height, multiplier, DISPLAY), valid);
}

#[test]
fn settings_file_drives_split_override() {
    let settings = FrameSettings::from_properties(
        "ResolutionX = 1280\nResolutionY = 720\nVSplitScreen = 1\n",
    )
    .unwrap();
    let resolved = resolve_split_request(
        SplitLayout::new(true, false),
        settings.h_split_override,
        settings.v_split_override,
    );
    assert_eq!(resolved.viewport_size(settings.resolution_x, settings.resolution_y), (640, 720));
}
